// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST endpoints: success shapes, 503 for missing models, 500 for failures

use super::support::{
    app_with, full_app, post_text, sentiment_only_app, words, FakeClassifier, FakeGenerator,
    FakeSummarizer,
};
use axum::http::StatusCode;
use std::sync::Arc;
use text_analysis_api::pipelines::{PipelineManager, Summarizer, TextGenerator};

#[tokio::test]
async fn test_sentiment_success() {
    let (status, body) = post_text(sentiment_only_app(), "/sentiment", "I love this product!").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "I love this product!");
    assert_eq!(body["sentiment"], "POSITIVE");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!(confidence > 0.999 && confidence <= 1.0);
}

#[tokio::test]
async fn test_sentiment_accepts_empty_text() {
    let (status, body) = post_text(sentiment_only_app(), "/sentiment", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "");
}

#[tokio::test]
async fn test_sentiment_failure_is_500() {
    let app = app_with(PipelineManager::from_parts(
        FakeClassifier::failing("onnx session error"),
        None,
        None,
        None,
    ));

    let (status, body) = post_text(app, "/sentiment", "anything").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "onnx session error");
    assert_eq!(body["error_type"], "internal_error");
}

#[tokio::test]
async fn test_generate_success() {
    let app = full_app(Arc::new(FakeSummarizer::default()));
    let (status, body) = post_text(app, "/generate", "Once upon a time").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prompt"], "Once upon a time");
    assert_eq!(body["generated_text"], "Once upon a time there was a test.");
}

#[tokio::test]
async fn test_generate_unavailable() {
    let (status, body) = post_text(sentiment_only_app(), "/generate", "Once").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Text generation model not available");
    assert_eq!(body["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_generate_failure_is_500() {
    let generator: Arc<dyn TextGenerator> = Arc::new(FakeGenerator {
        continuation: "",
        error: Some("sampling failed"),
    });
    let app = app_with(PipelineManager::from_parts(
        FakeClassifier::ok("POSITIVE", 0.9),
        Some(generator),
        None,
        None,
    ));

    let (status, body) = post_text(app, "/generate", "Once").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "sampling failed");
}

#[tokio::test]
async fn test_classify_success() {
    let app = full_app(Arc::new(FakeSummarizer::default()));
    let (status, body) = post_text(app, "/classify", "The service was slow").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "The service was slow");
    assert_eq!(body["category"], "NEGATIVE");
    assert!((body["confidence"].as_f64().unwrap() - 0.87).abs() < 1e-6);
}

#[tokio::test]
async fn test_classify_unavailable() {
    let (status, body) = post_text(sentiment_only_app(), "/classify", "x").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Text classification model not available");
}

#[tokio::test]
async fn test_classify_failure_is_500() {
    let app = app_with(PipelineManager::from_parts(
        FakeClassifier::ok("POSITIVE", 0.9),
        None,
        None,
        Some(FakeClassifier::failing("tokenizer failed")),
    ));

    let (status, body) = post_text(app, "/classify", "x").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "tokenizer failed");
}

#[tokio::test]
async fn test_summarize_short_text_is_echoed() {
    let summarizer = Arc::new(FakeSummarizer::default());
    let text = words(29);

    let (status, body) = post_text(full_app(summarizer.clone()), "/summarize", &text).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], text);
    assert_eq!(body["note"], "Text too short for summarization");
    assert!(body.get("original_text").is_none());
    assert!(summarizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_summarize_thirty_words_runs_model() {
    let summarizer = Arc::new(FakeSummarizer::default());
    let text = format!("{}. And then some more", words(26));
    assert_eq!(text.split_whitespace().count(), 30);

    let (status, body) = post_text(full_app(summarizer.clone()), "/summarize", &text).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_text"], text);
    assert_eq!(body["summary"], format!("{}.", words(26)));
    assert!(body.get("note").is_none());

    let calls = summarizer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_length, 130);
    assert_eq!(calls[0].min_length, 30);
    assert!(!calls[0].do_sample);
}

#[tokio::test]
async fn test_summarize_unavailable_even_for_short_text() {
    let (status, body) = post_text(sentiment_only_app(), "/summarize", "short").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Summarization model not available");
}

#[tokio::test]
async fn test_summarize_failure_is_500() {
    let summarizer: Arc<dyn Summarizer> = Arc::new(FakeSummarizer {
        error: Some("decoder failed"),
        ..Default::default()
    });
    let app = app_with(PipelineManager::from_parts(
        FakeClassifier::ok("POSITIVE", 0.9),
        None,
        Some(summarizer),
        None,
    ));

    let (status, body) = post_text(app, "/summarize", &words(40)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "decoder failed");
}

#[tokio::test]
async fn test_unavailable_model_does_not_affect_others() {
    let app = sentiment_only_app();

    let (status, _) = post_text(app.clone(), "/generate", "x").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = post_text(app, "/sentiment", "x").await;
    assert_eq!(status, StatusCode::OK);
}
