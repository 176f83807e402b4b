// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Startup loading and availability reporting

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use text_analysis_api::config::ServiceConfig;
use text_analysis_api::pipelines::{
    ClassificationOutput, ModelSource, PipelineManager, PipelineTask, TextClassifier,
};

struct Constant;

#[async_trait]
impl TextClassifier for Constant {
    async fn classify(&self, _text: &str) -> Result<ClassificationOutput> {
        Ok(ClassificationOutput {
            label: "POSITIVE".to_string(),
            score: 1.0,
        })
    }

    fn model_name(&self) -> &str {
        "constant"
    }
}

#[tokio::test]
async fn test_load_without_sentiment_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::default();
    config.set_models_dir(dir.path().to_path_buf());
    config.disable_downloads();

    let err = PipelineManager::load(&config.models).await.unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains("Failed to load sentiment analysis model"));
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_load_uses_configured_directories() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::default();
    config.set_models_dir(dir.path().to_path_buf());
    config.disable_downloads();
    config.models.sentiment.source = ModelSource::local(dir.path().join("elsewhere"));

    let err = PipelineManager::load(&config.models).await.unwrap_err();
    assert!(format!("{:#}", err).contains("elsewhere"));
}

#[tokio::test]
async fn test_manager_with_only_sentiment() {
    let manager = PipelineManager::from_parts(Arc::new(Constant), None, None, None);

    let result = manager.sentiment().classify("fine").await.unwrap();
    assert_eq!(result.label, "POSITIVE");

    assert_eq!(manager.available_count(), 1);
    for task in [
        PipelineTask::Generation,
        PipelineTask::Summarization,
        PipelineTask::Classification,
    ] {
        assert!(!manager.is_available(task));
    }

    let names: Vec<String> = manager.list_models().into_iter().map(|m| m.name).collect();
    assert_eq!(
        names,
        vec![
            "constant",
            "gpt2",
            "distilbart-cnn-6-6",
            "distilbert-base-uncased-finetuned-sst-2-english",
        ]
    );
}

#[tokio::test]
async fn test_same_model_for_sentiment_and_classification() {
    let shared: Arc<dyn TextClassifier> = Arc::new(Constant);
    let manager = PipelineManager::from_parts(shared.clone(), None, None, Some(shared));

    assert!(manager.is_available(PipelineTask::Classification));
    let classified = manager
        .classifier()
        .unwrap()
        .classify("fine")
        .await
        .unwrap();
    assert_eq!(classified.score, 1.0);
}

#[test]
#[ignore] // Only run if model files are downloaded
fn test_real_models_load() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = ServiceConfig::from_env();

    let manager = runtime
        .block_on(PipelineManager::load(&config.models))
        .unwrap();
    assert!(manager.available_count() >= 1);
}
