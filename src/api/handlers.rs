// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Route handlers
//!
//! Every POST handler follows the same order: availability check (503),
//! pipeline call (500 on error), then reshaping into the response body.

use axum::{extract::State, Json};
use tracing::{debug, error, warn};

use crate::api::http_server::AppState;
use crate::api::request::{ApiJson, TextInput};
use crate::api::response::{
    ClassifyResponse, GenerateResponse, HealthResponse, ModelsResponse, RootResponse,
    SentimentResponse, SummarizeResponse,
};
use crate::api::ApiError;
use crate::pipelines::PipelineTask;

/// Inputs with fewer words than this are returned without summarizing
pub const MIN_SUMMARY_WORDS: usize = 30;

pub const GENERATION_UNAVAILABLE: &str = "Text generation model not available";
pub const CLASSIFICATION_UNAVAILABLE: &str = "Text classification model not available";
pub const SUMMARIZATION_UNAVAILABLE: &str = "Summarization model not available";

fn unavailable(task: PipelineTask, detail: &str) -> ApiError {
    warn!("Rejected {} request: model not loaded", task);
    ApiError::ServiceUnavailable(detail.to_string())
}

fn pipeline_failed(task: PipelineTask, err: anyhow::Error) -> ApiError {
    error!("{} pipeline failed: {:#}", task, err);
    ApiError::from(err)
}

/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse::default())
}

/// POST /sentiment
///
/// # Errors
/// - 500 Internal Server Error: inference failed
pub async fn sentiment_handler(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TextInput>,
) -> Result<Json<SentimentResponse>, ApiError> {
    let result = state
        .pipelines
        .sentiment()
        .classify(&input.text)
        .await
        .map_err(|e| pipeline_failed(PipelineTask::Sentiment, e))?;

    debug!("Sentiment {} ({:.4})", result.label, result.score);

    Ok(Json(SentimentResponse {
        text: input.text,
        sentiment: result.label,
        confidence: result.score,
    }))
}

/// POST /generate
///
/// # Errors
/// - 503 Service Unavailable: generation model not loaded
/// - 500 Internal Server Error: generation failed
pub async fn generate_handler(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TextInput>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generator = state
        .pipelines
        .generator()
        .ok_or_else(|| unavailable(PipelineTask::Generation, GENERATION_UNAVAILABLE))?;

    let result = generator
        .generate(&input.text)
        .await
        .map_err(|e| pipeline_failed(PipelineTask::Generation, e))?;

    Ok(Json(GenerateResponse {
        prompt: input.text,
        generated_text: result.generated_text,
    }))
}

/// POST /classify
///
/// # Errors
/// - 503 Service Unavailable: classification model not loaded
/// - 500 Internal Server Error: inference failed
pub async fn classify_handler(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TextInput>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let classifier = state
        .pipelines
        .classifier()
        .ok_or_else(|| unavailable(PipelineTask::Classification, CLASSIFICATION_UNAVAILABLE))?;

    let result = classifier
        .classify(&input.text)
        .await
        .map_err(|e| pipeline_failed(PipelineTask::Classification, e))?;

    Ok(Json(ClassifyResponse {
        text: input.text,
        category: result.label,
        confidence: result.score,
    }))
}

/// POST /summarize
///
/// Availability is checked before the length rule, so short input still
/// gets a 503 when the model is missing.
///
/// # Errors
/// - 503 Service Unavailable: summarization model not loaded
/// - 500 Internal Server Error: summarization failed
pub async fn summarize_handler(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TextInput>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let summarizer = state
        .pipelines
        .summarizer()
        .ok_or_else(|| unavailable(PipelineTask::Summarization, SUMMARIZATION_UNAVAILABLE))?;

    let words = input.word_count();
    if words < MIN_SUMMARY_WORDS {
        debug!("Skipping summarization of {} words", words);
        return Ok(Json(SummarizeResponse::too_short(input.text)));
    }

    let result = summarizer
        .summarize(&input.text, &state.summarization)
        .await
        .map_err(|e| pipeline_failed(PipelineTask::Summarization, e))?;

    Ok(Json(SummarizeResponse::Summary {
        original_text: input.text,
        summary: result.summary_text,
    }))
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// GET /models
pub async fn models_handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.pipelines.list_models(),
    })
}

/// Fallback for unknown routes
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}
