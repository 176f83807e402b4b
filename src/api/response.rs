// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response bodies, one per success shape

use crate::pipelines::PipelineInfo;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "Welcome to my AI API";
pub const DOCS_PATH: &str = "/docs";
pub const TOO_SHORT_NOTE: &str = "Text too short for summarization";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootResponse {
    pub message: String,
    pub docs: String,
}

impl Default for RootResponse {
    fn default() -> Self {
        Self {
            message: WELCOME_MESSAGE.to_string(),
            docs: DOCS_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentResponse {
    pub text: String,
    /// Label reported by the model, e.g. `POSITIVE`
    pub sentiment: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub prompt: String,
    pub generated_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifyResponse {
    pub text: String,
    pub category: String,
    pub confidence: f32,
}

/// `/summarize` returns one of two shapes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SummarizeResponse {
    Summary {
        original_text: String,
        summary: String,
    },
    /// Input below the word threshold is echoed back unchanged
    TooShort { summary: String, note: String },
}

impl SummarizeResponse {
    pub fn too_short(text: impl Into<String>) -> Self {
        SummarizeResponse::TooShort {
            summary: text.into(),
            note: TOO_SHORT_NOTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    /// Unix time in seconds with sub-second precision
    pub timestamp: f64,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelsResponse {
    pub models: Vec<PipelineInfo>,
}
