// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text inference pipelines backed by ONNX Runtime
//!
//! Each pipeline wraps one exported HuggingFace model (ONNX graph, tokenizer
//! and `config.json`) and exposes a single high-level call. The HTTP layer only
//! sees the traits defined here, so handlers can be tested without model files.

pub mod classification;
pub mod decoding;
pub mod generation;
pub mod model_config;
pub mod model_manager;
pub mod model_source;
pub mod session;
pub mod summarization;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use classification::OnnxTextClassifier;
pub use generation::{GenerationSettings, OnnxTextGenerator};
pub use model_config::HfModelConfig;
pub use model_manager::{ModelsConfig, PipelineConfig, PipelineInfo, PipelineManager, PipelineTask};
pub use model_source::ModelSource;
pub use summarization::OnnxSummarizer;

/// Top label produced by a sequence classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutput {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Prompt followed by the generated continuation
    pub generated_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary_text: String,
}

/// Length limits for a summarization call, counted in decoder tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarizationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub do_sample: bool,
}

impl Default for SummarizationParams {
    fn default() -> Self {
        Self {
            max_length: 130,
            min_length: 30,
            do_sample: false,
        }
    }
}

/// Sequence classification (used for sentiment and topic classification)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationOutput>;

    fn model_name(&self) -> &str;
}

/// Causal language model text continuation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerationOutput>;

    fn model_name(&self) -> &str;
}

/// Abstractive summarization
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, params: &SummarizationParams) -> Result<SummaryOutput>;

    fn model_name(&self) -> &str;
}
