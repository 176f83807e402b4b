// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod pipelines;
pub mod version;

// Re-export main types
pub use api::{create_app, start_server, ApiError, AppState};
pub use config::ServiceConfig;
pub use pipelines::{
    ClassificationOutput, GenerationOutput, PipelineManager, PipelineTask, SummarizationParams,
    Summarizer, SummaryOutput, TextClassifier, TextGenerator,
};
