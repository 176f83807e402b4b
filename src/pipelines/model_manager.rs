// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline manager
//!
//! Loads the four text pipelines once at startup. Sentiment analysis is
//! mandatory; the generation, summarization and classification pipelines are
//! optional and stay unavailable for the rest of the process if they fail.

use crate::config::DEFAULT_PIPELINES;
use crate::pipelines::{
    GenerationSettings, ModelSource, OnnxSummarizer, OnnxTextClassifier, OnnxTextGenerator,
    Summarizer, TextClassifier, TextGenerator,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineTask {
    Sentiment,
    Generation,
    Summarization,
    Classification,
}

impl PipelineTask {
    pub const ALL: [PipelineTask; 4] = [
        PipelineTask::Sentiment,
        PipelineTask::Generation,
        PipelineTask::Summarization,
        PipelineTask::Classification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineTask::Sentiment => "sentiment",
            PipelineTask::Generation => "generation",
            PipelineTask::Summarization => "summarization",
            PipelineTask::Classification => "classification",
        }
    }
}

impl fmt::Display for PipelineTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to find one pipeline's model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name reported by `/models`
    pub name: String,
    pub source: ModelSource,
}

/// Model configuration for all pipelines
#[derive(Debug, Clone, PartialEq)]
pub struct ModelsConfig {
    pub sentiment: PipelineConfig,
    pub generation: PipelineConfig,
    pub summarization: PipelineConfig,
    pub classification: PipelineConfig,
    pub generation_settings: GenerationSettings,
    pub intra_threads: usize,
}

/// Availability of one pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub task: PipelineTask,
    /// Configured model name
    pub name: String,
    /// Whether the model loaded at startup
    pub available: bool,
}

#[derive(Clone)]
pub struct PipelineManager {
    sentiment: Arc<dyn TextClassifier>,
    generator: Option<Arc<dyn TextGenerator>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    classifier: Option<Arc<dyn TextClassifier>>,
    names: [String; 4],
}

impl fmt::Debug for PipelineManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineManager")
            .field("pipelines", &self.list_models())
            .finish()
    }
}

impl PipelineManager {
    /// Loads all pipelines concurrently
    ///
    /// # Errors
    /// Only when the sentiment pipeline fails. Failures of the optional
    /// pipelines are logged and leave that pipeline unavailable.
    pub async fn load(config: &ModelsConfig) -> Result<Self> {
        info!("Loading {} text pipelines", PipelineTask::ALL.len());

        let threads = config.intra_threads;

        let sentiment_cfg = config.sentiment.clone();
        let sentiment_task = tokio::task::spawn_blocking(move || {
            OnnxTextClassifier::load(sentiment_cfg.name, &sentiment_cfg.source, threads)
        });

        let generation_cfg = config.generation.clone();
        let settings = config.generation_settings.clone();
        let generation_task = tokio::task::spawn_blocking(move || {
            OnnxTextGenerator::load(generation_cfg.name, &generation_cfg.source, settings, threads)
        });

        let summarization_cfg = config.summarization.clone();
        let summarization_task = tokio::task::spawn_blocking(move || {
            OnnxSummarizer::load(summarization_cfg.name, &summarization_cfg.source, threads)
        });

        let classification_cfg = config.classification.clone();
        let classification_task = tokio::task::spawn_blocking(move || {
            OnnxTextClassifier::load(
                classification_cfg.name,
                &classification_cfg.source,
                threads,
            )
        });

        let (sentiment, generator, summarizer, classifier) = tokio::join!(
            sentiment_task,
            generation_task,
            summarization_task,
            classification_task
        );

        let sentiment = sentiment
            .context("Sentiment model loading task panicked")?
            .context("Failed to load sentiment analysis model")?;

        let generator = optional(PipelineTask::Generation, generator)
            .map(|m| Arc::new(m) as Arc<dyn TextGenerator>);
        let summarizer = optional(PipelineTask::Summarization, summarizer)
            .map(|m| Arc::new(m) as Arc<dyn Summarizer>);
        let classifier = optional(PipelineTask::Classification, classifier)
            .map(|m| Arc::new(m) as Arc<dyn TextClassifier>);

        let manager = Self {
            sentiment: Arc::new(sentiment),
            generator,
            summarizer,
            classifier,
            names: [
                config.sentiment.name.clone(),
                config.generation.name.clone(),
                config.summarization.name.clone(),
                config.classification.name.clone(),
            ],
        };

        info!(
            "Pipeline manager initialized: {}/{} pipelines available",
            manager.available_count(),
            PipelineTask::ALL.len()
        );

        Ok(manager)
    }

    /// Builds a manager from already-constructed pipelines
    pub fn from_parts(
        sentiment: Arc<dyn TextClassifier>,
        generator: Option<Arc<dyn TextGenerator>>,
        summarizer: Option<Arc<dyn Summarizer>>,
        classifier: Option<Arc<dyn TextClassifier>>,
    ) -> Self {
        // Missing pipelines keep the default model name in listings
        let fallback = |index: usize| DEFAULT_PIPELINES[index].name.to_string();
        let names = [
            sentiment.model_name().to_string(),
            generator
                .as_ref()
                .map(|g| g.model_name().to_string())
                .unwrap_or_else(|| fallback(1)),
            summarizer
                .as_ref()
                .map(|s| s.model_name().to_string())
                .unwrap_or_else(|| fallback(2)),
            classifier
                .as_ref()
                .map(|c| c.model_name().to_string())
                .unwrap_or_else(|| fallback(3)),
        ];

        Self {
            sentiment,
            generator,
            summarizer,
            classifier,
            names,
        }
    }

    pub fn sentiment(&self) -> Arc<dyn TextClassifier> {
        self.sentiment.clone()
    }

    pub fn generator(&self) -> Option<Arc<dyn TextGenerator>> {
        self.generator.clone()
    }

    pub fn summarizer(&self) -> Option<Arc<dyn Summarizer>> {
        self.summarizer.clone()
    }

    pub fn classifier(&self) -> Option<Arc<dyn TextClassifier>> {
        self.classifier.clone()
    }

    pub fn is_available(&self, task: PipelineTask) -> bool {
        match task {
            PipelineTask::Sentiment => true,
            PipelineTask::Generation => self.generator.is_some(),
            PipelineTask::Summarization => self.summarizer.is_some(),
            PipelineTask::Classification => self.classifier.is_some(),
        }
    }

    pub fn available_count(&self) -> usize {
        PipelineTask::ALL
            .iter()
            .filter(|t| self.is_available(**t))
            .count()
    }

    /// Lists every pipeline in a fixed order, available or not
    pub fn list_models(&self) -> Vec<PipelineInfo> {
        PipelineTask::ALL
            .iter()
            .zip(self.names.iter())
            .map(|(task, name)| PipelineInfo {
                task: *task,
                name: name.clone(),
                available: self.is_available(*task),
            })
            .collect()
    }
}

fn optional<T>(
    task: PipelineTask,
    joined: std::result::Result<Result<T>, tokio::task::JoinError>,
) -> Option<T> {
    match joined {
        Ok(Ok(model)) => {
            info!("✓ {} pipeline available", task);
            Some(model)
        }
        Ok(Err(e)) => {
            warn!("⚠️ Failed to load {} model: {:#}", task, e);
            warn!("   /{} requests will return 503 Service Unavailable", route_for(task));
            None
        }
        Err(e) => {
            error!("✗ {} model loading task failed: {}", task, e);
            None
        }
    }
}

fn route_for(task: PipelineTask) -> &'static str {
    match task {
        PipelineTask::Sentiment => "sentiment",
        PipelineTask::Generation => "generate",
        PipelineTask::Summarization => "summarize",
        PipelineTask::Classification => "classify",
    }
}
