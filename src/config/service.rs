// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from environment variables

use crate::api::DEFAULT_MAX_BODY_BYTES;
use crate::pipelines::{
    GenerationSettings, ModelSource, ModelsConfig, PipelineConfig, PipelineTask,
    SummarizationParams,
};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Default model for one pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineDefaults {
    pub task: PipelineTask,
    pub name: &'static str,
    pub hub_repo: &'static str,
    /// Prefix for `<PREFIX>_MODEL_DIR` / `<PREFIX>_MODEL_REPO`
    pub env_prefix: &'static str,
}

pub const DEFAULT_PIPELINES: [PipelineDefaults; 4] = [
    PipelineDefaults {
        task: PipelineTask::Sentiment,
        name: "distilbert-base-uncased-finetuned-sst-2-english",
        hub_repo: "Xenova/distilbert-base-uncased-finetuned-sst-2-english",
        env_prefix: "SENTIMENT",
    },
    PipelineDefaults {
        task: PipelineTask::Generation,
        name: "gpt2",
        hub_repo: "Xenova/gpt2",
        env_prefix: "GENERATION",
    },
    PipelineDefaults {
        task: PipelineTask::Summarization,
        name: "distilbart-cnn-6-6",
        hub_repo: "Xenova/distilbart-cnn-6-6",
        env_prefix: "SUMMARIZATION",
    },
    PipelineDefaults {
        task: PipelineTask::Classification,
        name: "distilbert-base-uncased-finetuned-sst-2-english",
        hub_repo: "Xenova/distilbert-base-uncased-finetuned-sst-2-english",
        env_prefix: "CLASSIFICATION",
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub models: ModelsConfig,
    pub summarization: SummarizationParams,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    /// Reads configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, so tests need not touch the
    /// process environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(default)
        };

        let models_dir = lookup("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./models"));
        let allow_download = flag("MODEL_DOWNLOAD", true);

        let pipeline = |defaults: &PipelineDefaults| {
            let dir = lookup(&format!("{}_MODEL_DIR", defaults.env_prefix))
                .map(PathBuf::from)
                .unwrap_or_else(|| models_dir.join(defaults.task.as_str()));
            // An empty repo disables downloads for this pipeline
            let repo = lookup(&format!("{}_MODEL_REPO", defaults.env_prefix))
                .unwrap_or_else(|| defaults.hub_repo.to_string());
            let name = lookup(&format!("{}_MODEL_NAME", defaults.env_prefix))
                .unwrap_or_else(|| defaults.name.to_string());

            let hub_repo = if repo.trim().is_empty() {
                None
            } else {
                Some(repo)
            };

            PipelineConfig {
                name,
                source: ModelSource {
                    local_dir: dir,
                    allow_download: allow_download && hub_repo.is_some(),
                    hub_repo,
                },
            }
        };

        let generation_defaults = GenerationSettings::default();
        let generation_settings = GenerationSettings {
            max_length: parse_var(&lookup, "GENERATION_MAX_LENGTH")
                .unwrap_or(generation_defaults.max_length),
            do_sample: flag("GENERATION_DO_SAMPLE", generation_defaults.do_sample),
            top_k: parse_var(&lookup, "GENERATION_TOP_K").unwrap_or(generation_defaults.top_k),
            temperature: parse_var(&lookup, "GENERATION_TEMPERATURE")
                .unwrap_or(generation_defaults.temperature),
            seed: parse_var(&lookup, "GENERATION_SEED"),
        };

        let summary_defaults = SummarizationParams::default();
        let summarization = SummarizationParams {
            max_length: parse_var(&lookup, "SUMMARY_MAX_LENGTH")
                .unwrap_or(summary_defaults.max_length),
            min_length: parse_var(&lookup, "SUMMARY_MIN_LENGTH")
                .unwrap_or(summary_defaults.min_length),
            do_sample: false,
        };

        Self {
            host: parse_var(&lookup, "API_HOST").unwrap_or(IpAddr::from([0, 0, 0, 0])),
            port: parse_var(&lookup, "API_PORT").unwrap_or(8000),
            models: ModelsConfig {
                sentiment: pipeline(&DEFAULT_PIPELINES[0]),
                generation: pipeline(&DEFAULT_PIPELINES[1]),
                summarization: pipeline(&DEFAULT_PIPELINES[2]),
                classification: pipeline(&DEFAULT_PIPELINES[3]),
                generation_settings,
                intra_threads: parse_var(&lookup, "ONNX_INTRA_THREADS").unwrap_or(4),
            },
            summarization,
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES")
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        }
    }

    /// Turns off hub downloads for every pipeline
    pub fn disable_downloads(&mut self) {
        for pipeline in self.pipelines_mut() {
            pipeline.source.allow_download = false;
        }
    }

    /// Points every pipeline at `<dir>/<task>`
    pub fn set_models_dir(&mut self, dir: PathBuf) {
        for (pipeline, defaults) in self.pipelines_mut().into_iter().zip(DEFAULT_PIPELINES.iter())
        {
            pipeline.source.local_dir = dir.join(defaults.task.as_str());
        }
    }

    fn pipelines_mut(&mut self) -> [&mut PipelineConfig; 4] {
        [
            &mut self.models.sentiment,
            &mut self.models.generation,
            &mut self.models.summarization,
            &mut self.models.classification,
        ]
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("API port must be greater than 0".to_string());
        }
        if self.max_body_bytes == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }
        if self.models.intra_threads == 0 {
            return Err("ONNX intra threads must be greater than 0".to_string());
        }
        if self.models.generation_settings.max_length == 0 {
            return Err("Generation max_length must be greater than 0".to_string());
        }
        if self.summarization.min_length > self.summarization.max_length {
            return Err(format!(
                "Summary min_length ({}) cannot exceed max_length ({})",
                self.summarization.min_length, self.summarization.max_length
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
