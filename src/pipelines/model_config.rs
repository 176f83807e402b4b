// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Subset of a HuggingFace `config.json` needed by the pipelines

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Fields read from `config.json`
///
/// Only the keys used for label mapping and decoding are kept; everything
/// else in the file is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HfModelConfig {
    #[serde(default)]
    pub model_type: Option<String>,

    /// Class index (as a string key) to label name
    #[serde(default)]
    pub id2label: HashMap<String, String>,

    #[serde(default)]
    pub problem_type: Option<String>,

    #[serde(default)]
    pub bos_token_id: Option<u32>,

    #[serde(default)]
    pub eos_token_id: Option<u32>,

    #[serde(default)]
    pub pad_token_id: Option<u32>,

    #[serde(default)]
    pub decoder_start_token_id: Option<u32>,

    #[serde(default)]
    pub forced_bos_token_id: Option<u32>,

    #[serde(default)]
    pub no_repeat_ngram_size: Option<usize>,

    #[serde(default)]
    pub vocab_size: Option<usize>,
}

impl HfModelConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model config {}", path.display()))
    }

    /// Label for a class index, falling back to `LABEL_<i>`
    pub fn label_for(&self, index: usize) -> String {
        self.id2label
            .get(&index.to_string())
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", index))
    }

    pub fn is_multi_label(&self) -> bool {
        self.problem_type.as_deref() == Some("multi_label_classification")
    }
}
