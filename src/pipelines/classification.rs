// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX sequence classification pipeline
//!
//! Runs a `*ForSequenceClassification` export (e.g.
//! distilbert-base-uncased-finetuned-sst-2-english) and returns the top label
//! with its probability. Used by both `/sentiment` and `/classify`.

use crate::pipelines::decoding::{argmax, sigmoid, softmax};
use crate::pipelines::session::{self, SharedSession};
use crate::pipelines::{ClassificationOutput, HfModelConfig, ModelSource, TextClassifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::value::{DynValue, Tensor};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Maximum input length in tokens (BERT-family position limit)
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// How raw logits become scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFunction {
    Softmax,
    Sigmoid,
}

impl ScoreFunction {
    /// Matches the usual pipeline rule: sigmoid for single-logit or
    /// multi-label heads, softmax otherwise
    pub fn for_config(config: &HfModelConfig, num_labels: usize) -> Self {
        if num_labels == 1 || config.is_multi_label() {
            ScoreFunction::Sigmoid
        } else {
            ScoreFunction::Softmax
        }
    }

    pub fn apply(&self, logits: &[f32]) -> Vec<f32> {
        match self {
            ScoreFunction::Softmax => softmax(logits),
            ScoreFunction::Sigmoid => sigmoid(logits),
        }
    }
}

/// Picks the best label from raw logits
pub fn top_label(config: &HfModelConfig, logits: &[f32]) -> Result<ClassificationOutput> {
    let scores = ScoreFunction::for_config(config, logits.len()).apply(logits);
    let best = argmax(&scores).context("Classifier returned no logits")?;

    Ok(ClassificationOutput {
        label: config.label_for(best),
        score: scores[best],
    })
}

#[derive(Clone)]
pub struct OnnxTextClassifier {
    session: SharedSession,
    tokenizer: Arc<Tokenizer>,
    config: Arc<HfModelConfig>,
    model_name: String,
    uses_token_type_ids: bool,
}

impl std::fmt::Debug for OnnxTextClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextClassifier")
            .field("model_name", &self.model_name)
            .field("labels", &self.config.id2label.len())
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .finish_non_exhaustive()
    }
}

impl OnnxTextClassifier {
    /// Loads `model.onnx`, `tokenizer.json` and `config.json` from `source`
    ///
    /// Blocking: may download files and builds the ONNX session.
    pub fn load(
        model_name: impl Into<String>,
        source: &ModelSource,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();

        let model_path = source.resolve("model.onnx")?;
        let tokenizer_path = source.resolve("tokenizer.json")?;
        let config_path = source.resolve("config.json")?;

        let config = HfModelConfig::from_file(&config_path)?;
        let tokenizer = session::load_tokenizer(&tokenizer_path, MAX_SEQUENCE_LENGTH)?;
        let session = session::load_session(&model_path, intra_threads)?;
        let uses_token_type_ids = session::has_input(&session, "token_type_ids");

        info!(
            "✅ Text classifier {} loaded ({} labels)",
            model_name,
            config.id2label.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config: Arc::new(config),
            model_name,
            uses_token_type_ids,
        })
    }

    /// Runs the graph and returns logits for the single input sequence
    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids = session::row_tensor(encoding.get_ids())?;
        let attention_mask = session::row_tensor(encoding.get_attention_mask())?;

        let mut inputs: Vec<(&str, DynValue)> = vec![
            ("input_ids", Tensor::from_array(input_ids)?.into_dyn()),
            ("attention_mask", Tensor::from_array(attention_mask)?.into_dyn()),
        ];
        if self.uses_token_type_ids {
            let token_type_ids = session::row_tensor(encoding.get_type_ids())?;
            inputs.push(("token_type_ids", Tensor::from_array(token_type_ids)?.into_dyn()));
        }

        let mut session = session::lock(&self.session)?;
        let outputs = session.run(inputs).context("Classifier inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits tensor")?;

        debug!("Classifier logits shape: {:?}", logits.shape());

        Ok(logits.iter().copied().collect())
    }

    pub fn classify_blocking(&self, text: &str) -> Result<ClassificationOutput> {
        let logits = self.logits(text)?;
        top_label(&self.config, &logits)
    }
}

#[async_trait]
impl TextClassifier for OnnxTextClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationOutput> {
        let this = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || this.classify_blocking(&text))
            .await
            .context("Classification task panicked")?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
