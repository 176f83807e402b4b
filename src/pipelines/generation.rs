// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX causal language model pipeline (GPT-2 family)
//!
//! Uses a decoder export without past key values, so every step re-runs the
//! full sequence. With the default 50-token budget this stays cheap and keeps
//! the graph interface to `input_ids` / `attention_mask` (+ `position_ids`).

use crate::pipelines::decoding::{argmax, top_k_sample};
use crate::pipelines::session::{self, SharedSession};
use crate::pipelines::{GenerationOutput, HfModelConfig, ModelSource, TextGenerator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, IxDyn};
use ort::value::{DynValue, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// GPT-2 context window
pub const MAX_CONTEXT_LENGTH: usize = 1024;

/// GPT-2 `<|endoftext|>`, used when config.json omits it
const DEFAULT_EOS_TOKEN_ID: u32 = 50256;

/// Decoding settings for text generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Total length in tokens, prompt included
    pub max_length: usize,
    pub do_sample: bool,
    pub top_k: usize,
    pub temperature: f32,
    /// Fixed RNG seed, mainly for reproducible tests
    pub seed: Option<u64>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_length: 50,
            do_sample: true,
            top_k: 50,
            temperature: 1.0,
            seed: None,
        }
    }
}

#[derive(Clone)]
pub struct OnnxTextGenerator {
    session: SharedSession,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    settings: GenerationSettings,
    bos_token_id: u32,
    eos_token_id: u32,
    uses_position_ids: bool,
}

impl std::fmt::Debug for OnnxTextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextGenerator")
            .field("model_name", &self.model_name)
            .field("settings", &self.settings)
            .field("eos_token_id", &self.eos_token_id)
            .finish_non_exhaustive()
    }
}

impl OnnxTextGenerator {
    /// Loads `model.onnx`, `tokenizer.json` and `config.json` from `source`
    pub fn load(
        model_name: impl Into<String>,
        source: &ModelSource,
        settings: GenerationSettings,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();

        let model_path = source.resolve("model.onnx")?;
        let tokenizer_path = source.resolve("tokenizer.json")?;
        let config_path = source.resolve("config.json")?;

        let config = HfModelConfig::from_file(&config_path)?;
        let tokenizer = session::load_tokenizer(&tokenizer_path, MAX_CONTEXT_LENGTH)?;
        let session = session::load_session(&model_path, intra_threads)?;
        let uses_position_ids = session::has_input(&session, "position_ids");

        let eos_token_id = config.eos_token_id.unwrap_or(DEFAULT_EOS_TOKEN_ID);
        let bos_token_id = config.bos_token_id.unwrap_or(eos_token_id);

        info!(
            "✅ Text generator {} loaded (max_length={}, sampling={})",
            model_name, settings.max_length, settings.do_sample
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            settings,
            bos_token_id,
            eos_token_id,
            uses_position_ids,
        })
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Logits for the position after the last token
    fn next_token_logits(&self, tokens: &[u32]) -> Result<Vec<f32>> {
        let len = tokens.len();
        let input_ids = session::row_tensor(tokens)?;
        let attention_mask = Array2::<i64>::ones((1, len));

        let mut inputs: Vec<(&str, DynValue)> = vec![
            ("input_ids", Tensor::from_array(input_ids)?.into_dyn()),
            ("attention_mask", Tensor::from_array(attention_mask)?.into_dyn()),
        ];
        if self.uses_position_ids {
            let positions: Vec<i64> = (0..len as i64).collect();
            let position_ids = Array2::from_shape_vec((1, len), positions)
                .context("Failed to create position_ids array")?;
            inputs.push(("position_ids", Tensor::from_array(position_ids)?.into_dyn()));
        }

        let mut session = session::lock(&self.session)?;
        let outputs = session.run(inputs).context("Generation inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits tensor")?;

        let shape = logits.shape();
        if shape.len() != 3 {
            anyhow::bail!(
                "Unexpected logits shape {:?} (expected [batch, seq_len, vocab])",
                shape
            );
        }
        let (last_pos, vocab_size) = (shape[1] - 1, shape[2]);

        Ok((0..vocab_size)
            .map(|v| logits[IxDyn(&[0, last_pos, v])])
            .collect())
    }

    pub fn generate_blocking(&self, prompt: &str) -> Result<GenerationOutput> {
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let tokens = starting_tokens(encoding.get_ids(), self.bos_token_id);
        if tokens.len() >= self.settings.max_length {
            debug!(
                "Prompt already {} tokens (max_length {}), nothing to generate",
                tokens.len(),
                self.settings.max_length
            );
            return Ok(GenerationOutput {
                generated_text: prompt.to_string(),
            });
        }

        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let continuation_ids = continue_tokens(
            &tokens,
            self.eos_token_id,
            &self.settings,
            &mut rng,
            |context| self.next_token_logits(context),
        )?;

        let continuation = self
            .tokenizer
            .decode(&continuation_ids, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        Ok(GenerationOutput {
            generated_text: format!("{}{}", prompt, continuation),
        })
    }
}

/// Prompt token ids, or a lone BOS when the prompt encodes to nothing
pub fn starting_tokens(prompt_ids: &[u32], bos_token_id: u32) -> Vec<u32> {
    if prompt_ids.is_empty() {
        vec![bos_token_id]
    } else {
        prompt_ids.to_vec()
    }
}

/// Extends `tokens` one step at a time until EOS or `settings.max_length`
///
/// `next_logits` receives the whole sequence so far and returns the logits
/// for the following position. Returns only the new tokens; EOS is never
/// part of the result.
pub fn continue_tokens<R, F>(
    tokens: &[u32],
    eos_token_id: u32,
    settings: &GenerationSettings,
    rng: &mut R,
    mut next_logits: F,
) -> Result<Vec<u32>>
where
    R: Rng + ?Sized,
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
{
    let mut sequence = tokens.to_vec();
    let start = sequence.len();

    while sequence.len() < settings.max_length {
        let logits = next_logits(&sequence)?;

        let index = if settings.do_sample {
            top_k_sample(&logits, settings.top_k, settings.temperature, rng)?
        } else {
            argmax(&logits)?
        };
        let next = index as u32;

        if next == eos_token_id {
            debug!("Generation stopped at EOS after {} tokens", sequence.len() - start);
            break;
        }
        sequence.push(next);
    }

    Ok(sequence.split_off(start))
}

#[async_trait]
impl TextGenerator for OnnxTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<GenerationOutput> {
        let this = self.clone();
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || this.generate_blocking(&prompt))
            .await
            .context("Generation task panicked")?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
