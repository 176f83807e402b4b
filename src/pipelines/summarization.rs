// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX encoder-decoder summarization pipeline (BART family)
//!
//! The encoder runs once over the article; the decoder is driven token by
//! token with the encoder output as cross-attention input. Decoding is greedy
//! with the length and n-gram constraints from the model config.

use crate::pipelines::decoding::{argmax, banned_ngram_tokens, mask_tokens, top_k_sample};
use crate::pipelines::session::{self, SharedSession};
use crate::pipelines::{
    HfModelConfig, ModelSource, SummarizationParams, Summarizer, SummaryOutput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, Array3, IxDyn};
use ort::value::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// BART encoder position limit
pub const MAX_INPUT_LENGTH: usize = 1024;

/// Token ids that steer decoding, resolved from config.json
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderTokens {
    pub decoder_start: u32,
    pub eos: u32,
    pub forced_bos: Option<u32>,
    pub no_repeat_ngram_size: usize,
}

impl DecoderTokens {
    /// BART defaults: `</s>` (2) starts and ends decoding, `<s>` (0) is forced first
    pub fn from_config(config: &HfModelConfig) -> Self {
        let eos = config.eos_token_id.unwrap_or(2);
        Self {
            decoder_start: config.decoder_start_token_id.unwrap_or(eos),
            eos,
            forced_bos: config.forced_bos_token_id,
            no_repeat_ngram_size: config.no_repeat_ngram_size.unwrap_or(0),
        }
    }
}

/// Applies the per-step constraints to raw logits
///
/// `generated` includes the decoder start token, matching how length limits
/// are counted.
pub fn constrain_logits(
    logits: &mut [f32],
    generated: &[u32],
    tokens: &DecoderTokens,
    params: &SummarizationParams,
) {
    let step = generated.len();

    // Force the first real token, then always finish at max_length
    if let Some(forced) = tokens.forced_bos.filter(|_| step == 1) {
        force_token(logits, forced);
        return;
    }
    if step + 1 >= params.max_length {
        force_token(logits, tokens.eos);
        return;
    }

    if step < params.min_length {
        mask_tokens(logits, [tokens.eos]);
    }
    if tokens.no_repeat_ngram_size > 0 {
        mask_tokens(
            logits,
            banned_ngram_tokens(generated, tokens.no_repeat_ngram_size),
        );
    }
}

fn force_token(logits: &mut [f32], token: u32) {
    for (i, l) in logits.iter_mut().enumerate() {
        if i != token as usize {
            *l = f32::NEG_INFINITY;
        }
    }
}

#[derive(Clone)]
pub struct OnnxSummarizer {
    encoder: SharedSession,
    decoder: SharedSession,
    tokenizer: Arc<Tokenizer>,
    tokens: DecoderTokens,
    model_name: String,
}

impl std::fmt::Debug for OnnxSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSummarizer")
            .field("model_name", &self.model_name)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl OnnxSummarizer {
    /// Loads `encoder_model.onnx`, `decoder_model.onnx`, `tokenizer.json`
    /// and `config.json` from `source`
    pub fn load(
        model_name: impl Into<String>,
        source: &ModelSource,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();

        let encoder_path = source.resolve("encoder_model.onnx")?;
        let decoder_path = source.resolve("decoder_model.onnx")?;
        let tokenizer_path = source.resolve("tokenizer.json")?;
        let config_path = source.resolve("config.json")?;

        let config = HfModelConfig::from_file(&config_path)?;
        let tokenizer = session::load_tokenizer(&tokenizer_path, MAX_INPUT_LENGTH)?;
        let encoder = session::load_session(&encoder_path, intra_threads)?;
        let decoder = session::load_session(&decoder_path, intra_threads)?;
        let tokens = DecoderTokens::from_config(&config);

        info!(
            "✅ Summarizer {} loaded (decoder_start={}, eos={}, no_repeat_ngram={})",
            model_name, tokens.decoder_start, tokens.eos, tokens.no_repeat_ngram_size
        );

        Ok(Self {
            encoder: Arc::new(Mutex::new(encoder)),
            decoder: Arc::new(Mutex::new(decoder)),
            tokenizer: Arc::new(tokenizer),
            tokens,
            model_name,
        })
    }

    /// Runs the encoder, returning `last_hidden_state` as `[1, seq, hidden]`
    fn encode(&self, input_ids: &Array2<i64>, attention_mask: &Array2<i64>) -> Result<Array3<f32>> {
        let mut encoder = session::lock(&self.encoder)?;
        let outputs = encoder
            .run(ort::inputs![
                "input_ids" => Tensor::from_array(input_ids.clone())?,
                "attention_mask" => Tensor::from_array(attention_mask.clone())?
            ])
            .context("Encoder inference failed")?;

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder hidden states")?;

        let shape = hidden.shape().to_vec();
        if shape.len() != 3 {
            anyhow::bail!(
                "Unexpected encoder output shape {:?} (expected [batch, seq_len, hidden])",
                shape
            );
        }

        hidden
            .to_owned()
            .into_shape_with_order((shape[0], shape[1], shape[2]))
            .context("Failed to reshape encoder hidden states")
    }

    /// Decoder logits for the next position
    fn decode_step(
        &self,
        generated: &[u32],
        encoder_hidden: &Array3<f32>,
        encoder_mask: &Array2<i64>,
    ) -> Result<Vec<f32>> {
        let decoder_ids = session::row_tensor(generated)?;

        let mut decoder = session::lock(&self.decoder)?;
        let outputs = decoder
            .run(ort::inputs![
                "input_ids" => Tensor::from_array(decoder_ids)?,
                "encoder_attention_mask" => Tensor::from_array(encoder_mask.clone())?,
                "encoder_hidden_states" => Tensor::from_array(encoder_hidden.clone())?
            ])
            .context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract decoder logits")?;

        let shape = logits.shape();
        if shape.len() != 3 {
            anyhow::bail!(
                "Unexpected decoder logits shape {:?} (expected [batch, seq_len, vocab])",
                shape
            );
        }
        let (last_pos, vocab_size) = (shape[1] - 1, shape[2]);

        Ok((0..vocab_size)
            .map(|v| logits[IxDyn(&[0, last_pos, v])])
            .collect())
    }

    pub fn summarize_blocking(
        &self,
        text: &str,
        params: &SummarizationParams,
    ) -> Result<SummaryOutput> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids = session::row_tensor(encoding.get_ids())?;
        let attention_mask = session::row_tensor(encoding.get_attention_mask())?;

        let encoder_hidden = self.encode(&input_ids, &attention_mask)?;
        debug!("Encoder hidden states: {:?}", encoder_hidden.shape());

        let mut rng = StdRng::from_entropy();
        let generated = decode_summary(&self.tokens, params, &mut rng, |generated| {
            self.decode_step(generated, &encoder_hidden, &attention_mask)
        })?;

        debug!("Summary decoded in {} tokens", generated.len());

        Ok(SummaryOutput {
            summary_text: summary_text(&self.tokenizer, &generated)?,
        })
    }
}

/// Decoder loop from the start token to EOS or `params.max_length`
///
/// `step` returns raw logits for the next position given the tokens so far.
/// The returned ids begin with the decoder start token and end with EOS,
/// which is always emitted because it is forced at `max_length`.
pub fn decode_summary<R, F>(
    tokens: &DecoderTokens,
    params: &SummarizationParams,
    rng: &mut R,
    mut step: F,
) -> Result<Vec<u32>>
where
    R: Rng + ?Sized,
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
{
    let mut generated = vec![tokens.decoder_start];

    while generated.len() < params.max_length {
        let mut logits = step(&generated)?;
        constrain_logits(&mut logits, &generated, tokens, params);

        let index = if params.do_sample {
            top_k_sample(&logits, 0, 1.0, rng)?
        } else {
            argmax(&logits)?
        };
        let next = index as u32;

        generated.push(next);
        if next == tokens.eos {
            break;
        }
    }

    Ok(generated)
}

/// Decoded summary without special tokens or surrounding whitespace
pub fn summary_text(tokenizer: &Tokenizer, ids: &[u32]) -> Result<String> {
    let text = tokenizer
        .decode(ids, true)
        .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;
    Ok(text.trim().to_string())
}

#[async_trait]
impl Summarizer for OnnxSummarizer {
    async fn summarize(&self, text: &str, params: &SummarizationParams) -> Result<SummaryOutput> {
        let this = self.clone();
        let text = text.to_string();
        let params = *params;
        tokio::task::spawn_blocking(move || this.summarize_blocking(&text, &params))
            .await
            .context("Summarization task panicked")?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
