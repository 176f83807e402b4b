// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Per-step logit constraints of the summarization decoder

use text_analysis_api::pipelines::decoding::argmax;
use text_analysis_api::pipelines::summarization::{constrain_logits, DecoderTokens};
use text_analysis_api::pipelines::{HfModelConfig, SummarizationParams};

const VOCAB: usize = 16;

fn bart_tokens() -> DecoderTokens {
    let config: HfModelConfig = serde_json::from_str(
        r#"{
            "model_type": "bart",
            "bos_token_id": 0,
            "eos_token_id": 2,
            "decoder_start_token_id": 2,
            "forced_bos_token_id": 0,
            "no_repeat_ngram_size": 3
        }"#,
    )
    .unwrap();
    DecoderTokens::from_config(&config)
}

fn params(min_length: usize, max_length: usize) -> SummarizationParams {
    SummarizationParams {
        max_length,
        min_length,
        do_sample: false,
    }
}

/// Logits where EOS is the most likely token
fn eos_favoured() -> Vec<f32> {
    let mut logits = vec![0.0; VOCAB];
    logits[2] = 10.0;
    logits[5] = 1.0;
    logits
}

#[test]
fn test_tokens_from_bart_config() {
    let tokens = bart_tokens();
    assert_eq!(tokens.decoder_start, 2);
    assert_eq!(tokens.eos, 2);
    assert_eq!(tokens.forced_bos, Some(0));
    assert_eq!(tokens.no_repeat_ngram_size, 3);
}

#[test]
fn test_tokens_defaults() {
    let tokens = DecoderTokens::from_config(&HfModelConfig::default());
    assert_eq!(tokens.eos, 2);
    assert_eq!(tokens.decoder_start, 2);
    assert_eq!(tokens.forced_bos, None);
    assert_eq!(tokens.no_repeat_ngram_size, 0);
}

#[test]
fn test_first_step_forces_bos() {
    let mut logits = eos_favoured();
    constrain_logits(&mut logits, &[2], &bart_tokens(), &params(30, 130));
    assert_eq!(argmax(&logits).unwrap(), 0);
}

#[test]
fn test_eos_blocked_below_min_length() {
    let mut logits = eos_favoured();
    constrain_logits(&mut logits, &[2, 0, 7, 8], &bart_tokens(), &params(30, 130));

    assert_eq!(logits[2], f32::NEG_INFINITY);
    assert_eq!(argmax(&logits).unwrap(), 5);
}

#[test]
fn test_eos_allowed_after_min_length() {
    let generated: Vec<u32> = std::iter::once(2).chain(3..13).collect();
    let mut logits = eos_favoured();
    constrain_logits(&mut logits, &generated, &bart_tokens(), &params(5, 130));

    assert_eq!(argmax(&logits).unwrap(), 2);
}

#[test]
fn test_eos_forced_at_max_length() {
    let generated: Vec<u32> = std::iter::once(2).chain(3..12).collect();
    let mut logits = vec![0.0; VOCAB];
    logits[9] = 50.0;
    constrain_logits(&mut logits, &generated, &bart_tokens(), &params(0, 11));

    assert_eq!(argmax(&logits).unwrap(), 2);
}

#[test]
fn test_repeated_trigram_is_masked() {
    // ... 7 8 9 ... 7 8 -> 9 would repeat "7 8 9"
    let generated = [2, 0, 7, 8, 9, 4, 7, 8];
    let mut logits = vec![0.0; VOCAB];
    logits[9] = 10.0;
    logits[4] = 5.0;
    constrain_logits(&mut logits, &generated, &bart_tokens(), &params(0, 130));

    assert_eq!(logits[9], f32::NEG_INFINITY);
    assert_eq!(argmax(&logits).unwrap(), 4);
}
