// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Logit post-processing shared by the generation and summarization pipelines
//!
//! Everything here is pure math over `f32` slices so it can be tested and
//! benchmarked without model files.

use anyhow::Result;
use rand::Rng;
use std::collections::HashSet;

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Element-wise logistic function
pub fn sigmoid(logits: &[f32]) -> Vec<f32> {
    logits.iter().map(|&l| 1.0 / (1.0 + (-l).exp())).collect()
}

/// Index of the largest value, ignoring NaNs
pub fn argmax(values: &[f32]) -> Result<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .ok_or_else(|| anyhow::anyhow!("Empty logits vector"))
}

/// Samples a token id from the `k` highest logits after temperature scaling
///
/// `k == 0` samples from the full distribution.
pub fn top_k_sample<R: Rng + ?Sized>(
    logits: &[f32],
    k: usize,
    temperature: f32,
    rng: &mut R,
) -> Result<usize> {
    if logits.is_empty() {
        anyhow::bail!("Empty logits vector");
    }
    if temperature <= 0.0 {
        return argmax(logits);
    }

    let mut indexed: Vec<(usize, f32)> = logits
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_finite())
        .map(|(i, &l)| (i, l / temperature))
        .collect();

    if indexed.is_empty() {
        anyhow::bail!("All logits are masked");
    }

    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    if k > 0 && indexed.len() > k {
        indexed.truncate(k);
    }

    let scaled: Vec<f32> = indexed.iter().map(|(_, l)| *l).collect();
    let probs = softmax(&scaled);

    let draw: f32 = rng.gen();
    let mut cumulative = 0.0f32;
    for (pos, p) in probs.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return Ok(indexed[pos].0);
        }
    }

    // Rounding can leave the cumulative sum just under 1.0
    Ok(indexed[indexed.len() - 1].0)
}

/// Tokens that would complete an n-gram already present in `tokens`
pub fn banned_ngram_tokens(tokens: &[u32], ngram_size: usize) -> HashSet<u32> {
    let mut banned = HashSet::new();
    if ngram_size == 0 || tokens.len() + 1 < ngram_size {
        return banned;
    }

    let prefix_len = ngram_size - 1;
    let current_prefix = &tokens[tokens.len() - prefix_len..];

    for window in tokens.windows(ngram_size) {
        if &window[..prefix_len] == current_prefix {
            banned.insert(window[prefix_len]);
        }
    }

    banned
}

/// Sets the given token ids to negative infinity
pub fn mask_tokens(logits: &mut [f32], tokens: impl IntoIterator<Item = u32>) {
    for token in tokens {
        if let Some(l) = logits.get_mut(token as usize) {
            *l = f32::NEG_INFINITY;
        }
    }
}
