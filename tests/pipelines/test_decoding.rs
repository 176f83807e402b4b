// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sampling and n-gram helpers used by the decoders

use rand::rngs::StdRng;
use rand::SeedableRng;
use text_analysis_api::pipelines::decoding::{
    argmax, banned_ngram_tokens, mask_tokens, softmax, top_k_sample,
};

#[test]
fn test_softmax_is_a_distribution() {
    let probs = softmax(&[1.0, 2.0, 3.0, -1.0]);
    let sum: f32 = probs.iter().sum();

    assert!((sum - 1.0).abs() < 1e-5);
    assert_eq!(argmax(&probs).unwrap(), 2);
}

#[test]
fn test_softmax_handles_large_logits() {
    let probs = softmax(&[1000.0, 1000.0]);
    assert!((probs[0] - 0.5).abs() < 1e-6);
    assert!(probs.iter().all(|p| p.is_finite()));
}

#[test]
fn test_top_k_one_is_greedy() {
    let mut rng = StdRng::seed_from_u64(7);
    let logits = [0.1, 4.0, 3.9, -2.0];

    for _ in 0..20 {
        assert_eq!(top_k_sample(&logits, 1, 1.0, &mut rng).unwrap(), 1);
    }
}

#[test]
fn test_top_k_stays_within_k_best() {
    let mut rng = StdRng::seed_from_u64(42);
    let logits = [5.0, 4.9, 4.8, -10.0, -10.0, -10.0];

    for _ in 0..200 {
        let token = top_k_sample(&logits, 3, 1.0, &mut rng).unwrap();
        assert!(token < 3, "sampled {} outside the top 3", token);
    }
}

#[test]
fn test_top_k_same_seed_same_tokens() {
    let logits: Vec<f32> = (0..100).map(|i| (i % 7) as f32).collect();
    let draw = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..10)
            .map(|_| top_k_sample(&logits, 50, 1.0, &mut rng).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(draw(3), draw(3));
}

#[test]
fn test_masked_tokens_are_never_sampled() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut logits = vec![1.0; 10];
    mask_tokens(&mut logits, [0, 1, 2, 3, 4]);

    for _ in 0..100 {
        assert!(top_k_sample(&logits, 0, 1.0, &mut rng).unwrap() >= 5);
    }
}

#[test]
fn test_everything_masked_is_an_error() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut logits = vec![0.0; 4];
    mask_tokens(&mut logits, 0..4u32);

    assert!(top_k_sample(&logits, 2, 1.0, &mut rng).is_err());
}

#[test]
fn test_banned_ngrams_trigram() {
    // "a b c a b" -> next "c" would repeat the trigram "a b c"
    let tokens = [1, 2, 3, 1, 2];
    let banned = banned_ngram_tokens(&tokens, 3);

    assert_eq!(banned.len(), 1);
    assert!(banned.contains(&3));
}

#[test]
fn test_banned_ngrams_short_history() {
    assert!(banned_ngram_tokens(&[1], 3).is_empty());
    assert!(banned_ngram_tokens(&[1, 2, 3], 0).is_empty());
}
