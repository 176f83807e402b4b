// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime session and tokenizer loading helpers

use anyhow::{Context, Result};
use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Shared, lockable ONNX session
pub type SharedSession = Arc<Mutex<Session>>;

/// Loads an ONNX graph on the CPU execution provider
pub fn load_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    if !model_path.exists() {
        anyhow::bail!("ONNX model file not found: {}", model_path.display());
    }

    info!("Loading ONNX model from {}", model_path.display());

    let session = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load ONNX model from {}",
            model_path.display()
        ))?;

    let input_names = input_names(&session);
    debug!("Model inputs for {}: {:?}", model_path.display(), input_names);

    Ok(session)
}

/// Loads `tokenizer.json`, truncating encodings to `max_length` tokens
pub fn load_tokenizer(tokenizer_path: &Path, max_length: usize) -> Result<Tokenizer> {
    if !tokenizer_path.exists() {
        anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
    }

    let mut tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
    // Single sequences only; the pipelines never batch
    tokenizer.with_padding(None);

    Ok(tokenizer)
}

pub fn input_names(session: &Session) -> Vec<String> {
    session.inputs.iter().map(|i| i.name.clone()).collect()
}

pub fn has_input(session: &Session, name: &str) -> bool {
    session.inputs.iter().any(|i| i.name == name)
}

/// Locks a session, turning a poisoned mutex into an error
pub fn lock(session: &SharedSession) -> Result<MutexGuard<'_, Session>> {
    session
        .lock()
        .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))
}

/// Builds a `[1, len]` i64 tensor from token ids
pub fn row_tensor<T: Copy + Into<i64>>(values: &[T]) -> Result<Array2<i64>> {
    let data: Vec<i64> = values.iter().map(|&v| v.into()).collect();
    Array2::from_shape_vec((1, data.len()), data).context("Failed to create input tensor")
}
