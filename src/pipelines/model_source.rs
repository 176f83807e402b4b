// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Locating model files on disk or on the HuggingFace Hub

use anyhow::{Context, Result};
use hf_hub::api::sync::Api;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where a pipeline's files come from
///
/// Local files win. The hub repository is only contacted when a required file
/// is missing from `local_dir` and downloading is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub local_dir: PathBuf,
    pub hub_repo: Option<String>,
    pub allow_download: bool,
}

impl ModelSource {
    pub fn local<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            local_dir: dir.into(),
            hub_repo: None,
            allow_download: false,
        }
    }

    pub fn with_hub_repo(mut self, repo: impl Into<String>) -> Self {
        self.hub_repo = Some(repo.into());
        self.allow_download = true;
        self
    }

    /// Resolves one file, e.g. `model.onnx` or `tokenizer.json`
    ///
    /// ONNX graphs are looked up both at the directory root and under `onnx/`,
    /// which is how exported hub repositories lay them out.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        if let Some(path) = self.find_local(file_name) {
            return Ok(path);
        }

        let repo = match (&self.hub_repo, self.allow_download) {
            (Some(repo), true) => repo,
            _ => anyhow::bail!(
                "Model file {} not found in {}",
                file_name,
                self.local_dir.display()
            ),
        };

        let remote_name = remote_file_name(file_name);
        info!("Downloading {} from {}", remote_name, repo);

        let api = Api::new().context("Failed to initialise HuggingFace Hub client")?;
        api.model(repo.clone())
            .get(&remote_name)
            .with_context(|| format!("Failed to download {} from {}", remote_name, repo))
    }

    fn find_local(&self, file_name: &str) -> Option<PathBuf> {
        candidates(&self.local_dir, file_name)
            .into_iter()
            .find(|p| p.exists())
    }
}

fn is_onnx(file_name: &str) -> bool {
    file_name.ends_with(".onnx")
}

fn candidates(dir: &Path, file_name: &str) -> Vec<PathBuf> {
    let mut paths = vec![dir.join(file_name)];
    if is_onnx(file_name) {
        paths.push(dir.join("onnx").join(file_name));
    }
    paths
}

fn remote_file_name(file_name: &str) -> String {
    if is_onnx(file_name) {
        format!("onnx/{}", file_name)
    } else {
        file_name.to_string()
    }
}
