// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::ServiceConfig;

/// Text Analysis API server
///
/// Flags override the matching environment variables.
#[derive(Parser, Debug, Default)]
#[command(name = "text-analysis-api")]
#[command(version)]
#[command(about = "HTTP API for sentiment analysis, text generation, summarization and classification", long_about = None)]
pub struct Cli {
    /// Address to bind (overrides API_HOST)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides API_PORT)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Directory holding one sub-directory per pipeline (overrides MODELS_DIR)
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Never download missing model files from the HuggingFace Hub
    #[arg(long)]
    pub no_download: bool,
}

impl Cli {
    /// Applies command line overrides on top of `config`
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.models_dir {
            config.set_models_dir(dir.clone());
        }
        if self.no_download {
            config.disable_downloads();
        }
    }
}
