// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use text_analysis_api::{
    api::{start_server, AppState},
    cli::Cli,
    config::ServiceConfig,
    pipelines::PipelineManager,
    version,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("🚀 Starting {}", version::get_version_string());
    info!("📦 BUILD VERSION: {}", version::VERSION);

    let mut config = ServiceConfig::from_env();
    cli.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    info!("🧠 Loading text pipelines (threads per session: {})", config.models.intra_threads);
    let pipelines = PipelineManager::load(&config.models)
        .await
        .context("Cannot start without the sentiment analysis model")?;

    for model in pipelines.list_models() {
        if model.available {
            info!("   ✓ {:<15} {}", model.task.as_str(), model.name);
        } else {
            warn!("   ✗ {:<15} {} (unavailable)", model.task.as_str(), model.name);
        }
    }

    let state = AppState::new(Arc::new(pipelines), config.summarization)
        .with_max_body_bytes(config.max_body_bytes);
    start_server(config.listen_addr(), state).await
}
