// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::api::docs::{openapi_handler, swagger_ui_handler, OPENAPI_PATH};
use crate::api::handlers::{
    classify_handler, generate_handler, health_handler, models_handler, not_found_handler,
    root_handler, sentiment_handler, summarize_handler,
};
use crate::pipelines::{PipelineManager, SummarizationParams};

/// Request bodies above this size are rejected with 413
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppState {
    pub pipelines: Arc<PipelineManager>,
    /// Length limits applied to every `/summarize` call
    pub summarization: SummarizationParams,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipelines: Arc<PipelineManager>, summarization: SummarizationParams) -> Self {
        Self {
            pipelines,
            summarization,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/sentiment", post(sentiment_handler))
        .route("/generate", post(generate_handler))
        .route("/classify", post(classify_handler))
        .route("/summarize", post(summarize_handler))
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .route(OPENAPI_PATH, get(openapi_handler))
        .route("/docs", get(swagger_ui_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API until Ctrl-C or SIGTERM
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    info!("🌐 API server listening on http://{}", addr);
    info!("   Docs available at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received, draining connections...");
}
