// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod docs;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod request;
pub mod response;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_app, start_server, AppState, DEFAULT_MAX_BODY_BYTES};
pub use request::{ApiJson, TextInput};
pub use response::{
    ClassifyResponse, GenerateResponse, HealthResponse, ModelsResponse, RootResponse,
    SentimentResponse, SummarizeResponse,
};
