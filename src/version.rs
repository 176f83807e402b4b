// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the text analysis API

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-onnx-pipelines-2025-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-10-18";

/// Endpoints served by this version
pub const FEATURES: &[&str] = &[
    "sentiment",
    "generate",
    "summarize",
    "classify",
    "health",
    "models",
    "openapi",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Text Analysis API {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for the OpenAPI document
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
