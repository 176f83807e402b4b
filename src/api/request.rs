// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request types shared by all POST endpoints

use crate::api::ApiError;
use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};

/// Request body for `/sentiment`, `/generate`, `/classify` and `/summarize`
///
/// # Example
/// ```json
/// { "text": "I love this product!" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextInput {
    pub text: String,
}

impl TextInput {
    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// JSON extractor whose rejections render as [`ApiError`] bodies
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
