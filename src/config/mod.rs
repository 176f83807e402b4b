// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod service;

pub use service::{PipelineDefaults, ServiceConfig, DEFAULT_PIPELINES};
