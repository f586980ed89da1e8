// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.
//!
//! None of these ever reach a permission query: lookups are total and fail
//! closed. They surface from the decoding, source and settings layers so
//! callers that drive those layers directly can react.

use std::path::PathBuf;
use thiserror::Error;

/// Payload could not be turned into a [`SamplingConfig`](crate::SamplingConfig).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty configuration payload")]
    Empty,

    #[error("malformed configuration payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Source layer errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no source backend for descriptor '{0}'")]
    Unresolved(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn polling thread: {0}")]
    Spawn(std::io::Error),
}

/// Settings file errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}
