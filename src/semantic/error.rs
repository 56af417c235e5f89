// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for the semantic highlighting engine.

use std::time::Duration;

/// Errors raised while reading a style configuration snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse style configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid color {value:?} for style {key:?}")]
    InvalidColor { key: String, value: String },
}

/// Errors reported by a resolved-reference provider while traversing a unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("compilation unit is not available")]
    UnitUnavailable,

    #[error("type resolution failed: {0}")]
    Resolution(String),
}

/// Failure of the synchronization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("timed out after {0:?} waiting for the highlighting permit")]
    Timeout(Duration),
}

/// A reconciliation pass that was aborted by an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HighlightError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("panic during highlighting pass: {0}")]
    Panicked(String),
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, HighlightError>;
