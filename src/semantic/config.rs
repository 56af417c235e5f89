// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Static configuration snapshot consumed by the style registry.
//!
//! The snapshot is read once when an editor opens; changes made afterwards
//! are not picked up by an existing registry.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::semantic::error::ConfigError;

/// Default bound on waiting for the reconciliation permit.
pub const DEFAULT_GATE_TIMEOUT_MS: u64 = 5_000;

/// User-facing settings for one highlight category.
///
/// Every attribute is optional; unset attributes are inherited through the
/// kind's fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSetting {
    /// Foreground color as `"r,g,b"` or `"#rrggbb"`
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    /// Whether this entry takes part in style resolution at all
    pub enabled: Option<bool>,
}

impl StyleSetting {
    /// Returns false if the entry was explicitly disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Configuration snapshot for one editor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// How long a pass waits for the reconciliation permit
    pub gate_timeout_ms: u64,
    /// Style settings keyed by category key (`"static-field"`, `"regex"`, ...)
    pub styles: BTreeMap<String, StyleSetting>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            gate_timeout_ms: DEFAULT_GATE_TIMEOUT_MS,
            styles: BTreeMap::new(),
        }
    }
}

impl StyleConfig {
    /// Parses a TOML configuration snapshot.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Returns the permit acquisition bound.
    pub fn gate_timeout(&self) -> Duration {
        Duration::from_millis(self.gate_timeout_ms)
    }

    /// Adds or replaces the setting for one key.
    pub fn with_style(mut self, key: impl Into<String>, setting: StyleSetting) -> Self {
        self.styles.insert(key.into(), setting);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_snapshot() {
        let config = StyleConfig::from_toml_str(
            r##"
            gate_timeout_ms = 250

            [styles.static-field]
            color = "#800080"
            italic = true

            [styles.field]
            color = "0,0,192"
            enabled = false
            "##,
        )
        .unwrap();

        assert_eq!(config.gate_timeout(), Duration::from_millis(250));
        let static_field = &config.styles["static-field"];
        assert_eq!(static_field.color.as_deref(), Some("#800080"));
        assert_eq!(static_field.italic, Some(true));
        assert_eq!(static_field.bold, None);
        assert!(static_field.is_enabled());
        assert!(!config.styles["field"].is_enabled());
    }

    #[test]
    fn test_empty_snapshot_uses_defaults() {
        let config = StyleConfig::from_toml_str("").unwrap();
        assert_eq!(config, StyleConfig::default());
        assert_eq!(config.gate_timeout_ms, DEFAULT_GATE_TIMEOUT_MS);
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let err = StyleConfig::from_toml_str("[styles.field\ncolor = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
