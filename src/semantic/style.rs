// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Maps highlight categories to display styles.
//!
//! The registry starts from a built-in theme, overlays the configuration
//! snapshot attribute by attribute and then resolves every category through
//! its fallback chain exactly once. Lookups after construction are read-only,
//! so one registry can be shared between the worker and the UI thread.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::semantic::config::{StyleConfig, StyleSetting};
use crate::semantic::error::ConfigError;
use crate::semantic::kind::HighlightKind;
use crate::semantic::position::Modifier;

static RGB_TRIPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*$").unwrap());
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})\s*$").unwrap());

/// An RGB foreground color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `"r,g,b"` or `"#rrggbb"`.
    pub fn parse(value: &str) -> Option<Color> {
        if let Some(caps) = RGB_TRIPLE.captures(value) {
            let r = caps[1].parse().ok()?;
            let g = caps[2].parse().ok()?;
            let b = caps[3].parse().ok()?;
            return Some(Color::rgb(r, g, b));
        }
        if let Some(caps) = HEX_COLOR.captures(value) {
            let r = u8::from_str_radix(&caps[1], 16).ok()?;
            let g = u8::from_str_radix(&caps[2], 16).ok()?;
            let b = u8::from_str_radix(&caps[3], 16).ok()?;
            return Some(Color::rgb(r, g, b));
        }
        None
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A fully resolved, immutable display style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub foreground: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl Style {
    /// Combines a modifier style into this one.
    ///
    /// The foreground stays with the primary style; the text attributes of
    /// both are OR-ed together.
    pub fn with_modifier(self, modifier: Style) -> Style {
        Style {
            foreground: self.foreground,
            bold: self.bold || modifier.bold,
            italic: self.italic || modifier.italic,
            underline: self.underline || modifier.underline,
            strikethrough: self.strikethrough || modifier.strikethrough,
        }
    }
}

/// A style with possibly unset attributes, as configured for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PartialStyle {
    foreground: Option<Color>,
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    strikethrough: Option<bool>,
}

impl PartialStyle {
    const fn color(r: u8, g: u8, b: u8) -> Self {
        Self {
            foreground: Some(Color::rgb(r, g, b)),
            bold: None,
            italic: None,
            underline: None,
            strikethrough: None,
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    const fn italic(mut self) -> Self {
        self.italic = Some(true);
        self
    }

    fn from_setting(key: &str, setting: &StyleSetting) -> Self {
        let foreground = setting.color.as_deref().and_then(|value| match parse_color(key, value) {
            Ok(color) => Some(color),
            Err(err) => {
                tracing::warn!(%err, "ignoring style color");
                None
            }
        });
        Self {
            foreground,
            bold: setting.bold,
            italic: setting.italic,
            underline: setting.underline,
            strikethrough: setting.strikethrough,
        }
    }

    /// Attributes set in `other` win over attributes set in `self`.
    fn overlay(self, other: PartialStyle) -> PartialStyle {
        PartialStyle {
            foreground: other.foreground.or(self.foreground),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strikethrough: other.strikethrough.or(self.strikethrough),
        }
    }

    /// Fills attributes still unset in `self` from a less specific entry.
    fn inherit(self, parent: PartialStyle) -> PartialStyle {
        parent.overlay(self)
    }

    fn finish(self) -> Style {
        Style {
            foreground: self.foreground.unwrap_or(Color::BLACK),
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            underline: self.underline.unwrap_or(false),
            strikethrough: self.strikethrough.unwrap_or(false),
        }
    }
}

fn parse_color(key: &str, value: &str) -> Result<Color, ConfigError> {
    Color::parse(value).ok_or_else(|| ConfigError::InvalidColor {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Immutable mapping from every highlight category to its display style.
///
/// Built once per editor session and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: HashMap<HighlightKind, Style>,
    gate_timeout: Duration,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new(&StyleConfig::default())
    }
}

impl StyleRegistry {
    /// Builds a registry from a configuration snapshot.
    ///
    /// Unknown keys and unparseable colors are logged and ignored; they never
    /// prevent the registry from being built.
    pub fn new(config: &StyleConfig) -> Self {
        let mut entries = default_theme();

        for (key, setting) in &config.styles {
            let Some(kind) = HighlightKind::from_key(key) else {
                tracing::warn!(key = %key, "ignoring unknown style key");
                continue;
            };
            if !setting.is_enabled() {
                entries.remove(&kind);
                continue;
            }
            let configured = PartialStyle::from_setting(key, setting);
            let merged = entries.get(&kind).copied().unwrap_or_default().overlay(configured);
            entries.insert(kind, merged);
        }

        let styles = HighlightKind::ALL
            .iter()
            .map(|&kind| (kind, resolve(&entries, kind)))
            .collect();

        Self {
            styles,
            gate_timeout: config.gate_timeout(),
        }
    }

    /// Gets the style for a category. Never fails: every category resolves
    /// through its fallback chain to the terminal default.
    pub fn style(&self, kind: HighlightKind) -> Style {
        self.styles.get(&kind).copied().unwrap_or_default()
    }

    /// Gets the rendered style of a primary category combined with an
    /// optional modifier.
    pub fn rendered_style(&self, kind: HighlightKind, modifier: Option<Modifier>) -> Style {
        let style = self.style(kind);
        match modifier {
            Some(modifier) => style.with_modifier(self.style(modifier.kind())),
            None => style,
        }
    }

    /// Returns how long a pass may wait for the reconciliation permit.
    pub fn gate_timeout(&self) -> Duration {
        self.gate_timeout
    }
}

fn resolve(entries: &HashMap<HighlightKind, PartialStyle>, kind: HighlightKind) -> Style {
    kind.fallback_chain()
        .filter_map(|link| entries.get(&link).copied())
        .fold(PartialStyle::default(), PartialStyle::inherit)
        .finish()
}

fn default_theme() -> HashMap<HighlightKind, PartialStyle> {
    use HighlightKind as K;

    let underline = PartialStyle {
        underline: Some(true),
        ..PartialStyle::default()
    };
    let strikethrough = PartialStyle {
        strikethrough: Some(true),
        ..PartialStyle::default()
    };

    HashMap::from([
        (K::Default, PartialStyle::color(0, 0, 0)),
        (K::Comment, PartialStyle::color(63, 127, 95)),
        (K::Keyword, PartialStyle::color(127, 0, 85).bold()),
        (K::Number, PartialStyle::color(205, 50, 0)),
        (K::String, PartialStyle::color(42, 0, 255)),
        (K::Regex, PartialStyle::color(217, 122, 0)),
        (K::MapKey, PartialStyle::color(0, 96, 96)),
        (K::Method, PartialStyle::color(0, 0, 0).bold()),
        (K::StaticMethod, PartialStyle::default().italic()),
        (K::MethodCall, PartialStyle::color(60, 60, 130)),
        (K::StaticCall, PartialStyle::default().italic()),
        (K::DynamicCall, PartialStyle::color(0, 120, 0)),
        (K::Class, PartialStyle::color(0, 80, 50)),
        (K::AbstractClass, PartialStyle::default().italic()),
        (K::Interface, PartialStyle::color(50, 63, 112)),
        (K::Annotation, PartialStyle::color(100, 100, 100)),
        (K::Enum, PartialStyle::color(100, 70, 50)),
        (K::TypePlaceholder, PartialStyle::color(100, 50, 150).bold()),
        (K::Field, PartialStyle::color(0, 0, 192)),
        (K::StaticField, PartialStyle::default().italic()),
        (K::StaticFinalValue, PartialStyle::default().bold()),
        (K::LocalVariable, PartialStyle::color(106, 62, 62)),
        (K::Deprecated, strikethrough),
        (K::Unknown, underline),
    ])
}
