// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Highlight categories produced by semantic classification.
//!
//! The category set is closed. Each kind has a stable configuration key, a
//! fixed parent in the style fallback chain and an ordinal that is used as the
//! tie-break when two positions start at the same offset.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// The closed set of semantic highlight categories.
///
/// Declaration order is significant: the derived `Ord` is the ordinal used to
/// order positions sharing an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HighlightKind {
    // Lexical-ish categories
    Comment,
    Default,
    Keyword,
    ReservedWord,
    Number,
    String,
    Regex,
    MapKey,
    TagKey,

    // Declarations and calls
    Constructor,
    Method,
    StaticMethod,
    ConstructorCall,
    DynamicCall,
    MethodCall,
    StaticCall,

    // Types
    Class,
    AbstractClass,
    Interface,
    Trait,
    Annotation,
    Enum,
    TypePlaceholder,

    // Members and variables
    Field,
    StaticField,
    StaticFinalValue,
    Parameter,
    LocalVariable,

    // Cross-cutting modifiers
    Deprecated,
    Unknown,
}

impl HighlightKind {
    /// Every kind, in ordinal order.
    pub const ALL: [HighlightKind; 30] = [
        HighlightKind::Comment,
        HighlightKind::Default,
        HighlightKind::Keyword,
        HighlightKind::ReservedWord,
        HighlightKind::Number,
        HighlightKind::String,
        HighlightKind::Regex,
        HighlightKind::MapKey,
        HighlightKind::TagKey,
        HighlightKind::Constructor,
        HighlightKind::Method,
        HighlightKind::StaticMethod,
        HighlightKind::ConstructorCall,
        HighlightKind::DynamicCall,
        HighlightKind::MethodCall,
        HighlightKind::StaticCall,
        HighlightKind::Class,
        HighlightKind::AbstractClass,
        HighlightKind::Interface,
        HighlightKind::Trait,
        HighlightKind::Annotation,
        HighlightKind::Enum,
        HighlightKind::TypePlaceholder,
        HighlightKind::Field,
        HighlightKind::StaticField,
        HighlightKind::StaticFinalValue,
        HighlightKind::Parameter,
        HighlightKind::LocalVariable,
        HighlightKind::Deprecated,
        HighlightKind::Unknown,
    ];

    /// Returns the configuration key for this kind.
    pub fn key(self) -> &'static str {
        match self {
            HighlightKind::Comment => "comment",
            HighlightKind::Default => "default",
            HighlightKind::Keyword => "keyword",
            HighlightKind::ReservedWord => "reserved-word",
            HighlightKind::Number => "number",
            HighlightKind::String => "string",
            HighlightKind::Regex => "regex",
            HighlightKind::MapKey => "map-key",
            HighlightKind::TagKey => "tag-key",
            HighlightKind::Constructor => "constructor",
            HighlightKind::Method => "method",
            HighlightKind::StaticMethod => "static-method",
            HighlightKind::ConstructorCall => "constructor-call",
            HighlightKind::DynamicCall => "dynamic-call",
            HighlightKind::MethodCall => "method-call",
            HighlightKind::StaticCall => "static-call",
            HighlightKind::Class => "class",
            HighlightKind::AbstractClass => "abstract-class",
            HighlightKind::Interface => "interface",
            HighlightKind::Trait => "trait",
            HighlightKind::Annotation => "annotation",
            HighlightKind::Enum => "enum",
            HighlightKind::TypePlaceholder => "type-placeholder",
            HighlightKind::Field => "field",
            HighlightKind::StaticField => "static-field",
            HighlightKind::StaticFinalValue => "static-final-value",
            HighlightKind::Parameter => "parameter",
            HighlightKind::LocalVariable => "local-variable",
            HighlightKind::Deprecated => "deprecated",
            HighlightKind::Unknown => "unknown",
        }
    }

    /// Looks a kind up by its configuration key.
    pub fn from_key(key: &str) -> Option<HighlightKind> {
        KEY_MAP.get(key).copied()
    }

    /// Returns the next kind in the style fallback chain.
    ///
    /// `Default` is the terminal entry and has no parent.
    pub fn fallback(self) -> Option<HighlightKind> {
        use HighlightKind::*;

        let parent = match self {
            Default => return None,

            StaticFinalValue => StaticField,
            StaticField => Field,

            AbstractClass | Interface | Enum | TypePlaceholder => Class,
            Trait | Annotation => Interface,

            Constructor | StaticMethod => Method,
            StaticCall | DynamicCall | ConstructorCall => MethodCall,

            Parameter => LocalVariable,
            Regex => String,
            TagKey => MapKey,
            ReservedWord => Keyword,

            Comment | Keyword | Number | String | MapKey | Method | MethodCall | Class | Field
            | LocalVariable | Deprecated | Unknown => Default,
        };
        Some(parent)
    }

    /// Iterates from this kind up to and including `Default`.
    pub fn fallback_chain(self) -> impl Iterator<Item = HighlightKind> {
        std::iter::successors(Some(self), |kind| kind.fallback())
    }

    /// Returns true for the cross-cutting modifier kinds.
    pub fn is_modifier(self) -> bool {
        matches!(self, HighlightKind::Deprecated | HighlightKind::Unknown)
    }

    /// Returns true for the type categories.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            HighlightKind::Class
                | HighlightKind::AbstractClass
                | HighlightKind::Interface
                | HighlightKind::Trait
                | HighlightKind::Annotation
                | HighlightKind::Enum
                | HighlightKind::TypePlaceholder
        )
    }
}

impl fmt::Display for HighlightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

static KEY_MAP: Lazy<HashMap<&'static str, HighlightKind>> =
    Lazy::new(|| HighlightKind::ALL.iter().map(|&kind| (kind.key(), kind)).collect());
