// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Semantic highlighting engine.
//!
//! Classifies the resolved references of a compiled unit into typed positions,
//! diffs them against what the editor currently shows and hands the delta to
//! the UI thread, one pass per document at a time.

pub mod ast;
pub mod classifier;
pub mod config;
pub mod diff;
pub mod error;
pub mod gate;
pub mod highlighter;
pub mod kind;
pub mod position;
pub mod provider;
pub mod sample;
pub mod style;


pub use classifier::ReferenceClassifier;
pub use config::{StyleConfig, StyleSetting};
pub use diff::{DiffEngine, HighlightDelta, StyledPosition};
pub use error::{ConfigError, GateError, HighlightError, ProviderError};
pub use gate::{CancellationToken, Permit, SyncGate};
pub use highlighter::{Checkpoint, PassOutcome, PassState, PassSummary, ReconcileMetrics, SemanticHighlighter};
pub use kind::HighlightKind;
pub use position::{Modifier, PositionSet, Span, TypedPosition};
pub use provider::{ReferenceRequestor, ResolvedNode, ResolvedReferenceProvider, ResolvedTree};
pub use style::{Color, Style, StyleRegistry};
