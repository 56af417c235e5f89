// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compares a freshly classified position set with what is on screen.
//!
//! Matching is by range and rendered style, not by kind: a span whose kind
//! changed but still renders identically is left alone, which keeps the
//! visible document from flickering.

use std::collections::HashMap;

use crate::semantic::kind::HighlightKind;
use crate::semantic::position::{Modifier, PositionSet, Span};
use crate::semantic::style::{Style, StyleRegistry};

/// A position together with the style it was (or will be) rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyledPosition {
    pub span: Span,
    pub kind: HighlightKind,
    pub modifier: Option<Modifier>,
    pub style: Style,
}

impl StyledPosition {
    pub fn offset(&self) -> usize {
        self.span.offset
    }

    pub fn length(&self) -> usize {
        self.span.length
    }
}

/// Output of one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightDelta {
    /// Positions to paint
    pub added: Vec<StyledPosition>,
    /// Previously painted positions to clear
    pub removed: Vec<StyledPosition>,
    /// Previously painted positions that stay as they are
    pub unchanged: Vec<StyledPosition>,
}

impl HighlightDelta {
    /// True if nothing on screen needs to change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// The applied list after this delta: unchanged plus added, in offset order.
    pub fn merged(&self) -> Vec<StyledPosition> {
        let mut merged: Vec<StyledPosition> = self.unchanged.iter().chain(&self.added).copied().collect();
        merged.sort_by_key(|position| (position.span.offset, position.kind, position.span.length));
        merged
    }
}

/// Owns the list of positions currently applied to the editor.
#[derive(Debug, Default)]
pub struct DiffEngine {
    applied: Vec<StyledPosition>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The positions most recently committed.
    pub fn applied(&self) -> &[StyledPosition] {
        &self.applied
    }

    /// Computes the delta between `positions` and the applied list.
    ///
    /// Does not modify the applied list; call [`DiffEngine::commit`] once
    /// the pass is known to complete.
    pub fn diff(&self, positions: &PositionSet, registry: &StyleRegistry) -> HighlightDelta {
        // Remaining previous entries, looked up by (range, style).
        let mut remaining: HashMap<(Span, Style), Vec<usize>> = HashMap::new();
        for (index, previous) in self.applied.iter().enumerate() {
            remaining.entry((previous.span, previous.style)).or_default().push(index);
        }
        let mut consumed = vec![false; self.applied.len()];

        let mut delta = HighlightDelta::default();
        for highlight in positions.iter() {
            let position = highlight.position;
            let style = registry.rendered_style(position.kind, highlight.modifier);
            let styled = StyledPosition {
                span: position.span(),
                kind: position.kind,
                modifier: highlight.modifier,
                style,
            };

            let matched = remaining.get_mut(&(styled.span, style)).and_then(|indices| indices.pop());
            match matched {
                Some(index) => {
                    consumed[index] = true;
                    delta.unchanged.push(self.applied[index]);
                }
                None => delta.added.push(styled),
            }
        }

        delta.removed = self
            .applied
            .iter()
            .zip(&consumed)
            .filter(|&(_, &used)| !used)
            .map(|(&previous, _)| previous)
            .collect();

        delta
    }

    /// Replaces the applied list with the result of `delta`.
    pub fn commit(&mut self, delta: &HighlightDelta) {
        self.applied = delta.merged();
    }

    /// Forgets everything applied, e.g. after the editor was reset.
    pub fn clear(&mut self) {
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::config::{StyleConfig, StyleSetting};
    use crate::semantic::position::TypedPosition;
    use HighlightKind as K;

    fn set(positions: &[TypedPosition]) -> PositionSet {
        positions.iter().copied().collect()
    }

    #[test]
    fn test_first_pass_adds_everything() {
        let registry = StyleRegistry::default();
        let engine = DiffEngine::new();
        let new = set(&[TypedPosition::new(0, 3, K::Field), TypedPosition::new(5, 2, K::Number)]);

        let delta = engine.diff(&new, &registry);
        assert_eq!(delta.added.len(), 2);
        assert!(delta.removed.is_empty());
        assert!(delta.unchanged.is_empty());
        assert_eq!(delta.added[0].style, registry.style(K::Field));
    }

    #[test]
    fn test_added_removed_unchanged() {
        let registry = StyleRegistry::default();
        let a = TypedPosition::new(0, 3, K::Field);
        let b = TypedPosition::new(10, 4, K::MethodCall);
        let c = TypedPosition::new(20, 2, K::Number);
        let d = TypedPosition::new(30, 5, K::Class);

        let mut engine = DiffEngine::new();
        let first = engine.diff(&set(&[a, b, c]), &registry);
        engine.commit(&first);

        let delta = engine.diff(&set(&[a, b, d]), &registry);
        let spans = |list: &[StyledPosition]| list.iter().map(|p| TypedPosition::at(p.span, p.kind)).collect::<Vec<_>>();
        assert_eq!(spans(&delta.added), vec![d]);
        assert_eq!(spans(&delta.removed), vec![c]);
        assert_eq!(spans(&delta.unchanged), vec![a, b]);

        engine.commit(&delta);
        assert_eq!(spans(engine.applied()), vec![a, b, d]);
    }

    #[test]
    fn test_diff_against_itself_is_empty() {
        let registry = StyleRegistry::default();
        let positions = set(&[
            TypedPosition::new(0, 3, K::Field),
            TypedPosition::new(4, 3, K::StaticField),
            TypedPosition::new(9, 1, K::Unknown),
        ]);
        let mut engine = DiffEngine::new();
        let first = engine.diff(&positions, &registry);
        engine.commit(&first);

        let second = engine.diff(&positions, &registry);
        assert!(second.is_empty());
        assert_eq!(second.unchanged.len(), 3);
    }

    #[test]
    fn test_same_style_different_kind_is_unchanged() {
        // Parameter has no theme entry and inherits local-variable.
        let registry = StyleRegistry::default();
        assert_eq!(registry.style(K::Parameter), registry.style(K::LocalVariable));

        let mut engine = DiffEngine::new();
        let first = engine.diff(&set(&[TypedPosition::new(0, 1, K::LocalVariable)]), &registry);
        engine.commit(&first);

        let delta = engine.diff(&set(&[TypedPosition::new(0, 1, K::Parameter)]), &registry);
        assert!(delta.is_empty());
        // The entry that stays is the one already on screen.
        assert_eq!(delta.unchanged[0].kind, K::LocalVariable);
    }

    #[test]
    fn test_style_change_replaces_span() {
        let registry = StyleRegistry::new(&StyleConfig::default().with_style(
            "static-field",
            StyleSetting {
                bold: Some(true),
                ..StyleSetting::default()
            },
        ));
        let mut engine = DiffEngine::new();
        let first = engine.diff(&set(&[TypedPosition::new(0, 3, K::Field)]), &registry);
        engine.commit(&first);

        let delta = engine.diff(&set(&[TypedPosition::new(0, 3, K::StaticField)]), &registry);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
        assert!(delta.unchanged.is_empty());
    }

    #[test]
    fn test_modifier_changes_rendered_style() {
        let registry = StyleRegistry::default();
        let field = TypedPosition::new(0, 3, K::Field);
        let mut engine = DiffEngine::new();
        let first = engine.diff(&set(&[field]), &registry);
        engine.commit(&first);

        let mut deprecated = PositionSet::new();
        deprecated.insert(field);
        deprecated.merge_modifier(field.span(), Modifier::Deprecated);

        let delta = engine.diff(&deprecated, &registry);
        assert_eq!(delta.added.len(), 1);
        assert!(delta.added[0].style.strikethrough);
        assert_eq!(delta.added[0].modifier, Some(Modifier::Deprecated));
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn test_duplicate_previous_entries_are_removed_once_each() {
        let registry = StyleRegistry::default();
        let styled = StyledPosition {
            span: Span::new(0, 3),
            kind: K::Field,
            modifier: None,
            style: registry.style(K::Field),
        };
        let mut engine = DiffEngine::new();
        engine.applied = vec![styled, styled];

        let delta = engine.diff(&set(&[TypedPosition::new(0, 3, K::Field)]), &registry);
        assert!(delta.added.is_empty());
        assert_eq!(delta.unchanged, vec![styled]);
        assert_eq!(delta.removed, vec![styled]);
    }

    #[test]
    fn test_empty_new_set_removes_everything() {
        let registry = StyleRegistry::default();
        let mut engine = DiffEngine::new();
        let first = engine.diff(&set(&[TypedPosition::new(0, 3, K::Field)]), &registry);
        engine.commit(&first);

        let delta = engine.diff(&PositionSet::new(), &registry);
        assert_eq!(delta.removed.len(), 1);
        engine.commit(&delta);
        assert!(engine.applied().is_empty());

        engine.clear();
        assert!(engine.applied().is_empty());
    }
}
