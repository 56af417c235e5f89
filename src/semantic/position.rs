// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Typed source positions and the ordered set the classifier fills.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::semantic::kind::HighlightKind;

/// A half-open byte range `[offset, offset + length)` in the source buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
}

impl Span {
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Creates a span from start and end offsets. An inverted range yields
    /// an empty span at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns true if `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        other.offset >= self.offset && other.end() <= self.end()
    }

    /// Returns the smallest span covering both.
    pub fn union(&self, other: &Span) -> Span {
        Span::from_bounds(self.offset.min(other.offset), self.end().max(other.end()))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.end())
    }
}

/// One classified span of source text.
///
/// Positions order by offset, then by kind ordinal, then by length; equality
/// is the full `(offset, length, kind)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedPosition {
    pub offset: usize,
    pub length: usize,
    pub kind: HighlightKind,
}

impl TypedPosition {
    pub const fn new(offset: usize, length: usize, kind: HighlightKind) -> Self {
        Self { offset, length, kind }
    }

    pub fn at(span: Span, kind: HighlightKind) -> Self {
        Self::new(span.offset, span.length, kind)
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.length)
    }
}

impl Ord for TypedPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset
            .cmp(&other.offset)
            .then(self.kind.cmp(&other.kind))
            .then(self.length.cmp(&other.length))
    }
}

impl PartialOrd for TypedPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A cross-cutting modifier folded into the style of a primary position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Deprecated,
    Unknown,
}

impl Modifier {
    pub fn from_kind(kind: HighlightKind) -> Option<Modifier> {
        match kind {
            HighlightKind::Deprecated => Some(Modifier::Deprecated),
            HighlightKind::Unknown => Some(Modifier::Unknown),
            _ => None,
        }
    }

    pub fn kind(self) -> HighlightKind {
        match self {
            Modifier::Deprecated => HighlightKind::Deprecated,
            Modifier::Unknown => HighlightKind::Unknown,
        }
    }
}

/// A member of a [`PositionSet`]: a position plus the modifier merged into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Highlight {
    pub position: TypedPosition,
    pub modifier: Option<Modifier>,
}

/// Result of adding a record to a [`PositionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The position became a new member
    Added,
    /// An identical triple was already present
    Duplicate,
    /// The modifier was folded into the immediately preceding record
    Merged,
    /// The record was dropped because it would break the set invariant
    Rejected,
}

/// Ordered, duplicate-free set of classified positions.
///
/// At most one position occupies any exact `(offset, length)` range; a
/// modifier emitted for that same range is attached to it instead of becoming
/// a second member.
#[derive(Debug, Clone, Default)]
pub struct PositionSet {
    members: BTreeMap<TypedPosition, Option<Modifier>>,
    by_range: HashMap<Span, TypedPosition>,
    last: Option<TypedPosition>,
}

impl PositionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a primary record.
    ///
    /// A second, different kind for an occupied range is rejected and the
    /// first classification is kept.
    pub fn insert(&mut self, position: TypedPosition) -> Insertion {
        if position.length == 0 {
            return Insertion::Rejected;
        }
        if let Some(modifier) = Modifier::from_kind(position.kind) {
            if self.last.is_some_and(|last| last.span() == position.span() && last != position) {
                return self.merge_modifier(position.span(), modifier);
            }
        }
        if let Some(existing) = self.by_range.get(&position.span()) {
            if *existing == position {
                self.last = Some(position);
                return Insertion::Duplicate;
            }
            tracing::warn!(
                span = %position.span(),
                kept = %existing.kind,
                dropped = %position.kind,
                "two classifications for one range; keeping the first"
            );
            return Insertion::Rejected;
        }
        self.members.insert(position, None);
        self.by_range.insert(position.span(), position);
        self.last = Some(position);
        Insertion::Added
    }

    /// Folds a modifier into the record emitted immediately before it.
    ///
    /// If that record does not cover exactly `span`, or already carries a
    /// different modifier, the new one is logged and dropped.
    pub fn merge_modifier(&mut self, span: Span, modifier: Modifier) -> Insertion {
        let Some(last) = self.last.filter(|last| last.span() == span) else {
            tracing::warn!(
                span = %span,
                modifier = %modifier.kind(),
                previous = ?self.last.map(|last| last.span()),
                "modifier does not line up with the preceding position; dropping it"
            );
            return Insertion::Rejected;
        };
        match self.members.get_mut(&last) {
            Some(Some(existing)) if *existing == modifier => Insertion::Duplicate,
            Some(Some(existing)) => {
                tracing::warn!(
                    span = %span,
                    kept = %existing.kind(),
                    dropped = %modifier.kind(),
                    "two modifiers for one range; keeping the first"
                );
                Insertion::Rejected
            }
            Some(slot) => {
                *slot = Some(modifier);
                Insertion::Merged
            }
            None => Insertion::Rejected,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, position: &TypedPosition) -> bool {
        self.members.contains_key(position)
    }

    /// Returns the modifier attached to a member, if any.
    pub fn modifier(&self, position: &TypedPosition) -> Option<Modifier> {
        self.members.get(position).copied().flatten()
    }

    /// Iterates the members in position order.
    pub fn iter(&self) -> impl Iterator<Item = Highlight> + '_ {
        self.members.iter().map(|(&position, &modifier)| Highlight { position, modifier })
    }

    /// Iterates just the positions, in order.
    pub fn positions(&self) -> impl Iterator<Item = TypedPosition> + '_ {
        self.members.keys().copied()
    }
}

// Membership only; the merge cursor is not part of a set's value.
impl PartialEq for PositionSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for PositionSet {}

impl FromIterator<TypedPosition> for PositionSet {
    fn from_iter<I: IntoIterator<Item = TypedPosition>>(iter: I) -> Self {
        let mut set = PositionSet::new();
        for position in iter {
            set.insert(position);
        }
        set
    }
}
