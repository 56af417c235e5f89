// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Turns resolved syntax-tree nodes into typed highlight positions.
//!
//! The classifier is driven by a [`ResolvedReferenceProvider`]: for every
//! node it either skips, emits one position, or (for an unresolved node)
//! emits `unknown` and asks the provider to stop descending. Interpolated
//! strings are the one node shape that produces several positions.

use crate::semantic::ast::{
    AstNode, Confidence, Declaration, DeclarationKind, EnclosingContext, NodeKind, OuterType, Resolution,
    ScopeKind, TypeInfo, VisitStatus,
};
use crate::semantic::error::ProviderError;
use crate::semantic::kind::HighlightKind;
use crate::semantic::position::{Modifier, PositionSet, Span, TypedPosition};
use crate::semantic::provider::{ReferenceRequestor, ResolvedReferenceProvider};

/// Node text suffix of synthetic trait-dispatch helpers. Such nodes have no
/// exact source backing but still point at real code.
const TRAIT_HELPER_MARKER: &str = "$Trait$Helper";

/// The name of the implicit single closure parameter.
const IMPLICIT_PARAMETER: &str = "it";

/// Opening and closing delimiters of interpolated strings, longest first.
const STRING_DELIMITERS: &[(&str, &str)] = &[
    ("\"\"\"", "\"\"\""),
    ("'''", "'''"),
    ("$/", "/$"),
    ("\"", "\""),
    ("'", "'"),
    ("/", "/"),
];

/// Classifies nodes into a fresh [`PositionSet`].
#[derive(Debug)]
pub struct ReferenceClassifier<'a> {
    source: &'a str,
    positions: PositionSet,
    /// Interpolated strings already recorded this pass
    interpolations: Vec<Span>,
    visited: usize,
}

impl<'a> ReferenceClassifier<'a> {
    /// Creates a classifier over the unit's source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            positions: PositionSet::new(),
            interpolations: Vec::new(),
            visited: 0,
        }
    }

    /// Runs a full traversal of `provider` and returns the classified set.
    pub fn classify(provider: &dyn ResolvedReferenceProvider) -> Result<PositionSet, ProviderError> {
        let mut classifier = ReferenceClassifier::new(provider.source());
        provider.visit(&mut classifier)?;
        Ok(classifier.into_positions())
    }

    /// Number of nodes the provider has reported so far.
    pub fn nodes_visited(&self) -> usize {
        self.visited
    }

    pub fn positions(&self) -> &PositionSet {
        &self.positions
    }

    pub fn into_positions(self) -> PositionSet {
        self.positions
    }

    fn emit(&mut self, span: Span, kind: HighlightKind) {
        self.positions.insert(TypedPosition::at(span, kind));
    }

    /// Emits a position for a node with a declaration, applying the
    /// deprecation overlay.
    fn emit_resolved(&mut self, node: &AstNode, resolution: &Resolution, position: Option<TypedPosition>) {
        if !resolution.is_deprecated() {
            if let Some(position) = position {
                self.positions.insert(position);
            }
            return;
        }

        if node.is_name_expression() {
            // Name expressions keep their category; deprecation rides along
            // as a modifier on the same range. Without a category there is
            // nothing to carry it.
            if let Some(position) = position {
                self.positions.insert(position);
                self.positions.merge_modifier(position.span(), Modifier::Deprecated);
            }
        } else if let Some(position) = position {
            self.emit(position.span(), HighlightKind::Deprecated);
        }
    }

    fn slice(&self, span: Span) -> Option<&'a str> {
        self.source.get(span.offset..span.end())
    }

    /// Checks that the node's rendered text is literally what the source
    /// holds at its range.
    fn is_real_node(&self, node: &AstNode) -> bool {
        if node.text.ends_with(TRAIT_HELPER_MARKER) {
            return true;
        }
        node.text.len() == node.span.length && self.slice(node.span) == Some(node.text.as_str())
    }

    fn preceded_by_at(&self, offset: usize) -> bool {
        offset > 0 && self.source.as_bytes().get(offset - 1) == Some(&b'@')
    }

    fn inside_interpolation(&self, span: Span) -> bool {
        self.interpolations.iter().any(|outer| outer.contains(&span))
    }

    /// Sniffs the source for a slashy literal: `/.../` or `$/.../$`.
    fn is_slashy(&self, span: Span) -> bool {
        let Some(text) = self.slice(span) else {
            return false;
        };
        (text.len() >= 2 && text.starts_with('/') && text.ends_with('/'))
            || (text.len() >= 4 && text.starts_with("$/") && text.ends_with("/$"))
    }

    fn handle_constant(&mut self, node: &AstNode, numeric: bool) {
        if numeric {
            self.emit(node.span, HighlightKind::Number);
        } else if !self.inside_interpolation(node.span) && self.is_slashy(node.span) {
            self.emit(node.span, HighlightKind::Regex);
        }
    }

    fn handle_interpolation(&mut self, node: &AstNode, fragments: &[Span]) {
        self.emit(node.span, HighlightKind::DynamicCall);
        self.interpolations.push(node.span);

        let whole = self.slice(node.span).unwrap_or_default();
        let delimiters = STRING_DELIMITERS
            .iter()
            .copied()
            .find(|(open, close)| {
                whole.len() >= open.len() + close.len() && whole.starts_with(open) && whole.ends_with(close)
            })
            .unwrap_or(("", ""));
        let fragment_kind = match delimiters.0 {
            "/" | "$/" => HighlightKind::Regex,
            _ => HighlightKind::String,
        };

        for &fragment in fragments {
            let Some(trimmed) = self.trim_fragment(fragment, node.span, delimiters) else {
                continue;
            };
            if !trimmed.is_empty() && node.span.contains(&trimmed) {
                self.emit(trimmed, fragment_kind);
            }
        }
    }

    /// Cuts a fragment down to its literal text.
    ///
    /// The first fragment loses the string's opening delimiter and the last
    /// its closing one. Fragments after an expression lose the `}` that closed
    /// it, and fragments before one lose the `${` or `$` that opens it.
    fn trim_fragment(&self, fragment: Span, whole: Span, (open, close): (&str, &str)) -> Option<Span> {
        let text = self.slice(fragment)?;
        let leading = if fragment.offset == whole.offset {
            if text.starts_with(open) { open.len() } else { 0 }
        } else if text.starts_with('}') {
            1
        } else {
            0
        };
        let body = &text[leading..];
        let trailing = if fragment.end() == whole.end() && !close.is_empty() && body.ends_with(close) {
            close.len()
        } else if body.ends_with("${") {
            2
        } else if body.ends_with('$') {
            1
        } else {
            0
        };
        Some(Span::new(fragment.offset + leading, body.len() - trailing))
    }

    fn handle_map_entry(&mut self, node: &AstNode, key: Span, key_is_constant: bool) {
        if !key_is_constant || key.offset != node.span.offset {
            return;
        }
        let bare = self
            .slice(key)
            .and_then(|text| text.chars().next())
            .is_some_and(|first| !matches!(first, '"' | '\'' | '/' | '$'));
        if bare {
            self.emit(key, HighlightKind::MapKey);
        }
    }

    fn handle_type_reference(
        &mut self,
        node: &AstNode,
        name: Option<Span>,
        outer: Option<&OuterType>,
        declaration: Option<&Declaration>,
    ) -> Option<TypedPosition> {
        if self.preceded_by_at(node.span.offset) {
            // annotations are colored lexically
            return None;
        }
        let info = match declaration.map(|decl| &decl.kind) {
            Some(DeclarationKind::Type(info)) => *info,
            _ => return None,
        };

        let mut span = name.unwrap_or(node.span);
        if let (None, Some(outer)) = (name, outer) {
            let outer_kind = if outer.deprecated {
                HighlightKind::Deprecated
            } else {
                type_kind(outer.info)
            };
            self.emit(outer.span, outer_kind);

            let dot = outer.span.end();
            if self.source.as_bytes().get(dot) == Some(&b'.') && dot + 1 < node.span.end() {
                span = Span::from_bounds(dot + 1, node.span.end());
            }
        }
        Some(TypedPosition::at(span, type_kind(info)))
    }

    /// Classifies the nodes that are driven by their declaration.
    fn classify_reference(
        &mut self,
        node: &AstNode,
        resolution: &Resolution,
        context: &EnclosingContext,
    ) -> Option<TypedPosition> {
        let declaration = resolution.declaration.as_ref();

        match &node.kind {
            NodeKind::FieldDeclaration { name } => {
                field_kind(declaration?).map(|kind| TypedPosition::at(*name, kind))
            }
            NodeKind::MethodDeclaration { name, name_text } => {
                let DeclarationKind::Method {
                    is_static,
                    is_constructor,
                } = declaration?.kind
                else {
                    return None;
                };
                if name.length > name_text.len() {
                    tracing::debug!(span = %name, name = %name_text, "method name range is wider than the name");
                    return None;
                }
                let kind = if is_constructor {
                    HighlightKind::Constructor
                } else if is_static {
                    HighlightKind::StaticMethod
                } else {
                    HighlightKind::Method
                };
                Some(TypedPosition::at(*name, kind))
            }
            NodeKind::ParameterDeclaration { name } => {
                variable_kind(declaration?, context).map(|kind| TypedPosition::at(*name, kind))
            }
            NodeKind::TypeReference { name, outer } => {
                self.handle_type_reference(node, *name, outer.as_ref(), declaration)
            }
            NodeKind::Name | NodeKind::Member => {
                let declaration = declaration?;
                let kind = match &declaration.kind {
                    DeclarationKind::Field { .. } => field_kind(declaration),
                    DeclarationKind::Parameter { .. } | DeclarationKind::LocalVariable => {
                        variable_kind(declaration, context)
                    }
                    DeclarationKind::Type(info) => Some(type_kind(*info)),
                    DeclarationKind::Method { .. } | DeclarationKind::Dynamic => None,
                };
                kind.map(|kind| TypedPosition::at(node.span, kind))
            }
            NodeKind::MethodCall { name, receiver_is_type } => {
                let kind = if resolution.dynamic {
                    HighlightKind::DynamicCall
                } else if *receiver_is_type {
                    HighlightKind::StaticCall
                } else {
                    HighlightKind::MethodCall
                };
                Some(TypedPosition::at(*name, kind))
            }
            NodeKind::StaticMethodCall { name } => {
                let kind = if resolution.dynamic {
                    HighlightKind::DynamicCall
                } else {
                    HighlightKind::StaticCall
                };
                Some(TypedPosition::at(*name, kind))
            }
            NodeKind::ConstructorCall { name } => Some(TypedPosition::at(*name, HighlightKind::ConstructorCall)),
            NodeKind::Constant { .. }
            | NodeKind::InterpolatedString { .. }
            | NodeKind::MapEntry { .. }
            | NodeKind::Other => None,
        }
    }
}

impl ReferenceRequestor for ReferenceClassifier<'_> {
    fn accept(&mut self, node: &AstNode, resolution: &Resolution, context: &EnclosingContext) -> VisitStatus {
        self.visited += 1;

        // Nodes without a source location
        if node.span.is_empty() {
            return VisitStatus::Continue;
        }

        if resolution.confidence == Confidence::Unknown {
            if self.is_real_node(node) {
                self.emit(node.span, HighlightKind::Unknown);
                // Nothing under an unresolved node can be classified meaningfully.
                return VisitStatus::CancelBranch;
            }
            return VisitStatus::Continue;
        }

        match &node.kind {
            NodeKind::InterpolatedString { fragments } => self.handle_interpolation(node, fragments),
            NodeKind::MapEntry { key, key_is_constant } => self.handle_map_entry(node, *key, *key_is_constant),
            NodeKind::Constant { numeric } => self.handle_constant(node, *numeric),
            _ => {
                let position = self.classify_reference(node, resolution, context);
                self.emit_resolved(node, resolution, position);
            }
        }
        VisitStatus::Continue
    }
}

fn field_kind(declaration: &Declaration) -> Option<HighlightKind> {
    match declaration.kind {
        DeclarationKind::Field { is_static: false, .. } => Some(HighlightKind::Field),
        DeclarationKind::Field { is_final: false, .. } => Some(HighlightKind::StaticField),
        DeclarationKind::Field { .. } => Some(HighlightKind::StaticFinalValue),
        _ => None,
    }
}

fn type_kind(info: TypeInfo) -> HighlightKind {
    if info.is_enum {
        HighlightKind::Enum
    } else if info.is_placeholder {
        HighlightKind::TypePlaceholder
    } else if info.is_annotation {
        HighlightKind::Annotation
    } else if info.is_interface {
        if info.is_trait {
            HighlightKind::Trait
        } else {
            HighlightKind::Interface
        }
    } else if info.is_abstract {
        HighlightKind::AbstractClass
    } else {
        HighlightKind::Class
    }
}

fn variable_kind(declaration: &Declaration, context: &EnclosingContext) -> Option<HighlightKind> {
    match declaration.kind {
        DeclarationKind::Parameter { line: Some(_) } => match context.lookup(&declaration.name) {
            Some(ScopeKind::ForLoop | ScopeKind::Catch) => Some(HighlightKind::LocalVariable),
            _ => Some(HighlightKind::Parameter),
        },
        DeclarationKind::Parameter { line: None } if declaration.name == IMPLICIT_PARAMETER => {
            Some(HighlightKind::DynamicCall)
        }
        DeclarationKind::LocalVariable => Some(HighlightKind::LocalVariable),
        _ => None,
    }
}
