// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Synthetic resolved units for measurements and end-to-end checks.
//!
//! [`sample_unit`] writes a compilation unit of `classes` small classes and
//! the resolved tree a type-inference pass would report for it. Every kind of
//! node the classifier handles appears at least once per class, including one
//! unresolved call whose subtree must not be classified.

use crate::semantic::ast::{
    AstNode, Declaration, EnclosingContext, NodeKind, Resolution, ScopeKind, TypeInfo,
};
use crate::semantic::position::Span;
use crate::semantic::provider::{ResolvedNode, ResolvedTree};

/// Number of positions [`sample_unit`] yields per class.
pub const POSITIONS_PER_CLASS: usize = 18;

struct UnitWriter {
    source: String,
}

impl UnitWriter {
    fn text(&mut self, text: &str) -> Span {
        let span = Span::new(self.source.len(), text.len());
        self.source.push_str(text);
        span
    }

    fn slice(&self, span: Span) -> &str {
        self.source.get(span.offset..span.end()).unwrap_or_default()
    }

    fn node(&self, kind: NodeKind, span: Span) -> AstNode {
        AstNode::new(kind, span, self.slice(span))
    }
}

/// Generates a unit with `classes` classes, each shaped like
///
/// ```text
/// class Widget0 extends Base {
///     static final int LIMIT0 = 42
///     String label0 = "w${count}"
///     def run0(int count) {
///         println(label0.size())
///         def pattern = /ab+c/
///         mystery(count)
///         [key: pattern]
///     }
/// }
/// ```
pub fn sample_unit(classes: usize) -> ResolvedTree {
    let mut w = UnitWriter { source: String::new() };
    let mut roots = Vec::with_capacity(classes);

    for i in 0..classes {
        let class_start = w.text("class ");
        let class_name = w.text(&format!("Widget{i}"));
        w.text(" extends ");
        let base = w.text("Base");
        w.text(" {\n    ");

        let limit_start = w.text("static final int ");
        let limit_name = w.text(&format!("LIMIT{i}"));
        w.text(" = ");
        let limit_value = w.text("42");
        let limit = Span::from_bounds(limit_start.offset, limit_value.end());
        w.text("\n    ");

        let label_start = w.text("String ");
        let label_name = w.text(&format!("label{i}"));
        w.text(" = ");
        let head = w.text("\"w${");
        let count_in_string = w.text("count");
        let tail = w.text("}\"");
        let string = Span::from_bounds(head.offset, tail.end());
        let label = Span::from_bounds(label_start.offset, tail.end());
        w.text("\n    ");

        let method_start = w.text("def ");
        let method_text = format!("run{i}");
        let method_name = w.text(&method_text);
        w.text("(int ");
        let param = w.text("count");
        w.text(") {\n        ");
        let println = w.text("println");
        w.text("(");
        let label_ref = w.text(&format!("label{i}"));
        w.text(".");
        let size = w.text("size");
        w.text("())\n        def ");
        let pattern = w.text("pattern");
        w.text(" = ");
        let regex = w.text("/ab+c/");
        w.text("\n        ");
        let mystery_name = w.text("mystery");
        w.text("(");
        let mystery_arg = w.text("count");
        let mystery_close = w.text(")");
        let mystery = Span::from_bounds(mystery_name.offset, mystery_close.end());
        w.text("\n        [");
        let key = w.text("key");
        w.text(": ");
        let pattern_ref = w.text("pattern");
        let entry = Span::from_bounds(key.offset, pattern_ref.end());
        w.text("]\n    ");
        let method_end = w.text("}");
        let method = Span::from_bounds(method_start.offset, method_end.end());
        w.text("\n");
        let class_end = w.text("}");
        let class = Span::from_bounds(class_start.offset, class_end.end());
        w.text("\n");

        let in_method = EnclosingContext::in_element(method_text.clone())
            .bind("count", ScopeKind::Method)
            .bind("pattern", ScopeKind::Block);
        let count = || Declaration::parameter("count", Some(4));
        let field = |name: Span, is_static, is_final| {
            let decl = Declaration::field(w.slice(name), is_static, is_final);
            Resolution::exact(decl)
        };

        let body = ResolvedNode::new(
            w.node(
                NodeKind::MethodDeclaration {
                    name: method_name,
                    name_text: method_text.clone(),
                },
                method,
            ),
            Resolution::exact(Declaration::method(method_text.clone(), false)),
        )
        .with_child(ResolvedNode::new(
            w.node(NodeKind::ParameterDeclaration { name: param }, param),
            Resolution::exact(count()),
        ))
        .with_child(ResolvedNode::new(
            w.node(NodeKind::StaticMethodCall { name: println }, println),
            Resolution::exact(Declaration::method("println", true)),
        ))
        .with_child(
            ResolvedNode::new(w.node(NodeKind::Name, label_ref), field(label_name, false, false))
                .with_context(in_method.clone()),
        )
        .with_child(ResolvedNode::new(
            w.node(
                NodeKind::MethodCall {
                    name: size,
                    receiver_is_type: false,
                },
                size,
            ),
            Resolution::exact(Declaration::method("size", false)),
        ))
        .with_child(
            ResolvedNode::new(
                w.node(NodeKind::Name, pattern),
                Resolution::exact(Declaration::local_variable("pattern")),
            )
            .with_context(in_method.clone()),
        )
        .with_child(ResolvedNode::new(w.node(NodeKind::Constant { numeric: false }, regex), Resolution::none()))
        .with_child(
            ResolvedNode::new(w.node(NodeKind::Other, mystery), Resolution::unknown()).with_child(
                ResolvedNode::new(w.node(NodeKind::Name, mystery_arg), Resolution::exact(count()))
                    .with_context(in_method.clone()),
            ),
        )
        .with_child(
            ResolvedNode::new(
                w.node(
                    NodeKind::MapEntry {
                        key,
                        key_is_constant: true,
                    },
                    entry,
                ),
                Resolution::none(),
            )
            .with_child(
                ResolvedNode::new(
                    w.node(NodeKind::Name, pattern_ref),
                    Resolution::exact(Declaration::local_variable("pattern")),
                )
                .with_context(in_method),
            ),
        );

        let class_node = ResolvedNode::new(
            w.node(NodeKind::Other, class),
            Resolution::exact(Declaration::type_decl(format!("Widget{i}"), TypeInfo::class())),
        )
        .with_child(ResolvedNode::new(
            w.node(
                NodeKind::TypeReference {
                    name: Some(class_name),
                    outer: None,
                },
                class_name,
            ),
            Resolution::exact(Declaration::type_decl(format!("Widget{i}"), TypeInfo::class())),
        ))
        .with_child(ResolvedNode::new(
            w.node(NodeKind::TypeReference { name: None, outer: None }, base),
            Resolution::exact(Declaration::type_decl("Base", TypeInfo::abstract_class())),
        ))
        .with_child(
            ResolvedNode::new(
                w.node(NodeKind::FieldDeclaration { name: limit_name }, limit),
                field(limit_name, true, true),
            )
            .with_child(ResolvedNode::new(
                w.node(NodeKind::Constant { numeric: true }, limit_value),
                Resolution::none(),
            )),
        )
        .with_child(
            ResolvedNode::new(
                w.node(NodeKind::FieldDeclaration { name: label_name }, label),
                field(label_name, false, false),
            )
            .with_child(
                ResolvedNode::new(
                    w.node(
                        NodeKind::InterpolatedString {
                            fragments: vec![head, tail],
                        },
                        string,
                    ),
                    Resolution::none(),
                )
                .with_child(
                    ResolvedNode::new(w.node(NodeKind::Name, count_in_string), Resolution::exact(count()))
                        .with_context(EnclosingContext::new().bind("count", ScopeKind::Closure)),
                ),
            ),
        )
        .with_child(body);

        roots.push(class_node);
    }

    let mut tree = ResolvedTree::new(w.source);
    for root in roots {
        tree.push(root);
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::classifier::ReferenceClassifier;
    use crate::semantic::kind::HighlightKind as K;
    use crate::semantic::position::TypedPosition;
    use crate::semantic::provider::ResolvedReferenceProvider;

    #[test]
    fn test_sample_unit_classifies_every_shape() {
        let tree = sample_unit(1);
        let source = tree.source();
        let positions = ReferenceClassifier::classify(&tree).unwrap();
        let found = |text: &str, kind: K| {
            let offset = source.find(text).unwrap();
            positions.contains(&TypedPosition::new(offset, text.len(), kind))
        };

        assert_eq!(positions.len(), POSITIONS_PER_CLASS);
        assert!(found("Widget0", K::Class));
        assert!(found("Base", K::AbstractClass));
        assert!(found("LIMIT0", K::StaticFinalValue));
        assert!(found("42", K::Number));
        assert!(found("label0", K::Field));
        assert!(found("\"w${count}\"", K::DynamicCall));
        // The literal part of the interpolated string, without delimiters
        let fragment = source.find("\"w${").unwrap() + 1;
        assert!(positions.contains(&TypedPosition::new(fragment, 1, K::String)));
        assert!(found("run0", K::Method));
        assert!(found("println", K::StaticCall));
        assert!(found("size", K::MethodCall));
        assert!(found("/ab+c/", K::Regex));
        assert!(found("mystery(count)", K::Unknown));
        assert!(found("key", K::MapKey));
        assert!(found("pattern", K::LocalVariable));

        // The argument under the unresolved call is never classified.
        let argument = source.find("mystery(").unwrap() + "mystery(".len();
        assert!(positions.positions().all(|p| p.offset != argument));
    }

    #[test]
    fn test_sample_unit_scales_linearly() {
        let tree = sample_unit(25);
        let positions = ReferenceClassifier::classify(&tree).unwrap();
        assert_eq!(positions.len(), 25 * POSITIONS_PER_CLASS);
    }
}
