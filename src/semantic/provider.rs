// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The seam between the highlighter and the type-resolution pass.

use crate::semantic::ast::{AstNode, EnclosingContext, Resolution, VisitStatus};
use crate::semantic::error::ProviderError;

/// Receives one callback per visited node.
pub trait ReferenceRequestor {
    /// Handles one resolved node. Returning [`VisitStatus::CancelBranch`]
    /// asks the provider not to descend into the node's children.
    fn accept(&mut self, node: &AstNode, resolution: &Resolution, context: &EnclosingContext) -> VisitStatus;
}

/// A compiled unit together with its type-resolution pass.
///
/// Implementations choose the traversal order; it need not be document order.
pub trait ResolvedReferenceProvider: Send + Sync {
    /// The unit's source text. Offsets in nodes index into this buffer.
    fn source(&self) -> &str;

    /// Runs resolution and reports every node to `requestor`.
    fn visit(&self, requestor: &mut dyn ReferenceRequestor) -> Result<(), ProviderError>;
}

/// A node with its resolution and context, plus its children.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub node: AstNode,
    pub resolution: Resolution,
    pub context: EnclosingContext,
    pub children: Vec<ResolvedNode>,
}

impl ResolvedNode {
    pub fn new(node: AstNode, resolution: Resolution) -> Self {
        Self {
            node,
            resolution,
            context: EnclosingContext::default(),
            children: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: EnclosingContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_child(mut self, child: ResolvedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ResolvedNode::node_count).sum::<usize>()
    }
}

/// A provider over an already-resolved tree, walked depth first.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTree {
    source: String,
    roots: Vec<ResolvedNode>,
}

impl ResolvedTree {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            roots: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: ResolvedNode) -> Self {
        self.roots.push(root);
        self
    }

    pub fn push(&mut self, root: ResolvedNode) {
        self.roots.push(root);
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ResolvedNode::node_count).sum()
    }

    fn walk(node: &ResolvedNode, requestor: &mut dyn ReferenceRequestor) {
        match requestor.accept(&node.node, &node.resolution, &node.context) {
            VisitStatus::Continue => {
                for child in &node.children {
                    Self::walk(child, requestor);
                }
            }
            VisitStatus::CancelBranch => {}
        }
    }
}

impl ResolvedReferenceProvider for ResolvedTree {
    fn source(&self) -> &str {
        &self.source
    }

    fn visit(&self, requestor: &mut dyn ReferenceRequestor) -> Result<(), ProviderError> {
        for root in &self.roots {
            Self::walk(root, requestor);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::ast::NodeKind;
    use crate::semantic::position::Span;

    struct Recorder {
        seen: Vec<String>,
        cancel_on: &'static str,
    }

    impl ReferenceRequestor for Recorder {
        fn accept(&mut self, node: &AstNode, _: &Resolution, _: &EnclosingContext) -> VisitStatus {
            self.seen.push(node.text.clone());
            if node.text == self.cancel_on {
                VisitStatus::CancelBranch
            } else {
                VisitStatus::Continue
            }
        }
    }

    fn leaf(text: &str) -> ResolvedNode {
        ResolvedNode::new(AstNode::new(NodeKind::Other, Span::new(0, text.len()), text), Resolution::none())
    }

    #[test]
    fn test_depth_first_walk_honors_cancel_branch() {
        let tree = ResolvedTree::new("")
            .with_root(leaf("a").with_child(leaf("b").with_child(leaf("c"))).with_child(leaf("d")))
            .with_root(leaf("e"));
        assert_eq!(tree.node_count(), 5);

        let mut recorder = Recorder {
            seen: Vec::new(),
            cancel_on: "b",
        };
        tree.visit(&mut recorder).unwrap();
        assert_eq!(recorder.seen, vec!["a", "b", "d", "e"]);
    }
}
