// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolved syntax-tree nodes as delivered by a resolved-reference provider.
//!
//! Each node kind the classifier cares about is one variant of [`NodeKind`];
//! everything else arrives as [`NodeKind::Other`]. Resolution results and the
//! enclosing context are plain data so providers can be backed by any
//! type-inference engine.

use crate::semantic::position::Span;

/// One node of a compiled unit's syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Full source range of the node
    pub span: Span,
    /// The node's rendered text, used to tell real nodes from synthetic ones
    pub text: String,
}

impl AstNode {
    pub fn new(kind: NodeKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// Returns true for plain name references, which signal deprecation by
    /// overlay rather than by reclassification.
    pub fn is_name_expression(&self) -> bool {
        matches!(self.kind, NodeKind::Name)
    }
}

/// The closed set of node shapes the classifier distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Field or property declaration; `name` is the declared name
    FieldDeclaration { name: Span },
    /// Method or constructor declaration
    MethodDeclaration {
        name: Span,
        /// The raw method name, without quotes
        name_text: String,
    },
    /// Parameter declaration
    ParameterDeclaration { name: Span },
    /// Reference to a type, such as a declared type, cast or class literal
    TypeReference {
        /// Range of the type's simple name, when the parser recorded one
        name: Option<Span>,
        /// Outer class segment of a qualified reference like `Outer.Inner`
        outer: Option<OuterType>,
    },
    /// A plain name expression (`foo`)
    Name,
    /// The member part of a property or attribute access (`a.foo`)
    Member,
    /// A method call on a receiver
    MethodCall { name: Span, receiver_is_type: bool },
    /// A call without a receiver that resolved to a static method
    StaticMethodCall { name: Span },
    /// `new Foo(...)`; `name` is the constructed type's name
    ConstructorCall { name: Span },
    /// A literal constant
    Constant { numeric: bool },
    /// An interpolated string; `fragments` are its literal parts
    InterpolatedString { fragments: Vec<Span> },
    /// A map entry `key: value`
    MapEntry { key: Span, key_is_constant: bool },
    /// Anything else; never classified on its own
    Other,
}

/// The outer-class segment of a qualified type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterType {
    pub span: Span,
    pub info: TypeInfo,
    pub deprecated: bool,
}

/// How certain the type-resolution pass is about a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    Exact,
    Inferred,
    Loose,
    Unknown,
}

/// Type-resolution result for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub confidence: Confidence,
    /// The declaration the node resolved to, if any
    pub declaration: Option<Declaration>,
    /// The call was bound dynamically (duck typed) rather than statically
    pub dynamic: bool,
}

impl Resolution {
    pub fn new(confidence: Confidence, declaration: Option<Declaration>) -> Self {
        Self {
            confidence,
            declaration,
            dynamic: false,
        }
    }

    /// An exactly resolved node.
    pub fn exact(declaration: Declaration) -> Self {
        Self::new(Confidence::Exact, Some(declaration))
    }

    /// A node resolved without a declaration (literals, structural nodes).
    pub fn none() -> Self {
        Self::new(Confidence::Exact, None)
    }

    /// A node the resolver could not make sense of.
    pub fn unknown() -> Self {
        Self::new(Confidence::Unknown, None)
    }

    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.declaration.as_ref().is_some_and(|decl| decl.deprecated)
    }
}

/// A resolved declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Carries a deprecation annotation
    pub deprecated: bool,
}

impl Declaration {
    pub fn new(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            deprecated: false,
        }
    }

    pub fn field(name: impl Into<String>, is_static: bool, is_final: bool) -> Self {
        Self::new(name, DeclarationKind::Field { is_static, is_final })
    }

    pub fn method(name: impl Into<String>, is_static: bool) -> Self {
        Self::new(
            name,
            DeclarationKind::Method {
                is_static,
                is_constructor: false,
            },
        )
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        Self::new(
            name,
            DeclarationKind::Method {
                is_static: false,
                is_constructor: true,
            },
        )
    }

    pub fn type_decl(name: impl Into<String>, info: TypeInfo) -> Self {
        Self::new(name, DeclarationKind::Type(info))
    }

    pub fn parameter(name: impl Into<String>, line: Option<u32>) -> Self {
        Self::new(name, DeclarationKind::Parameter { line })
    }

    pub fn local_variable(name: impl Into<String>) -> Self {
        Self::new(name, DeclarationKind::LocalVariable)
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// What a declaration declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    Field { is_static: bool, is_final: bool },
    Method { is_static: bool, is_constructor: bool },
    Type(TypeInfo),
    /// A parameter; `line` is `None` for synthetic parameters
    Parameter { line: Option<u32> },
    LocalVariable,
    /// A name bound only at runtime, e.g. a script binding
    Dynamic,
}

/// Shape flags of a declared type. Several may be set at once; the
/// classifier picks one in a fixed precedence order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub is_enum: bool,
    pub is_placeholder: bool,
    pub is_annotation: bool,
    pub is_interface: bool,
    pub is_trait: bool,
    pub is_abstract: bool,
}

impl TypeInfo {
    pub fn class() -> Self {
        Self::default()
    }

    pub fn abstract_class() -> Self {
        Self {
            is_abstract: true,
            ..Self::default()
        }
    }

    pub fn interface() -> Self {
        Self {
            is_interface: true,
            is_abstract: true,
            ..Self::default()
        }
    }

    pub fn trait_type() -> Self {
        Self {
            is_trait: true,
            ..Self::interface()
        }
    }

    pub fn annotation() -> Self {
        Self {
            is_annotation: true,
            ..Self::interface()
        }
    }

    pub fn enumeration() -> Self {
        Self {
            is_enum: true,
            ..Self::default()
        }
    }

    pub fn placeholder() -> Self {
        Self {
            is_placeholder: true,
            ..Self::default()
        }
    }
}

/// The kind of block that introduced a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Method,
    Closure,
    Block,
    ForLoop,
    Catch,
}

/// Enclosing element and variable scopes at the point a node was visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnclosingContext {
    /// Name of the enclosing member, if any
    pub element: Option<String>,
    /// Variable bindings, outermost first
    pub bindings: Vec<(String, ScopeKind)>,
}

impl EnclosingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_element(element: impl Into<String>) -> Self {
        Self {
            element: Some(element.into()),
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, scope: ScopeKind) -> Self {
        self.bindings.push((name.into(), scope));
        self
    }

    /// Finds the innermost scope that declares `name`.
    pub fn lookup(&self, name: &str) -> Option<ScopeKind> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|&(_, scope)| scope)
    }
}

/// Tells the provider whether to descend into the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitStatus {
    Continue,
    /// Skip the current node's children
    CancelBranch,
}
