//! Syntax tree nodes as produced by a front-end compiler.
//!
//! The tree is a plain owned structure: each [`SyntaxNode`] owns its
//! children. The analysis layer flattens it into an index table and never
//! keeps live references into a tree, so the shape here favors simplicity
//! over sharing.

use crate::span::Range;
use serde::{Deserialize, Serialize};

/// The kind of a syntax node.
///
/// Kinds are deliberately coarse: the analysis core only needs to know
/// whether a node declares a name, references one, imports one, or is
/// structural filler. Language-specific detail stays in the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The root node of one compiled file.
    Unit,
    /// A class (or class-like type) declaration.
    Class,
    /// A method or function declaration.
    Method,
    /// A field declaration inside a class.
    Field,
    /// A local variable declaration.
    Variable,
    /// A method parameter declaration.
    Parameter,
    /// An import declaration binding an external type name.
    Import,
    /// A reference to a named declaration.
    Reference,
    /// A call expression.
    Call,
    /// A literal value.
    Literal,
    /// A block or other structural grouping.
    Block,
}

impl NodeKind {
    /// Whether nodes of this kind introduce a name into the symbol table.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Method
                | Self::Field
                | Self::Variable
                | Self::Parameter
                | Self::Import
        )
    }

    /// Specificity rank used to break ties between nodes with identical
    /// ranges: higher wins. Declarations beat the expressions that enclose
    /// them, and narrower declarations beat broader ones.
    pub fn specificity(self) -> u8 {
        match self {
            Self::Unit => 0,
            Self::Block => 1,
            Self::Literal => 2,
            Self::Call => 3,
            Self::Reference => 4,
            Self::Class => 5,
            Self::Method => 6,
            Self::Import => 7,
            Self::Field => 8,
            Self::Variable | Self::Parameter => 9,
        }
    }
}

/// A declared parameter of a method, carried for signature help.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSig {
    /// Parameter name.
    pub name: String,
    /// Declared type name, if the front end knows it.
    pub type_name: Option<String>,
}

impl ParamSig {
    /// Render as `name` or `name: Type`.
    pub fn render(&self) -> String {
        match &self.type_name {
            Some(ty) => format!("{}: {}", self.name, ty),
            None => self.name.clone(),
        }
    }
}

/// One node of a front-end syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Source range covered by the node.
    pub range: Range,
    /// Declared or referenced simple name, when the node has one.
    pub name: Option<String>,
    /// Fully qualified name, currently only set on imports.
    pub qualified_name: Option<String>,
    /// Declared type: field/variable/parameter type, or method return type.
    pub type_name: Option<String>,
    /// Declared parameters, only set on methods.
    pub params: Vec<ParamSig>,
    /// Child nodes in structural order.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Create a node with no name and no children.
    pub fn new(kind: NodeKind, range: Range) -> Self {
        Self {
            kind,
            range,
            name: None,
            qualified_name: None,
            type_name: None,
            params: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the simple name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the qualified name.
    #[must_use]
    pub fn with_qualified_name(mut self, name: impl Into<String>) -> Self {
        self.qualified_name = Some(name.into());
        self
    }

    /// Set the declared type name.
    #[must_use]
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Set the declared parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamSig>) -> Self {
        self.params = params;
        self
    }

    /// Append a child node.
    #[must_use]
    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::subtree_len).sum::<usize>()
    }
}
