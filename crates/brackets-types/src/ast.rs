//! Template AST.
//!
//! A template parses to a [`Root`] holding text, statement and block
//! nodes. Chain segments (`elif`, `else`, …) never nest: they are stored
//! as an ordered, flat list on the block that owns them.

use crate::Span;

/// The root of a parsed template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Root {
    pub children: Vec<Node>,
}

impl Root {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A single template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, passed through verbatim.
    Text(TextNode),
    /// `{{ expr }}`
    Statement(StatementNode),
    /// `{{#name args}} … {{/name}}`
    Block(BlockNode),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Text(n) => n.span,
            Node::Statement(n) => n.span,
            Node::Block(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub span: Span,
}

/// An embedded expression whose value is appended to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementNode {
    /// Entity-decoded expression source.
    pub code: String,
    pub span: Span,
}

/// A block controlled by a registered command.
///
/// For chain segments `chain_blocks` is always empty; the owning block
/// carries every segment in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub name: String,
    /// Entity-decoded argument text following the command name.
    pub args: String,
    pub children: Vec<Node>,
    pub chain_blocks: Vec<BlockNode>,
    pub span: Span,
}

impl BlockNode {
    pub fn new(name: impl Into<String>, args: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
            children: Vec::new(),
            chain_blocks: Vec::new(),
            span,
        }
    }

    /// `true` when the block carries argument text.
    pub fn has_args(&self) -> bool {
        !self.args.trim().is_empty()
    }
}
