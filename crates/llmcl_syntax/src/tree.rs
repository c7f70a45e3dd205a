//! The parse tree produced by the [Parser](crate::parser::Parser)

use serde::Serialize;

/// A node of the parse tree.
///
/// Children are kept in source order. The tree is never mutated once the parser hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    /// Creates a node with no children
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: vec![],
        }
    }

    /// Creates an empty message, the root of every tree
    pub fn message() -> Self {
        Self::new(NodeKind::Message)
    }

    /// Creates a node with the given children
    pub fn with_children<I: IntoIterator<Item = Node>>(kind: NodeKind, children: I) -> Self {
        Self {
            kind,
            children: children.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// The token text this node was created from, `None` for a message
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Message => None,
            NodeKind::Version(value)
            | NodeKind::Concept(value)
            | NodeKind::Relation(value)
            | NodeKind::Quantifier(value)
            | NodeKind::Reference(value) => Some(value),
        }
    }

    /// Counts this node and all of its descendants
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// The number of nodes on the longest path from this node to a leaf
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::message()
    }
}

/// The kind of a parse tree node, carrying the full token text (sigil included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeKind {
    Message,
    Version(String),
    Concept(String),
    Relation(String),
    Quantifier(String),
    Reference(String),
}
