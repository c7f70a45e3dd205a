//! The intermediate representation, one record per notation element

use serde::Serialize;

/// The version a message gets when its source names none
pub const DEFAULT_VERSION: &str = "1.0";

/// A node of the intermediate representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrNode {
    Message(Message),
    Concept(Concept),
    Relation(Named),
    Quantifier(Named),
    Reference(Reference),
}

impl IrNode {
    /// The children of this node, always empty for a reference
    pub fn children(&self) -> &[IrNode] {
        match self {
            IrNode::Message(Message { children, .. })
            | IrNode::Concept(Concept { children, .. })
            | IrNode::Relation(Named { children, .. })
            | IrNode::Quantifier(Named { children, .. }) => children,
            IrNode::Reference(_) => &[],
        }
    }

    /// Where this node sorts among its siblings after normalization. Lower sorts first.
    pub fn precedence(&self) -> u8 {
        match self {
            IrNode::Concept(_) => 0,
            IrNode::Relation(_) => 1,
            IrNode::Quantifier(_) => 2,
            IrNode::Reference(_) => 3,
            IrNode::Message(_) => 4,
        }
    }

    /// Gets this node as a concept, if it is one
    pub fn as_concept(&self) -> Option<&Concept> {
        if let IrNode::Concept(concept) = self {
            Some(concept)
        } else {
            None
        }
    }

    /// Visits this node and every descendant, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a IrNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// The root of every program
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    pub version: String,
    pub children: Vec<IrNode>,
}

impl Message {
    pub fn new<I: IntoIterator<Item = IrNode>>(version: impl Into<String>, children: I) -> Self {
        Self {
            version: version.into(),
            children: children.into_iter().collect(),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION, [])
    }
}

/// A concept with an optional qualifier, written `#<id>~<qualifier>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Concept {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    pub children: Vec<IrNode>,
}

impl Concept {
    pub fn new<I: IntoIterator<Item = IrNode>>(
        id: impl Into<String>,
        qualifier: Option<String>,
        children: I,
    ) -> Self {
        Self {
            id: id.into(),
            qualifier,
            children: children.into_iter().collect(),
        }
    }
}

/// A relation or quantifier, which only carry a name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Named {
    pub name: String,
    pub children: Vec<IrNode>,
}

impl Named {
    pub fn new<I: IntoIterator<Item = IrNode>>(name: impl Into<String>, children: I) -> Self {
        Self {
            name: name.into(),
            children: children.into_iter().collect(),
        }
    }
}

/// A reference to earlier context, written `^<source>.<path>...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    pub source: String,
    pub path: Vec<String>,
}

impl Reference {
    pub fn new<I, S>(source: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: source.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }
}
