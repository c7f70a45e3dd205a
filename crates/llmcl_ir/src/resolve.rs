//! Responsible for resolving references against earlier messages of a conversation

use crate::ir::{Concept, IrNode, Message, Reference};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::trace;

/// How many messages a [ContextBuffer] keeps by default
pub const DEFAULT_CONTEXT_SIZE: usize = 10;

/// Source naming the latest message in context
pub const SELF_SOURCE: &str = "self";
/// Source naming knowledge shared outside of the conversation
pub const SHARED_SOURCE: &str = "shared";
/// Prefix of sources counting back from the latest message, `prev1` being the latest
pub const PREV_SOURCE_PREFIX: &str = "prev";

/// The earlier messages that references point into, oldest first.
///
/// The buffer is bounded. Pushing a message past its capacity evicts the oldest one.
///
/// # Examples
/// ```
/// # use llmcl_ir::ir::{Concept, IrNode, Message, Reference};
/// # use llmcl_ir::resolve::{ContextBuffer, Resolved};
/// let mut context = ContextBuffer::default();
/// context.push(Message::new(
///     "1.0",
///     [IrNode::Concept(Concept::new("c142", Some("agi".to_string()), []))],
/// ));
/// let reference = Reference::new("prev1", ["#c142"]);
/// let Ok(Resolved::Node(node)) = context.resolve(&reference) else {
///     panic!("should resolve");
/// };
/// assert_eq!(node.as_concept().map(|c| c.id.as_str()), Some("c142"));
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuffer {
    messages: VecDeque<Message>,
    capacity: usize,
}

/// What a reference resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// The reference had no path and named a whole message
    Message(&'a Message),
    Node(&'a IrNode),
    /// Shared knowledge is not held here, so only the requested path is handed back
    Shared(&'a [String]),
}

/// Why a reference could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("there is no earlier message to resolve against")]
    EmptyContext,
    #[error("{0:?} does not count back by a positive number")]
    InvalidPrevIndex(String),
    #[error("prev{back} reaches past the {available} messages in context")]
    PrevOutOfRange { back: usize, available: usize },
    #[error("unknown reference source {0:?}")]
    UnknownSource(String),
    #[error("nothing matches path segment {0:?}")]
    SegmentNotFound(String),
}

impl ContextBuffer {
    /// Creates an empty buffer keeping at most `capacity` messages
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Adds the newest message, evicting the oldest ones past capacity
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
            trace!("evicted the oldest message from context");
        }
    }

    /// The latest message, the one `self` references resolve against
    pub fn latest(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// The message `back` steps from the end, `1` being the latest
    pub fn prev(&self, back: usize) -> Option<&Message> {
        if back == 0 {
            return None;
        }
        let index = self.messages.len().checked_sub(back)?;
        self.messages.get(index)
    }

    /// Every message in context, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Resolves a single reference.
    ///
    /// After the source picks a message, every path segment picks one child of the node found
    /// so far:
    /// - `#<tag>` matches the first concept whose `id~qualifier` text starts with the tag, or
    ///   whose qualifier is the tag
    /// - a number is a child index
    /// - anything else matches a concept id or qualifier, or a relation or quantifier name
    pub fn resolve<'a>(&'a self, reference: &'a Reference) -> Result<Resolved<'a>, ResolveError> {
        let source = reference.source.as_str();
        let message = if source == SELF_SOURCE {
            self.latest().ok_or(ResolveError::EmptyContext)?
        } else if source == SHARED_SOURCE {
            return Ok(Resolved::Shared(&reference.path));
        } else if let Some(index) = source.strip_prefix(PREV_SOURCE_PREFIX) {
            let back = parse_index(index)
                .filter(|back| *back > 0)
                .ok_or_else(|| ResolveError::InvalidPrevIndex(source.to_string()))?;
            self.prev(back).ok_or(ResolveError::PrevOutOfRange {
                back,
                available: self.len(),
            })?
        } else {
            return Err(ResolveError::UnknownSource(source.to_string()));
        };
        resolve_path(message, &reference.path)
    }

    /// Resolves every reference in a node and its descendants, in tree order
    pub fn resolve_all<'a>(
        &'a self,
        node: &'a IrNode,
    ) -> Vec<(&'a Reference, Result<Resolved<'a>, ResolveError>)> {
        let mut resolutions = vec![];
        node.walk(&mut |node| {
            if let IrNode::Reference(reference) = node {
                resolutions.push((reference, self.resolve(reference)));
            }
        });
        resolutions
    }
}

impl Default for ContextBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_SIZE)
    }
}

fn parse_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn resolve_path<'a>(message: &'a Message, path: &[String]) -> Result<Resolved<'a>, ResolveError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(Resolved::Message(message));
    };
    let mut current = find_child(&message.children, first)?;
    for segment in rest {
        current = find_child(current.children(), segment)?;
    }
    Ok(Resolved::Node(current))
}

fn find_child<'a>(children: &'a [IrNode], segment: &str) -> Result<&'a IrNode, ResolveError> {
    let found = if let Some(tag) = segment.strip_prefix('#') {
        children.iter().find(|child| {
            child
                .as_concept()
                .is_some_and(|concept| matches_tag(concept, tag))
        })
    } else if let Some(index) = parse_index(segment) {
        children.get(index)
    } else {
        children.iter().find(|child| is_named(child, segment))
    };
    found.ok_or_else(|| ResolveError::SegmentNotFound(segment.to_string()))
}

fn matches_tag(concept: &Concept, tag: &str) -> bool {
    let text = match &concept.qualifier {
        Some(qualifier) => format!("{}~{qualifier}", concept.id),
        None => concept.id.clone(),
    };
    text.starts_with(tag) || concept.qualifier.as_deref() == Some(tag)
}

fn is_named(node: &IrNode, name: &str) -> bool {
    match node {
        IrNode::Concept(concept) => {
            concept.id == name || concept.qualifier.as_deref() == Some(name)
        }
        IrNode::Relation(named) | IrNode::Quantifier(named) => named.name == name,
        IrNode::Message(_) | IrNode::Reference(_) => false,
    }
}
