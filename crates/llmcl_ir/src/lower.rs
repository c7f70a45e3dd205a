//! Lowers the parse tree into the intermediate representation

use crate::ir::{Concept, IrNode, Message, Named, Reference, DEFAULT_VERSION};
use llmcl_syntax::tree::{Node, NodeKind};
use tracing::trace;

/// Lowers a single parse tree node.
///
/// Returns `None` for version nodes. Their text is only read by the enclosing message, so they
/// are dropped from every children list.
pub fn lower(node: &Node) -> Option<IrNode> {
    let lowered = match node.kind() {
        NodeKind::Message => IrNode::Message(lower_message(node)),
        NodeKind::Version(_) => return None,
        NodeKind::Concept(text) => IrNode::Concept(lower_concept(text, node.children())),
        NodeKind::Relation(text) => IrNode::Relation(Named::new(
            strip_sigil(text, '~'),
            lower_children(node.children()),
        )),
        NodeKind::Quantifier(text) => IrNode::Quantifier(Named::new(
            strip_sigil(text, '$'),
            lower_children(node.children()),
        )),
        NodeKind::Reference(text) => IrNode::Reference(lower_reference(text)),
    };
    trace!("lowered {:?} to {lowered:?}", node.kind());
    Some(lowered)
}

/// Lowers a message node. The version comes from the first version child, if any.
pub fn lower_message(node: &Node) -> Message {
    let version = node
        .children()
        .iter()
        .find_map(|child| match child.kind() {
            NodeKind::Version(text) => Some(text.strip_prefix("@v").unwrap_or(text)),
            _ => None,
        })
        .unwrap_or(DEFAULT_VERSION);
    Message::new(version, lower_children(node.children()))
}

fn lower_children(children: &[Node]) -> Vec<IrNode> {
    children.iter().filter_map(lower).collect()
}

fn strip_sigil(text: &str, sigil: char) -> &str {
    text.strip_prefix(sigil).unwrap_or(text)
}

/// Splits `#<id>~<qualifier>` on the first `~` only
fn lower_concept(text: &str, children: &[Node]) -> Concept {
    let body = strip_sigil(text, '#');
    let (id, qualifier) = match body.split_once('~') {
        Some((id, qualifier)) => (id, Some(qualifier.to_string())),
        None => (body, None),
    };
    Concept::new(id, qualifier, lower_children(children))
}

/// Lowers reference text such as `^prev1.topic`, splitting the source from the path
pub fn lower_reference(text: &str) -> Reference {
    let mut parts = strip_sigil(text, '^').split('.');
    let source = parts.next().unwrap_or_default();
    Reference::new(source, parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmcl_syntax::lexer::tokenize;
    use llmcl_syntax::parser::parse;
    use test_log::test;

    fn lower_source(source: &str) -> Message {
        lower_message(&parse(tokenize(source)))
    }

    #[test]
    fn test_concept_splitting() {
        let message = lower_source("#c1~a~b #c2 #c3~");
        let IrNode::Concept(first) = &message.children[0] else {
            panic!("expected a concept, got {:?}", message.children[0]);
        };
        assert_eq!(first.id, "c1");
        assert_eq!(first.qualifier.as_deref(), Some("a~b"));

        let IrNode::Concept(second) = &first.children[0] else {
            panic!("expected a nested concept");
        };
        assert_eq!(second.id, "c2");
        assert_eq!(second.qualifier, None);

        let third = second.children[0].as_concept().expect("concept");
        assert_eq!(third.qualifier.as_deref(), Some(""));
    }

    #[test]
    fn test_version_is_read_and_dropped() {
        let message = lower_source("@v2.1{#c1}");
        assert_eq!(message.version, "2.1");
        assert_eq!(message.children.len(), 1);
    }

    #[test]
    fn test_first_version_wins() {
        let message = lower_source("@v3 @v4 #c1");
        assert_eq!(message.version, "3");
        assert_eq!(message.children.len(), 1);
    }

    #[test]
    fn test_missing_version_defaults() {
        assert_eq!(lower_source("#c1").version, DEFAULT_VERSION);
        assert_eq!(lower_source(""), Message::default());
    }

    #[test]
    fn test_nested_versions_are_dropped() {
        let message = lower_source("#c1{@v9}");
        assert_eq!(message.version, DEFAULT_VERSION);
        assert!(message.children[0].children().is_empty());
    }

    #[test]
    fn test_references() {
        let message = lower_source("^prev1.topic.name ^self ^");
        assert_eq!(
            message.children,
            vec![
                IrNode::Reference(Reference::new("prev1", ["topic", "name"])),
                IrNode::Reference(Reference::new("self", Vec::<String>::new())),
                IrNode::Reference(Reference::new("", Vec::<String>::new())),
            ]
        );
    }

    #[test]
    fn test_relations_and_quantifiers_strip_sigils() {
        let message = lower_source("~causes $many");
        assert_eq!(
            message.children,
            vec![IrNode::Relation(Named::new(
                "causes",
                [IrNode::Quantifier(Named::new("many", []))]
            ))]
        );
    }

    #[test]
    fn test_lower_root_is_message() {
        let tree = parse(tokenize("@v1.0"));
        assert_eq!(
            lower(&tree),
            Some(IrNode::Message(Message::new("1.0", [])))
        );
    }
}
