//! Turns IR back into notation

use crate::ir::{Concept, IrNode, Message, Named, Reference};

pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Pretty prints IR as indented notation.
///
/// A node with children opens a brace on its own line and closes it at its own indentation.
/// A node without children is written alone on its line.
///
/// # Examples
/// ```
/// # use llmcl_ir::ir::{Concept, IrNode, Message};
/// # use llmcl_ir::printer::Printer;
/// let message = IrNode::Message(Message::new(
///     "1.0",
///     [IrNode::Concept(Concept::new("c1", Some("topic".to_string()), []))],
/// ));
/// assert_eq!(Printer::default().generate(&message), "@v1.0{\n  #c1~topic\n}\n");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    indent_width: usize,
}

impl Printer {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }

    /// Generates the notation for a node and all of its descendants
    pub fn generate(&self, node: &IrNode) -> String {
        let mut buffer = String::new();
        self.write_node(&mut buffer, node, 0);
        buffer
    }

    fn indent(&self, buffer: &mut String, depth: usize) {
        buffer.extend(std::iter::repeat(' ').take(depth * self.indent_width));
    }

    fn write_node(&self, buffer: &mut String, node: &IrNode, depth: usize) {
        self.indent(buffer, depth);
        match node {
            IrNode::Message(Message { version, children }) => {
                buffer.push_str("@v");
                buffer.push_str(version);
                buffer.push_str("{\n");
                self.write_children(buffer, children, depth);
                self.indent(buffer, depth);
                buffer.push_str("}\n");
            }
            IrNode::Concept(Concept {
                id,
                qualifier,
                children,
            }) => {
                buffer.push('#');
                buffer.push_str(id);
                if let Some(qualifier) = qualifier {
                    buffer.push('~');
                    buffer.push_str(qualifier);
                }
                self.write_body(buffer, children, depth);
            }
            IrNode::Relation(Named { name, children }) => {
                buffer.push('~');
                buffer.push_str(name);
                self.write_body(buffer, children, depth);
            }
            IrNode::Quantifier(Named { name, children }) => {
                buffer.push('$');
                buffer.push_str(name);
                self.write_body(buffer, children, depth);
            }
            IrNode::Reference(Reference { source, path }) => {
                buffer.push('^');
                buffer.push_str(source);
                for segment in path {
                    buffer.push('.');
                    buffer.push_str(segment);
                }
                buffer.push('\n');
            }
        }
    }

    fn write_body(&self, buffer: &mut String, children: &[IrNode], depth: usize) {
        if children.is_empty() {
            buffer.push('\n');
        } else {
            buffer.push_str("{\n");
            self.write_children(buffer, children, depth);
            self.indent(buffer, depth);
            buffer.push_str("}\n");
        }
    }

    fn write_children(&self, buffer: &mut String, children: &[IrNode], depth: usize) {
        for child in children {
            self.write_node(buffer, child, depth + 1);
        }
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_WIDTH)
    }
}

/// Generates notation with the default indentation
pub fn generate(node: &IrNode) -> String {
    Printer::default().generate(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_message;
    use crate::normalize::normalize;
    use llmcl_syntax::lexer::tokenize;
    use llmcl_syntax::parser::parse;
    use test_log::test;

    fn round_trip(source: &str) -> String {
        let ir = IrNode::Message(lower_message(&parse(tokenize(source))));
        generate(&normalize(&ir))
    }

    #[test]
    fn test_nested_output() {
        let output = round_trip("@v1.0{#c501~approaches #c142~agi $quantity{3}}");
        assert_eq!(
            output,
            "@v1.0{\n  #c501~approaches{\n    #c142~agi{\n      $quantity\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_leaves() {
        let output = round_trip("^prev1.topic.name ~near");
        assert_eq!(output, "@v1.0{\n  ~near\n  ^prev1.topic.name\n}\n");
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(round_trip(""), "@v1.0{\n}\n");
    }

    #[test]
    fn test_custom_indent() {
        let message = IrNode::Message(Message::new(
            "2",
            [IrNode::Relation(Named::new(
                "causes",
                [IrNode::Quantifier(Named::new("all", []))],
            ))],
        ));
        assert_eq!(
            Printer::new(4).generate(&message),
            "@v2{\n    ~causes{\n        $all\n    }\n}\n"
        );
    }

    #[test]
    fn test_printing_normalized_ir_is_idempotent() {
        let ir = IrNode::Message(lower_message(&parse(tokenize(
            "@v1.0{#c1~x{^self} ~rel $q #c2 ^prev2.a}",
        ))));
        let once = normalize(&ir);
        assert_eq!(generate(&once), generate(&normalize(&once)));
    }

    #[test]
    fn test_output_of_malformed_source_reparses() {
        let output = round_trip("#c1{#c2");
        let reparsed = parse(tokenize(&output));
        assert_eq!(lower_message(&reparsed).children.len(), 1);
        assert_eq!(output, "@v1.0{\n  #c1{\n    #c2\n  }\n}\n");
    }
}
