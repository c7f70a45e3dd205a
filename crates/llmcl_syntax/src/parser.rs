//! Builds the parse tree from a token stream

use crate::tree::{Node, NodeKind};
use crate::Mode;
use llmcl_tokens::position::Position;
use llmcl_tokens::token::{Token, TokenKind};
use tracing::trace;

pub mod error;

pub use error::*;

/// Creates the parse tree from a token stream in a single pass.
///
/// The parser keeps a stack of open containers above the implicit `Message` root. Concept,
/// relation and quantifier tokens are appended to the innermost container and become the new
/// innermost container themselves, so nesting follows token adjacency. Versions and references
/// are attached as leaves. A `Close` pops one container, never the root. Braces are tracked
/// separately only to report imbalance.
///
/// # Examples
/// ```
/// # use llmcl_syntax::lexer::tokenize;
/// # use llmcl_syntax::parser::Parser;
/// let mut parser = Parser::new();
/// parser.extend(tokenize("#c1 #c2"));
/// let parsed = parser.finish();
/// assert_eq!(parsed.tree.children().len(), 1);
/// assert_eq!(parsed.tree.children()[0].children().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    root: Node,
    containers: Vec<Node>,
    open_braces: Vec<Position>,
    diagnostics: Vec<Diagnostic>,
}

/// The finished tree, along with anything the parser tolerated on the way
#[derive(Debug)]
pub struct Parsed {
    pub tree: Node,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Creates a parser with only the message root open
    pub fn new() -> Self {
        Self::default()
    }

    fn innermost(&mut self) -> &mut Node {
        self.containers.last_mut().unwrap_or(&mut self.root)
    }

    fn close_container(&mut self) {
        if let Some(closed) = self.containers.pop() {
            self.innermost().push(closed);
        }
    }

    /// Feeds a single token to the parser
    pub fn push_token(&mut self, token: Token) {
        trace!("parsing {token:?} at depth {}", self.containers.len());
        let position = token.position();
        match token.kind() {
            TokenKind::Version => {
                let leaf = Node::new(NodeKind::Version(token.into_text()));
                self.innermost().push(leaf);
            }
            TokenKind::Reference => {
                let leaf = Node::new(NodeKind::Reference(token.into_text()));
                self.innermost().push(leaf);
            }
            TokenKind::Concept => self
                .containers
                .push(Node::new(NodeKind::Concept(token.into_text()))),
            TokenKind::Relation => self
                .containers
                .push(Node::new(NodeKind::Relation(token.into_text()))),
            TokenKind::Quantifier => self
                .containers
                .push(Node::new(NodeKind::Quantifier(token.into_text()))),
            TokenKind::Open => self.open_braces.push(position),
            TokenKind::Close => {
                if self.open_braces.pop().is_none() {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnbalancedBrace(Brace::Close),
                        position,
                    ));
                }
                self.close_container();
            }
        }
    }

    /// Folds every container still open into its parent and hands out the tree
    pub fn finish(mut self) -> Parsed {
        while !self.containers.is_empty() {
            self.close_container();
        }
        let mut diagnostics = self.diagnostics;
        diagnostics.extend(
            self.open_braces
                .into_iter()
                .map(|open| Diagnostic::new(DiagnosticKind::UnbalancedBrace(Brace::Open), open)),
        );
        diagnostics.sort_by_key(|diagnostic| diagnostic.position);
        Parsed {
            tree: self.root,
            diagnostics,
        }
    }
}

impl Extend<Token> for Parser {
    fn extend<T: IntoIterator<Item = Token>>(&mut self, iter: T) {
        iter.into_iter().for_each(|token| self.push_token(token));
    }
}

impl FromIterator<Token> for Parser {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        let mut parser = Parser::new();
        parser.extend(iter);
        parser
    }
}

/// Parses a token stream, absorbing unbalanced braces. Never fails.
pub fn parse<I: IntoIterator<Item = Token>>(tokens: I) -> Node {
    let Parsed { tree, diagnostics } = Parser::from_iter(tokens).finish();
    Mode::Lenient.tolerate(diagnostics);
    tree
}

/// Parses a token stream, failing in [Mode::Strict] on unbalanced braces
pub fn parse_with<I: IntoIterator<Item = Token>>(tokens: I, mode: Mode) -> SyntaxResult<Node> {
    let Parsed { tree, diagnostics } = Parser::from_iter(tokens).finish();
    mode.check(diagnostics)?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use test_log::test;

    fn concept(text: &str, children: Vec<Node>) -> Node {
        Node::with_children(NodeKind::Concept(text.to_string()), children)
    }

    #[test]
    fn test_adjacent_containers_nest() {
        let tree = parse(tokenize("@v1.0{#c501~approaches #c142~agi $quantity{3}}"));
        let expected = Node::with_children(
            NodeKind::Message,
            [
                Node::new(NodeKind::Version("@v1.0".to_string())),
                concept(
                    "#c501~approaches",
                    vec![concept(
                        "#c142~agi",
                        vec![Node::new(NodeKind::Quantifier("$quantity".to_string()))],
                    )],
                ),
            ],
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_close_separates_siblings() {
        let tree = parse(tokenize("#c1{#c2}}#c3"));
        let children = tree.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].value(), Some("#c1"));
        assert_eq!(children[0].children()[0].value(), Some("#c2"));
        assert_eq!(children[1].value(), Some("#c3"));
    }

    #[test]
    fn test_references_and_versions_are_leaves() {
        let tree = parse(tokenize("~causes ^prev1.topic #c9"));
        let relation = &tree.children()[0];
        assert_eq!(relation.kind(), &NodeKind::Relation("~causes".to_string()));
        assert_eq!(
            relation.children(),
            &[
                Node::new(NodeKind::Reference("^prev1.topic".to_string())),
                concept("#c9", vec![]),
            ]
        );
    }

    #[test]
    fn test_close_past_root_is_ignored() {
        let tree = parse(tokenize("}}#c1}}}"));
        assert_eq!(tree.children(), &[concept("#c1", vec![])]);
    }

    #[test]
    fn test_lenient_on_unbalanced_open() {
        let tree = parse(tokenize("#c1{#c2"));
        assert_eq!(
            tree.children(),
            &[concept("#c1", vec![concept("#c2", vec![])])]
        );
    }

    #[test]
    fn test_empty_input_is_empty_message() {
        assert_eq!(parse(tokenize("")), Node::message());
    }

    #[test]
    fn test_strict_reports_unmatched_open() {
        let err = parse_with(tokenize("@v1.0{\n  #c1{\n}"), Mode::Strict)
            .expect_err("one brace is never closed");
        let diagnostics = err.diagnostics();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new(
                DiagnosticKind::UnbalancedBrace(Brace::Open),
                Position::new(1, 6, 5)
            )]
        );
    }

    #[test]
    fn test_strict_reports_stray_close() {
        let err = parse_with(tokenize("#c1}"), Mode::Strict).expect_err("stray close");
        assert_eq!(
            err.kind(),
            &DiagnosticKind::UnbalancedBrace(Brace::Close)
        );
    }

    #[test]
    fn test_strict_accepts_balanced() {
        let tree = parse_with(tokenize("@v1.0{#c1{^self}}"), Mode::Strict).expect("balanced");
        assert_eq!(tree.depth(), 3);
    }
}
