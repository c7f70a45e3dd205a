//! A lexical token from LLM-CL source text

use crate::position::Position;
use serde::Serialize;
use std::fmt::{Debug, Formatter};

/// A lexical token from LLM-CL source text
#[derive(Clone, Serialize)]
pub struct Token {
    kind: TokenKind,
    text: String,
    position: Position,
}

impl Token {
    /// Creates a new token
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Gets the kind for this token
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The exact source text of this token, sigil included
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.position.line()
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.position.column()
    }

    /// Consumes this token, returning its text
    pub fn into_text(self) -> String {
        self.text
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Open | TokenKind::Close => write!(f, "{:?}", self.kind),
            kind => write!(f, "{kind:?}({:?})", self.text),
        }
    }
}

/// Tokens are equal when their kind and text are, wherever they appear in the source
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}

impl Eq for Token {}

/// The kind for a token
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// `@v1.0`
    Version,
    /// `#c142`, `#c501~approaches`
    Concept,
    /// `~causes`
    Relation,
    /// `$quantity`
    Quantifier,
    /// `^prev1.topic`
    Reference,
    /// `{`
    Open,
    /// `}`
    Close,
}

impl TokenKind {
    /// The leading text identifying this kind of token
    pub const fn sigil(&self) -> &'static str {
        match self {
            TokenKind::Version => "@v",
            TokenKind::Concept => "#",
            TokenKind::Relation => "~",
            TokenKind::Quantifier => "$",
            TokenKind::Reference => "^",
            TokenKind::Open => "{",
            TokenKind::Close => "}",
        }
    }

    /// Checks if this kind only marks structure and names nothing
    pub const fn is_brace(&self) -> bool {
        matches!(self, TokenKind::Open | TokenKind::Close)
    }
}
