use llmcl_tokens::position::Position;
use llmcl_tokens::SpannedError;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Something the lexer or parser tolerated in lenient mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, position: Position) -> Self {
        Self { kind, position }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)
    }
}

/// [Diagnostic] kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum DiagnosticKind {
    #[error("unrecognized character {0:?}")]
    UnrecognizedCharacter(char),
    #[error("unbalanced brace: {0}")]
    UnbalancedBrace(Brace),
}

/// Which side of a brace pair is missing its partner
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Brace {
    Open,
    Close,
}

impl Display for Brace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Brace::Open => write!(f, "'{{' is never closed"),
            Brace::Close => write!(f, "'}}' closes nothing"),
        }
    }
}

/// Represents the diagnostics of a strict-mode lex or parse.
///
/// The first diagnostic is the error itself, every following one is chained as its cause.
#[derive(Debug, thiserror::Error)]
#[error("syntax error: {0}")]
pub struct SyntaxError(SpannedError<DiagnosticKind, SyntaxError>);

impl SyntaxError {
    /// Creates a new error
    pub fn new(
        kind: DiagnosticKind,
        location: impl Into<Option<Position>>,
        cause: impl Into<Option<Self>>,
    ) -> Self {
        Self(SpannedError::new(kind, location, cause))
    }

    /// Chains diagnostics together in order, returning `None` if there are none
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Option<Self> {
        diagnostics
            .into_iter()
            .rev()
            .fold(None, |cause, diagnostic| {
                Some(Self::new(diagnostic.kind, diagnostic.position, cause))
            })
    }

    /// The kind of the first diagnostic
    pub fn kind(&self) -> &DiagnosticKind {
        self.0.error()
    }

    /// Flattens this error back into every diagnostic it carries, in order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        let mut next = Some(self);
        while let Some(error) = next {
            diagnostics.push(Diagnostic::new(
                error.0.error().clone(),
                error.0.location().unwrap_or_default(),
            ));
            next = error.0.cause();
        }
        diagnostics
    }
}

impl From<Diagnostic> for SyntaxError {
    fn from(value: Diagnostic) -> Self {
        Self::new(value.kind, value.position, None)
    }
}

pub type SyntaxResult<T = ()> = Result<T, SyntaxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_round_trips_diagnostics() {
        let diagnostics = vec![
            Diagnostic::new(
                DiagnosticKind::UnrecognizedCharacter('%'),
                Position::new(1, 4, 3),
            ),
            Diagnostic::new(
                DiagnosticKind::UnbalancedBrace(Brace::Open),
                Position::new(2, 1, 9),
            ),
        ];
        let error = SyntaxError::from_diagnostics(diagnostics.clone()).expect("not empty");
        assert_eq!(error.kind(), &DiagnosticKind::UnrecognizedCharacter('%'));
        assert_eq!(error.diagnostics(), diagnostics);
    }

    #[test]
    fn test_no_diagnostics_no_error() {
        assert!(SyntaxError::from_diagnostics(vec![]).is_none());
    }

    #[test]
    fn test_display() {
        let error = SyntaxError::from(Diagnostic::new(
            DiagnosticKind::UnbalancedBrace(Brace::Close),
            Position::new(1, 9, 8),
        ));
        assert_eq!(
            error.to_string(),
            "syntax error: unbalanced brace: '}' closes nothing\n  -> 1:9\n"
        );
    }
}
