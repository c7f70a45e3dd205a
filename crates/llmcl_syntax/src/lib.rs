#![doc = include_str!("../README.md")]

use crate::parser::error::{Diagnostic, SyntaxError, SyntaxResult};
use crate::tree::Node;
use tracing::debug;

pub mod lexer;
pub mod parser;
pub mod tree;

/// How the lexer and parser treat input they can not make sense of
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Skip unrecognized characters and absorb unbalanced braces, logging each at debug level
    #[default]
    Lenient,
    /// Fail with a [SyntaxError] holding every diagnostic
    Strict,
}

impl Mode {
    /// Applies this mode to the diagnostics of a stage
    pub fn check(self, diagnostics: Vec<Diagnostic>) -> SyntaxResult {
        match self {
            Mode::Lenient => {
                self.tolerate(diagnostics);
                Ok(())
            }
            Mode::Strict => SyntaxError::from_diagnostics(diagnostics).map_or(Ok(()), Err),
        }
    }

    fn tolerate(self, diagnostics: Vec<Diagnostic>) {
        for diagnostic in diagnostics {
            debug!("tolerated {diagnostic}");
        }
    }
}

/// Tokenizes and parses source text in the given mode.
pub fn syntactic_parse(source: &str, mode: Mode) -> SyntaxResult<Node> {
    let tokens = lexer::tokenize_with(source, mode)?;
    parser::parse_with(tokens, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::DiagnosticKind;
    use test_log::test;

    #[test]
    fn test_lenient_parse_of_malformed_source_never_fails() {
        for source in ["#c1{#c2", "}}}", "{{{", "@@@ %%% ###", "@v{#~$^}"] {
            syntactic_parse(source, Mode::Lenient).expect("lenient parsing never fails");
        }
    }

    #[test]
    fn test_strict_parse_stops_at_lexing() {
        let err = syntactic_parse("#c1 ! {", Mode::Strict).expect_err("bad character");
        assert_eq!(err.kind(), &DiagnosticKind::UnrecognizedCharacter('!'));
    }
}
