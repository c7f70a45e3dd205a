//! Responsible with converting LLM-CL source text into a token stream

use crate::parser::error::{Diagnostic, DiagnosticKind, SyntaxResult};
use crate::Mode;
use llmcl_tokens::position::Position;
use llmcl_tokens::token::Token;
use std::str::Split;
use tracing::trace;

pub mod token_parsing;

use token_parsing::{longest_match, parse_insignificant};

/// Responsible with converting source text into a token stream.
///
/// Scans line by line. Whitespace is dropped, and a character no rule recognizes is skipped
/// and reported as an `Err` item, so the lexer itself never stops early.
///
/// # Examples
/// ```
/// # use llmcl_syntax::lexer::Lexer;
/// # use llmcl_tokens::token::TokenKind;
/// let kinds = Lexer::new("#c1 ~near ^prev1")
///     .filter_map(Result::ok)
///     .map(|token| token.kind())
///     .collect::<Vec<_>>();
/// assert_eq!(kinds, [TokenKind::Concept, TokenKind::Relation, TokenKind::Reference]);
/// ```
#[derive(Debug)]
pub struct Lexer<'s> {
    lines: Split<'s, char>,
    rest: &'s str,
    position: Position,
    next_line: usize,
    next_offset: usize,
}

impl<'s> Lexer<'s> {
    /// Creates a new lexer
    pub fn new(source: &'s str) -> Self {
        Self {
            lines: source.split('\n'),
            rest: "",
            position: Position::start(),
            next_line: 1,
            next_offset: 0,
        }
    }

    fn advance_line(&mut self) -> bool {
        match self.lines.next() {
            None => false,
            Some(line) => {
                self.rest = line;
                self.position = Position::new(self.next_line, 1, self.next_offset);
                self.next_line += 1;
                self.next_offset += line.len() + 1;
                true
            }
        }
    }

    fn bump(&mut self, text: &str) {
        self.rest = &self.rest[text.len()..];
        self.position = self.position.advance(text);
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Result<Token, Diagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while self.rest.is_empty() {
                if !self.advance_line() {
                    return None;
                }
            }

            let rest = self.rest;
            if let Ok((_, whitespace)) = parse_insignificant(rest) {
                self.bump(whitespace);
                continue;
            }

            let position = self.position;
            return match longest_match(rest) {
                Some((kind, text)) => {
                    self.bump(text);
                    trace!("lexed {kind:?} {text:?} at {position}");
                    Some(Ok(Token::new(kind, text, position)))
                }
                None => {
                    let skipped = rest.chars().next()?;
                    self.bump(&rest[..skipped.len_utf8()]);
                    Some(Err(Diagnostic::new(
                        DiagnosticKind::UnrecognizedCharacter(skipped),
                        position,
                    )))
                }
            };
        }
    }
}

/// Everything a full pass of the lexer observed
#[derive(Debug, Default)]
pub struct Scan {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scans the whole source, keeping both tokens and skipped characters
pub fn scan(source: &str) -> Scan {
    Lexer::new(source).fold(Scan::default(), |mut scan, next| {
        match next {
            Ok(token) => scan.tokens.push(token),
            Err(diagnostic) => scan.diagnostics.push(diagnostic),
        }
        scan
    })
}

/// Tokenizes source text, silently skipping anything unrecognized. Never fails.
pub fn tokenize(source: &str) -> Vec<Token> {
    let Scan {
        tokens,
        diagnostics,
    } = scan(source);
    Mode::Lenient.tolerate(diagnostics);
    tokens
}

/// Tokenizes source text, failing in [Mode::Strict] if any character was unrecognized
pub fn tokenize_with(source: &str, mode: Mode) -> SyntaxResult<Vec<Token>> {
    let Scan {
        tokens,
        diagnostics,
    } = scan(source);
    mode.check(diagnostics)?;
    Ok(tokens)
}
