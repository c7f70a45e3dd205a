//! The ordered rule table used by the lexer.
//!
//! Every rule is a `nom` parser anchored at the current position. The lexer asks every rule,
//! keeps the longest match and breaks ties by table order.

use llmcl_tokens::token::TokenKind;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::combinator::recognize;
use nom::error::{context, VerboseError};
use nom::sequence::preceded;
use nom::IResult;

type Result<'a, O = &'a str> = IResult<&'a str, O, VerboseError<&'a str>>;

/// A matcher recognizing the text of a single token at the start of its input
pub type Matcher = for<'a> fn(&'a str) -> Result<'a>;

/// A `(kind, matcher)` pair of the lexer table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: TokenKind,
    pub matcher: Matcher,
}

/// Rules in priority order
pub static RULES: [Rule; 7] = [
    Rule {
        kind: TokenKind::Version,
        matcher: parse_version,
    },
    Rule {
        kind: TokenKind::Concept,
        matcher: parse_concept,
    },
    Rule {
        kind: TokenKind::Relation,
        matcher: parse_relation,
    },
    Rule {
        kind: TokenKind::Quantifier,
        matcher: parse_quantifier,
    },
    Rule {
        kind: TokenKind::Reference,
        matcher: parse_reference,
    },
    Rule {
        kind: TokenKind::Open,
        matcher: parse_open,
    },
    Rule {
        kind: TokenKind::Close,
        matcher: parse_close,
    },
];

/// Finds the longest rule match at the start of `src`.
///
/// Returns `None` if no rule matches.
pub fn longest_match(src: &str) -> Option<(TokenKind, &str)> {
    RULES.iter().fold(None, |best, rule| match (rule.matcher)(src) {
        Ok((_, matched)) => match best {
            Some((_, longest)) if longest.len() >= matched.len() => best,
            _ => Some((rule.kind, matched)),
        },
        Err(_) => best,
    })
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn parse_version(src: &str) -> Result {
    context(
        "version",
        recognize(preceded(
            tag("@v"),
            take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        )),
    )(src)
}

fn parse_concept(src: &str) -> Result {
    context(
        "concept",
        recognize(preceded(tag("#"), take_while(|c: char| is_word(c) || c == '~'))),
    )(src)
}

fn parse_relation(src: &str) -> Result {
    context("relation", recognize(preceded(tag("~"), take_while(is_word))))(src)
}

fn parse_quantifier(src: &str) -> Result {
    context(
        "quantifier",
        recognize(preceded(tag("$"), take_while(is_word))),
    )(src)
}

fn parse_reference(src: &str) -> Result {
    context(
        "reference",
        recognize(preceded(
            tag("^"),
            take_while(|c: char| is_word(c) || c == '.' || c == '#'),
        )),
    )(src)
}

fn parse_open(src: &str) -> Result {
    context("open", tag("{"))(src)
}

fn parse_close(src: &str) -> Result {
    context("close", tag("}"))(src)
}

/// Recognizes a run of whitespace, which never becomes a token
pub fn parse_insignificant(src: &str) -> Result {
    context("insignificant", take_while1(char::is_whitespace))(src)
}
