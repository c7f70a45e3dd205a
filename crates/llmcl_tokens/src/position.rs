//! Source positions for tokens and diagnostics

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A position within LLM-CL source text.
///
/// `line` and `column` are 1-based, the column counts characters and resets at the start of
/// every line. `offset` is the byte offset from the start of the whole source.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize)]
pub struct Position {
    line: usize,
    column: usize,
    offset: usize,
}

impl Position {
    /// Creates a new position
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The position of the very first character of a source
    pub const fn start() -> Self {
        Self::new(1, 1, 0)
    }

    #[inline]
    pub const fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub const fn column(&self) -> usize {
        self.column
    }

    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Gets the position `text` characters after this one, on the same line
    pub fn advance(&self, text: &str) -> Self {
        Self {
            line: self.line,
            column: self.column + text.chars().count(),
            offset: self.offset + text.len(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_counts_chars() {
        let p = Position::start().advance("#é1");
        assert_eq!(p.line(), 1);
        assert_eq!(p.column(), 4);
        assert_eq!(p.offset(), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(3, 7, 40).to_string(), "3:7");
    }
}
