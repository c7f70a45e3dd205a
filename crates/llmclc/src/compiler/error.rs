//! An llmcl compilation error

use crate::compiler::analysis::AnalysisError;
use itertools::Itertools as _;
use llmcl_syntax::parser::SyntaxError;
use llmcl_tokens::position::Position;
use llmcl_tokens::SpannedError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The kind of error
#[derive(Debug, Error)]
pub enum LlmclCErrorKind {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{}", .0.iter().join("\n"))]
    Multi(Vec<LlmclCError>),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("while compiling {0:?}")]
    InFile(PathBuf),
    #[error("compile job for {0:?} never finished")]
    Unfinished(PathBuf),
}

/// An error occurred while attempting to compile llmcl source
#[derive(Debug, Error)]
#[error(transparent)]
pub struct LlmclCError(#[from] SpannedError<LlmclCErrorKind, LlmclCError>);

impl LlmclCError {
    /// Creates a new [LlmclCError] using a quick constructor
    #[inline]
    pub fn new(
        error: impl Into<LlmclCErrorKind>,
        location: impl Into<Option<Position>>,
        caused_by: impl Into<Option<LlmclCError>>,
    ) -> Self {
        Self(SpannedError::new(error.into(), location, caused_by))
    }

    /// Wraps this error with the file it came from
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::new(LlmclCErrorKind::InFile(path.into()), None, self)
    }

    pub fn kind(&self) -> &LlmclCErrorKind {
        self.0.error()
    }

    /// The error this one wraps, if any
    pub fn cause(&self) -> Option<&LlmclCError> {
        self.0.cause()
    }

    /// Follows the cause chain down to the error that started it
    pub fn root(&self) -> &LlmclCError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }
}

impl<T> From<T> for LlmclCError
where
    LlmclCErrorKind: From<T>,
{
    fn from(value: T) -> Self {
        Self(SpannedError::new(LlmclCErrorKind::from(value), None, None))
    }
}

impl From<Vec<LlmclCError>> for LlmclCErrorKind {
    fn from(value: Vec<LlmclCError>) -> Self {
        LlmclCErrorKind::Multi(value)
    }
}

/// A type alias for general results in llmclc
pub type LlmclCResult<T> = Result<T, LlmclCError>;
