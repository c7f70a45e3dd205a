#![doc = include_str!("../README.md")]

use crate::position::Position;
use std::fmt::{Display, Formatter};

pub mod position;
pub mod token;

/// An error with a location
#[derive(Debug, thiserror::Error)]
pub struct SpannedError<E, C> {
    error: E,
    location: Option<Position>,
    cause: Option<Box<C>>,
}

impl<E, C> SpannedError<E, C> {
    pub fn new(
        error: E,
        location: impl Into<Option<Position>>,
        cause: impl Into<Option<C>>,
    ) -> Self {
        Self {
            error,
            location: location.into(),
            cause: cause.into().map(Box::new),
        }
    }

    /// The error itself, without location or cause
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Where in the source the error occurred, if known
    pub fn location(&self) -> Option<Position> {
        self.location
    }

    /// The error this one was caused by, or chained after
    pub fn cause(&self) -> Option<&C> {
        self.cause.as_deref()
    }
}

impl<E: Display, C: Display> Display for SpannedError<E, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.error)?;
        if let Some(location) = &self.location {
            writeln!(f, "  -> {location}")?;
        }
        if let Some(cause) = &self.cause {
            cause.fmt(f)?;
        }

        Ok(())
    }
}
