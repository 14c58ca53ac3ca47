use thiserror::Error as ThisError;

use crate::token::Location;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    /// A fault in the JSON input. The parser halts; it must be reset before
    /// it will accept input again.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A fault in how the parser was used, independent of the input.
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// An internal invariant was violated. Seeing this is a defect in the
    /// parser, not in the input or the caller.
    #[error("parser defect: {0}")]
    Bug(&'static str),
}

/// A syntax error in the input, pointing at the offending character or at
/// the start of an offending literal.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("{kind} at {location}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: Location,
}

impl SyntaxError {
    pub(crate) fn new(kind: SyntaxErrorKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// The human-readable message, without the location suffix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum SyntaxErrorKind {
    #[error("Unexpected token: \"{0}\"")]
    UnexpectedToken(&'static str),
    #[error("Unexpected value")]
    UnexpectedValue,
    #[error("Unknown literal value: {0}")]
    UnknownLiteralValue(String),
    #[error("Illegal escape sequence: \\{0}")]
    IllegalEscapeSequence(String),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Unterminated object")]
    UnterminatedObject,
    #[error("Unterminated array")]
    UnterminatedArray,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum UsageError {
    #[error("parser is already closed")]
    AlreadyClosed,
    #[error("parser halted by an earlier error and must be reset")]
    Halted,
    #[error("placeholder must be installed before any input is pushed")]
    PlaceholderAfterInput,
    #[error("event tracking is not enabled")]
    EventTrackingDisabled,
}
