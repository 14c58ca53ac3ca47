//! Streaming, incremental JSON parsing with a continuously observable value
//! tree.
//!
//! Input arrives in arbitrarily-sized text chunks and the decoded tree is
//! valid at every chunk boundary: the latest chunk is already reflected, and
//! strings that are mid-parse can optionally be surfaced as partial values.
//! A placeholder tree seeded before parsing lets a consumer render a
//! skeleton that is progressively overwritten and trimmed as real data
//! arrives, and an optional event log records every structural mutation for
//! differential rendering.
//!
//! The pipeline has two resumable stages: a character-driven lexer that
//! emits at most two tokens per code point, and a token-driven parser that
//! maintains a context stack from the root down to the node currently being
//! populated. Splitting the input into chunks differently never changes the
//! outcome.
//!
//! Parsing is strict JSON with a few deliberate accommodations: raw control
//! characters inside strings are accepted, numbers are decoded with the
//! standard finite `f64` parse, trailing commas are rejected, and duplicate
//! object keys overwrite earlier values in place.

pub use error::{Error, Result, SyntaxError, SyntaxErrorKind, UsageError};
pub use event::{Event, EventKind, PathSegment};
pub use parser::{IncompleteStrings, JsonStreamParser, ParserOptions};
pub use stream::{parse, Observation, ParseStream};
pub use token::{LiteralValue, Location, Token, TokenKind};
pub use value::{JsonObject, JsonValue};

mod error;
mod event;
mod lexer;
mod parser;
mod stream;
mod token;
mod value;

/// Parse a complete input in one call, returning the final root value.
pub fn parse_complete(text: &str) -> Result<JsonValue> {
    let mut parser = JsonStreamParser::new();
    parser.push(text)?;
    parser.close()?;
    Ok(parser.value().clone())
}
