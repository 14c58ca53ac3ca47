use rustc_hash::FxHashSet;

use crate::error::{Error, Result, SyntaxError, SyntaxErrorKind, UsageError};
use crate::event::{Event, EventKind, PathSegment};
use crate::lexer::Lexer;
use crate::token::{Location, Token, TokenKind};
use crate::value::{JsonObject, JsonValue};

/// How in-progress string values are exposed through
/// [`JsonStreamParser::value`] at chunk boundaries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IncompleteStrings {
    /// Strings appear in the tree only once their closing quote is seen.
    #[default]
    Off,
    /// The accumulated contents replace the target slot at every chunk
    /// boundary; the next chunk extends or finalizes them.
    Plain,
    /// Like `Plain`, with the given suffix appended (typically `"..."`) so a
    /// UI can mark the value as still streaming.
    WithSuffix(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParserOptions {
    pub incomplete_strings: IncompleteStrings,
    /// When enabled, every structural mutation of the tree is recorded and
    /// can be drained with [`JsonStreamParser::take_events`].
    pub track_events: bool,
}

/// The next lexical atom a container context expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Piece {
    PropertyName,
    Colon,
    Value,
    Comma,
}

/// One entry of the context stack: the container currently being populated,
/// or the string currently being accumulated.
#[derive(Debug)]
enum Frame {
    Array {
        index: usize,
        expected: Piece,
        is_empty: bool,
    },
    Object {
        /// The most recently consumed property name; the slot that the next
        /// value lands in once `expected` reaches `Value`.
        key: String,
        expected: Piece,
        is_empty: bool,
        /// Every property name consumed during this parse, used to trim
        /// untouched placeholder properties when the container closes.
        seen_keys: FxHashSet<String>,
    },
    String {
        buffer: String,
    },
}

impl Frame {
    fn array() -> Self {
        Frame::Array {
            index: 0,
            expected: Piece::Value,
            is_empty: true,
        }
    }

    fn object() -> Self {
        Frame::Object {
            key: String::new(),
            expected: Piece::PropertyName,
            is_empty: true,
            seen_keys: FxHashSet::default(),
        }
    }

    fn expected(&self) -> Option<Piece> {
        match self {
            Frame::Array { expected, .. } | Frame::Object { expected, .. } => Some(*expected),
            Frame::String { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContainerKind {
    Object,
    Array,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Open,
    Closed,
    Halted,
}

/// A resumable JSON parser whose decoded value tree is observable at any
/// point during parsing.
///
/// Input arrives in arbitrarily-sized chunks through [`push`]; splitting the
/// input differently never changes the outcome. [`value`] returns the root
/// of the live tree, already reflecting the latest chunk. A placeholder
/// installed before parsing is progressively overwritten and trimmed as real
/// data arrives.
///
/// [`push`]: JsonStreamParser::push
/// [`value`]: JsonStreamParser::value
pub struct JsonStreamParser {
    lexer: Lexer,
    /// The root slot, held as a one-element array so the bottom stack frame
    /// can address it with ordinary array logic.
    root: JsonValue,
    stack: Vec<Frame>,
    options: ParserOptions,
    events: Vec<Event>,
    has_placeholder: bool,
    started: bool,
    phase: Phase,
    #[cfg(feature = "debug-tracing")]
    token_trace: Vec<Token>,
}

impl Default for JsonStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStreamParser {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            lexer: Lexer::new(),
            root: JsonValue::Array(vec![JsonValue::Null]),
            stack: vec![Frame::array()],
            options,
            events: Vec::new(),
            has_placeholder: false,
            started: false,
            phase: Phase::Open,
            #[cfg(feature = "debug-tracing")]
            token_trace: Vec::new(),
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// The current root value. Always valid: before any input it is `Null`
    /// (or the placeholder), mid-parse it reflects everything consumed so
    /// far, and after a failure it retains the last consistent state.
    pub fn value(&self) -> &JsonValue {
        match &self.root {
            JsonValue::Array(slots) => &slots[0],
            _ => unreachable!("the root slot is always held in a one-element array"),
        }
    }

    /// Install an initial root value to act as a skeleton for the parse.
    /// Containers in the placeholder that the input also produces are reused
    /// in place, so properties and elements the input has not reached yet
    /// stay visible; they are trimmed once the enclosing container closes.
    pub fn set_placeholder(&mut self, value: JsonValue) -> Result<()> {
        if self.started {
            return Err(UsageError::PlaceholderAfterInput.into());
        }
        match &mut self.root {
            JsonValue::Array(slots) => slots[0] = value,
            _ => return Err(Error::Bug("root container is not an array")),
        }
        self.has_placeholder = true;
        Ok(())
    }

    /// Drain the accumulated event log.
    pub fn take_events(&mut self) -> Result<Vec<Event>> {
        if !self.options.track_events {
            return Err(UsageError::EventTrackingDisabled.into());
        }
        Ok(std::mem::take(&mut self.events))
    }

    /// Consume one chunk of input text. Behavior is identical no matter how
    /// the input is partitioned into chunks.
    pub fn push(&mut self, text: &str) -> Result<()> {
        self.guard_open()?;
        self.started = true;
        let result = self.push_inner(text);
        if result.is_err() {
            self.phase = Phase::Halted;
        }
        result
    }

    /// Finalize the parse: flush a trailing literal and verify that every
    /// container and string has been closed.
    pub fn close(&mut self) -> Result<()> {
        self.guard_open()?;
        self.started = true;
        let result = self.close_inner();
        self.phase = match result {
            Ok(()) => Phase::Closed,
            Err(_) => Phase::Halted,
        };
        result
    }

    /// Return to the freshly-constructed state: root `Null`, no placeholder,
    /// empty event log. Options are retained.
    pub fn reset(&mut self) {
        self.lexer.reset();
        self.root = JsonValue::Array(vec![JsonValue::Null]);
        self.stack.clear();
        self.stack.push(Frame::array());
        self.events.clear();
        self.has_placeholder = false;
        self.started = false;
        self.phase = Phase::Open;
        #[cfg(feature = "debug-tracing")]
        self.token_trace.clear();
    }

    fn guard_open(&self) -> Result<()> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Closed => Err(UsageError::AlreadyClosed.into()),
            Phase::Halted => Err(UsageError::Halted.into()),
        }
    }

    fn push_inner(&mut self, text: &str) -> Result<()> {
        for c in text.chars() {
            for token in self.lexer.push_char(c)? {
                self.consume_token(token)?;
            }
        }
        self.surface_incomplete_string()
    }

    fn close_inner(&mut self) -> Result<()> {
        if let Some(token) = self.lexer.close()? {
            self.consume_token(token)?;
        }
        if self.stack.len() > 1 {
            let kind = match self.stack.last() {
                Some(Frame::Object { .. }) => SyntaxErrorKind::UnterminatedObject,
                Some(Frame::Array { .. }) => SyntaxErrorKind::UnterminatedArray,
                Some(Frame::String { .. }) => SyntaxErrorKind::UnterminatedString,
                None => return Err(Error::Bug("context stack is empty")),
            };
            return Err(SyntaxError::new(kind, self.lexer.location()).into());
        }
        Ok(())
    }

    fn consume_token(&mut self, token: Token) -> Result<()> {
        #[cfg(feature = "debug-tracing")]
        self.token_trace.push(token.clone());

        let name = token.kind.display_name();
        let location = token.location;
        let unexpected =
            || Error::from(SyntaxError::new(SyntaxErrorKind::UnexpectedToken(name), location));

        match token.kind {
            TokenKind::Literal(literal) => self.set_value(literal.into_value(), location)?,
            TokenKind::StartObject => self.begin_container(ContainerKind::Object, location)?,
            TokenKind::StartArray => self.begin_container(ContainerKind::Array, location)?,
            TokenKind::EndObject => {
                let ok = match self.top()? {
                    Frame::Object {
                        expected, is_empty, ..
                    } => {
                        let required = if *is_empty {
                            Piece::PropertyName
                        } else {
                            Piece::Comma
                        };
                        *expected == required
                    }
                    _ => false,
                };
                if !ok {
                    return Err(unexpected());
                }
                self.close_container()?;
            }
            TokenKind::EndArray => {
                // The bottom frame is the synthetic root slot, never closable.
                let ok = self.stack.len() > 1
                    && match self.top()? {
                        Frame::Array {
                            expected, is_empty, ..
                        } => *is_empty || *expected != Piece::Value,
                        _ => false,
                    };
                if !ok {
                    return Err(unexpected());
                }
                self.close_container()?;
            }
            TokenKind::Colon => match self.top_mut()? {
                Frame::Object { expected, .. } if *expected == Piece::Colon => {
                    *expected = Piece::Value;
                }
                _ => return Err(unexpected()),
            },
            TokenKind::Comma => {
                if self.top()?.expected() != Some(Piece::Comma) {
                    return Err(unexpected());
                }
                self.advance()?;
            }
            TokenKind::StartString => {
                let allowed = match self.top()? {
                    Frame::Array { expected, .. } => *expected == Piece::Value,
                    Frame::Object { expected, .. } => {
                        matches!(*expected, Piece::Value | Piece::PropertyName)
                    }
                    Frame::String { .. } => false,
                };
                if !allowed {
                    return Err(unexpected());
                }
                self.stack.push(Frame::String {
                    buffer: String::new(),
                });
            }
            TokenKind::StringChunk(chunk) => match self.top_mut()? {
                Frame::String { buffer } => buffer.push_str(&chunk),
                _ => return Err(Error::Bug("string chunk outside of a string context")),
            },
            TokenKind::EndString(tail) => {
                let mut buffer = match self.stack.pop() {
                    Some(Frame::String { buffer }) => buffer,
                    _ => return Err(Error::Bug("string end outside of a string context")),
                };
                buffer.push_str(&tail);
                let is_property_name = matches!(
                    self.top()?,
                    Frame::Object {
                        expected: Piece::PropertyName,
                        ..
                    }
                );
                if is_property_name {
                    if let Frame::Object { key, expected, .. } = self.top_mut()? {
                        *key = buffer;
                        *expected = Piece::Colon;
                    }
                } else {
                    self.set_value(JsonValue::String(buffer), location)?;
                }
            }
        }
        Ok(())
    }

    /// Write `value` into the slot addressed by the current context, then
    /// step the context forward to expect a separator.
    fn set_value(&mut self, value: JsonValue, location: Location) -> Result<()> {
        if self.top()?.expected() != Some(Piece::Value) {
            return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedValue, location).into());
        }
        let event = self
            .options
            .track_events
            .then(|| Event::new(EventKind::Set, self.current_path()));
        let slot = Self::slot_mut(&mut self.root, &self.stack)?;
        *slot = value;
        self.finish_value(event)
    }

    fn begin_container(&mut self, kind: ContainerKind, location: Location) -> Result<()> {
        if self.top()?.expected() != Some(Piece::Value) {
            return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedValue, location).into());
        }
        let event = self
            .options
            .track_events
            .then(|| Event::new(EventKind::Begin, self.current_path()));
        let slot = Self::slot_mut(&mut self.root, &self.stack)?;
        // A compatible container already in the slot is a placeholder: keep
        // it, so entries the input has not reached yet stay visible.
        match (kind, &mut *slot) {
            (ContainerKind::Object, JsonValue::Object(_)) => {}
            (ContainerKind::Array, JsonValue::Array(_)) => {}
            (ContainerKind::Object, other) => *other = JsonValue::Object(JsonObject::default()),
            (ContainerKind::Array, other) => *other = JsonValue::Array(Vec::new()),
        }
        self.finish_value(event)?;
        self.stack.push(match kind {
            ContainerKind::Object => Frame::object(),
            ContainerKind::Array => Frame::array(),
        });
        Ok(())
    }

    fn finish_value(&mut self, event: Option<Event>) -> Result<()> {
        match self.top_mut()? {
            Frame::Array {
                expected, is_empty, ..
            }
            | Frame::Object {
                expected, is_empty, ..
            } => {
                *expected = Piece::Comma;
                *is_empty = false;
            }
            Frame::String { .. } => return Err(Error::Bug("cannot assign into a string context")),
        }
        if let Some(event) = event {
            self.events.push(event);
        }
        Ok(())
    }

    /// Step a container context past one completed element: arrays move to
    /// the next index, objects record the consumed key and await the next
    /// property name.
    fn advance(&mut self) -> Result<()> {
        match self.top_mut()? {
            Frame::Array {
                index, expected, ..
            } => {
                *index += 1;
                *expected = Piece::Value;
            }
            Frame::Object {
                key,
                expected,
                seen_keys,
                ..
            } => {
                seen_keys.insert(key.clone());
                *expected = Piece::PropertyName;
            }
            Frame::String { .. } => return Err(Error::Bug("cannot advance a string context")),
        }
        Ok(())
    }

    fn close_container(&mut self) -> Result<()> {
        let is_empty = match self.top()? {
            Frame::Array { is_empty, .. } | Frame::Object { is_empty, .. } => *is_empty,
            Frame::String { .. } => return Err(Error::Bug("cannot close a string context")),
        };
        // Normalize the final element into the bookkeeping so the array
        // length and seen-key set cover it.
        if !is_empty {
            self.advance()?;
        }
        if self.has_placeholder {
            self.trim_top_container()?;
        }
        self.stack.pop();
        if self.options.track_events {
            let path = self.current_path();
            self.events.push(Event::new(EventKind::End, path));
        }
        Ok(())
    }

    /// Remove placeholder leftovers from the container being closed: array
    /// elements past the last parsed index, and object properties never
    /// written by this parse.
    fn trim_top_container(&mut self) -> Result<()> {
        let frames = &self.stack[..self.stack.len().saturating_sub(1)];
        let container = Self::slot_mut_no_materialize(&mut self.root, frames)?;
        match (container, self.stack.last()) {
            (JsonValue::Array(items), Some(Frame::Array { index, .. })) => items.truncate(*index),
            (JsonValue::Object(map), Some(Frame::Object { seen_keys, .. })) => {
                map.retain(|key, _| seen_keys.contains(key));
            }
            _ => return Err(Error::Bug("context stack desynced from value tree")),
        }
        Ok(())
    }

    /// At a chunk boundary, expose the contents of a string that is still
    /// being lexed as the value of its destination slot. Context bookkeeping
    /// is untouched: the next token continues as if nothing happened, and no
    /// event is emitted.
    fn surface_incomplete_string(&mut self) -> Result<()> {
        let suffix: String = match &self.options.incomplete_strings {
            IncompleteStrings::Off => return Ok(()),
            IncompleteStrings::Plain => String::new(),
            IncompleteStrings::WithSuffix(suffix) => suffix.clone(),
        };
        if let Some(token) = self.lexer.flush_string() {
            self.consume_token(token)?;
        }
        let Some((Frame::String { buffer }, parents)) = self.stack.split_last() else {
            return Ok(());
        };
        // Only a string *value* is surfaced; a property name in progress
        // stays invisible until its closing quote.
        let parent_expects_value = matches!(
            parents.last(),
            Some(Frame::Array {
                expected: Piece::Value,
                ..
            }) | Some(Frame::Object {
                expected: Piece::Value,
                ..
            })
        );
        if !parent_expects_value {
            return Ok(());
        }
        let mut surfaced = String::with_capacity(buffer.len() + suffix.len());
        surfaced.push_str(buffer);
        surfaced.push_str(&suffix);
        let slot = Self::slot_mut(&mut self.root, parents)?;
        *slot = JsonValue::String(surfaced);
        Ok(())
    }

    fn top(&self) -> Result<&Frame> {
        self.stack.last().ok_or(Error::Bug("context stack is empty"))
    }

    fn top_mut(&mut self) -> Result<&mut Frame> {
        self.stack
            .last_mut()
            .ok_or(Error::Bug("context stack is empty"))
    }

    /// The path from the root to the slot the current context addresses.
    /// The synthetic bottom frame is excluded; the root itself is `[]`.
    fn current_path(&self) -> Vec<PathSegment> {
        self.stack[1..]
            .iter()
            .filter_map(|frame| match frame {
                Frame::Array { index, .. } => Some(PathSegment::Index(*index)),
                Frame::Object { key, .. } => Some(PathSegment::Key(key.clone())),
                Frame::String { .. } => None,
            })
            .collect()
    }

    /// Resolve the value slot addressed by a chain of container frames,
    /// descending from the root through each frame's current key. The final
    /// slot is materialized as `Null` if it does not exist yet.
    fn slot_mut<'a>(root: &'a mut JsonValue, frames: &[Frame]) -> Result<&'a mut JsonValue> {
        Self::descend(root, frames, true)
    }

    /// Like [`slot_mut`], but every step must already exist.
    ///
    /// [`slot_mut`]: JsonStreamParser::slot_mut
    fn slot_mut_no_materialize<'a>(
        root: &'a mut JsonValue,
        frames: &[Frame],
    ) -> Result<&'a mut JsonValue> {
        Self::descend(root, frames, false)
    }

    fn descend<'a>(
        root: &'a mut JsonValue,
        frames: &[Frame],
        materialize_last: bool,
    ) -> Result<&'a mut JsonValue> {
        let mut current = root;
        let last = frames.len().saturating_sub(1);
        for (depth, frame) in frames.iter().enumerate() {
            let at_last = depth == last;
            current = match (current, frame) {
                (JsonValue::Array(items), Frame::Array { index, .. }) => {
                    if materialize_last && at_last && *index == items.len() {
                        items.push(JsonValue::Null);
                    }
                    items
                        .get_mut(*index)
                        .ok_or(Error::Bug("array index out of range for context stack"))?
                }
                (JsonValue::Object(map), Frame::Object { key, .. }) => {
                    if materialize_last && at_last {
                        map.entry(key.clone()).or_insert(JsonValue::Null)
                    } else {
                        map.get_mut(key)
                            .ok_or(Error::Bug("object key missing for context stack"))?
                    }
                }
                _ => return Err(Error::Bug("context stack desynced from value tree")),
            };
        }
        Ok(current)
    }
}

#[cfg(feature = "debug-tracing")]
impl JsonStreamParser {
    /// Every token consumed so far, in order.
    pub fn debug_token_trace(&self) -> &[Token] {
        &self.token_trace
    }
}
