use crate::error::Result;
use crate::event::Event;
use crate::parser::{JsonStreamParser, ParserOptions};
use crate::value::JsonValue;

/// One snapshot of parsing progress: the root value with the latest chunk
/// applied, the events recorded since the previous observation, and whether
/// the stream has ended.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub root: JsonValue,
    pub events: Vec<Event>,
    pub done: bool,
}

/// Lazily parse an iterator of text chunks.
///
/// The returned iterator yields one [`Observation`] per input chunk and a
/// final one with `done == true` after the input is exhausted and the parse
/// has been closed. This is the recommended interface for UI consumers that
/// re-render on every chunk.
pub fn parse<I>(chunks: I, options: ParserOptions) -> ParseStream<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    ParseStream {
        parser: JsonStreamParser::with_options(options),
        chunks: chunks.into_iter(),
        finished: false,
    }
}

pub struct ParseStream<I> {
    parser: JsonStreamParser,
    chunks: I,
    finished: bool,
}

impl<I> ParseStream<I> {
    fn observe(&mut self, done: bool) -> Result<Observation> {
        let events = if self.parser.options().track_events {
            self.parser.take_events()?
        } else {
            Vec::new()
        };
        Ok(Observation {
            root: self.parser.value().clone(),
            events,
            done,
        })
    }
}

impl<I> Iterator for ParseStream<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let step = match self.chunks.next() {
            Some(chunk) => self.parser.push(chunk.as_ref()).map(|()| false),
            None => {
                self.finished = true;
                self.parser.close().map(|()| true)
            }
        };
        let item = step.and_then(|done| self.observe(done));
        if item.is_err() {
            self.finished = true;
        }
        Some(item)
    }
}

impl<I> std::iter::FusedIterator for ParseStream<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}
