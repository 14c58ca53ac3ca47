use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::token::{LiteralValue, Location, Token, TokenKind};

/// Fixed-capacity output area for [`Lexer::push_char`].
///
/// A single character can finish a pending literal and itself form a
/// structural token (`5}` produces a literal and an object end), so one call
/// yields at most two tokens. Holding them in an inline pair avoids a heap
/// allocation per character.
#[derive(Debug, Default)]
pub(crate) struct TokenBuf {
    slots: [Option<Token>; 2],
}

impl TokenBuf {
    fn push(&mut self, token: Token) {
        if self.slots[0].is_none() {
            self.slots[0] = Some(token);
        } else if self.slots[1].is_none() {
            self.slots[1] = Some(token);
        } else {
            debug_assert!(false, "a single character produced more than two tokens");
        }
    }
}

impl IntoIterator for TokenBuf {
    type Item = Token;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<Token>, 2>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter().flatten()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LexerMode {
    #[default]
    Main,
    String,
    EscapeSequence,
    UnicodeEscapeSequence,
}

const UNICODE_ESCAPE_LEN: usize = 4;

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// The character-driven half of the pipeline.
///
/// The lexer consumes one code point at a time and never looks ahead, which
/// is what lets a chunk end anywhere — including in the middle of a string,
/// a literal, or an escape sequence — and resume on the next call with
/// behavior identical to having seen the whole input at once.
pub(crate) struct Lexer {
    mode: LexerMode,
    string_buffer: String,
    literal_buffer: String,
    /// Location of the first character of `literal_buffer`, so that errors
    /// about a literal point at its start rather than at the character that
    /// flushed it.
    literal_start: Location,
    unicode_buffer: String,
    /// A decoded high surrogate waiting to see whether the next escape
    /// completes the pair.
    pending_high_surrogate: Option<u16>,
    location: Location,
    last_char_is_cr: bool,
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            mode: LexerMode::Main,
            string_buffer: String::new(),
            literal_buffer: String::new(),
            literal_start: Location::start(),
            unicode_buffer: String::with_capacity(UNICODE_ESCAPE_LEN),
            pending_high_surrogate: None,
            location: Location::start(),
            last_char_is_cr: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Consume one code point, producing zero, one, or two tokens.
    pub fn push_char(&mut self, c: char) -> Result<TokenBuf, SyntaxError> {
        self.advance_location(c);
        let mut out = TokenBuf::default();
        match self.mode {
            LexerMode::Main => self.lex_main(c, &mut out)?,
            LexerMode::String => self.lex_string(c, &mut out),
            LexerMode::EscapeSequence => self.lex_escape(c)?,
            LexerMode::UnicodeEscapeSequence => self.lex_unicode_escape(c)?,
        }
        Ok(out)
    }

    /// Emit the string content accumulated since the last flush as a
    /// `StringChunk`, leaving the lexer inside the string. The parser calls
    /// this at chunk boundaries to observe partial strings.
    pub fn flush_string(&mut self) -> Option<Token> {
        if self.mode == LexerMode::Main || self.string_buffer.is_empty() {
            return None;
        }
        let content = std::mem::take(&mut self.string_buffer);
        Some(Token::new(TokenKind::StringChunk(content), self.location))
    }

    /// Flush a trailing literal and verify the lexer is not mid-string.
    pub fn close(&mut self) -> Result<Option<Token>, SyntaxError> {
        if self.mode != LexerMode::Main {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnterminatedString,
                self.location,
            ));
        }
        let mut out = TokenBuf::default();
        self.flush_literal(&mut out)?;
        Ok(out.into_iter().next())
    }

    fn advance_location(&mut self, c: char) {
        self.location.index += 1;
        self.location.column += 1;
        match c {
            '\r' => {
                self.location.line += 1;
                self.location.column = 0;
                self.last_char_is_cr = true;
            }
            '\n' => {
                // A `\n` directly after `\r` is the tail of one line break.
                if !self.last_char_is_cr {
                    self.location.line += 1;
                    self.location.column = 0;
                }
                self.last_char_is_cr = false;
            }
            _ => self.last_char_is_cr = false,
        }
    }

    fn lex_main(&mut self, c: char, out: &mut TokenBuf) -> Result<(), SyntaxError> {
        let structural = match c {
            '{' => Some(TokenKind::StartObject),
            '}' => Some(TokenKind::EndObject),
            '[' => Some(TokenKind::StartArray),
            ']' => Some(TokenKind::EndArray),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = structural {
            self.flush_literal(out)?;
            out.push(Token::new(kind, self.location));
            return Ok(());
        }
        match c {
            '"' => {
                self.flush_literal(out)?;
                self.string_buffer.clear();
                self.mode = LexerMode::String;
                out.push(Token::new(TokenKind::StartString, self.location));
            }
            ' ' | '\t' | '\r' | '\n' => self.flush_literal(out)?,
            _ => {
                if self.literal_buffer.is_empty() {
                    self.literal_start = self.location;
                }
                self.literal_buffer.push(c);
            }
        }
        Ok(())
    }

    fn lex_string(&mut self, c: char, out: &mut TokenBuf) {
        match c {
            '\\' => self.mode = LexerMode::EscapeSequence,
            '"' => {
                self.settle_pending_surrogate();
                let content = std::mem::take(&mut self.string_buffer);
                out.push(Token::new(TokenKind::EndString(content), self.location));
                self.mode = LexerMode::Main;
            }
            // Raw control characters and line breaks are accepted verbatim.
            _ => {
                self.settle_pending_surrogate();
                self.string_buffer.push(c);
            }
        }
    }

    fn lex_escape(&mut self, c: char) -> Result<(), SyntaxError> {
        let decoded = match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.unicode_buffer.clear();
                self.mode = LexerMode::UnicodeEscapeSequence;
                return Ok(());
            }
            other => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::IllegalEscapeSequence(other.to_string()),
                    self.location,
                ));
            }
        };
        self.settle_pending_surrogate();
        self.string_buffer.push(decoded);
        self.mode = LexerMode::String;
        Ok(())
    }

    fn lex_unicode_escape(&mut self, c: char) -> Result<(), SyntaxError> {
        self.unicode_buffer.push(c);
        if self.unicode_buffer.chars().count() < UNICODE_ESCAPE_LEN {
            return Ok(());
        }
        let unit = u16::from_str_radix(&self.unicode_buffer, 16).map_err(|_| {
            SyntaxError::new(
                SyntaxErrorKind::IllegalEscapeSequence(format!("u{}", self.unicode_buffer)),
                self.location,
            )
        })?;
        self.push_code_unit(unit);
        self.mode = LexerMode::String;
        Ok(())
    }

    /// Append one decoded UTF-16 code unit to the string buffer. Surrogate
    /// halves combine with their counterpart when adjacent; a half that
    /// never finds its counterpart decodes to U+FFFD, matching
    /// `String::from_utf16_lossy`.
    fn push_code_unit(&mut self, unit: u16) {
        if let Some(high) = self.pending_high_surrogate.take() {
            if is_low_surrogate(unit) {
                let combined =
                    0x10000 + (((high as u32) - 0xD800) << 10) + ((unit as u32) - 0xDC00);
                self.string_buffer.push(
                    char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER),
                );
                return;
            }
            self.string_buffer.push(char::REPLACEMENT_CHARACTER);
        }
        if is_high_surrogate(unit) {
            self.pending_high_surrogate = Some(unit);
        } else if is_low_surrogate(unit) {
            self.string_buffer.push(char::REPLACEMENT_CHARACTER);
        } else {
            self.string_buffer
                .push(char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }

    fn settle_pending_surrogate(&mut self) {
        if self.pending_high_surrogate.take().is_some() {
            self.string_buffer.push(char::REPLACEMENT_CHARACTER);
        }
    }

    fn flush_literal(&mut self, out: &mut TokenBuf) -> Result<(), SyntaxError> {
        if self.literal_buffer.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.literal_buffer);
        let value = match text.as_str() {
            "null" => LiteralValue::Null,
            "true" => LiteralValue::Bool(true),
            "false" => LiteralValue::Bool(false),
            _ => {
                let number = text
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .ok_or_else(|| {
                        SyntaxError::new(
                            SyntaxErrorKind::UnknownLiteralValue(text.clone()),
                            self.literal_start,
                        )
                    })?;
                LiteralValue::Number(number)
            }
        };
        out.push(Token::new(TokenKind::Literal(value), self.literal_start));
        Ok(())
    }
}
