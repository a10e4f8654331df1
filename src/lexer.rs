//! Character-level scanning.
//!
//! [`Lexer`] splits the input into raw tokens (identifiers, numbers, quoted
//! strings and single punctuation characters) without knowing anything about
//! the condition language. [`Scanner`] wraps it with a one-slot pushback so the
//! tokenizer can look one raw token ahead and step back again.

use thiserror::Error;

/// Errors raised while splitting input into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// A character or character sequence that starts no valid token
    #[error("illegal token '{text}' at position {position}")]
    Illegal { text: String, position: usize },

    /// A delimiter that was opened but never closed
    #[error("unterminated {what} starting at position {position}")]
    Unterminated { what: &'static str, position: usize },

    /// A `$jq` reference whose mode or body could not be read
    #[error("malformed sub-query at position {position}: {reason}")]
    SubQuery { reason: &'static str, position: usize },

    /// `unscan` called twice without a `scan` in between
    #[error("unscan called twice without an intervening scan")]
    DoubleUnscan,

    /// `unscan` called before any token was scanned
    #[error("unscan called with no scanned token to replay")]
    NothingToUnscan,

    /// Raw text requested while an unscanned token is still pending
    #[error("raw read requested while a token is waiting to be replayed")]
    PendingReplay,
}

/// Kind of a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Eof,
    /// Letter or underscore followed by letters, digits or underscores
    Ident,
    Int,
    Float,
    /// Double- or single-quoted string; the text keeps its quotes
    String,
    /// Any other single character
    Char(char),
}

/// A raw token together with its source text and character offset.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub kind: RawKind,
    pub text: String,
    pub position: usize,
}

impl RawToken {
    pub fn is_char(&self, ch: char) -> bool {
        self.kind == RawKind::Char(ch)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == RawKind::Eof
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, RawKind::Int | RawKind::Float)
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reads a quoted string verbatim: quotes and backslash escapes are kept
    /// as written.
    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::from(quote);
        self.advance();

        while let Some(ch) = self.current_char() {
            result.push(ch);
            self.advance();
            match ch {
                c if c == quote => return Ok(result),
                '\\' => {
                    if let Some(escaped) = self.current_char() {
                        result.push(escaped);
                        self.advance();
                    }
                }
                _ => {}
            }
        }

        Err(LexError::Unterminated {
            what: "string literal",
            position: start,
        })
    }

    fn read_number(&mut self) -> (RawKind, String) {
        let mut number = String::new();
        let mut kind = RawKind::Int;

        self.read_digits(&mut number);

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            kind = RawKind::Float;
            number.push('.');
            self.advance();
            self.read_digits(&mut number);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                kind = RawKind::Float;
                for _ in 0..digit_at {
                    if let Some(ch) = self.current_char() {
                        number.push(ch);
                    }
                    self.advance();
                }
                self.read_digits(&mut number);
            }
        }

        (kind, number)
    }

    /// Returns the next raw token, skipping leading whitespace.
    pub fn next_token(&mut self) -> Result<RawToken, LexError> {
        self.skip_whitespace();
        let position = self.position;

        let (kind, text) = match self.current_char() {
            None => (RawKind::Eof, String::new()),
            Some(quote @ ('"' | '\'')) => (RawKind::String, self.read_string(quote)?),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => (RawKind::Ident, self.read_identifier()),
            Some(ch) => {
                self.advance();
                (RawKind::Char(ch), ch.to_string())
            }
        };

        Ok(RawToken {
            kind,
            text,
            position,
        })
    }

    /// Reads characters verbatim up to `close`, consuming the delimiter but
    /// leaving it out of the result.
    pub fn read_delimited(
        &mut self,
        close: char,
        what: &'static str,
        start: usize,
    ) -> Result<String, LexError> {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == close {
                return Ok(result);
            }
            result.push(ch);
        }
        Err(LexError::Unterminated {
            what,
            position: start,
        })
    }

    /// Reads characters verbatim until `depth` levels of `open`/`close` are
    /// closed. Quoted strings are copied whole so delimiters inside them do
    /// not count. The final `close` is consumed and left out of the result.
    pub fn read_balanced(
        &mut self,
        open: char,
        close: char,
        mut depth: usize,
        what: &'static str,
        start: usize,
    ) -> Result<String, LexError> {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            match ch {
                '"' | '\'' => {
                    result.push_str(&self.read_string(ch)?);
                    continue;
                }
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(result);
                    }
                }
                c if c == open => depth += 1,
                _ => {}
            }
            result.push(ch);
            self.advance();
        }
        Err(LexError::Unterminated {
            what,
            position: start,
        })
    }
}

/// One-token lookahead over a [`Lexer`].
///
/// `scan` returns the next raw token; after `unscan` the following `scan`
/// replays the previously returned token instead of consuming input. Only one
/// token can be pending: a second `unscan` before a `scan` is reported as
/// [`LexError::DoubleUnscan`].
pub struct Scanner {
    lexer: Lexer,
    last: Option<RawToken>,
    replay: bool,
}

impl Scanner {
    pub fn new(lexer: Lexer) -> Self {
        Scanner {
            lexer,
            last: None,
            replay: false,
        }
    }

    pub fn scan(&mut self) -> Result<RawToken, LexError> {
        if self.replay {
            self.replay = false;
            if let Some(token) = &self.last {
                return Ok(token.clone());
            }
        }
        let token = self.lexer.next_token()?;
        self.last = Some(token.clone());
        Ok(token)
    }

    pub fn unscan(&mut self) -> Result<(), LexError> {
        if self.replay {
            return Err(LexError::DoubleUnscan);
        }
        if self.last.is_none() {
            return Err(LexError::NothingToUnscan);
        }
        self.replay = true;
        Ok(())
    }

    /// See [`Lexer::read_delimited`]. Fails with [`LexError::PendingReplay`]
    /// if a token is waiting to be replayed; callers scan it first.
    pub fn read_delimited(
        &mut self,
        close: char,
        what: &'static str,
        start: usize,
    ) -> Result<String, LexError> {
        if self.replay {
            return Err(LexError::PendingReplay);
        }
        let text = self.lexer.read_delimited(close, what, start)?;
        self.last = None;
        Ok(text)
    }

    /// See [`Lexer::read_balanced`]. Same pending-replay rule as
    /// [`Scanner::read_delimited`].
    pub fn read_balanced(
        &mut self,
        open: char,
        close: char,
        depth: usize,
        what: &'static str,
        start: usize,
    ) -> Result<String, LexError> {
        if self.replay {
            return Err(LexError::PendingReplay);
        }
        let text = self.lexer.read_balanced(open, close, depth, what, start)?;
        self.last = None;
        Ok(text)
    }
}
