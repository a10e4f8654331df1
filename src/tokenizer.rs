//! Classification of raw tokens into condition-language tokens.
//!
//! Multi-character operators, negative numbers, `NOT` forms, bracket paths,
//! array literals and `$jq(...)` sub-queries are fused here into single
//! [`Token`]s.

use crate::{
    ast::{SubQuerySource, Token},
    lexer::{LexError, Lexer, RawKind, RawToken, Scanner},
};

pub struct Tokenizer {
    scanner: Scanner,
}

fn illegal(raw: &RawToken) -> LexError {
    LexError::Illegal {
        text: raw.text.clone(),
        position: raw.position,
    }
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Tokenizer {
            scanner: Scanner::new(Lexer::new(input)),
        }
    }

    /// Pushes back the last raw token so the next call to [`next_token`]
    /// classifies it again. Only valid after a token that consumed exactly one
    /// raw token (parentheses and end of input).
    ///
    /// [`next_token`]: Tokenizer::next_token
    pub fn unscan(&mut self) -> Result<(), LexError> {
        self.scanner.unscan()
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let raw = self.scanner.scan()?;

        let token = match raw.kind {
            RawKind::Eof => Token::Eof,
            RawKind::Int | RawKind::Float => Token::Number(raw.text.clone()),
            RawKind::String => Token::String(raw.text.clone()),
            RawKind::Ident => self.read_word(&raw)?,
            RawKind::Char('(') => Token::LParen,
            RawKind::Char(')') => Token::RParen,
            RawKind::Char('-') => self.read_negative_number()?,
            RawKind::Char('$') => self.read_dollar(&raw)?,
            RawKind::Char('!') => match self.scanner.scan()? {
                next if next.is_char('=') => Token::NotEq,
                next if next.is_char('~') => Token::NotMatch,
                next => return Err(illegal(&next)),
            },
            RawKind::Char('=') => match self.scanner.scan()? {
                next if next.is_char('=') => Token::EqEq,
                next if next.is_char('~') => Token::Match,
                next => return Err(illegal(&next)),
            },
            RawKind::Char('>') => self.read_comparison(Token::Gt, Token::GtEq)?,
            RawKind::Char('<') => self.read_comparison(Token::Lt, Token::LtEq)?,
            RawKind::Char('/') => {
                let pattern = self.scanner.read_delimited('/', "pattern", raw.position)?;
                Token::String(format!("/{pattern}/"))
            }
            RawKind::Char('[') => self.read_bracket(&raw)?,
            RawKind::Char(_) => Token::String(raw.text.clone()),
        };

        log::trace!("token {token:?} at position {}", raw.position);
        Ok(token)
    }

    /// `<`/`>` optionally followed by `=`.
    fn read_comparison(&mut self, single: Token, with_equal: Token) -> Result<Token, LexError> {
        let next = self.scanner.scan()?;
        if next.is_char('=') {
            Ok(with_equal)
        } else {
            self.scanner.unscan()?;
            Ok(single)
        }
    }

    /// A `-` directly followed by a number fuses into a negative number.
    fn read_negative_number(&mut self) -> Result<Token, LexError> {
        let next = self.scanner.scan()?;
        if next.text.contains('-') || !next.is_number() {
            return Err(illegal(&next));
        }
        Ok(Token::Number(format!("-{}", next.text)))
    }

    /// `$<digits>` is an indexed identifier, `$jq...` a sub-query.
    fn read_dollar(&mut self, dollar: &RawToken) -> Result<Token, LexError> {
        let next = self.scanner.scan()?;
        match next.kind {
            RawKind::Int => Ok(Token::Ident(format!("${}", next.text))),
            RawKind::Ident if next.text.eq_ignore_ascii_case("jq") => {
                self.read_sub_query(dollar.position)
            }
            _ => Err(LexError::Illegal {
                text: format!("${}", next.text),
                position: dollar.position,
            }),
        }
    }

    /// Reads `[mode](query)` after `$jq`; the mode is optional.
    fn read_sub_query(&mut self, position: usize) -> Result<Token, LexError> {
        let mode = self.read_sub_query_mode(position)?;

        let open = self.scanner.scan()?;
        if !open.is_char('(') {
            return Err(LexError::SubQuery {
                reason: "missing '('",
                position,
            });
        }
        let query = self.scanner.read_balanced('(', ')', 1, "sub-query", open.position)?;

        Ok(Token::SubQuery(SubQuerySource { query, mode }))
    }

    fn read_sub_query_mode(&mut self, position: usize) -> Result<Option<String>, LexError> {
        let open = self.scanner.scan()?;
        if !open.is_char('[') {
            self.scanner.unscan()?;
            return Ok(None);
        }
        let mode = self.scanner.scan()?;
        if mode.is_char(']') {
            return Ok(None);
        }
        if !self.scanner.scan()?.is_char(']') {
            return Err(LexError::SubQuery {
                reason: "missing ']' after mode",
                position,
            });
        }
        Ok(Some(mode.text))
    }

    /// Keywords are matched case-insensitively; any other word is a variable.
    fn read_word(&mut self, raw: &RawToken) -> Result<Token, LexError> {
        let token = match raw.text.to_ascii_uppercase().as_str() {
            "AND" => Token::And,
            "NAND" => Token::Nand,
            "OR" => Token::Or,
            "XOR" => Token::Xor,
            "IN" => Token::In,
            "TRUE" => Token::True,
            "FALSE" => Token::False,
            "NOT" => {
                let next = self.scanner.scan()?;
                match next.text.to_ascii_uppercase().as_str() {
                    "IN" => Token::NotIn,
                    "TRUE" => Token::False,
                    "FALSE" => Token::True,
                    _ => {
                        self.scanner.unscan()?;
                        return Err(illegal(raw));
                    }
                }
            }
            _ => Token::Ident(raw.text.clone()),
        };
        Ok(token)
    }

    /// `[a][b]...` becomes the identifier `a.b`; a leading `[@]` segment is
    /// skipped. When the first bracket does not hold a single identifier or
    /// integer, its content is taken as an array literal instead.
    fn read_bracket(&mut self, open: &RawToken) -> Result<Token, LexError> {
        let mut path: Vec<String> = Vec::new();
        let mut first = true;

        loop {
            let segment = self.scanner.scan()?;
            let skipped = first && segment.is_char('@');
            let valid = skipped || matches!(segment.kind, RawKind::Ident | RawKind::Int);

            if !valid {
                if !first {
                    return Err(illegal(&segment));
                }
                self.scanner.unscan()?;
                return self.read_array(String::new(), open);
            }

            let close = self.scanner.scan()?;
            if !close.is_char(']') {
                if !first || skipped {
                    return Err(illegal(&close));
                }
                self.scanner.unscan()?;
                return self.read_array(segment.text, open);
            }
            if !skipped {
                path.push(segment.text);
            }
            first = false;

            let next = self.scanner.scan()?;
            if !next.is_char('[') {
                self.scanner.unscan()?;
                break;
            }
        }

        if path.is_empty() {
            return Err(illegal(open));
        }
        Ok(Token::Ident(path.join(".")))
    }

    /// Collects the rest of an array literal up to its closing bracket.
    /// `payload` holds what the bracket-path attempt already consumed; one
    /// raw token is pending in the scanner.
    fn read_array(&mut self, mut payload: String, open: &RawToken) -> Result<Token, LexError> {
        let pending = self.scanner.scan()?;
        if pending.is_eof() {
            return Err(LexError::Unterminated {
                what: "array literal",
                position: open.position,
            });
        }
        if pending.is_char(']') {
            return Ok(Token::Array(payload));
        }

        let depth = if pending.is_char('[') { 2 } else { 1 };
        payload.push_str(&pending.text);
        payload.push_str(&self.scanner.read_balanced(
            '[',
            ']',
            depth,
            "array literal",
            open.position,
        )?);
        Ok(Token::Array(payload))
    }
}

/// Splits a whole condition into tokens, ending with [`Token::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        let done = token == Token::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
