//! Sub-query engines.
//!
//! `$jq(...)` operands are compiled once at parse time through a
//! [`QueryEngine`] and run at every evaluation against the arguments serialized
//! as JSON. Any engine can be plugged in; [`PathEngine`] is the built-in one
//! and understands the path subset of jq:
//!
//! ```text
//! .                 identity
//! .user.name        field access (missing fields give null)
//! ."odd key"        quoted field name
//! .["odd key"]      bracketed field name
//! .items[0]         index, negative counts from the end
//! .items[]          every element of an array or value of an object
//! .items[]?         suppress errors of the preceding step
//! .a, .b            outputs of both paths
//! .items[] | .id    feed each output into the next path
//! ```

use std::{fmt, sync::Arc};

use serde_json::Value;
use thiserror::Error;

use crate::value::json_type_name;

/// Errors raised while compiling or running a sub-query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query syntax error at position {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("cannot {operation} a {found} value")]
    Type { operation: String, found: &'static str },

    /// Failure reported by an external engine
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Ordered results of one query run. Each call to [`CompiledQuery::run`]
/// starts over from the first result.
pub type QueryResults<'a> = Box<dyn Iterator<Item = Result<Value, QueryError>> + 'a>;

/// A query compiled ahead of time and run any number of times.
pub trait CompiledQuery: fmt::Debug + Send + Sync {
    fn run<'a>(&'a self, input: &'a Value) -> QueryResults<'a>;
}

/// Compiles sub-query text into reusable handles.
pub trait QueryEngine {
    fn compile(&self, text: &str) -> Result<Arc<dyn CompiledQuery>, QueryError>;
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathExpr {
    /// Identity: `.`
    Identity,

    /// Field access: `.foo`, `."foo"`, `.["foo"]`
    Field(String),

    /// Array index access: `.[0]` or `.[-1]`
    Index(i64),

    /// Iterate all elements: `.[]`
    Iterate,

    /// Errors of the inner step produce no output: `.foo?`
    Optional(Box<PathExpr>),

    /// Steps applied in sequence: `.foo.bar[0]`, `.a | .b`
    Pipe(Vec<PathExpr>),

    /// Outputs of every branch in order: `.foo, .bar`
    Comma(Vec<PathExpr>),
}

impl PathExpr {
    fn eval(&self, input: &Value, out: &mut Vec<Value>) -> Result<(), QueryError> {
        match self {
            PathExpr::Identity => out.push(input.clone()),
            PathExpr::Field(name) => match input {
                Value::Object(map) => out.push(map.get(name).cloned().unwrap_or(Value::Null)),
                Value::Null => out.push(Value::Null),
                other => {
                    return Err(QueryError::Type {
                        operation: format!("read field \"{name}\" of"),
                        found: json_type_name(other),
                    });
                }
            },
            PathExpr::Index(index) => match input {
                Value::Array(items) => {
                    let position = if *index < 0 {
                        items.len().checked_sub(index.unsigned_abs() as usize)
                    } else {
                        Some(*index as usize)
                    };
                    out.push(
                        position
                            .and_then(|p| items.get(p))
                            .cloned()
                            .unwrap_or(Value::Null),
                    );
                }
                Value::Null => out.push(Value::Null),
                other => {
                    return Err(QueryError::Type {
                        operation: format!("index [{index}] into"),
                        found: json_type_name(other),
                    });
                }
            },
            PathExpr::Iterate => match input {
                Value::Array(items) => out.extend(items.iter().cloned()),
                Value::Object(map) => out.extend(map.values().cloned()),
                other => {
                    return Err(QueryError::Type {
                        operation: "iterate over".to_string(),
                        found: json_type_name(other),
                    });
                }
            },
            PathExpr::Optional(inner) => {
                let mut produced = Vec::new();
                if inner.eval(input, &mut produced).is_ok() {
                    out.extend(produced);
                }
            }
            PathExpr::Pipe(steps) => {
                let mut current = vec![input.clone()];
                for step in steps {
                    let mut next = Vec::new();
                    for value in &current {
                        step.eval(value, &mut next)?;
                    }
                    current = next;
                }
                out.extend(current);
            }
            PathExpr::Comma(branches) => {
                for branch in branches {
                    branch.eval(input, out)?;
                }
            }
        }
        Ok(())
    }
}

/// A query compiled by [`PathEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    expr: PathExpr,
}

impl PathQuery {
    pub fn expr(&self) -> &PathExpr {
        &self.expr
    }
}

impl CompiledQuery for PathQuery {
    fn run<'a>(&'a self, input: &'a Value) -> QueryResults<'a> {
        let mut out = Vec::new();
        let failure = self.expr.eval(input, &mut out).err();
        Box::new(out.into_iter().map(Ok::<Value, QueryError>).chain(failure.map(Err)))
    }
}

/// Built-in engine for jq path expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathEngine;

impl PathEngine {
    pub fn compile_path(&self, text: &str) -> Result<PathQuery, QueryError> {
        let mut parser = PathParser::new(text);
        let expr = parser.parse_pipe()?;
        parser.skip_ws();
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected '{c}'")));
        }
        Ok(PathQuery { expr })
    }
}

impl QueryEngine for PathEngine {
    fn compile(&self, text: &str) -> Result<Arc<dyn CompiledQuery>, QueryError> {
        Ok(Arc::new(self.compile_path(text)?))
    }
}

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        PathParser { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Syntax {
            message: message.into(),
            position: self.pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), QueryError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.next();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn parse_pipe(&mut self) -> Result<PathExpr, QueryError> {
        let mut stages = vec![self.parse_comma()?];
        loop {
            self.skip_ws();
            if self.peek() != Some('|') {
                break;
            }
            self.next();
            stages.push(self.parse_comma()?);
        }
        Ok(if stages.len() == 1 {
            stages.remove(0)
        } else {
            PathExpr::Pipe(stages)
        })
    }

    fn parse_comma(&mut self) -> Result<PathExpr, QueryError> {
        let mut branches = vec![self.parse_path()?];
        loop {
            self.skip_ws();
            if self.peek() != Some(',') {
                break;
            }
            self.next();
            branches.push(self.parse_path()?);
        }
        Ok(if branches.len() == 1 {
            branches.remove(0)
        } else {
            PathExpr::Comma(branches)
        })
    }

    /// A path starting with `.`, or a parenthesised pipe.
    fn parse_path(&mut self) -> Result<PathExpr, QueryError> {
        self.skip_ws();
        let mut steps = Vec::new();

        match self.peek() {
            Some('(') => {
                self.next();
                steps.push(self.parse_pipe()?);
                self.expect(')')?;
            }
            Some('.') => {
                self.next();
                match self.peek() {
                    Some('[') => steps.push(self.parse_bracket()?),
                    Some(c) if c == '"' || c.is_alphabetic() || c == '_' => {
                        steps.push(PathExpr::Field(self.parse_key()?));
                    }
                    _ => steps.push(PathExpr::Identity),
                }
            }
            Some(c) => return Err(self.error(format!("expected '.', found '{c}'"))),
            None => return Err(self.error("expected '.', found end of input")),
        }

        loop {
            match self.peek() {
                Some('[') => steps.push(self.parse_bracket()?),
                Some('?') => {
                    self.next();
                    if let Some(last) = steps.pop() {
                        steps.push(PathExpr::Optional(Box::new(last)));
                    }
                }
                Some('.') => {
                    self.next();
                    match self.peek() {
                        Some('[') => steps.push(self.parse_bracket()?),
                        _ => steps.push(PathExpr::Field(self.parse_key()?)),
                    }
                }
                _ => break,
            }
        }

        Ok(if steps.len() == 1 {
            steps.remove(0)
        } else {
            PathExpr::Pipe(steps)
        })
    }

    /// `[]`, `[n]` or `["key"]`.
    fn parse_bracket(&mut self) -> Result<PathExpr, QueryError> {
        self.expect('[')?;
        self.skip_ws();
        let step = match self.peek() {
            Some(']') => PathExpr::Iterate,
            Some('"') => PathExpr::Field(self.parse_string()?),
            Some(c) if c == '-' || c.is_ascii_digit() => PathExpr::Index(self.parse_integer()?),
            Some(c) => return Err(self.error(format!("unexpected '{c}' in brackets"))),
            None => return Err(self.error("unterminated '['")),
        };
        self.expect(']')?;
        Ok(step)
    }

    fn parse_key(&mut self) -> Result<String, QueryError> {
        if self.peek() == Some('"') {
            return self.parse_string();
        }
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {
                self.next();
            }
            Some(c) => return Err(self.error(format!("expected field name, found '{c}'"))),
            None => return Err(self.error("expected field name, found end of input")),
        }
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.next();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_integer(&mut self) -> Result<i64, QueryError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.next();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.next();
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error(format!("invalid index '{}'", &self.input[start..self.pos])))
    }

    fn parse_string(&mut self) -> Result<String, QueryError> {
        self.expect('"')?;
        let mut result = String::new();
        loop {
            match self.next() {
                Some('"') => return Ok(result),
                Some('\\') => match self.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some(c @ ('"' | '\\' | '/')) => result.push(c),
                    Some(c) => return Err(self.error(format!("invalid escape '\\{c}'"))),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => result.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}
