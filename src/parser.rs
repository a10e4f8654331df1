use std::num::ParseFloatError;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Pattern, SubQuery, SubQueryMode, SubQuerySource, Token},
    config::{ParserConfig, PrecedenceVersion},
    lexer::LexError,
    query::{QueryEngine, QueryError},
    tokenizer::Tokenizer,
    value::json_type_name,
};

/// Errors that can occur while parsing a condition.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token that cannot start an operand
    #[error("unexpected {found} where an operand was expected")]
    UnexpectedToken { found: String },

    /// An operand followed by something that is not an operator.
    /// `partial` holds the expression parsed up to that point.
    #[error("expected an operator, found {token}")]
    TrailingToken { token: String, partial: Box<Expr> },

    /// Input left over after a complete expression, such as a stray `)`
    #[error("unexpected {found} after the end of the expression")]
    TrailingInput { found: String },

    #[error("missing closing ')', found {found}")]
    MissingParen { found: String },

    #[error("parentheses nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber {
        text: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid string literal {text}")]
    InvalidString { text: String },

    #[error("invalid array literal [{text}]")]
    InvalidArray {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("array literal must not be empty")]
    EmptyArray,

    #[error("array literal must start with a string or a number, found {found}")]
    UnsupportedArray { found: &'static str },

    #[error("sub-query $jq({query}) used but no query engine is configured")]
    NoQueryEngine { query: String },

    #[error("cannot compile sub-query '{query}'")]
    SubQuery {
        query: String,
        #[source]
        source: QueryError,
    },

    /// Adds a description of what was being parsed to an inner error
    #[error("{context}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    fn context(self, context: &'static str) -> Self {
        ParseError::Context {
            context,
            source: Box::new(self),
        }
    }
}

pub struct Parser<'e> {
    tokenizer: Tokenizer,
    config: ParserConfig,
    engine: Option<&'e dyn QueryEngine>,
    depth: usize,
}

impl<'e> Parser<'e> {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Parser {
            tokenizer,
            config: ParserConfig::default(),
            engine: None,
            depth: 0,
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the engine that compiles `$jq(...)` sub-queries.
    pub fn with_engine(mut self, engine: &'e dyn QueryEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Parses the whole input as one condition.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        match self.tokenizer.next_token()? {
            Token::Eof => {
                log::debug!("parsed condition {expr}");
                Ok(expr)
            }
            token => Err(ParseError::TrailingInput {
                found: token.to_string(),
            }),
        }
    }

    /// Parses operands joined by binary operators, stopping in front of a
    /// parenthesis or the end of input.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self
            .parse_unary()
            .map_err(|e| e.context("cannot parse operand"))?;

        loop {
            let token = self.tokenizer.next_token()?;
            let op = match token {
                Token::Eof | Token::LParen | Token::RParen => {
                    self.tokenizer.unscan()?;
                    return Ok(expr);
                }
                token => match token.binary_op() {
                    Some(op) => op,
                    None => {
                        return Err(ParseError::TrailingToken {
                            token: token.to_string(),
                            partial: Box::new(expr),
                        });
                    }
                },
            };

            let rhs = self
                .parse_unary()
                .map_err(|e| e.context("cannot parse right-hand operand"))?;
            let rhs = match (op, rhs) {
                (BinOp::Match | BinOp::NotMatch, Expr::String(pattern)) => compile_pattern(pattern),
                (_, rhs) => rhs,
            };
            expr = insert_node(expr, op, rhs, self.config.precedence);
        }
    }

    /// Parses a single operand: a literal, a variable, a sub-query or a
    /// parenthesised expression.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.tokenizer.next_token()? {
            Token::LParen => {
                if self.depth >= self.config.max_nesting {
                    return Err(ParseError::TooDeep {
                        limit: self.config.max_nesting,
                    });
                }
                self.depth += 1;
                let inner = self.parse_expression();
                self.depth -= 1;
                let inner = inner.map_err(|e| e.context("cannot parse parenthesised expression"))?;
                match self.tokenizer.next_token()? {
                    Token::RParen => Ok(Expr::Paren(Box::new(inner))),
                    token => Err(ParseError::MissingParen {
                        found: token.to_string(),
                    }),
                }
            }
            Token::Ident(name) => Ok(Expr::Var(name)),
            Token::String(text) => parse_string(text),
            Token::Number(text) => match text.parse::<f64>() {
                Ok(n) => Ok(Expr::Number(n)),
                Err(source) => Err(ParseError::InvalidNumber { text, source }),
            },
            Token::True => Ok(Expr::Boolean(true)),
            Token::False => Ok(Expr::Boolean(false)),
            Token::Array(payload) => parse_array(payload),
            Token::SubQuery(source) => self.parse_sub_query(source),
            token => Err(ParseError::UnexpectedToken {
                found: token.to_string(),
            }),
        }
    }

    fn parse_sub_query(&self, source: SubQuerySource) -> Result<Expr, ParseError> {
        let SubQuerySource { query, mode } = source;
        let Some(engine) = self.engine else {
            return Err(ParseError::NoQueryEngine { query });
        };
        let compiled = match engine.compile(&query) {
            Ok(compiled) => compiled,
            Err(source) => return Err(ParseError::SubQuery { query, source }),
        };
        Ok(Expr::SubQuery(SubQuery {
            source: query,
            mode: SubQueryMode::from_name(mode.as_deref()),
            query: compiled,
        }))
    }
}

/// Strips exactly the first and last character of a string token, whatever
/// they are.
fn parse_string(text: String) -> Result<Expr, ParseError> {
    let mut chars = text.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(ParseError::InvalidString { text });
    }
    Ok(Expr::String(chars.as_str().to_string()))
}

/// Compiles the right operand of `=~` / `!~` once. An invalid pattern stays
/// a string so that evaluation reports it.
fn compile_pattern(pattern: String) -> Expr {
    match Pattern::new(&pattern) {
        Ok(compiled) => Expr::Pattern(compiled),
        Err(_) => Expr::String(pattern),
    }
}

/// Parses an array payload as JSON. The first element decides the array type;
/// later elements of another type are dropped.
fn parse_array(payload: String) -> Result<Expr, ParseError> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(&format!("[{payload}]")) {
        Ok(values) => values,
        Err(source) => {
            return Err(ParseError::InvalidArray {
                text: payload,
                source,
            });
        }
    };

    match values.first() {
        None => Err(ParseError::EmptyArray),
        Some(serde_json::Value::String(_)) => Ok(Expr::StringList(
            values
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        )),
        Some(serde_json::Value::Number(_)) => Ok(Expr::NumberList(
            values.iter().filter_map(serde_json::Value::as_f64).collect(),
        )),
        Some(other) => Err(ParseError::UnsupportedArray {
            found: json_type_name(other),
        }),
    }
}

/// Folds `op rhs` into the tree `lhs`.
///
/// When `lhs` is a binary node whose operator binds looser than `op`, the new
/// operator takes over `lhs`'s right operand instead of the whole tree. Otherwise
/// the whole tree becomes the left operand, so operators of equal precedence
/// group left to right.
pub fn insert_node(lhs: Expr, op: BinOp, rhs: Expr, precedence: PrecedenceVersion) -> Expr {
    match lhs {
        Expr::Binary {
            op: lhs_op,
            lhs: left,
            rhs: right,
        } if precedence.precedence(lhs_op) < precedence.precedence(op) => Expr::Binary {
            op: lhs_op,
            lhs: left,
            rhs: Box::new(insert_node(*right, op, rhs, precedence)),
        },
        lhs => Expr::binary(op, lhs, rhs),
    }
}
