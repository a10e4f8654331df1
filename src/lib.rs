//! A small boolean condition language.
//!
//! Conditions such as `age >= 18 AND country IN ["NL", "BE"]` are parsed once
//! into an [`Expr`] and then evaluated against any number of argument maps.
//! Operands can also come from `$jq(...)` sub-queries that run against the
//! arguments as a JSON document.
//!
//! ```
//! use conditions_lang::{Args, Value, evaluate, parse};
//!
//! let expr = parse("(role == \"admin\" OR level > 3) AND name =~ \"^a\"").unwrap();
//!
//! let mut args = Args::new();
//! args.insert("role".to_string(), Value::from("user"));
//! args.insert("level".to_string(), Value::from(5));
//! args.insert("name".to_string(), Value::from("ada"));
//!
//! assert!(evaluate(&expr, &args).unwrap());
//! ```

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod tokenizer;
pub mod value;

pub use ast::{BinOp, Expr, Pattern, SubQuery, SubQueryMode, Token};
pub use config::{ParserConfig, PrecedenceVersion};
pub use evaluator::{EvalError, Evaluator, Literal};
pub use lexer::{LexError, Lexer, Scanner};
pub use parser::{ParseError, Parser};
pub use query::{CompiledQuery, PathEngine, QueryEngine, QueryError};
pub use tokenizer::{Tokenizer, tokenize};
pub use value::{Args, ArgsError, Value, args_from_json, args_to_json};

/// Parses a condition with the default configuration. Sub-queries are
/// compiled by the built-in [`PathEngine`].
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    parse_with(text, ParserConfig::default(), &PathEngine)
}

/// Parses a condition with an explicit configuration and query engine.
pub fn parse_with(
    text: &str,
    config: ParserConfig,
    engine: &dyn QueryEngine,
) -> Result<Expr, ParseError> {
    Parser::new(Tokenizer::new(text))
        .with_config(config)
        .with_engine(engine)
        .parse()
}

/// Evaluates a parsed condition against `args`.
pub fn evaluate(expr: &Expr, args: &Args) -> Result<bool, EvalError> {
    Evaluator::new(args).evaluate(expr)
}
