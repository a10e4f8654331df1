//! CLI support for conditions-lang
//!
//! Provides programmatic access to the `cond` commands for embedding in
//! other tools.

mod check;
mod tokens;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use tokens::tokenize;

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations. Each variant names the
/// failing stage; the underlying error is its `source`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("parse error")]
    Parse(#[from] crate::ParseError),

    #[error("evaluation error")]
    Eval(#[from] crate::EvalError),

    #[error("tokenize error")]
    Lex(#[from] crate::LexError),

    #[error("invalid JSON arguments")]
    Json(#[from] serde_json::Error),

    #[error("invalid arguments")]
    Args(#[from] crate::ArgsError),

    #[error("IO error")]
    Io(#[from] io::Error),

    /// Unknown `--precedence` value
    #[error("unknown precedence version {0}, expected 0 or 1")]
    Precedence(i64),
}
