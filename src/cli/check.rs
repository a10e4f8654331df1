//! Evaluate conditions against JSON arguments

use super::CliError;
use crate::{
    Args, ParserConfig, PathEngine, PrecedenceVersion, args_from_json, evaluate, parse_with,
};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The condition to evaluate
    pub expression: String,
    /// Arguments as a JSON object; no arguments when absent
    pub args: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    /// Precedence version, 0 or 1
    pub precedence: Option<i64>,
}

/// Result of a check operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// The condition evaluated to this value
    Result(bool),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let config = match options.precedence {
        None => ParserConfig::default(),
        Some(version @ (0 | 1)) => {
            ParserConfig::default().with_precedence(PrecedenceVersion::from_version(version))
        }
        Some(other) => return Err(CliError::Precedence(other)),
    };

    let expr = parse_with(&options.expression, config, &PathEngine)?;
    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let args = match options.args.as_deref().map(str::trim) {
        None | Some("") => Args::new(),
        Some(json) => args_from_json(serde_json::from_str(json)?)?,
    };

    Ok(CheckResult::Result(evaluate(&expr, &args)?))
}
