//! Token listing for debugging conditions

use super::CliError;
use crate::Token;

/// Splits `expression` into tokens and renders one `kind text` line per
/// token, ending with the end-of-input marker.
pub fn tokenize(expression: &str) -> Result<Vec<String>, CliError> {
    let tokens = crate::tokenize(expression)?;
    Ok(tokens.iter().map(describe).collect())
}

fn describe(token: &Token) -> String {
    let kind = match token {
        Token::Eof => return "EOF".to_string(),
        Token::LParen | Token::RParen => "PAREN",
        Token::Ident(_) => "IDENT",
        Token::String(_) => "STRING",
        Token::Number(_) => "NUMBER",
        Token::True | Token::False => "BOOLEAN",
        Token::Array(_) => "ARRAY",
        Token::SubQuery(_) => "SUBQUERY",
        _ => "OPERATOR",
    };
    format!("{kind:<8} {token}")
}
