use std::fmt;

use crate::ast::BinOp;

/// Query text and optional mode of a `$jq[mode](query)` reference, as read
/// by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuerySource {
    pub query: String,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of input
    Eof,

    /// Left parenthesis for grouping
    LParen,

    /// Right parenthesis
    RParen,

    // Operands
    /// Variable reference
    ///
    /// # Examples
    /// ```text
    /// score          // Ident("score")
    /// $0             // Ident("$0")
    /// [user][name]   // Ident("user.name")
    /// ```
    Ident(String),

    /// String literal, still wrapped in its delimiters
    ///
    /// # Examples
    /// ```text
    /// "hello"        // String("\"hello\"")
    /// /^a.*z$/       // String("/^a.*z$/")
    /// ```
    String(String),

    /// Numeric literal text, including a fused leading minus
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1.5
    /// ```
    Number(String),

    /// `TRUE`, or the folded `NOT FALSE`
    True,

    /// `FALSE`, or the folded `NOT TRUE`
    False,

    /// Array literal payload without the outer brackets
    ///
    /// # Examples
    /// ```text
    /// ["a", "b"]     // Array("\"a\", \"b\"")
    /// ```
    Array(String),

    /// Embedded sub-query
    ///
    /// # Examples
    /// ```text
    /// $jq(.user.age)
    /// $jq[array](.tags[])
    /// ```
    SubQuery(SubQuerySource),

    // Logical
    Or,
    Xor,
    And,
    Nand,

    // Comparison
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `=~`
    Match,
    /// `!~`
    NotMatch,

    // Membership
    In,
    NotIn,
}

impl Token {
    /// The binary operator this token stands for, if any.
    pub fn binary_op(&self) -> Option<BinOp> {
        let op = match self {
            Token::Or => BinOp::Or,
            Token::Xor => BinOp::Xor,
            Token::And => BinOp::And,
            Token::Nand => BinOp::Nand,
            Token::EqEq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::LtEq => BinOp::LessEqual,
            Token::Gt => BinOp::GreaterThan,
            Token::GtEq => BinOp::GreaterEqual,
            Token::Match => BinOp::Match,
            Token::NotMatch => BinOp::NotMatch,
            Token::In => BinOp::In,
            Token::NotIn => BinOp::NotIn,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => f.write_str("end of input"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Ident(name) => f.write_str(name),
            Token::String(text) | Token::Number(text) => f.write_str(text),
            Token::True => f.write_str("TRUE"),
            Token::False => f.write_str("FALSE"),
            Token::Array(payload) => write!(f, "[{payload}]"),
            Token::SubQuery(source) => match &source.mode {
                Some(mode) => write!(f, "$jq[{mode}]({})", source.query),
                None => write!(f, "$jq({})", source.query),
            },
            operator => f.write_str(operator.binary_op().map_or("", BinOp::symbol)),
        }
    }
}
