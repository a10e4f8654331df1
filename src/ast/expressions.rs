use std::{fmt, sync::Arc};

use regex::Regex;

use crate::{ast::BinOp, query::CompiledQuery};

/// Abstract Syntax Tree node of a condition.
///
/// Built once by the parser and never modified afterwards; evaluation only
/// reads it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Binary operation
    ///
    /// # Example
    /// ```text
    /// score > 10
    /// ```
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Parenthesised group, transparent to evaluation
    Paren(Box<Expr>),

    /// Variable reference, resolved against the arguments at evaluation time
    Var(String),

    // Literals
    /// String literal
    String(String),

    /// String literal on the right of `=~` / `!~`, compiled once by the parser
    Pattern(Pattern),

    /// Number literal
    Number(f64),

    /// Boolean literal
    Boolean(bool),

    /// String array literal, right side of `IN` / `NOT IN`
    StringList(Vec<String>),

    /// Number array literal, right side of `IN` / `NOT IN`
    NumberList(Vec<f64>),

    /// Compiled sub-query
    SubQuery(SubQuery),
}

/// How the results of a sub-query collapse into a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubQueryMode {
    /// First result, which must be a string or number
    #[default]
    First,
    /// Last result, which must be a string or number
    Last,
    /// All results, as a string or number array
    Array,
}

impl SubQueryMode {
    /// Resolves a mode name. Missing or unrecognised names mean [`SubQueryMode::First`].
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("last") => SubQueryMode::Last,
            Some("array") => SubQueryMode::Array,
            _ => SubQueryMode::First,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SubQueryMode::First => "first",
            SubQueryMode::Last => "last",
            SubQueryMode::Array => "array",
        }
    }
}

/// A sub-query compiled at parse time.
#[derive(Debug, Clone)]
pub struct SubQuery {
    /// Query text as written between the parentheses
    pub source: String,
    pub mode: SubQueryMode,
    pub query: Arc<dyn CompiledQuery>,
}

/// Two sub-queries are equal when they were written the same way.
impl PartialEq for SubQuery {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.mode == other.mode
    }
}

/// A compiled regular expression literal.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Pattern {
            regex: Regex::new(pattern)?,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Expr {
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Splits a chain of binary nodes along its left edge.
    ///
    /// Returns the leftmost operand and the `(operator, right operand)` pairs
    /// in the order they apply. `((a AND b) OR c)` yields `a` and
    /// `[(AND, b), (OR, c)]`. Any other node is its own leftmost operand.
    pub fn left_spine(&self) -> (&Expr, Vec<(BinOp, &Expr)>) {
        let mut steps = Vec::new();
        let mut node = self;
        while let Expr::Binary { op, lhs, rhs } = node {
            steps.push((*op, rhs.as_ref()));
            node = lhs;
        }
        steps.reverse();
        (node, steps)
    }
}

/// Writes every binary node in its own parentheses, so the tree shape is
/// visible: `A OR B AND C` displays as `(A OR (B AND C))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { .. } => {
                let (first, steps) = self.left_spine();
                for _ in &steps {
                    f.write_str("(")?;
                }
                write!(f, "{first}")?;
                for (op, rhs) in steps {
                    write!(f, " {op} {rhs})")?;
                }
                Ok(())
            }
            Expr::Paren(inner) => write!(f, "({inner})"),
            Expr::Var(name) => f.write_str(name),
            Expr::String(value) => write!(f, "{value:?}"),
            Expr::Pattern(pattern) => write!(f, "{:?}", pattern.as_str()),
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Boolean(true) => f.write_str("TRUE"),
            Expr::Boolean(false) => f.write_str("FALSE"),
            Expr::StringList(values) => write!(f, "{values:?}"),
            Expr::NumberList(values) => write!(f, "{values:?}"),
            Expr::SubQuery(sub) => write!(f, "$jq[{}]({})", sub.mode.name(), sub.source),
        }
    }
}
