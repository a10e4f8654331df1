use std::cell::OnceCell;

use regex::Regex;
use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, SubQuery, SubQueryMode},
    query::QueryError,
    value::{Args, Value, args_to_json, json_type_name},
};

/// A fully reduced operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    StringList(Vec<String>),
    NumberList(Vec<f64>),
}

impl Literal {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Number(_) => "number",
            Literal::Boolean(_) => "boolean",
            Literal::StringList(_) => "string list",
            Literal::NumberList(_) => "number list",
        }
    }
}

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("argument '{name}' is not defined")]
    MissingArgument { name: String },

    /// The argument exists but its kind cannot be used as an operand
    #[error("argument '{name}' holds a {kind}, which cannot be used as an operand")]
    UnsupportedValue { name: String, kind: &'static str },

    #[error("expected a {expected} operand, found a {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid regular expression '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{operator} is not defined for a {found} left operand")]
    UnsupportedOperand {
        operator: BinOp,
        found: &'static str,
    },

    /// The sub-query produced nothing, or `null`
    #[error("sub-query '{query}' produced no value")]
    NoSubQueryResult { query: String },

    #[error("sub-query '{query}' produced a {found}, expected a string or a number")]
    SubQueryValue { query: String, found: &'static str },

    #[error("sub-query '{query}' failed")]
    SubQuery {
        query: String,
        #[source]
        source: QueryError,
    },

    #[error("condition reduced to a {found}, expected a boolean")]
    NotBoolean { found: &'static str },

    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<EvalError>,
    },
}

impl EvalError {
    fn context(self, context: impl Into<String>) -> Self {
        EvalError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every context layer removed.
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Reduces a parsed condition against one set of arguments.
///
/// An evaluator borrows its arguments and never touches the expression it
/// walks, so the same [`Expr`] can be evaluated by many evaluators at once.
/// The JSON form of the arguments handed to sub-queries is built on first
/// use and reused for the lifetime of the evaluator; sub-queries themselves
/// run again on every evaluation.
pub struct Evaluator<'a> {
    args: &'a Args,
    document: OnceCell<serde_json::Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(args: &'a Args) -> Self {
        Evaluator {
            args,
            document: OnceCell::new(),
        }
    }

    /// Evaluates `expr`, which must reduce to a boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use conditions_lang::{Args, Evaluator, Value, parse};
    ///
    /// let expr = parse("n > 3 AND tag IN [\"a\", \"b\"]").unwrap();
    ///
    /// let mut args = Args::new();
    /// args.insert("n".to_string(), Value::from(5));
    /// args.insert("tag".to_string(), Value::from("b"));
    ///
    /// assert!(Evaluator::new(&args).evaluate(&expr).unwrap());
    /// ```
    pub fn evaluate(&self, expr: &Expr) -> Result<bool, EvalError> {
        let result = match self.reduce(expr)? {
            Literal::Boolean(b) => b,
            other => {
                return Err(EvalError::NotBoolean {
                    found: other.kind_name(),
                });
            }
        };
        log::debug!("condition {expr} evaluated to {result}");
        Ok(result)
    }

    /// Reduces `expr` to a single literal.
    pub fn reduce(&self, expr: &Expr) -> Result<Literal, EvalError> {
        match expr {
            Expr::Paren(inner) => self.reduce(inner),
            Expr::Binary { .. } => {
                // Chains of operators are walked in a loop; only right
                // operands and groups recurse.
                let (first, steps) = expr.left_spine();
                let mut left = self.reduce(first)?;
                for (op, rhs) in steps {
                    left = self
                        .apply(op, &left, rhs)
                        .map_err(|e| e.context(format!("cannot apply {op}")))?;
                }
                Ok(left)
            }
            Expr::Var(name) => self.resolve(name),
            Expr::String(s) => Ok(Literal::String(s.clone())),
            Expr::Pattern(pattern) => Ok(Literal::String(pattern.as_str().to_string())),
            Expr::Number(n) => Ok(Literal::Number(*n)),
            Expr::Boolean(b) => Ok(Literal::Boolean(*b)),
            Expr::StringList(items) => Ok(Literal::StringList(items.clone())),
            Expr::NumberList(items) => Ok(Literal::NumberList(items.clone())),
            Expr::SubQuery(sub_query) => self.run_sub_query(sub_query),
        }
    }

    /// Applies `op` to an already reduced left operand and the expression on
    /// its right. Precompiled patterns are matched without reducing them.
    fn apply(&self, op: BinOp, left: &Literal, rhs: &Expr) -> Result<Literal, EvalError> {
        if let (BinOp::Match | BinOp::NotMatch, Expr::Pattern(pattern)) = (op, rhs) {
            let matched = pattern.is_match(expect_string(left)?);
            return Ok(Literal::Boolean(matched == (op == BinOp::Match)));
        }
        let right = self.reduce(rhs)?;
        apply_binop(op, left, &right)
    }

    fn resolve(&self, name: &str) -> Result<Literal, EvalError> {
        let Some(value) = self.args.get(name) else {
            return Err(EvalError::MissingArgument {
                name: name.to_string(),
            });
        };
        match value {
            Value::String(s) => Ok(Literal::String(s.clone())),
            Value::Number(n) => Ok(Literal::Number(*n)),
            Value::Boolean(b) => Ok(Literal::Boolean(*b)),
            Value::StringList(items) => Ok(Literal::StringList(items.clone())),
            Value::NumberList(items) => Ok(Literal::NumberList(items.clone())),
            Value::Document(_) => Err(EvalError::UnsupportedValue {
                name: name.to_string(),
                kind: value.kind_name(),
            }),
        }
    }

    fn document(&self) -> &serde_json::Value {
        self.document.get_or_init(|| args_to_json(self.args))
    }

    /// Runs the compiled query against the arguments and collapses its
    /// results according to the sub-query's mode.
    fn run_sub_query(&self, sub_query: &SubQuery) -> Result<Literal, EvalError> {
        log::debug!(
            "running sub-query '{}' in {} mode",
            sub_query.source,
            sub_query.mode.name()
        );

        let results = sub_query
            .query
            .run(self.document())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| EvalError::SubQuery {
                query: sub_query.source.clone(),
                source,
            })?;

        match sub_query.mode {
            SubQueryMode::First => scalar_result(&sub_query.source, results.first()),
            SubQueryMode::Last => scalar_result(&sub_query.source, results.last()),
            SubQueryMode::Array => array_result(&sub_query.source, results),
        }
    }
}

fn scalar_result(query: &str, value: Option<&serde_json::Value>) -> Result<Literal, EvalError> {
    match value {
        None | Some(serde_json::Value::Null) => Err(EvalError::NoSubQueryResult {
            query: query.to_string(),
        }),
        Some(serde_json::Value::String(s)) => Ok(Literal::String(s.clone())),
        Some(serde_json::Value::Number(n)) => match n.as_f64() {
            Some(n) => Ok(Literal::Number(n)),
            None => Err(EvalError::SubQueryValue {
                query: query.to_string(),
                found: "number",
            }),
        },
        Some(other) => Err(EvalError::SubQueryValue {
            query: query.to_string(),
            found: json_type_name(other),
        }),
    }
}

/// The first result decides the list kind; every other result must match it.
fn array_result(query: &str, values: Vec<serde_json::Value>) -> Result<Literal, EvalError> {
    let mismatch = |v: &serde_json::Value| EvalError::SubQueryValue {
        query: query.to_string(),
        found: json_type_name(v),
    };

    match values.first() {
        None | Some(serde_json::Value::Null) => Err(EvalError::NoSubQueryResult {
            query: query.to_string(),
        }),
        Some(serde_json::Value::Number(_)) => values
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| mismatch(v)))
            .collect::<Result<Vec<_>, _>>()
            .map(Literal::NumberList),
        Some(serde_json::Value::String(_)) => values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Ok(s),
                other => Err(mismatch(&other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Literal::StringList),
        Some(other) => Err(mismatch(other)),
    }
}

fn expect_bool(lit: &Literal) -> Result<bool, EvalError> {
    match lit {
        Literal::Boolean(b) => Ok(*b),
        other => Err(EvalError::TypeMismatch {
            expected: "boolean",
            found: other.kind_name(),
        }),
    }
}

fn expect_number(lit: &Literal) -> Result<f64, EvalError> {
    match lit {
        Literal::Number(n) => Ok(*n),
        other => Err(EvalError::TypeMismatch {
            expected: "number",
            found: other.kind_name(),
        }),
    }
}

fn expect_string(lit: &Literal) -> Result<&str, EvalError> {
    match lit {
        Literal::String(s) => Ok(s),
        other => Err(EvalError::TypeMismatch {
            expected: "string",
            found: other.kind_name(),
        }),
    }
}

fn apply_binop(op: BinOp, left: &Literal, right: &Literal) -> Result<Literal, EvalError> {
    let result = match op {
        BinOp::And => expect_bool(left)? && expect_bool(right)?,
        BinOp::Nand => !(expect_bool(left)? && expect_bool(right)?),
        BinOp::Or => expect_bool(left)? || expect_bool(right)?,
        BinOp::Xor => expect_bool(left)? != expect_bool(right)?,
        BinOp::Equal => equal(left, right)?,
        BinOp::NotEqual => !equal(left, right)?,
        BinOp::GreaterThan => expect_number(left)? > expect_number(right)?,
        BinOp::GreaterEqual => expect_number(left)? >= expect_number(right)?,
        BinOp::LessThan => expect_number(left)? < expect_number(right)?,
        BinOp::LessEqual => expect_number(left)? <= expect_number(right)?,
        BinOp::Match => matches_pattern(left, right)?,
        BinOp::NotMatch => !matches_pattern(left, right)?,
        BinOp::In => contains(op, left, right)?,
        BinOp::NotIn => !contains(op, left, right)?,
    };
    Ok(Literal::Boolean(result))
}

/// The left operand picks the comparison. A list on the left never equals
/// anything.
fn equal(left: &Literal, right: &Literal) -> Result<bool, EvalError> {
    match left {
        Literal::String(l) => Ok(l == expect_string(right)?),
        Literal::Number(l) => Ok(*l == expect_number(right)?),
        Literal::Boolean(l) => Ok(*l == expect_bool(right)?),
        Literal::StringList(_) | Literal::NumberList(_) => Ok(false),
    }
}

fn matches_pattern(subject: &Literal, pattern: &Literal) -> Result<bool, EvalError> {
    let subject = expect_string(subject)?;
    let pattern = expect_string(pattern)?;
    let re = Regex::new(pattern).map_err(|source| EvalError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(re.is_match(subject))
}

fn contains(op: BinOp, needle: &Literal, haystack: &Literal) -> Result<bool, EvalError> {
    match (needle, haystack) {
        (Literal::String(s), Literal::StringList(items)) => Ok(items.contains(s)),
        (Literal::Number(n), Literal::NumberList(items)) => Ok(items.contains(n)),
        // an empty list has no element kind
        (Literal::String(_) | Literal::Number(_), Literal::StringList(items))
            if items.is_empty() =>
        {
            Ok(false)
        }
        (Literal::String(_) | Literal::Number(_), Literal::NumberList(items))
            if items.is_empty() =>
        {
            Ok(false)
        }
        (Literal::String(_), other) => Err(EvalError::TypeMismatch {
            expected: "string list",
            found: other.kind_name(),
        }),
        (Literal::Number(_), other) => Err(EvalError::TypeMismatch {
            expected: "number list",
            found: other.kind_name(),
        }),
        (other, _) => Err(EvalError::UnsupportedOperand {
            operator: op,
            found: other.kind_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_eval(op: BinOp, left: Literal, right: Literal) -> Result<Literal, EvalError> {
        apply_binop(op, &left, &right)
    }

    #[test]
    fn test_boolean_operators() {
        let t = || Literal::Boolean(true);
        let f = || Literal::Boolean(false);
        assert_eq!(lit_eval(BinOp::And, t(), f()).unwrap(), f());
        assert_eq!(lit_eval(BinOp::Nand, t(), t()).unwrap(), f());
        assert_eq!(lit_eval(BinOp::Or, f(), t()).unwrap(), t());
        assert_eq!(lit_eval(BinOp::Xor, t(), t()).unwrap(), f());
        assert!(matches!(
            lit_eval(BinOp::And, t(), Literal::Number(1.0)),
            Err(EvalError::TypeMismatch {
                expected: "boolean",
                found: "number"
            })
        ));
    }

    #[test]
    fn test_less_than_is_strict() {
        assert_eq!(
            lit_eval(BinOp::LessThan, Literal::Number(2.0), Literal::Number(2.0)).unwrap(),
            Literal::Boolean(false)
        );
        assert_eq!(
            lit_eval(BinOp::LessEqual, Literal::Number(2.0), Literal::Number(2.0)).unwrap(),
            Literal::Boolean(true)
        );
    }

    #[test]
    fn test_list_equality_is_false() {
        let list = || Literal::NumberList(vec![1.0]);
        assert_eq!(
            lit_eval(BinOp::Equal, list(), list()).unwrap(),
            Literal::Boolean(false)
        );
        assert_eq!(
            lit_eval(BinOp::NotEqual, list(), list()).unwrap(),
            Literal::Boolean(true)
        );
    }

    #[test]
    fn test_array_result_rejects_mixed_kinds() {
        let values = vec![serde_json::json!(1), serde_json::json!("a")];
        assert!(matches!(
            array_result(".[]", values),
            Err(EvalError::SubQueryValue { found: "string", .. })
        ));
    }

    #[test]
    fn test_empty_lists_contain_nothing() {
        for haystack in [Literal::StringList(vec![]), Literal::NumberList(vec![])] {
            for needle in [Literal::String("a".into()), Literal::Number(1.0)] {
                assert_eq!(
                    lit_eval(BinOp::In, needle.clone(), haystack.clone()).unwrap(),
                    Literal::Boolean(false)
                );
                assert_eq!(
                    lit_eval(BinOp::NotIn, needle, haystack.clone()).unwrap(),
                    Literal::Boolean(true)
                );
            }
        }
    }

    #[test]
    fn test_context_displays_only_its_own_message() {
        let err = EvalError::NotBoolean { found: "number" }.context("cannot apply AND");
        assert_eq!(err.to_string(), "cannot apply AND");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("condition reduced to a number, expected a boolean"));
    }

    #[test]
    fn test_root_cause_strips_context() {
        let err = EvalError::NotBoolean { found: "number" }
            .context("outer")
            .context("outermost");
        assert!(matches!(
            err.root_cause(),
            EvalError::NotBoolean { found: "number" }
        ));
    }
}
