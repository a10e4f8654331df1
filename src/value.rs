use std::collections::BTreeMap;

use thiserror::Error;

/// An argument value supplied by the caller.
///
/// Scalars and homogeneous lists can be read by variables in a condition.
/// [`Value::Document`] holds arbitrary nested JSON that only sub-queries can
/// look into.
///
/// # Examples
///
/// ```
/// use conditions_lang::{Args, Value};
///
/// let mut args = Args::new();
/// args.insert("name".to_string(), Value::from("ada"));
/// args.insert("age".to_string(), Value::from(36_u8));
/// args.insert("scores".to_string(), Value::from(vec![1_i32, 2, 3]));
///
/// assert_eq!(args["age"], Value::Number(36.0));
/// assert_eq!(args["scores"], Value::NumberList(vec![1.0, 2.0, 3.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string
    String(String),

    /// Any integer or float, widened to 64 bits
    Number(f64),

    Boolean(bool),

    /// List of strings
    StringList(Vec<String>),

    /// List of numbers
    NumberList(Vec<f64>),

    /// Nested JSON reachable only through sub-queries
    Document(serde_json::Value),
}

/// Arguments of one evaluation, keyed by variable name.
pub type Args = BTreeMap<String, Value>;

/// Errors raised when building arguments from JSON.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Returns a human-readable type name for a JSON value
pub(crate) fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Value {
    /// Human-readable name of the value's kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::StringList(_) => "string list",
            Value::NumberList(_) => "number list",
            Value::Document(_) => "document",
        }
    }

    /// Converts JSON into a value. Arrays made only of strings or only of
    /// numbers become lists; null, objects and other arrays are kept as a
    /// [`Value::Document`].
    pub fn from_json(v: serde_json::Value) -> Value {
        use serde_json::Value as Json;
        match v {
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Document(Json::Number(n)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => match items.first() {
                None => Value::StringList(Vec::new()),
                Some(Json::String(_)) if items.iter().all(Json::is_string) => Value::StringList(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Json::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                ),
                Some(Json::Number(_)) if items.iter().all(Json::is_number) => {
                    Value::NumberList(items.iter().filter_map(Json::as_f64).collect())
                }
                _ => Value::Document(Json::Array(items)),
            },
            other => Value::Document(other),
        }
    }

    /// Converts the value to JSON. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        let number = |f: f64| {
            serde_json::Number::from_f64(f)
                .map(Json::Number)
                .unwrap_or(Json::Null)
        };
        match self {
            Value::String(s) => Json::String(s.clone()),
            Value::Number(f) => number(*f),
            Value::Boolean(b) => Json::Bool(*b),
            Value::StringList(items) => {
                Json::Array(items.iter().cloned().map(Json::String).collect())
            }
            Value::NumberList(items) => Json::Array(items.iter().copied().map(number).collect()),
            Value::Document(doc) => doc.clone(),
        }
    }
}

/// Builds arguments from a JSON object, converting each member with
/// [`Value::from_json`].
pub fn args_from_json(v: serde_json::Value) -> Result<Args, ArgsError> {
    match v {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(v)))
            .collect()),
        other => Err(ArgsError::NotAnObject(json_type_name(&other))),
    }
}

/// Serializes the whole argument map into one JSON object.
pub fn args_to_json(args: &Args) -> serde_json::Value {
    serde_json::Value::Object(
        args.iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::StringList(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::StringList(items.into_iter().map(str::to_string).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from_json(v)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }

            impl From<Vec<$t>> for Value {
                fn from(items: Vec<$t>) -> Self {
                    Value::NumberList(items.into_iter().map(|n| n as f64).collect())
                }
            }

            impl From<&[$t]> for Value {
                fn from(items: &[$t]) -> Self {
                    Value::NumberList(items.iter().map(|&n| n as f64).collect())
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
