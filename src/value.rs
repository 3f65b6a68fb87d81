//! In-memory typed option values and their canonical type identifiers.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Canonical identifier for [`Value::Str`].
pub const STR: &str = "str";
/// Canonical identifier for [`Value::Int`].
pub const INT: &str = "int";
/// Canonical identifier for [`Value::Float`].
pub const FLOAT: &str = "float";
/// Canonical identifier for [`Value::Bool`].
pub const BOOL: &str = "bool";
/// Canonical identifier for [`Value::StrSet`].
pub const STR_SET: &str = "set<str>";
/// Canonical identifier for [`Value::StrList`].
pub const STR_LIST: &str = "list<str>";
/// Canonical identifier for [`Value::IntList`].
pub const INT_LIST: &str = "list<int>";

/// A typed option value.
///
/// Every option held by a [`Config`](crate::Config) is one of these
/// variants. The variant determines the canonical type identifier used to
/// look up codec registrations, so two logically-equal types always
/// resolve to the same registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrSet(BTreeSet<String>),
    StrList(Vec<String>),
    IntList(Vec<i64>),
}

impl Value {
    /// Canonical identifier of this value's type (`"str"`, `"int"`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => STR,
            Value::Int(_) => INT,
            Value::Float(_) => FLOAT,
            Value::Bool(_) => BOOL,
            Value::StrSet(_) => STR_SET,
            Value::StrList(_) => STR_LIST,
            Value::IntList(_) => INT_LIST,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Value::StrSet(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Value::StrList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Value::IntList(v) => Some(v),
            _ => None,
        }
    }
}

/// Generic text form: scalars in their natural spelling, booleans as
/// `true`/`false`, containers comma-joined. This is what encoding falls
/// back to when a type has no registered encode function.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::StrSet(s) => {
                let joined: Vec<&str> = s.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
            Value::StrList(v) => {
                let joined: Vec<&str> = v.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
            Value::IntList(v) => {
                let joined: Vec<String> = v.iter().map(|n| n.to_string()).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BTreeSet<String>> for Value {
    fn from(s: BTreeSet<String>) -> Self {
        Value::StrSet(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StrList(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StrList(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntList(v)
    }
}
