//! The value model: a closed sum type over every payload the algebra
//! accepts.
//!
//! The source of truth for "what is this value" is the variant itself,
//! fixed at construction. Handlers and messages are first-class variants
//! with their own types rather than records recognized by shape; the
//! structural rules only run once, inside the codec, when foreign data is
//! admitted.

mod callable;
mod kind;
#[macro_use]
mod macros;

pub use callable::Callable;
pub use kind::Kind;

use std::collections::BTreeMap;
use std::fmt;

use crate::cascade::{Handler, Message};

/// Keyed record storage. Ordered so renderings and encodings are stable.
pub type Map = BTreeMap<String, Value>;

/// A runtime value.
///
/// Everything the algebra, the cascade, and the log touch is a `Value`.
/// Values are immutable once admitted to a [`Tree`](crate::tree::Tree):
/// the tree owns them and only ever hands out shared references.
///
/// # Example
///
/// ```rust
/// use accrete::record;
/// use accrete::value::Value;
///
/// let v = record! { "count" => 100.0, "label" => "counter" };
/// assert_eq!(v.get("count").and_then(Value::as_number), Some(100.0));
/// ```
#[derive(Clone, Debug)]
pub enum Value {
    /// No value at all. Combining any target with `Absent` is a no-op.
    Absent,
    /// The null sentinel. As a combination value it zeroes the target.
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Fn(Callable),
    Seq(Vec<Value>),
    Record(Map),
    Handler(Handler),
    Message(Box<Message>),
}

impl Value {
    /// The value's tag. Pure and total.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Absent => Kind::Absent,
            Self::Null => Kind::Null,
            Self::Text(_) => Kind::Text,
            Self::Number(_) => Kind::Number,
            Self::Bool(_) => Kind::Bool,
            Self::Fn(_) => Kind::Callable,
            Self::Seq(_) => Kind::Seq,
            Self::Record(_) => Kind::Record,
            Self::Handler(_) => Kind::Handler,
            Self::Message(_) => Kind::Message,
        }
    }

    /// Build a record from key/value pairs.
    ///
    /// The [`record!`](crate::record) macro is usually more convenient.
    pub fn record<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Record(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a key on a record. `None` for every other variant.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Record(map) => map.get(key),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text payload, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) | (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Fn(a), Self::Fn(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Best-effort rendering, used in error payloads and diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("<absent>"),
            Self::Null => f.write_str("null"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Self::Bool(b) => write!(f, "{b}"),
            Self::Fn(c) => write!(f, "<fn {}>", c.name()),
            Self::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Record(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Handler(h) => write!(f, "<handler {}>", h.name()),
            Self::Message(m) => write!(f, "{m}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Seq(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Record(map)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Self::Fn(c)
    }
}

impl From<Handler> for Value {
    fn from(h: Handler) -> Self {
        Self::Handler(h)
    }
}

impl From<Message> for Value {
    fn from(m: Message) -> Self {
        Self::Message(Box::new(m))
    }
}
