//! Tags for the closed set of value kinds.
//!
//! Every [`Value`](super::Value) carries exactly one tag, fixed at
//! construction. Rule selection in the combination algebra is driven by
//! tag pairs, never by re-inspecting a value's structure.

use std::fmt;

/// The closed set of tags a value can carry.
///
/// Tags are assigned once, when a value is constructed, and looked up with
/// [`Value::kind`](super::Value::kind). The lookup is pure, total, and
/// infallible, a plain match on the variant.
///
/// # Example
///
/// ```rust
/// use accrete::value::{Kind, Value};
///
/// assert_eq!(Value::Null.kind(), Kind::Null);
/// assert_eq!(Value::from(3.0).kind(), Kind::Number);
/// assert_eq!(Value::from("hi").kind(), Kind::Text);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    /// No value at all; combining with it is a no-op.
    Absent,
    /// The null sentinel; combining it into a target zeroes the target.
    Null,
    Text,
    Number,
    Bool,
    Callable,
    /// Ordered sequence of values.
    Seq,
    /// A named, registered transition function.
    Handler,
    /// A value that names a handler and requests its invocation.
    Message,
    /// Plain keyed record; the catch-all structured kind.
    Record,
}

impl Kind {
    /// The tag's name for display and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Callable => "callable",
            Self::Seq => "seq",
            Self::Handler => "handler",
            Self::Message => "message",
            Self::Record => "record",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
