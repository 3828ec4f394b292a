//! Messages: values that request a named transition.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::value::{Map, Value};

/// A message names a registered handler and carries a payload for it.
///
/// Dispatch stamps the bookkeeping fields: `id` is the message's position
/// in the core's log, `parent` links it to the message whose cascade
/// produced it, `timestamp` marks root events, and `children` records the
/// patches its handler fanned out into. A freshly constructed message has
/// none of these set.
///
/// # Example
///
/// ```rust
/// use accrete::cascade::Message;
///
/// let msg = Message::new("dec").field("amount", 50.0);
/// assert_eq!(msg.handler, "dec");
/// assert!(msg.is_root());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Name of the handler this message invokes.
    pub handler: String,
    /// Arbitrary payload fields.
    pub payload: Map,
    /// Position in the core's message log, assigned at dispatch.
    pub id: Option<u64>,
    /// Id of the causing message, stamped when this message arrives as a
    /// cascade patch.
    pub parent: Option<u64>,
    /// Stamped on root events (messages with no parent) at dispatch.
    pub timestamp: Option<DateTime<Utc>>,
    /// The patches this message's handler produced, in order. Stored as
    /// plain values, never as references back into the core.
    pub children: Vec<Value>,
}

impl Message {
    /// A message for the named handler with an empty payload.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            payload: Map::new(),
            id: None,
            parent: None,
            timestamp: None,
            children: Vec::new(),
        }
    }

    /// A message with a full payload.
    pub fn with_payload(handler: impl Into<String>, payload: Map) -> Self {
        Self {
            payload,
            ..Self::new(handler)
        }
    }

    /// Add one payload field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// A root event is a message no other message caused.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"handler\": {:?}", self.handler)?;
        if let Some(id) = self.id {
            write!(f, ", \"id\": {id}")?;
        }
        if let Some(parent) = self.parent {
            write!(f, ", \"parent\": {parent}")?;
        }
        for (key, value) in &self.payload {
            write!(f, ", {key:?}: {value}")?;
        }
        f.write_str("}")
    }
}
