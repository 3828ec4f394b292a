//! Flat (de)serialization of trees.
//!
//! A tree serializes to a flat sequence: the seed value first, then every
//! node's value in creation order. A value extends the most recently added
//! node unless a parent marker precedes it, which switches the replay
//! cursor to the node with that id. Decoding replays `add` calls, so the
//! reducer re-gates every value on the way back in.
//!
//! Two things are deliberately loose, and stay that way:
//!
//! - Branch numbering is not canonicalized. Replay reproduces every value,
//!   parent relationship, and residue, but if fork order differs from the
//!   original insertion order the branch indexes may differ.
//! - Functions do not serialize as code. A callable encodes as
//!   `{"$fn": name}` and a handler as `{"$handler": name}`; decoding
//!   resolves names through a caller-built [`Registry`], and unknown names
//!   fail the decode.
//!
//! In the text form, parent markers are JSON integers while numeric values
//! always carry a fractional form, so the two never collide. Message
//! bookkeeping uses the reserved keys `handler`, `id`, `parent`,
//! `timestamp`, and `children`; payload fields with those names do not
//! survive a round trip.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::cascade::{Handler, Message};
use crate::tree::{NodeId, Reducer, Tree, TreeError};
use crate::value::{Callable, Map, Value};

/// One entry of the flat encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// Switch the replay cursor: the next value extends this node id.
    Parent(usize),
    /// A value to admit at the cursor.
    Value(Value),
}

/// Named callables and handler prototypes for decode-time resolution.
///
/// # Example
///
/// ```rust
/// use accrete::cascade::{Handler, Message};
/// use accrete::tree::Registry;
/// use accrete::value::Value;
///
/// let registry = Registry::new()
///     .with_handler(Handler::new("tick", |_: &Value, _: &Message| Ok(Value::Absent)));
/// assert!(registry.handler("tick").is_some());
/// assert!(registry.callable("tick").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Registry {
    callables: BTreeMap<String, Callable>,
    handlers: BTreeMap<String, Handler>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callable, keyed by its name.
    pub fn with_callable(mut self, callable: Callable) -> Self {
        self.callables.insert(callable.name().to_string(), callable);
        self
    }

    /// Add a handler prototype, keyed by its name.
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handlers.insert(handler.name().to_string(), handler);
        self
    }

    /// Look up a callable by name.
    pub fn callable(&self, name: &str) -> Option<&Callable> {
        self.callables.get(name)
    }

    /// Look up a handler prototype by name.
    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }
}

/// Codec error types.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The flat sequence must begin with a seed value.
    #[error("flat encoding must begin with a seed value")]
    MissingSeed,

    /// A parent marker must be followed by exactly one value.
    #[error("parent marker {id} is not followed by a value")]
    DanglingParent { id: usize },

    /// The text form must be a single flat JSON array.
    #[error("text encoding is not a flat array")]
    NotAnArray,

    /// A `$fn` name the registry does not know.
    #[error("unknown callable '{name}'")]
    UnknownCallable { name: String },

    /// A `$handler` name the registry does not know.
    #[error("unknown handler '{name}'")]
    UnknownHandler { name: String },

    /// Non-finite numbers have no JSON representation.
    #[error("number {value} has no text representation")]
    NonFinite { value: f64 },

    /// Structurally invalid encoding.
    #[error("malformed encoding: {reason}")]
    Malformed { reason: String },

    /// Replaying the entries failed at the log boundary: the reducer
    /// rejected a value or a parent id was never issued.
    #[error("replay failed: {0}")]
    Replay(#[from] TreeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl<R: Reducer> Tree<R> {
    /// The tree as a flat entry sequence. Inverse of [`Tree::from_flat`].
    pub fn to_flat(&self) -> Vec<Entry> {
        let mut out = Vec::with_capacity(self.nodes.len());
        out.push(Entry::Value(self.nodes[0].value.clone()));
        let mut prev = NodeId(0);
        for node in &self.nodes[1..] {
            if node.parent != Some(prev) {
                if let Some(parent) = node.parent {
                    out.push(Entry::Parent(parent.0));
                }
            }
            out.push(Entry::Value(node.value.clone()));
            prev = node.id;
        }
        out
    }

    /// Rebuild a tree by replaying a flat entry sequence.
    ///
    /// Every value goes back through [`Tree::add_to`], so the reducer
    /// re-validates the whole history; a value that no longer reduces
    /// fails the decode.
    pub fn from_flat<I>(entries: I, reducer: R) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut iter = entries.into_iter();
        let seed = match iter.next() {
            Some(Entry::Value(seed)) => seed,
            _ => return Err(CodecError::MissingSeed),
        };
        let mut tree = Tree::with_reducer(seed, reducer);
        let mut pending: Option<usize> = None;
        for entry in iter {
            match entry {
                Entry::Parent(id) => {
                    if let Some(prev) = pending.replace(id) {
                        return Err(CodecError::DanglingParent { id: prev });
                    }
                }
                Entry::Value(value) => match pending.take() {
                    Some(parent) => {
                        tree.add_to(value, NodeId(parent))?;
                    }
                    None => {
                        tree.add(value)?;
                    }
                },
            }
        }
        if let Some(id) = pending {
            return Err(CodecError::DanglingParent { id });
        }
        Ok(tree)
    }

    /// The tree as JSON text. Inverse of [`Tree::decode`].
    pub fn encode(&self) -> Result<String, CodecError> {
        let mut items = Vec::with_capacity(self.nodes.len());
        for entry in self.to_flat() {
            items.push(match entry {
                Entry::Parent(id) => JsonValue::from(id as u64),
                Entry::Value(value) => value_to_json(&value)?,
            });
        }
        Ok(serde_json::to_string(&JsonValue::Array(items))?)
    }

    /// Rebuild a tree from JSON text, resolving functions through the
    /// registry and replaying every `add`.
    pub fn decode(text: &str, reducer: R, registry: &Registry) -> Result<Self, CodecError> {
        let parsed: JsonValue = serde_json::from_str(text)?;
        let items = match parsed {
            JsonValue::Array(items) => items,
            _ => return Err(CodecError::NotAnArray),
        };
        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            entries.push(entry_from_json(item, registry)?);
        }
        Self::from_flat(entries, reducer)
    }
}

fn entry_from_json(json: &JsonValue, registry: &Registry) -> Result<Entry, CodecError> {
    if let JsonValue::Number(n) = json {
        // Bare integers are parent markers; number values always carry a
        // fractional form.
        if n.is_u64() {
            return Ok(Entry::Parent(n.as_u64().unwrap_or(0) as usize));
        }
    }
    Ok(Entry::Value(value_from_json(json, registry)?))
}

fn value_to_json(value: &Value) -> Result<JsonValue, CodecError> {
    Ok(match value {
        Value::Absent => serde_json::json!({ "$absent": true }),
        Value::Null => JsonValue::Null,
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .ok_or(CodecError::NonFinite { value: *n })?,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Fn(c) => serde_json::json!({ "$fn": c.name() }),
        Value::Seq(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_to_json(item)?);
            }
            JsonValue::Array(out)
        }
        Value::Record(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), value_to_json(item)?);
            }
            JsonValue::Object(out)
        }
        Value::Handler(h) => serde_json::json!({ "$handler": h.name() }),
        Value::Message(msg) => message_to_json(msg)?,
    })
}

fn message_to_json(msg: &Message) -> Result<JsonValue, CodecError> {
    let mut out = serde_json::Map::new();
    out.insert("handler".to_string(), JsonValue::String(msg.handler.clone()));
    for (key, item) in &msg.payload {
        out.insert(key.clone(), value_to_json(item)?);
    }
    if let Some(id) = msg.id {
        out.insert("id".to_string(), JsonValue::from(id));
    }
    if let Some(parent) = msg.parent {
        out.insert("parent".to_string(), JsonValue::from(parent));
    }
    if let Some(timestamp) = msg.timestamp {
        out.insert(
            "timestamp".to_string(),
            JsonValue::String(timestamp.to_rfc3339()),
        );
    }
    if !msg.children.is_empty() {
        let mut children = Vec::with_capacity(msg.children.len());
        for child in &msg.children {
            children.push(value_to_json(child)?);
        }
        out.insert("children".to_string(), JsonValue::Array(children));
    }
    Ok(JsonValue::Object(out))
}

fn value_from_json(json: &JsonValue, registry: &Registry) -> Result<Value, CodecError> {
    Ok(match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => Value::Number(n.as_f64().ok_or(CodecError::Malformed {
            reason: format!("number {n} does not fit a float"),
        })?),
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_from_json(item, registry)?);
            }
            Value::Seq(out)
        }
        JsonValue::Object(map) => {
            // Classification happens here, once, in precedence order:
            // markers first, then the message discriminator, then a plain
            // record.
            if map.contains_key("$absent") {
                return Ok(Value::Absent);
            }
            if let Some(JsonValue::String(name)) = map.get("$fn") {
                return registry
                    .callable(name)
                    .cloned()
                    .map(Value::Fn)
                    .ok_or_else(|| CodecError::UnknownCallable { name: name.clone() });
            }
            if let Some(JsonValue::String(name)) = map.get("$handler") {
                return registry
                    .handler(name)
                    .cloned()
                    .map(Value::Handler)
                    .ok_or_else(|| CodecError::UnknownHandler { name: name.clone() });
            }
            if let Some(JsonValue::String(_)) = map.get("handler") {
                return Ok(Value::Message(Box::new(message_from_json(map, registry)?)));
            }
            let mut out = Map::new();
            for (key, item) in map {
                out.insert(key.clone(), value_from_json(item, registry)?);
            }
            Value::Record(out)
        }
    })
}

fn message_from_json(
    map: &serde_json::Map<String, JsonValue>,
    registry: &Registry,
) -> Result<Message, CodecError> {
    let name = match map.get("handler") {
        Some(JsonValue::String(name)) => name.clone(),
        _ => {
            return Err(CodecError::Malformed {
                reason: "message without a handler name".to_string(),
            })
        }
    };
    let mut msg = Message::new(name);
    for (key, item) in map {
        match key.as_str() {
            "handler" => {}
            "id" => msg.id = item.as_u64(),
            "parent" => msg.parent = item.as_u64(),
            "timestamp" => {
                let text = item.as_str().ok_or_else(|| CodecError::Malformed {
                    reason: "message timestamp is not text".to_string(),
                })?;
                let parsed =
                    DateTime::parse_from_rfc3339(text).map_err(|e| CodecError::Malformed {
                        reason: format!("bad message timestamp {text:?}: {e}"),
                    })?;
                msg.timestamp = Some(parsed.with_timezone(&Utc));
            }
            "children" => match item {
                JsonValue::Array(items) => {
                    let mut children = Vec::with_capacity(items.len());
                    for child in items {
                        children.push(value_from_json(child, registry)?);
                    }
                    msg.children = children;
                }
                _ => {
                    return Err(CodecError::Malformed {
                        reason: "message children is not a sequence".to_string(),
                    })
                }
            },
            _ => {
                msg.payload
                    .insert(key.clone(), value_from_json(item, registry)?);
            }
        }
    }
    Ok(msg)
}
