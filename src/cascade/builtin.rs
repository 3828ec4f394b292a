//! Built-in handlers.
//!
//! Two small handlers ship with the crate: `assert`, which checks the
//! core's shallow state against the message payload, and `log`, which
//! records the last logged line into the core's residue. Both are ordinary
//! handlers; register them with `combine` like any other.

use crate::cascade::{Handler, Message};
use crate::combine::CombineError;
use crate::value::{Map, Value};

/// A handler that asserts shallow key equality against the core.
///
/// Every payload field must exist on the core with an equal value;
/// otherwise the dispatch fails with [`CombineError::HandlerFailed`].
/// Produces no patches.
///
/// # Example
///
/// ```rust
/// use accrete::cascade::{assert_handler, Message};
/// use accrete::combine::combine;
/// use accrete::record;
/// use accrete::value::Value;
///
/// let core = combine(&record! { "count" => 3.0 }, &Value::Handler(assert_handler())).unwrap();
/// assert!(combine(&core, &Message::new("assert").field("count", 3.0).into()).is_ok());
/// assert!(combine(&core, &Message::new("assert").field("count", 4.0).into()).is_err());
/// ```
pub fn assert_handler() -> Handler {
    Handler::new("assert", |core: &Value, msg: &Message| {
        for (key, expected) in &msg.payload {
            match core.get(key) {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(CombineError::HandlerFailed {
                        name: "assert".to_string(),
                        reason: format!("key {key:?}: expected {expected}, found {actual}"),
                    })
                }
                None => {
                    return Err(CombineError::HandlerFailed {
                        name: "assert".to_string(),
                        reason: format!("core is missing asserted key {key:?}"),
                    })
                }
            }
        }
        Ok(Value::Seq(Vec::new()))
    })
    .with_call(|args| match args {
        Value::Record(map) => Message::with_payload("assert", map),
        other => Message::new("assert").field("value", other),
    })
}

/// A handler that records its message text into the core.
///
/// When the core's `debug` flag is true, a `{"msg": text}` payload becomes
/// a `{"lastOutput": text}` patch; otherwise the dispatch is a recorded
/// no-op. Its `install` patch seeds `debug` and `lastOutput`, and its
/// `call` wraps bare text.
pub fn log_handler() -> Handler {
    Handler::new("log", |core: &Value, msg: &Message| {
        let debug = core.get("debug").and_then(Value::as_bool).unwrap_or(false);
        if !debug {
            return Ok(Value::Absent);
        }
        match msg.payload.get("msg").and_then(Value::as_text) {
            Some(text) => {
                let mut patch = Map::new();
                patch.insert("lastOutput".to_string(), Value::from(text));
                Ok(Value::Seq(vec![Value::Record(patch)]))
            }
            None => Ok(Value::Seq(Vec::new())),
        }
    })
    .with_install(|| {
        let mut seed = Map::new();
        seed.insert("debug".to_string(), Value::from(true));
        seed.insert("lastOutput".to_string(), Value::from(""));
        Value::Record(seed)
    })
    .with_call(|args| match args {
        Value::Text(text) => Message::new("log").field("msg", text),
        Value::Record(map) => Message::with_payload("log", map),
        other => Message::new("log").field("msg", other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::combine;
    use crate::record;

    #[test]
    fn assert_passes_on_matching_state() {
        let core = combine(
            &record! { "count" => 3.0, "label" => "x" },
            &Value::Handler(assert_handler()),
        )
        .unwrap();

        let msg = Message::new("assert").field("count", 3.0).field("label", "x");
        assert!(combine(&core, &msg.into()).is_ok());
    }

    #[test]
    fn assert_fails_on_mismatch_or_missing_key() {
        let core = combine(&record! { "count" => 3.0 }, &Value::Handler(assert_handler())).unwrap();

        let err = combine(&core, &Message::new("assert").field("count", 4.0).into()).unwrap_err();
        assert!(matches!(err, CombineError::HandlerFailed { name, .. } if name == "assert"));

        let err = combine(&core, &Message::new("assert").field("ghost", 1.0).into()).unwrap_err();
        assert!(matches!(err, CombineError::HandlerFailed { name, .. } if name == "assert"));
    }

    #[test]
    fn assert_call_wraps_a_record() {
        let msg = assert_handler()
            .call(record! { "count" => 2.0 })
            .unwrap();
        assert_eq!(msg.handler, "assert");
        assert_eq!(msg.payload.get("count"), Some(&Value::from(2.0)));
    }

    #[test]
    fn log_records_last_output_when_debugging() {
        let handler = log_handler();
        let core = combine(&record! {}, &Value::Handler(handler.clone())).unwrap();
        let core = combine(&core, &handler.install().unwrap()).unwrap();

        let msg = handler.call(Value::from("hello")).unwrap();
        let core = combine(&core, &msg.into()).unwrap();
        assert_eq!(core.get("lastOutput"), Some(&Value::from("hello")));
    }

    #[test]
    fn log_is_silent_without_debug() {
        let handler = log_handler();
        let core = combine(&record! {}, &Value::Handler(handler.clone())).unwrap();

        let msg = handler.call(Value::from("quiet")).unwrap();
        let core = combine(&core, &msg.into()).unwrap();
        assert_eq!(core.get("lastOutput"), None);
    }
}
