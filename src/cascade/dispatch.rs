//! Registration and dispatch: the two combination rules that turn a core
//! record into a state machine.
//!
//! Both rules are reached only through [`combine`], never called directly
//! by outside code. Dispatch is the one place in the algebra with a
//! documented, observable side effect on its result: the triggering
//! message is appended to the core's `msgs` log. Under ownership this is
//! "clone the record, push, return the new record"; the caller's target
//! is never touched.

use chrono::Utc;

use crate::cascade::{Handler, Message};
use crate::combine::{combine, merge_records, CombineError};
use crate::value::{Map, Value};

/// Reserved core key holding the name → handler record.
pub(crate) const HANDLERS_KEY: &str = "handlers";
/// Reserved core key holding the append-only message log.
pub(crate) const MSGS_KEY: &str = "msgs";

/// Register a handler into a core: seed the reserved collections if they
/// are missing, then insert by name. Overwriting an existing name is
/// allowed and last-write-wins.
pub(crate) fn register(core: &Map, handler: &Handler) -> Result<Value, CombineError> {
    let mut seed = Map::new();
    seed.insert(HANDLERS_KEY.to_string(), Value::Record(Map::new()));
    seed.insert(MSGS_KEY.to_string(), Value::Seq(Vec::new()));
    let mut core = merge_records(core, &seed)?;

    match core.get_mut(HANDLERS_KEY) {
        Some(Value::Record(handlers)) => {
            handlers.insert(handler.name().to_string(), Value::Handler(handler.clone()));
        }
        _ => {
            return Err(CombineError::Rejected {
                reason: format!("core field {HANDLERS_KEY:?} is not a record"),
            })
        }
    }
    Ok(Value::Record(core))
}

/// Dispatch a message against a core: record it, run its handler, and fold
/// the resulting patches back in, cascading through any patches that are
/// themselves messages.
///
/// Folding is strictly sequential and depth-first; later patches see the
/// core produced by earlier ones. There is no cycle detection; handler
/// authors own termination of their cascades.
pub(crate) fn dispatch(core: &Map, msg: &Message) -> Result<Value, CombineError> {
    let mut msg = msg.clone();
    // A message nothing caused is a root event; stamp its arrival time.
    // The clone above doubles as the defensive copy before mutation.
    if msg.is_root() {
        msg.timestamp = Some(Utc::now());
    }

    let mut core = core.clone();
    let id = match core.get_mut(MSGS_KEY) {
        Some(Value::Seq(msgs)) => {
            let id = msgs.len() as u64;
            msg.id = Some(id);
            msgs.push(Value::Message(Box::new(msg.clone())));
            id
        }
        _ => {
            return Err(CombineError::Rejected {
                reason: format!("core has no {MSGS_KEY:?} log; register a handler first"),
            })
        }
    };

    let handler = match core.get(HANDLERS_KEY) {
        Some(Value::Record(handlers)) => match handlers.get(&msg.handler) {
            Some(Value::Handler(handler)) => handler.clone(),
            _ => {
                return Err(CombineError::HandlerNotFound {
                    name: msg.handler.clone(),
                    message: msg.to_string(),
                })
            }
        },
        _ => {
            return Err(CombineError::HandlerNotFound {
                name: msg.handler.clone(),
                message: msg.to_string(),
            })
        }
    };

    let core_value = Value::Record(core);
    let mut patches = match handler.handle(&core_value, &msg)? {
        Value::Absent => Vec::new(),
        Value::Seq(items) => items,
        single => vec![single],
    };

    // Causal linkage: record patches gain a "parent" key that merges into
    // the core; message patches gain their parent field.
    for patch in &mut patches {
        match patch {
            Value::Record(map) => {
                map.insert("parent".to_string(), Value::Number(id as f64));
            }
            Value::Message(child) => {
                child.parent = Some(id);
            }
            _ => {}
        }
    }

    let mut core = match core_value {
        Value::Record(map) => map,
        _ => unreachable!("core was constructed as a record above"),
    };
    if let Some(Value::Seq(msgs)) = core.get_mut(MSGS_KEY) {
        if let Some(Value::Message(stored)) = msgs.get_mut(id as usize) {
            stored.children = patches.clone();
        }
    }

    let mut core = Value::Record(core);
    for patch in &patches {
        core = combine(&core, patch)?;
    }
    Ok(core)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    fn msgs_of(core: &Value) -> Vec<Message> {
        match core.get(MSGS_KEY) {
            Some(Value::Seq(items)) => items
                .iter()
                .map(|v| match v {
                    Value::Message(m) => (**m).clone(),
                    other => panic!("non-message in msgs log: {other}"),
                })
                .collect(),
            other => panic!("missing msgs log: {other:?}"),
        }
    }

    fn dec_handler() -> Handler {
        Handler::new("dec", |core: &Value, msg: &Message| {
            let count = core.get("count").and_then(Value::as_number).unwrap_or(0.0);
            if count <= 0.0 {
                return Err(CombineError::HandlerFailed {
                    name: "dec".to_string(),
                    reason: format!("count is exhausted at {count}"),
                });
            }
            let amount = msg
                .payload
                .get("amount")
                .and_then(Value::as_number)
                .unwrap_or(1.0);
            Ok(record! { "count" => -amount })
        })
    }

    #[test]
    fn registration_seeds_the_reserved_collections() {
        let core = combine(&record! {}, &Value::Handler(dec_handler())).unwrap();
        assert!(matches!(core.get(HANDLERS_KEY), Some(Value::Record(_))));
        assert!(matches!(core.get(MSGS_KEY), Some(Value::Seq(s)) if s.is_empty()));
        assert!(matches!(
            core.get(HANDLERS_KEY).and_then(|h| h.get("dec")),
            Some(Value::Handler(_)),
        ));
    }

    #[test]
    fn registration_preserves_existing_state() {
        let core = combine(&record! { "count" => 10.0 }, &Value::Handler(dec_handler())).unwrap();
        assert_eq!(core.get("count"), Some(&Value::from(10.0)));

        // Registering a second time must not clear the message log.
        let core = combine(&core, &Message::new("dec").into()).unwrap();
        let core = combine(&core, &Value::Handler(dec_handler())).unwrap();
        assert_eq!(msgs_of(&core).len(), 1);
    }

    #[test]
    fn registration_is_last_write_wins() {
        let loud = Handler::new("dec", |_: &Value, _: &Message| Ok(record! { "loud" => true }));
        let core = combine(&record! { "count" => 5.0 }, &Value::Handler(dec_handler())).unwrap();
        let core = combine(&core, &Value::Handler(loud)).unwrap();

        let core = combine(&core, &Message::new("dec").into()).unwrap();
        assert_eq!(core.get("loud"), Some(&Value::from(true)));
        assert_eq!(core.get("count"), Some(&Value::from(5.0)));
    }

    #[test]
    fn dispatch_records_and_stamps_the_message() {
        let core = combine(&record! { "count" => 3.0 }, &Value::Handler(dec_handler())).unwrap();
        let core = combine(&core, &Message::new("dec").into()).unwrap();

        let msgs = msgs_of(&core);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].id, Some(0));
        // A root event gets a timestamp; its recorded patches gain a parent.
        assert!(msgs[0].timestamp.is_some());
        assert_eq!(msgs[0].children.len(), 1);
        assert_eq!(
            msgs[0].children[0].get("parent"),
            Some(&Value::from(0.0)),
        );
        assert_eq!(core.get("count"), Some(&Value::from(2.0)));
    }

    #[test]
    fn dispatch_to_missing_handler_is_fatal() {
        let core = combine(&record! {}, &Value::Handler(dec_handler())).unwrap();
        let err = combine(&core, &Message::new("nope").into()).unwrap_err();
        assert!(matches!(err, CombineError::HandlerNotFound { name, .. } if name == "nope"));
    }

    #[test]
    fn dispatch_without_a_log_is_rejected() {
        let err = combine(&record! {}, &Message::new("dec").into()).unwrap_err();
        assert!(matches!(err, CombineError::Rejected { .. }));
    }

    #[test]
    fn absent_result_means_no_patches() {
        let quiet = Handler::new("quiet", |_: &Value, _: &Message| Ok(Value::Absent));
        let core = combine(&record! {}, &Value::Handler(quiet)).unwrap();
        let core = combine(&core, &Message::new("quiet").into()).unwrap();
        assert!(msgs_of(&core)[0].children.is_empty());
    }

    #[test]
    fn cascade_links_child_messages_to_their_cause() {
        // Handler A emits a message for handler B; one dispatch must record
        // both, with the second's parent pointing at the first's id.
        let a = Handler::new("a", |_: &Value, _: &Message| {
            Ok(Value::from(Message::new("b").field("mark", "from-a")))
        });
        let b = Handler::new("b", |_: &Value, _: &Message| Ok(record! { "seen" => "b" }));

        let core = combine(&record! {}, &Value::Handler(a)).unwrap();
        let core = combine(&core, &Value::Handler(b)).unwrap();
        let core = combine(&core, &Message::new("a").into()).unwrap();

        let msgs = msgs_of(&core);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].handler, "a");
        assert_eq!(msgs[1].handler, "b");
        assert_eq!(msgs[1].parent, msgs[0].id);
        // Only the root event carries a timestamp.
        assert!(msgs[0].timestamp.is_some());
        assert!(msgs[1].timestamp.is_none());
        assert_eq!(core.get("seen"), Some(&Value::from("b")));
    }

    #[test]
    fn patches_fold_sequentially() {
        // Later patches must see the core produced by earlier ones.
        let bump = Handler::new("bump", |_: &Value, _: &Message| {
            Ok(Value::Seq(vec![
                record! { "n" => 1.0 },
                record! { "n" => 10.0 },
            ]))
        });
        let core = combine(&record! { "n" => 0.0 }, &Value::Handler(bump)).unwrap();
        let core = combine(&core, &Message::new("bump").into()).unwrap();
        assert_eq!(core.get("n"), Some(&Value::from(11.0)));
    }

    #[test]
    fn counter_scenario_runs_end_to_end() {
        let core = combine(&record! { "count" => 100.0 }, &Value::Handler(dec_handler())).unwrap();

        let mut core = core;
        for _ in 0..3 {
            core = combine(&core, &Message::new("dec").into()).unwrap();
        }
        core = combine(&core, &Message::new("dec").field("amount", 50.0).into()).unwrap();
        assert_eq!(core.get("count"), Some(&Value::from(47.0)));

        // Force the counter below zero, then watch the next dispatch fail
        // fatally instead of going further negative.
        core = combine(&core, &Message::new("dec").field("amount", 200.0).into()).unwrap();
        assert_eq!(core.get("count"), Some(&Value::from(-153.0)));

        let err = combine(&core, &Message::new("dec").into()).unwrap_err();
        assert!(matches!(err, CombineError::HandlerFailed { name, .. } if name == "dec"));
    }
}
