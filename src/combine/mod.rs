//! The value-combination algebra.
//!
//! [`combine`] relates a target and an incoming value by their tag pair and
//! produces a new target. It is the reducer every piece of this crate folds
//! with by default: record patches merge, numbers accumulate, sequences
//! grow, callables apply, and the two synthetic kinds (handlers and
//! messages) route into the cascade.
//!
//! The algebra is deliberately closed: a tag pair without a rule is a
//! contract violation and fails loudly, naming both tags and rendering both
//! operands.

mod error;

pub use error::CombineError;

use crate::cascade;
use crate::value::{Map, Value};

/// Combine `value` into `target`, producing a new target.
///
/// The target is never mutated; record merges defensively copy, and the
/// one observable side effect in the whole algebra (the message-log append
/// performed by dispatch) happens on an owned copy that is returned as the
/// new target.
///
/// Rule selection, in order:
///
/// 1. a `Null` target accepts anything and becomes it;
/// 2. an `Absent` value is a no-op;
/// 3. otherwise the tag pair picks a rule: scalar replacement/accumulation,
///    `Null`-zeroing, sequence concat/append, callable application, record
///    merge, handler registration, or message dispatch.
///
/// # Example
///
/// ```rust
/// use accrete::combine::combine;
/// use accrete::record;
/// use accrete::value::Value;
///
/// assert_eq!(combine(&Value::from(5.0), &Value::from(3.0)).unwrap(), Value::from(8.0));
/// assert_eq!(
///     combine(&record! { "a" => 1.0, "b" => 2.0 }, &record! { "b" => 3.0 }).unwrap(),
///     record! { "a" => 1.0, "b" => 5.0 },
/// );
/// ```
///
/// # Errors
///
/// [`CombineError::RuleMissing`] for unrelated tag pairs,
/// [`CombineError::NumericParse`] for non-numeric text combined into a
/// number, and whatever the cascade raises for handler registration and
/// message dispatch.
pub fn combine(target: &Value, value: &Value) -> Result<Value, CombineError> {
    // Nothing accepts everything and becomes it.
    if matches!(target, Value::Null) {
        return Ok(value.clone());
    }
    // Absence is a true no-op.
    if matches!(value, Value::Absent) {
        return Ok(target.clone());
    }

    match (target, value) {
        (Value::Text(_), Value::Text(s)) => Ok(Value::Text(s.clone())),
        (Value::Text(_), Value::Null) => Ok(Value::Text(String::new())),

        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Number(_), Value::Text(s)) => parse_number(s),
        (Value::Number(_), Value::Null) => Ok(Value::Number(0.0)),

        (Value::Bool(_), Value::Bool(b)) => Ok(Value::Bool(*b)),
        (Value::Bool(_), Value::Text(s)) => Ok(Value::Bool(s == "true")),
        (Value::Bool(b), Value::Null) => Ok(Value::Bool(!b)),

        (Value::Seq(a), Value::Seq(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::Seq(out))
        }
        (Value::Seq(_), Value::Null) => Ok(Value::Seq(Vec::new())),
        (Value::Seq(a), single) => {
            let mut out = a.clone();
            out.push(single.clone());
            Ok(Value::Seq(out))
        }

        (Value::Fn(f), arg) if !matches!(arg, Value::Null) => f.invoke(arg),
        (arg, Value::Fn(f)) => f.invoke(arg),

        (Value::Record(a), Value::Record(b)) => Ok(Value::Record(merge_records(a, b)?)),
        (Value::Record(core), Value::Handler(handler)) => cascade::register(core, handler),
        (Value::Record(core), Value::Message(msg)) => cascade::dispatch(core, msg),

        (t, v) => Err(CombineError::RuleMissing {
            target: t.kind(),
            value: v.kind(),
            target_repr: t.to_string(),
            value_repr: v.to_string(),
        }),
    }
}

/// Fold a run of values into a target, left to right.
pub fn combine_all<'a, I>(target: &Value, values: I) -> Result<Value, CombineError>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut acc = target.clone();
    for value in values {
        acc = combine(&acc, value)?;
    }
    Ok(acc)
}

/// Key-wise recursive record merge.
///
/// The patch side is copied and filled in; shared keys recurse through
/// [`combine`], target-only keys carry over unchanged. Neither operand is
/// mutated.
pub(crate) fn merge_records(target: &Map, patch: &Map) -> Result<Map, CombineError> {
    let mut out = patch.clone();
    for (key, existing) in target {
        match patch.get(key) {
            Some(incoming) => {
                out.insert(key.clone(), combine(existing, incoming)?);
            }
            None => {
                out.insert(key.clone(), existing.clone());
            }
        }
    }
    Ok(out)
}

fn parse_number(text: &str) -> Result<Value, CombineError> {
    text.trim()
        .parse::<f64>()
        .map(Value::Number)
        .map_err(|_| CombineError::NumericParse {
            text: text.to_string(),
        })
}
