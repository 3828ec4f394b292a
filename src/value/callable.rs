//! Named callable payloads.

use std::fmt;
use std::sync::Arc;

use crate::combine::CombineError;
use crate::value::Value;

/// A callable value: a named, pure transformation from one value to another.
///
/// The name exists so callables can survive serialization: the text codec
/// writes a callable as its name and resolves it back through a
/// [`Registry`](crate::tree::Registry) on decode. Two callables compare
/// equal when their names match.
///
/// Instead of storing a bare function pointer we store a shared closure, so
/// a callable can capture configuration at construction time.
///
/// # Example
///
/// ```rust
/// use accrete::value::{Callable, Value};
///
/// let double = Callable::new("double", |v: &Value| {
///     let n = v.as_number().unwrap_or(0.0);
///     Ok(Value::from(n * 2.0))
/// });
///
/// assert_eq!(double.invoke(&Value::from(21.0)).unwrap(), Value::from(42.0));
/// ```
#[derive(Clone)]
pub struct Callable {
    name: String,
    func: Arc<dyn Fn(&Value) -> Result<Value, CombineError> + Send + Sync>,
}

impl Callable {
    /// Create a named callable from a function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, CombineError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The callable's name, used for display, equality, and replay.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the callable to a value.
    pub fn invoke(&self, arg: &Value) -> Result<Value, CombineError> {
        (self.func)(arg)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_applies_function() {
        let negate = Callable::new("negate", |v: &Value| {
            Ok(Value::from(-v.as_number().unwrap_or(0.0)))
        });
        assert_eq!(negate.invoke(&Value::from(5.0)).unwrap(), Value::from(-5.0));
    }

    #[test]
    fn equality_is_by_name() {
        let a = Callable::new("same", |v: &Value| Ok(v.clone()));
        let b = Callable::new("same", |_: &Value| Ok(Value::Null));
        let c = Callable::new("other", |v: &Value| Ok(v.clone()));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn callable_can_fail() {
        let picky = Callable::new("picky", |v: &Value| match v {
            Value::Number(n) => Ok(Value::from(*n)),
            other => Err(CombineError::Rejected {
                reason: format!("picky wants a number, got {other}"),
            }),
        });

        assert!(picky.invoke(&Value::from(1.0)).is_ok());
        assert!(picky.invoke(&Value::from("nope")).is_err());
    }
}
