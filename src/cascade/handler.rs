//! Handlers: named, registered transition functions.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::cascade::Message;
use crate::combine::CombineError;
use crate::value::Value;

/// The transition function itself. Receives the core (with the triggering
/// message already appended to its log) and the message, and returns a
/// patch, a `Seq` of patches, or `Absent` for none.
pub type HandleFn = Arc<dyn Fn(&Value, &Message) -> Result<Value, CombineError> + Send + Sync>;

/// Optional convenience: a patch that seeds the core for this handler.
pub type InstallFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Optional convenience: wrap loose arguments into a well-formed message.
pub type CallFn = Arc<dyn Fn(Value) -> Message + Send + Sync>;

/// A named transition. Registering one into a core (by combining the core
/// with the handler value) makes it invokable by any message naming it.
///
/// Handlers are pure values: the same handler can be registered into many
/// cores, and registration is last-write-wins per name. Two handlers
/// compare equal when their names match.
///
/// # Example
///
/// ```rust
/// use accrete::cascade::{Handler, Message};
/// use accrete::record;
/// use accrete::value::Value;
///
/// let dec = Handler::new("dec", |_core: &Value, msg: &Message| {
///     let amount = msg.payload.get("amount").and_then(Value::as_number).unwrap_or(1.0);
///     Ok(record! { "count" => -amount })
/// });
/// assert_eq!(dec.name(), "dec");
/// ```
#[derive(Clone)]
pub struct Handler {
    name: String,
    handle: HandleFn,
    install: Option<InstallFn>,
    call: Option<CallFn>,
}

impl Handler {
    /// Create a handler from a name and its transition function.
    pub fn new<F>(name: impl Into<String>, handle: F) -> Self
    where
        F: Fn(&Value, &Message) -> Result<Value, CombineError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handle: Arc::new(handle),
            install: None,
            call: None,
        }
    }

    /// Start a fluent build of a handler with optional conveniences.
    pub fn build(name: impl Into<String>) -> HandlerBuilder {
        HandlerBuilder::new(name)
    }

    /// The handler's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the transition function.
    pub fn handle(&self, core: &Value, msg: &Message) -> Result<Value, CombineError> {
        (self.handle)(core, msg)
    }

    /// The handler's initialization patch, if it declares one.
    pub fn install(&self) -> Option<Value> {
        self.install.as_ref().map(|f| f())
    }

    /// Wrap arguments into a message for this handler, if it declares a
    /// call convenience.
    pub fn call(&self, args: Value) -> Option<Message> {
        self.call.as_ref().map(|f| f(args))
    }

    /// Attach an initialization patch.
    pub fn with_install<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.install = Some(Arc::new(f));
        self
    }

    /// Attach a message-wrapping convenience.
    pub fn with_call<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Message + Send + Sync + 'static,
    {
        self.call = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("install", &self.install.is_some())
            .field("call", &self.call.is_some())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Builder for handlers with `install`/`call` conveniences.
pub struct HandlerBuilder {
    name: String,
    handle: Option<HandleFn>,
    install: Option<InstallFn>,
    call: Option<CallFn>,
}

impl HandlerBuilder {
    /// Start building a handler with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
            install: None,
            call: None,
        }
    }

    /// Set the transition function (required).
    pub fn handle<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Message) -> Result<Value, CombineError> + Send + Sync + 'static,
    {
        self.handle = Some(Arc::new(f));
        self
    }

    /// Set the initialization patch.
    pub fn install<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.install = Some(Arc::new(f));
        self
    }

    /// Set the message-wrapping convenience.
    pub fn call<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Message + Send + Sync + 'static,
    {
        self.call = Some(Arc::new(f));
        self
    }

    /// Build the handler.
    ///
    /// Fails if no transition function was supplied.
    pub fn finish(self) -> Result<Handler, BuildError> {
        let handle = self.handle.ok_or(BuildError::MissingHandle {
            name: self.name.clone(),
        })?;
        Ok(Handler {
            name: self.name,
            handle,
            install: self.install,
            call: self.call,
        })
    }
}

/// Handler construction errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Every handler needs a transition function.
    #[error("handler '{name}' has no handle function")]
    MissingHandle { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn handle_runs_the_transition() {
        let h = Handler::new("noop", |_: &Value, _: &Message| Ok(Value::Absent));
        let out = h.handle(&record! {}, &Message::new("noop")).unwrap();
        assert_eq!(out, Value::Absent);
    }

    #[test]
    fn equality_is_by_name() {
        let a = Handler::new("same", |_: &Value, _: &Message| Ok(Value::Absent));
        let b = Handler::new("same", |_: &Value, _: &Message| Ok(Value::Null));
        let c = Handler::new("other", |_: &Value, _: &Message| Ok(Value::Absent));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn builder_requires_handle() {
        let result = Handler::build("empty").finish();
        assert!(matches!(result, Err(BuildError::MissingHandle { name }) if name == "empty"));
    }

    #[test]
    fn builder_carries_conveniences() {
        let h = Handler::build("log")
            .handle(|_: &Value, _: &Message| Ok(Value::Absent))
            .install(|| record! { "debug" => true })
            .call(|args| match args {
                Value::Text(s) => Message::new("log").field("msg", s),
                other => Message::new("log").field("msg", other.to_string()),
            })
            .finish()
            .unwrap();

        assert_eq!(h.install(), Some(record! { "debug" => true }));
        let msg = h.call(Value::from("hello")).unwrap();
        assert_eq!(msg.handler, "log");
        assert_eq!(msg.payload.get("msg"), Some(&Value::from("hello")));
    }

    #[test]
    fn plain_handler_has_no_conveniences() {
        let h = Handler::new("bare", |_: &Value, _: &Message| Ok(Value::Absent));
        assert!(h.install().is_none());
        assert!(h.call(Value::Null).is_none());
    }
}
