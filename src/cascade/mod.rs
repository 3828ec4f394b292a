//! The handler cascade: named, registered transitions over a core record.
//!
//! A core is an ordinary record that owns two reserved collections:
//! `handlers` (name → [`Handler`], last-write-wins) and `msgs` (the
//! append-only, causally ordered log of dispatched [`Message`]s). Combining
//! a handler into a record registers it; combining a message dispatches it,
//! records it, and folds the handler's patches back into the core, and a
//! patch that is itself a message recurses, which is the cascade.
//!
//! Everything here runs on the caller's stack, synchronously, to
//! completion. A handler may kick off outside work, but it cannot await
//! anything, and it must not re-enter the log except as a fresh external
//! event.

mod builtin;
mod dispatch;
mod handler;
mod message;

pub use builtin::{assert_handler, log_handler};
pub use handler::{BuildError, CallFn, HandleFn, Handler, HandlerBuilder, InstallFn};
pub use message::Message;

pub(crate) use dispatch::{dispatch, register};
