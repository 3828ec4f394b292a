//! Accrete: an event-sourcing core built from two layers.
//!
//! The lower layer is a **combination algebra**: [`combine`] relates a
//! target and an incoming value by their tag pair and produces a new
//! target. The upper layer is a **branching log**: [`Tree`] keeps an
//! append-only n-ary history of immutable values whose edges fold through
//! the algebra (or any reducer you supply), memoizing the accumulated
//! state, the *residue*, at every branch tip.
//!
//! Named transitions layer on the algebra: registering a [`Handler`] into
//! a core record and dispatching a [`Message`] at it records the message
//! in a causal log and folds the handler's patches back in, cascading
//! through patches that are themselves messages.
//!
//! # Core Concepts
//!
//! - **Value**: the closed sum type every layer speaks ([`Value`])
//! - **Combine**: tag-pair rules producing new targets, never mutating old ones
//! - **Cascade**: named transitions with causal message linkage
//! - **Tree**: branching history with memoized residues and transactional adds
//!
//! # Example
//!
//! ```rust
//! use accrete::cascade::{Handler, Message};
//! use accrete::record;
//! use accrete::tree::Tree;
//! use accrete::value::Value;
//!
//! // A named transition: decrement a counter.
//! let dec = Handler::new("dec", |_core: &Value, msg: &Message| {
//!     let amount = msg.payload.get("amount").and_then(Value::as_number).unwrap_or(1.0);
//!     Ok(record! { "count" => -amount })
//! });
//!
//! // History is a branching log; every edge folds through the algebra.
//! let mut tree = Tree::new(record! { "count" => 100.0 });
//! tree.add(Value::Handler(dec)).unwrap();
//! tree.add(Message::new("dec").field("amount", 50.0).into()).unwrap();
//!
//! let residue = tree.residue(tree.last()).unwrap();
//! assert_eq!(residue.get("count"), Some(&Value::from(50.0)));
//! ```
//!
//! The whole core is synchronous and single-writer: a call to `add` or
//! `combine` runs its entire cascade on the caller's stack before
//! returning, and concurrent producers must serialize their calls
//! themselves.

pub mod cascade;
pub mod checkpoint;
pub mod combine;
pub mod tree;
pub mod value;

// Re-export commonly used types
pub use cascade::{assert_handler, log_handler, Handler, HandlerBuilder, Message};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use combine::{combine, combine_all, CombineError};
pub use tree::{Branch, Combine, Entry, Node, NodeId, Reducer, Registry, Tree, TreeError};
pub use value::{Callable, Kind, Map, Value};
