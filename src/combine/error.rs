//! Combination error types.

use thiserror::Error;

use crate::value::Kind;

/// Errors raised while combining values.
///
/// Nothing here is retried or swallowed: every variant is a contract
/// violation or a deliberate rejection, surfaced synchronously with enough
/// context for the caller to log, abort, or fix its input.
#[derive(Debug, Error)]
pub enum CombineError {
    /// No combination rule exists for this tag pair. Always fatal; the
    /// caller supplied values the algebra does not relate.
    #[error("no rule to combine {target} with {value}: {target_repr} --- {value_repr}")]
    RuleMissing {
        target: Kind,
        value: Kind,
        /// Best-effort rendering of the target operand.
        target_repr: String,
        /// Best-effort rendering of the value operand.
        value_repr: String,
    },

    /// A message named a handler the core has not registered.
    #[error("handler '{name}' not found for message {message}")]
    HandlerNotFound { name: String, message: String },

    /// Number-from-text conversion failed.
    #[error("cannot parse {text:?} as a number")]
    NumericParse { text: String },

    /// A handler ran and refused the transition.
    #[error("handler '{name}' failed: {reason}")]
    HandlerFailed { name: String, reason: String },

    /// A callable or custom reducer rejected its input.
    #[error("{reason}")]
    Rejected { reason: String },
}
