//! Tree error types.

use thiserror::Error;

use crate::combine::CombineError;
use crate::value::Value;

/// Errors raised at the log boundary.
///
/// A reducer failure is caught exactly here: the failing `add` aborts with
/// no change to the log, and the rejection carries the value that was
/// refused so the caller can diagnose, log, or retry on its own terms.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The reducer refused to fold this value into the path it extends.
    #[error("value rejected by reducer: {value}")]
    Rejected {
        /// The value that failed to reduce.
        value: Value,
        #[source]
        source: CombineError,
    },

    /// A node id that was never issued by this tree.
    #[error("unknown node id {id}")]
    UnknownNode { id: usize },
}
