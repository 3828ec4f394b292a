//! Checkpoint and resume functionality for branching logs.
//!
//! The raw text encoding of a tree is deliberately bare: no version, no
//! identity, no provenance. A checkpoint wraps it in a small versioned
//! envelope so a persisted log can be validated before it is replayed,
//! in a readable JSON form or a compact binary form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tree::{Reducer, Registry, Tree};

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a branching log.
///
/// Holds the tree's text encoding plus enough envelope to refuse foreign
/// data. Functions inside the tree serialize by name, so restoring needs
/// the same [`Registry`] the original session would use.
///
/// # Example
///
/// ```rust
/// use accrete::checkpoint::Checkpoint;
/// use accrete::record;
/// use accrete::tree::{Combine, Registry, Tree};
///
/// let mut tree = Tree::new(record! { "n" => 0.0 });
/// tree.add(record! { "n" => 1.0 }).unwrap();
///
/// let checkpoint = Checkpoint::capture(&tree).unwrap();
/// let restored = checkpoint.restore(Combine, &Registry::new()).unwrap();
/// assert_eq!(restored.node_count(), 2);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When the checkpoint was created
    pub created_at: DateTime<Utc>,

    /// The tree's flat text encoding
    pub tree: String,
}

impl Checkpoint {
    /// Capture a tree into a fresh checkpoint.
    pub fn capture<R: Reducer>(tree: &Tree<R>) -> Result<Self, CheckpointError> {
        let encoded = tree
            .encode()
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
        Ok(Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            tree: encoded,
        })
    }

    /// Replay the checkpointed tree.
    ///
    /// Rejects checkpoints written by an unsupported format version before
    /// touching the payload.
    pub fn restore<R: Reducer>(
        &self,
        reducer: R,
        registry: &Registry,
    ) -> Result<Tree<R>, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Tree::decode(&self.tree, reducer, registry)
            .map_err(|e| CheckpointError::RestoreFailed(e.to_string()))
    }

    /// The checkpoint as readable JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Parse a checkpoint from JSON.
    pub fn from_json(text: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(text).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    /// The checkpoint as compact bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Parse a checkpoint from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}
