//! Store Error Types
//!
//! Failures raised by store backends inside `anyhow::Error`. Callers that need
//! to classify a failure downcast to [`StoreError`]; anything else is treated
//! as a plain persistence failure.

use crate::models::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Node {0} does not exist in the store")]
    NodeNotFound(NodeId),

    #[error("Node {0} already exists in the store")]
    DuplicateId(NodeId),

    /// The node was modified by another writer between read and save
    #[error("Version conflict for node {node_id}: expected version {expected_version}, found {actual_version}")]
    VersionConflict {
        node_id: NodeId,
        expected_version: i64,
        actual_version: i64,
    },
}

impl StoreError {
    pub fn version_conflict(node_id: NodeId, expected_version: i64, actual_version: i64) -> Self {
        Self::VersionConflict {
            node_id,
            expected_version,
            actual_version,
        }
    }
}
