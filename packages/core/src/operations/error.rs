//! Error types for media tree operations
//!
//! Every operation returns a typed `OperationError`; nothing is signalled
//! through logs or boolean side channels.

use super::hooks::HookPoint;
use crate::db::StoreError;
use crate::models::{ContentTypeId, NodeId, ValidationError};
use thiserror::Error;

/// Errors that can occur during media tree operations
///
/// # Examples
///
/// ```rust
/// use mediatree_core::operations::OperationError;
///
/// let err = OperationError::node_not_found(1034);
/// assert!(err.is_not_found());
/// assert_eq!(err.to_string(), "Node '1034' does not exist");
/// ```
#[derive(Error, Debug)]
pub enum OperationError {
    /// Id does not resolve to an existing node
    #[error("Node '{node_id}' does not exist")]
    NotFound { node_id: NodeId },

    /// A node references a content type the store does not know
    #[error("Content type {content_type_id} does not exist")]
    ContentTypeNotFound { content_type_id: ContentTypeId },

    /// The user's start node does not cover the requested node
    #[error("User {user_id} has no access to node '{node_id}'")]
    Forbidden { user_id: i64, node_id: NodeId },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An operation hook vetoed the change; nothing was written
    #[error("{operation} operation was cancelled: {reason}")]
    Cancelled { operation: HookPoint, reason: String },

    /// The node was modified concurrently between read and write
    #[error("Version conflict for node '{node_id}': expected version {expected_version}, but current version is {actual_version}")]
    VersionConflict {
        node_id: NodeId,
        expected_version: i64,
        actual_version: i64,
    },

    /// The repository failed; the operation was abandoned as a whole
    #[error("Persistence failed while {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl OperationError {
    pub fn node_not_found(node_id: NodeId) -> Self {
        Self::NotFound { node_id }
    }

    pub fn content_type_not_found(content_type_id: ContentTypeId) -> Self {
        Self::ContentTypeNotFound { content_type_id }
    }

    pub fn forbidden(user_id: i64, node_id: NodeId) -> Self {
        Self::Forbidden { user_id, node_id }
    }

    pub fn cancelled(operation: HookPoint, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            operation,
            reason: reason.into(),
        }
    }

    /// Classify a store failure
    ///
    /// `StoreError`s raised by the backend keep their meaning (missing node,
    /// stale version); anything else becomes `Persistence`.
    pub fn from_store(context: impl Into<String>, source: anyhow::Error) -> Self {
        match source.downcast_ref::<StoreError>() {
            Some(StoreError::NodeNotFound(node_id)) => Self::node_not_found(*node_id),
            Some(StoreError::VersionConflict {
                node_id,
                expected_version,
                actual_version,
            }) => Self::VersionConflict {
                node_id: *node_id,
                expected_version: *expected_version,
                actual_version: *actual_version,
            },
            _ => Self::Persistence {
                context: context.into(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_classifies_known_failures() {
        let missing = OperationError::from_store("saving", StoreError::NodeNotFound(7).into());
        assert!(matches!(missing, OperationError::NotFound { node_id: 7 }));

        let stale = OperationError::from_store(
            "saving",
            StoreError::version_conflict(7, 1, 2).into(),
        );
        assert!(matches!(
            stale,
            OperationError::VersionConflict {
                node_id: 7,
                expected_version: 1,
                actual_version: 2
            }
        ));

        let other = OperationError::from_store("saving", anyhow::anyhow!("disk full"));
        assert_eq!(other.to_string(), "Persistence failed while saving: disk full");
    }

    #[test]
    fn test_validation_conversion() {
        let err: OperationError = ValidationError::EmptyName.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: Node name cannot be empty");
    }
}
