//! Node Data Structures
//!
//! This module defines the core `Node` struct for the media tree, the reserved
//! sentinel ids, and the `ValidationError` type shared by every business rule.
//!
//! # Architecture
//!
//! - **Integer ids**: Nodes are addressed by `i64` ids; `ROOT_ID` and
//!   `RECYCLE_BIN_ID` are virtual positions that never resolve to a stored node
//! - **Materialised paths**: Every node carries its full ancestor chain
//!   (`NodePath`), kept consistent with `parent_id` on every move
//! - **Soft delete**: `trashed` nodes keep their original path so they can be
//!   restored by moving them back into the live tree
//!
//! # Examples
//!
//! ```rust
//! use mediatree_core::models::{Node, NodePath};
//!
//! let parent_path: NodePath = "-1,1034".parse().unwrap();
//! let node = Node::new(1035, "holiday.jpg".to_string(), 1032, &parent_path);
//!
//! assert_eq!(node.parent_id, 1034);
//! assert_eq!(node.path.to_string(), "-1,1034,1035");
//! assert!(node.validate().is_ok());
//! ```

use super::path::NodePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a node in the tree
pub type NodeId = i64;

/// Identifier of a content (media) type
pub type ContentTypeId = i64;

/// Virtual ancestor of all top-level nodes
pub const ROOT_ID: NodeId = -1;

/// Virtual container of all trashed nodes
pub const RECYCLE_BIN_ID: NodeId = -21;

/// Whether `id` is one of the reserved, never-persisted ids
pub fn is_sentinel(id: NodeId) -> bool {
    id == ROOT_ID || id == RECYCLE_BIN_ID
}

/// Default version value for serde deserialization (version 1)
fn default_version() -> i64 {
    1
}

/// Business-rule violations
///
/// These are expected, recoverable outcomes that the boundary layer
/// translates into user-facing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The node's content type may not live directly under the root
    #[error("Node '{node_id}' of content type {content_type_id} is not allowed at the root")]
    NotAllowedAtRoot {
        node_id: NodeId,
        content_type_id: ContentTypeId,
    },

    /// The destination's content type does not list the node's content type
    #[error("Content type {content_type_id} of node '{node_id}' is not allowed under node '{parent_id}'")]
    NotAllowedByContentType {
        node_id: NodeId,
        content_type_id: ContentTypeId,
        parent_id: NodeId,
    },

    /// The destination is the node itself or one of its descendants
    #[error("Node '{node_id}' cannot be placed under '{parent_id}' which is inside its own subtree")]
    NotAllowedByPath { node_id: NodeId, parent_id: NodeId },

    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Inconsistent node '{node_id}': {reason}")]
    InconsistentNode { node_id: NodeId, reason: String },

    #[error("Sort request lists node '{0}' more than once")]
    DuplicateSortId(NodeId),

    #[error("Sort request references unknown node '{0}'")]
    UnknownSortId(NodeId),

    #[error("Sort request mixes children of '{expected}' and '{found}'")]
    MixedSortParents { expected: NodeId, found: NodeId },

    #[error("Unknown order field: {0}")]
    UnknownOrderField(String),

    #[error("Node name cannot be empty")]
    EmptyName,
}

/// Lifecycle state of a node with respect to deletion
///
/// Deletion is monotonic: `Active → Trashed → Erased`. `Erased` is never
/// persisted; an erased node simply no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    Active,
    Trashed,
    Erased,
}

/// A node in the media tree.
///
/// # Fields
///
/// - `id`: Unique integer identifier
/// - `parent_id`: Direct parent (`ROOT_ID` for top-level nodes)
/// - `name`: Display name, used by filtering and name ordering
/// - `path`: Ancestor chain from the root down to this node, inclusive
/// - `content_type_id`: Media type; drives root placement and child allow-lists
/// - `trashed`: Soft-deleted flag (node sits in the recycle bin)
/// - `sort_order`: Position among siblings
/// - `version`: Optimistic concurrency counter, bumped by the store on save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    pub parent_id: NodeId,

    pub name: String,

    /// Rendered as `-1,1034,1035` on the wire
    pub path: NodePath,

    pub content_type_id: ContentTypeId,

    #[serde(default)]
    pub trashed: bool,

    #[serde(default)]
    pub sort_order: i32,

    #[serde(default = "default_version")]
    pub version: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node directly below `parent_path`
    ///
    /// `parent_id` is taken from the last segment of `parent_path`, so passing
    /// `NodePath::root()` creates a top-level node.
    pub fn new(
        id: NodeId,
        name: String,
        content_type_id: ContentTypeId,
        parent_path: &NodePath,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: parent_path.node_id(),
            name,
            path: parent_path.child(id),
            content_type_id,
            trashed: false,
            sort_order: 0,
            version: default_version(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the structural invariants of a single node
    ///
    /// - the name is not blank
    /// - the path ends with the node's own id
    /// - `parent_id` matches the second-to-last path segment
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.path.node_id() != self.id {
            return Err(ValidationError::InconsistentNode {
                node_id: self.id,
                reason: format!("path '{}' does not end with the node id", self.path),
            });
        }

        if self.path.parent_id() != Some(self.parent_id) {
            return Err(ValidationError::InconsistentNode {
                node_id: self.id,
                reason: format!(
                    "parent {} does not match path '{}'",
                    self.parent_id, self.path
                ),
            });
        }

        Ok(())
    }

    /// Whether the node sits directly under the root
    pub fn is_top_level(&self) -> bool {
        self.parent_id == ROOT_ID
    }

    /// Depth below the root (top-level nodes are level 1)
    pub fn level(&self) -> usize {
        self.path.level()
    }

    pub fn state(&self) -> LifecycleState {
        if self.trashed {
            LifecycleState::Trashed
        } else {
            LifecycleState::Active
        }
    }
}
