//! Content Types
//!
//! A content type decides where nodes of that type may be placed: whether
//! they may sit directly under the root, and which child types they accept.

use super::node::ContentTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structural rules attached to a media type
///
/// # Examples
///
/// ```rust
/// use mediatree_core::models::ContentType;
///
/// let folder = ContentType::new(1031, "Folder")
///     .with_allowed_as_root(true)
///     .with_allowed_children([1031, 1032, 1033]);
///
/// assert!(folder.allows_child(1032));
/// assert!(!folder.allows_child(2000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    pub id: ContentTypeId,

    pub alias: String,

    /// Nodes of this type may exist directly under the root
    #[serde(default)]
    pub allowed_as_root: bool,

    /// Content types a node of this type may contain as children
    #[serde(default)]
    pub allowed_content_type_ids: BTreeSet<ContentTypeId>,
}

impl ContentType {
    pub fn new(id: ContentTypeId, alias: impl Into<String>) -> Self {
        Self {
            id,
            alias: alias.into(),
            allowed_as_root: false,
            allowed_content_type_ids: BTreeSet::new(),
        }
    }

    pub fn with_allowed_as_root(mut self, allowed: bool) -> Self {
        self.allowed_as_root = allowed;
        self
    }

    pub fn with_allowed_children(mut self, ids: impl IntoIterator<Item = ContentTypeId>) -> Self {
        self.allowed_content_type_ids.extend(ids);
        self
    }

    /// Whether a node of `content_type_id` may be placed under a node of this type
    pub fn allows_child(&self, content_type_id: ContentTypeId) -> bool {
        self.allowed_content_type_ids.contains(&content_type_id)
    }
}
