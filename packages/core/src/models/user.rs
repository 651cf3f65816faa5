//! Backoffice users as seen by the access rules
//!
//! Only the start node matters here; the user's wider permission set is
//! handled outside this crate.

use super::node::{NodeId, ROOT_ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Root of the subtree this user is scoped to (`ROOT_ID` = unrestricted)
    pub start_node_id: NodeId,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>, start_node_id: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            start_node_id,
        }
    }

    /// A user whose scope is the whole tree
    pub fn unrestricted(id: i64, name: impl Into<String>) -> Self {
        Self::new(id, name, ROOT_ID)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.start_node_id == ROOT_ID
    }
}
