//! Node Paths
//!
//! Every node stores the chain of its ancestor ids, from the virtual root down
//! to the node itself, rendered as a comma-delimited string such as
//! `-1,1034,1035`. [`NodePath`] is the parsed form of that string.
//!
//! # Containment
//!
//! All ancestry checks compare parsed ids, never substrings, so id `10`
//! never matches inside `100` regardless of how the string was delimited.
//!
//! # Examples
//!
//! ```rust
//! use mediatree_core::models::NodePath;
//!
//! let path: NodePath = "-1,1034,1035".parse().unwrap();
//! assert!(path.contains(1034));
//! assert!(!path.contains(103));
//! assert_eq!(path.parent_id(), Some(1034));
//! assert_eq!(path.to_string(), "-1,1034,1035");
//! ```

use super::node::{NodeId, ValidationError, ROOT_ID};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DELIMITER: char = ',';

/// Ordered ancestor chain of a node, starting at [`ROOT_ID`] and ending with
/// the node's own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<NodeId>);

impl NodePath {
    /// Path of the virtual root itself (`-1`)
    pub fn root() -> Self {
        Self(vec![ROOT_ID])
    }

    /// Build a path from an id chain
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MalformedPath` if the chain is empty or does
    /// not start at the root.
    pub fn from_ids(ids: Vec<NodeId>) -> Result<Self, ValidationError> {
        match ids.first().copied() {
            None => Err(malformed(&ids, "path is empty")),
            Some(first) if first != ROOT_ID => {
                Err(malformed(&ids, "path must start at the root"))
            }
            Some(_) => Ok(Self(ids)),
        }
    }

    /// Path of a direct child of this path's node
    pub fn child(&self, id: NodeId) -> Self {
        let mut ids = self.0.clone();
        ids.push(id);
        Self(ids)
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    /// Whether `id` is one of the segments (ancestor-or-self)
    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    /// Id of the node this path addresses (last segment)
    pub fn node_id(&self) -> NodeId {
        // from_ids/FromStr guarantee at least the root segment
        self.0.last().copied().unwrap_or(ROOT_ID)
    }

    /// Id of the direct parent, `None` for the root path
    pub fn parent_id(&self) -> Option<NodeId> {
        self.0.len().checked_sub(2).map(|i| self.0[i])
    }

    /// Depth below the root (top-level nodes are level 1)
    pub fn level(&self) -> usize {
        self.0.len() - 1
    }

    /// Whether `prefix` is a (non-strict) leading segment run of this path
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Whether this path lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &NodePath) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }

    /// Replace the leading `old_prefix` with `new_prefix`
    ///
    /// Returns `None` if this path does not start with `old_prefix`.
    pub fn rebase(&self, old_prefix: &NodePath, new_prefix: &NodePath) -> Option<NodePath> {
        if !self.starts_with(old_prefix) {
            return None;
        }
        let mut ids = new_prefix.0.clone();
        ids.extend_from_slice(&self.0[old_prefix.0.len()..]);
        Some(Self(ids))
    }
}

fn malformed(ids: &[NodeId], reason: &str) -> ValidationError {
    let rendered = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    ValidationError::MalformedPath {
        path: rendered,
        reason: reason.to_string(),
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", DELIMITER)?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::MalformedPath {
                path: s.to_string(),
                reason: "path is empty".to_string(),
            });
        }

        let ids = s
            .split(DELIMITER)
            .map(|segment| {
                segment
                    .parse::<NodeId>()
                    .map_err(|_| ValidationError::MalformedPath {
                        path: s.to_string(),
                        reason: format!("segment '{}' is not an integer id", segment),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ids[0] != ROOT_ID {
            return Err(ValidationError::MalformedPath {
                path: s.to_string(),
                reason: "path must start at the root".to_string(),
            });
        }

        Ok(Self(ids))
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
