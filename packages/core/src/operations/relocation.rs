//! Move and copy validation
//!
//! `MoveCopyValidator` decides whether a node may be relocated under a new
//! parent (or to the root). The rules are the same for move and copy:
//!
//! 1. The node must exist
//! 2. Root destinations (any negative id) require a content type that is
//!    allowed at the root
//! 3. Otherwise the destination must exist and its content type must list
//!    the node's content type as an allowed child
//! 4. The destination must not be the node itself or one of its descendants
//!
//! The planning helpers turn a validated relocation into the staged batch of
//! nodes (node plus rewritten descendants) that the caller commits at once.

use super::error::OperationError;
use crate::db::NodeStore;
use crate::models::{ContentType, ContentTypeId, Node, NodeId, NodePath, ValidationError, ROOT_ID};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolved destination of a relocation
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    /// `ROOT_ID` for root destinations
    pub parent_id: NodeId,
    pub path: NodePath,
    /// Whether the destination subtree lives in the recycle bin
    pub trashed: bool,
}

impl Destination {
    pub fn root() -> Self {
        Self {
            parent_id: ROOT_ID,
            path: NodePath::root(),
            trashed: false,
        }
    }

    pub fn under(parent: &Node) -> Self {
        Self {
            parent_id: parent.id,
            path: parent.path.clone(),
            trashed: parent.trashed,
        }
    }
}

/// Whether a destination id means "the root"
pub fn is_root_destination(destination_parent_id: NodeId) -> bool {
    destination_parent_id < 0
}

pub struct MoveCopyValidator {
    store: Arc<dyn NodeStore>,
}

impl MoveCopyValidator {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Validate relocating `node_id` under `destination_parent_id`
    ///
    /// Returns the node being moved or copied.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node or the destination does not exist
    /// - `Validation(NotAllowedAtRoot)` for a root destination the content
    ///   type does not permit
    /// - `Validation(NotAllowedByContentType)` if the destination does not
    ///   accept the node's content type
    /// - `Validation(NotAllowedByPath)` if the destination is inside the
    ///   node's own subtree
    pub async fn validate(
        &self,
        node_id: NodeId,
        destination_parent_id: NodeId,
    ) -> Result<Node, OperationError> {
        self.validate_with_destination(node_id, destination_parent_id)
            .await
            .map(|(node, _)| node)
    }

    /// Same as [`validate`](Self::validate), also returning the resolved
    /// destination
    pub async fn validate_with_destination(
        &self,
        node_id: NodeId,
        destination_parent_id: NodeId,
    ) -> Result<(Node, Destination), OperationError> {
        let node = self.get_node(node_id).await?;

        if is_root_destination(destination_parent_id) {
            let content_type = self.get_content_type(node.content_type_id).await?;
            if !content_type.allowed_as_root {
                tracing::debug!(
                    "Node {} ('{}') rejected at root by content type '{}'",
                    node.id,
                    node.name,
                    content_type.alias
                );
                return Err(ValidationError::NotAllowedAtRoot {
                    node_id: node.id,
                    content_type_id: node.content_type_id,
                }
                .into());
            }
            return Ok((node, Destination::root()));
        }

        let parent = self.get_node(destination_parent_id).await?;
        let parent_type = self.get_content_type(parent.content_type_id).await?;
        if !parent_type.allows_child(node.content_type_id) {
            tracing::debug!(
                "Content type {} not allowed under '{}' ({})",
                node.content_type_id,
                parent.name,
                parent_type.alias
            );
            return Err(ValidationError::NotAllowedByContentType {
                node_id: node.id,
                content_type_id: node.content_type_id,
                parent_id: parent.id,
            }
            .into());
        }

        if parent.path.contains(node.id) {
            tracing::debug!(
                "Node {} cannot move under '{}': destination is inside its subtree",
                node.id,
                parent.path
            );
            return Err(ValidationError::NotAllowedByPath {
                node_id: node.id,
                parent_id: parent.id,
            }
            .into());
        }

        let destination = Destination::under(&parent);
        Ok((node, destination))
    }

    async fn get_node(&self, id: NodeId) -> Result<Node, OperationError> {
        self.store
            .get_node(id)
            .await
            .map_err(|e| OperationError::from_store("resolving node for relocation", e))?
            .ok_or_else(|| OperationError::node_not_found(id))
    }

    async fn get_content_type(&self, id: ContentTypeId) -> Result<ContentType, OperationError> {
        self.store
            .get_content_type(id)
            .await
            .map_err(|e| OperationError::from_store("resolving content type", e))?
            .ok_or_else(|| OperationError::content_type_not_found(id))
    }
}

/// Sort order that appends after the existing `siblings`
pub fn next_sort_order<'a>(siblings: impl IntoIterator<Item = &'a Node>) -> i32 {
    siblings
        .into_iter()
        .map(|n| n.sort_order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Stage a move of `node` and its `descendants` under `destination`
///
/// Rewrites the node's parent and every path in the subtree, and puts the
/// node at `sort_order`. The trashed flag of the whole subtree follows the
/// destination, so moving a trashed subtree under a live parent restores it.
///
/// # Errors
///
/// `InconsistentNode` if a descendant's path does not start with the node's
/// path; nothing is staged in that case.
pub fn plan_move(
    node: Node,
    descendants: Vec<Node>,
    destination: &Destination,
    sort_order: i32,
) -> Result<Vec<Node>, ValidationError> {
    let old_path = node.path.clone();
    let new_path = destination.path.child(node.id);

    let mut moved = node;
    moved.parent_id = destination.parent_id;
    moved.path = new_path.clone();
    moved.sort_order = sort_order;
    moved.trashed = destination.trashed;

    let mut staged = Vec::with_capacity(descendants.len() + 1);
    staged.push(moved);
    for mut descendant in descendants {
        let Some(rebased) = descendant.path.rebase(&old_path, &new_path) else {
            return Err(ValidationError::InconsistentNode {
                node_id: descendant.id,
                reason: format!("path '{}' is not below '{}'", descendant.path, old_path),
            });
        };
        descendant.path = rebased;
        descendant.trashed = destination.trashed;
        staged.push(descendant);
    }
    Ok(staged)
}

/// Stage a copy of `node` and its `descendants` under `destination`
///
/// `new_ids` supplies one fresh id per copied node, in the order the nodes
/// are given (the node first, then `descendants`, parents before children).
/// Copies start at version 1 with fresh timestamps. They are active even when
/// the source sits in the recycle bin, unless the destination itself is
/// trashed, in which case they are trashed along with it.
pub fn plan_copy(
    node: &Node,
    descendants: &[Node],
    destination: &Destination,
    sort_order: i32,
    new_ids: &[NodeId],
) -> Vec<Node> {
    let originals = std::iter::once(node).chain(descendants.iter());
    let id_map: HashMap<NodeId, NodeId> = originals
        .clone()
        .map(|n| n.id)
        .zip(new_ids.iter().copied())
        .collect();

    let mut new_paths: HashMap<NodeId, NodePath> = HashMap::with_capacity(id_map.len());
    let mut staged = Vec::with_capacity(id_map.len());

    for original in originals {
        let Some(&copy_id) = id_map.get(&original.id) else {
            break;
        };

        let (parent_id, parent_path) = if original.id == node.id {
            (destination.parent_id, destination.path.clone())
        } else {
            let Some(&mapped_parent) = id_map.get(&original.parent_id) else {
                continue;
            };
            let Some(parent_path) = new_paths.get(&mapped_parent) else {
                continue;
            };
            (mapped_parent, parent_path.clone())
        };

        let mut copy = Node::new(
            copy_id,
            original.name.clone(),
            original.content_type_id,
            &parent_path,
        );
        copy.parent_id = parent_id;
        copy.trashed = destination.trashed;
        copy.sort_order = if original.id == node.id {
            sort_order
        } else {
            original.sort_order
        };

        new_paths.insert(copy_id, copy.path.clone());
        staged.push(copy);
    }

    staged
}
