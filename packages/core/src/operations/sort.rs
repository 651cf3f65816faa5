//! Sibling reordering
//!
//! `SortCoordinator` assigns `sort_order = 0, 1, 2, …` to a list of sibling
//! ids in the order given and commits the whole list as one batch. Malformed
//! requests (unknown ids, duplicates, ids from different parents) are
//! rejected before anything is staged.

use super::error::OperationError;
use super::hooks::{HookPoint, HookRegistry};
use crate::db::NodeStore;
use crate::models::{Node, NodeId, ValidationError};
use std::collections::HashSet;
use std::sync::Arc;

/// Committed result of a reorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome {
    /// Common parent of the reordered nodes; `None` for an empty request
    pub parent_id: Option<NodeId>,
    pub node_ids: Vec<NodeId>,
}

impl SortOutcome {
    fn unchanged() -> Self {
        Self {
            parent_id: None,
            node_ids: Vec::new(),
        }
    }
}

pub struct SortCoordinator {
    store: Arc<dyn NodeStore>,
    hooks: Arc<HookRegistry>,
}

impl SortCoordinator {
    pub fn new(store: Arc<dyn NodeStore>, hooks: Arc<HookRegistry>) -> Self {
        Self { store, hooks }
    }

    /// Reorder siblings to match `node_ids`
    ///
    /// An empty list is a successful no-op.
    ///
    /// # Errors
    ///
    /// - `Validation` for unknown, duplicate or mixed-parent ids
    /// - `Cancelled` if a hook vetoes any of the updates
    /// - `VersionConflict` / `Persistence` if the store rejects the batch
    pub async fn reorder(&self, node_ids: &[NodeId]) -> Result<SortOutcome, OperationError> {
        self.reorder_within(None, node_ids).await
    }

    /// Reorder children of `parent_id`; every id must be a child of it
    pub async fn reorder_children(
        &self,
        parent_id: NodeId,
        node_ids: &[NodeId],
    ) -> Result<SortOutcome, OperationError> {
        self.reorder_within(Some(parent_id), node_ids).await
    }

    async fn reorder_within(
        &self,
        expected_parent: Option<NodeId>,
        node_ids: &[NodeId],
    ) -> Result<SortOutcome, OperationError> {
        if node_ids.is_empty() {
            tracing::debug!("Empty sort request, nothing to do");
            return Ok(SortOutcome::unchanged());
        }

        let mut seen = HashSet::with_capacity(node_ids.len());
        if let Some(&duplicate) = node_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ValidationError::DuplicateSortId(duplicate).into());
        }

        let nodes = self
            .store
            .get_nodes(node_ids)
            .await
            .map_err(|e| OperationError::from_store("loading nodes to sort", e))?;
        if nodes.len() != node_ids.len() {
            let found: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
            if let Some(&missing) = node_ids.iter().find(|id| !found.contains(id)) {
                return Err(ValidationError::UnknownSortId(missing).into());
            }
        }

        let Some(parent_id) = expected_parent.or_else(|| nodes.first().map(|n| n.parent_id)) else {
            return Ok(SortOutcome::unchanged());
        };
        if let Some(stray) = nodes.iter().find(|n| n.parent_id != parent_id) {
            return Err(ValidationError::MixedSortParents {
                expected: parent_id,
                found: stray.parent_id,
            }
            .into());
        }

        let staged: Vec<Node> = nodes
            .into_iter()
            .enumerate()
            .map(|(position, mut node)| {
                node.sort_order = position as i32;
                node
            })
            .collect();

        self.hooks.check(HookPoint::Sorting, &staged)?;

        self.store
            .save_nodes(staged)
            .await
            .map_err(|e| OperationError::from_store("saving sort order", e))?;

        tracing::info!("Sorted {} children of node {}", node_ids.len(), parent_id);
        Ok(SortOutcome {
            parent_id: Some(parent_id),
            node_ids: node_ids.to_vec(),
        })
    }
}
