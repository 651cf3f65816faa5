//! Delete state machine
//!
//! A single delete request is overloaded: the first call on an active node
//! moves its subtree to the recycle bin, a second call on the (now trashed)
//! node erases the subtree permanently.
//!
//! ```text
//! Active ──request_delete──▶ Trashed ──request_delete──▶ Erased
//!                              │
//!                              └──empty_recycle_bin──▶ Erased
//! ```
//!
//! Each transition is staged in memory, offered to the hooks, then committed
//! as one store batch. A hook veto or a store failure leaves every node of
//! the subtree in its prior state.

use super::error::OperationError;
use super::hooks::{HookPoint, HookRegistry};
use crate::db::NodeStore;
use crate::models::{LifecycleState, Node, NodeId};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub node_id: NodeId,
    /// State the node is in after the request
    pub state: LifecycleState,
    /// Nodes touched, the requested node included
    pub affected_count: usize,
}

pub struct LifecycleManager {
    store: Arc<dyn NodeStore>,
    hooks: Arc<HookRegistry>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn NodeStore>, hooks: Arc<HookRegistry>) -> Self {
        Self { store, hooks }
    }

    /// Advance `node_id` one step through the delete state machine
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node does not exist (including already erased nodes)
    /// - `Cancelled` if a hook vetoes the transition
    /// - `Persistence` / `VersionConflict` if the store rejects the batch
    pub async fn request_delete(&self, node_id: NodeId) -> Result<DeleteOutcome, OperationError> {
        let node = self
            .store
            .get_node(node_id)
            .await
            .map_err(|e| OperationError::from_store("resolving node for delete", e))?
            .ok_or_else(|| OperationError::node_not_found(node_id))?;

        match node.state() {
            LifecycleState::Active => self.trash(node).await,
            LifecycleState::Trashed | LifecycleState::Erased => self.erase(node).await,
        }
    }

    /// Erase every trashed node
    ///
    /// Returns the number of nodes erased; an empty recycle bin is a
    /// successful no-op returning 0.
    pub async fn empty_recycle_bin(&self) -> Result<usize, OperationError> {
        let trashed = self
            .store
            .get_trashed()
            .await
            .map_err(|e| OperationError::from_store("listing recycle bin", e))?;

        if trashed.is_empty() {
            tracing::debug!("Recycle bin already empty");
            return Ok(0);
        }

        // Collect the trashed subtrees, visiting each node once
        let mut seen = HashSet::with_capacity(trashed.len());
        let mut doomed = Vec::with_capacity(trashed.len());
        for node in trashed {
            if !seen.insert(node.id) {
                continue;
            }
            let descendants = self
                .store
                .get_descendants(node.id)
                .await
                .map_err(|e| OperationError::from_store("collecting trashed subtree", e))?;
            doomed.push(node);
            doomed.extend(descendants.into_iter().filter(|d| seen.insert(d.id)));
        }

        self.hooks.check(HookPoint::Erasing, &doomed)?;

        let ids: Vec<NodeId> = doomed.iter().map(|n| n.id).collect();
        let erased = self
            .store
            .delete_nodes(&ids)
            .await
            .map_err(|e| OperationError::from_store("emptying recycle bin", e))?;

        tracing::info!("Emptied recycle bin: {} node(s) erased", erased);
        Ok(erased)
    }

    async fn subtree(&self, node: Node) -> Result<Vec<Node>, OperationError> {
        let descendants = self
            .store
            .get_descendants(node.id)
            .await
            .map_err(|e| OperationError::from_store("collecting subtree", e))?;

        let mut subtree = Vec::with_capacity(descendants.len() + 1);
        subtree.push(node);
        subtree.extend(descendants);
        Ok(subtree)
    }

    async fn trash(&self, node: Node) -> Result<DeleteOutcome, OperationError> {
        let node_id = node.id;
        let staged: Vec<Node> = self
            .subtree(node)
            .await?
            .into_iter()
            .map(|mut n| {
                n.trashed = true;
                n
            })
            .collect();

        self.hooks.check(HookPoint::Trashing, &staged)?;

        let saved = self
            .store
            .save_nodes(staged)
            .await
            .map_err(|e| OperationError::from_store("moving subtree to recycle bin", e))?;

        tracing::info!(
            "Moved node {} to recycle bin ({} node(s))",
            node_id,
            saved.len()
        );
        Ok(DeleteOutcome {
            node_id,
            state: LifecycleState::Trashed,
            affected_count: saved.len(),
        })
    }

    async fn erase(&self, node: Node) -> Result<DeleteOutcome, OperationError> {
        let node_id = node.id;
        let subtree = self.subtree(node).await?;

        self.hooks.check(HookPoint::Erasing, &subtree)?;

        let ids: Vec<NodeId> = subtree.iter().map(|n| n.id).collect();
        let erased = self
            .store
            .delete_nodes(&ids)
            .await
            .map_err(|e| OperationError::from_store("erasing subtree", e))?;

        tracing::info!("Erased node {} ({} node(s))", node_id, erased);
        Ok(DeleteOutcome {
            node_id,
            state: LifecycleState::Erased,
            affected_count: erased,
        })
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;
