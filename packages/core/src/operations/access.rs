//! Path-based access evaluation
//!
//! A user may see or act on a node when their start node is an
//! ancestor-or-self of that node, i.e. appears in the node's path. Users
//! whose start node is the root are unrestricted. The two sentinel positions
//! (`ROOT_ID` and `RECYCLE_BIN_ID`) are only reachable by unrestricted users.
//! Trashed nodes belong to the recycle bin scope whatever path they keep, so
//! they are reachable by unrestricted users only as well.
//!
//! The check returns an [`AccessCheck`] that carries the resolved node, so
//! the following step of an operation can reuse it without a second lookup.

use super::error::OperationError;
use crate::db::NodeStore;
use crate::models::{is_sentinel, Node, NodeId, User};
use std::sync::Arc;

/// Outcome of an access check
///
/// `node` is `None` when the check targeted a sentinel id.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessCheck {
    pub granted: bool,
    pub node: Option<Node>,
}

pub struct PathAccessEvaluator {
    store: Arc<dyn NodeStore>,
}

impl PathAccessEvaluator {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Decide whether `user` may access `node_id`
    ///
    /// # Errors
    ///
    /// `NotFound` when a non-sentinel id does not resolve.
    pub async fn has_path_access(
        &self,
        node_id: NodeId,
        user: &User,
    ) -> Result<AccessCheck, OperationError> {
        if is_sentinel(node_id) {
            let granted = user.is_unrestricted();
            tracing::debug!(
                "Sentinel access check for user {} on {}: {}",
                user.id,
                node_id,
                granted
            );
            return Ok(AccessCheck {
                granted,
                node: None,
            });
        }

        let node = self
            .store
            .get_node(node_id)
            .await
            .map_err(|e| OperationError::from_store("resolving node for access check", e))?
            .ok_or_else(|| OperationError::node_not_found(node_id))?;

        let granted = Self::has_path_access_to(&node, user);
        tracing::debug!(
            "Path access check for user {} (start node {}) on '{}': {}",
            user.id,
            user.start_node_id,
            node.path,
            granted
        );

        Ok(AccessCheck {
            granted,
            node: Some(node),
        })
    }

    /// Access rule for an already resolved node
    pub fn has_path_access_to(node: &Node, user: &User) -> bool {
        if user.is_unrestricted() {
            return true;
        }
        !node.trashed && node.path.contains(user.start_node_id)
    }

    /// Require access, turning a denial into `Forbidden`
    ///
    /// Returns the resolved node (`None` for sentinel ids).
    pub async fn authorize(
        &self,
        node_id: NodeId,
        user: &User,
    ) -> Result<Option<Node>, OperationError> {
        let check = self.has_path_access(node_id, user).await?;
        if !check.granted {
            tracing::warn!("User {} denied access to node {}", user.id, node_id);
            return Err(OperationError::forbidden(user.id, node_id));
        }
        Ok(check.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::fixtures;
    use crate::models::{RECYCLE_BIN_ID, ROOT_ID};

    #[tokio::test]
    async fn test_scoped_user_sees_own_subtree_only() {
        let store = fixtures::seeded_store().await;
        let evaluator = PathAccessEvaluator::new(store);
        let user = User::new(5, "editor", fixtures::PHOTOS);

        let check = evaluator.has_path_access(fixtures::SUMMER, &user).await.unwrap();
        assert!(check.granted);
        assert_eq!(check.node.map(|n| n.id), Some(fixtures::SUMMER));

        assert!(evaluator.has_path_access(fixtures::PHOTOS, &user).await.unwrap().granted);
        assert!(!evaluator.has_path_access(fixtures::REPORTS, &user).await.unwrap().granted);
    }

    #[tokio::test]
    async fn test_unrestricted_user_sees_everything() {
        let store = fixtures::seeded_store().await;
        let evaluator = PathAccessEvaluator::new(store);
        let admin = User::unrestricted(1, "admin");

        for id in [fixtures::PHOTOS, fixtures::REPORTS, ROOT_ID, RECYCLE_BIN_ID] {
            assert!(evaluator.has_path_access(id, &admin).await.unwrap().granted);
        }
    }

    #[tokio::test]
    async fn test_sentinels_deny_scoped_users() {
        let store = fixtures::seeded_store().await;
        let evaluator = PathAccessEvaluator::new(store);
        let user = User::new(5, "editor", fixtures::PHOTOS);

        let root = evaluator.has_path_access(ROOT_ID, &user).await.unwrap();
        assert!(!root.granted);
        assert!(root.node.is_none());
        assert!(!evaluator.has_path_access(RECYCLE_BIN_ID, &user).await.unwrap().granted);
    }

    #[tokio::test]
    async fn test_unknown_node_is_not_found() {
        let store = fixtures::seeded_store().await;
        let evaluator = PathAccessEvaluator::new(store);
        let admin = User::unrestricted(1, "admin");

        let err = evaluator.has_path_access(4040, &admin).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_trashed_nodes_fall_under_recycle_bin_scope() {
        let store = fixtures::seeded_store().await;
        let mut beach = store.get_node(fixtures::BEACH).await.unwrap().unwrap();
        beach.trashed = true;
        store.save_nodes(vec![beach.clone()]).await.unwrap();

        let evaluator = PathAccessEvaluator::new(store);
        let editor = User::new(5, "editor", fixtures::PHOTOS);
        let admin = User::unrestricted(1, "admin");

        // The retained path "-1,10,100,101" still names the editor's start node
        assert!(beach.path.contains(fixtures::PHOTOS));
        assert!(!evaluator.has_path_access(fixtures::BEACH, &editor).await.unwrap().granted);
        assert!(evaluator.has_path_access(fixtures::BEACH, &admin).await.unwrap().granted);

        // Live siblings stay reachable
        assert!(evaluator.has_path_access(fixtures::SUNSET, &editor).await.unwrap().granted);
    }

    #[tokio::test]
    async fn test_authorize_returns_forbidden() {
        let store = fixtures::seeded_store().await;
        let evaluator = PathAccessEvaluator::new(store);
        let user = User::new(5, "editor", fixtures::DOCUMENTS);

        let node = evaluator.authorize(fixtures::REPORTS, &user).await.unwrap();
        assert_eq!(node.map(|n| n.id), Some(fixtures::REPORTS));

        let err = evaluator.authorize(fixtures::SUMMER, &user).await.unwrap_err();
        assert!(matches!(
            err,
            OperationError::Forbidden {
                user_id: 5,
                node_id: fixtures::SUMMER
            }
        ));
    }
}
