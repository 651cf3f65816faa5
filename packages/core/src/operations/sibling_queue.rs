//! Sibling reorder queue with retry on optimistic concurrency conflicts
//!
//! Reorders touch every child of a parent, so two editors sorting the same
//! folder easily collide on node versions. Instead of failing on the first
//! conflict, the queue retries the whole reorder; every attempt re-reads the
//! siblings, so it runs against fresh versions.
//!
//! # Example
//!
//! ```rust
//! use mediatree_core::db::InMemoryStore;
//! use mediatree_core::operations::{HookRegistry, SiblingOperationQueue, SortCoordinator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! let coordinator = Arc::new(SortCoordinator::new(store, Arc::new(HookRegistry::new())));
//! let queue = SiblingOperationQueue::new(coordinator);
//!
//! // Retry up to 3 times with exponential backoff (10ms, 20ms, 40ms)
//! queue.reorder_with_retry(-1, &[], 3).await?;
//! # Ok(())
//! # }
//! ```

use super::error::OperationError;
use super::sort::{SortCoordinator, SortOutcome};
use crate::models::NodeId;
use std::sync::Arc;
use tokio::time::Duration;

/// Base delay of the exponential backoff
const BASE_BACKOFF_MS: u64 = 10;

/// Retries sibling reorders that lose an optimistic concurrency race
pub struct SiblingOperationQueue {
    coordinator: Arc<SortCoordinator>,
}

impl SiblingOperationQueue {
    pub fn new(coordinator: Arc<SortCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Reorder children of `parent_id`, retrying on version conflicts
    ///
    /// # Retry Behavior
    ///
    /// - **Retry on**: `OperationError::VersionConflict` only
    /// - **Backoff**: Exponential (10ms, 20ms, 40ms, 80ms, ...)
    /// - **Other errors**: returned immediately
    ///
    /// `max_retries = 0` means a single attempt.
    pub async fn reorder_with_retry(
        &self,
        parent_id: NodeId,
        node_ids: &[NodeId],
        max_retries: usize,
    ) -> Result<SortOutcome, OperationError> {
        let mut attempt = 0;

        loop {
            match self.coordinator.reorder_children(parent_id, node_ids).await {
                Ok(outcome) => {
                    if attempt > 0 {
                        tracing::debug!(
                            "Sibling reorder under {} succeeded after {} retry(ies)",
                            parent_id,
                            attempt
                        );
                    }
                    return Ok(outcome);
                }

                Err(OperationError::VersionConflict {
                    node_id,
                    expected_version,
                    actual_version,
                }) if attempt < max_retries => {
                    tracing::debug!(
                        "Version conflict on attempt {}/{} for node {}: expected v{}, got v{}. Retrying...",
                        attempt + 1,
                        max_retries + 1,
                        node_id,
                        expected_version,
                        actual_version
                    );

                    let backoff_ms = BASE_BACKOFF_MS << attempt.min(16);
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;

                    attempt += 1;
                }

                Err(e) => {
                    if matches!(e, OperationError::VersionConflict { .. }) {
                        tracing::warn!(
                            "Max retries ({}) exceeded reordering children of {}",
                            max_retries,
                            parent_id
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, NodeStore, StoreError};
    use crate::models::{ContentType, ContentTypeId, Node};
    use crate::operations::{fixtures, HookRegistry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that loses the first `conflicts` saves to a concurrent writer
    struct ContendedStore {
        inner: Arc<InMemoryStore>,
        conflicts: AtomicUsize,
        save_attempts: AtomicUsize,
    }

    #[async_trait]
    impl NodeStore for ContendedStore {
        async fn get_node(&self, id: NodeId) -> anyhow::Result<Option<Node>> {
            self.inner.get_node(id).await
        }
        async fn get_nodes(&self, ids: &[NodeId]) -> anyhow::Result<Vec<Node>> {
            self.inner.get_nodes(ids).await
        }
        async fn get_children(&self, parent_id: NodeId) -> anyhow::Result<Vec<Node>> {
            self.inner.get_children(parent_id).await
        }
        async fn get_descendants(&self, id: NodeId) -> anyhow::Result<Vec<Node>> {
            self.inner.get_descendants(id).await
        }
        async fn get_trashed(&self) -> anyhow::Result<Vec<Node>> {
            self.inner.get_trashed().await
        }
        async fn get_content_type(&self, id: ContentTypeId) -> anyhow::Result<Option<ContentType>> {
            self.inner.get_content_type(id).await
        }
        async fn next_node_id(&self) -> anyhow::Result<NodeId> {
            self.inner.next_node_id().await
        }
        async fn insert_nodes(&self, nodes: Vec<Node>) -> anyhow::Result<Vec<Node>> {
            self.inner.insert_nodes(nodes).await
        }
        async fn save_nodes(&self, nodes: Vec<Node>) -> anyhow::Result<Vec<Node>> {
            self.save_attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                let first = nodes.first().map(|n| (n.id, n.version)).unwrap_or_default();
                return Err(StoreError::version_conflict(first.0, first.1, first.1 + 1).into());
            }
            self.inner.save_nodes(nodes).await
        }
        async fn delete_nodes(&self, ids: &[NodeId]) -> anyhow::Result<usize> {
            self.inner.delete_nodes(ids).await
        }
    }

    async fn queue_with_conflicts(conflicts: usize) -> (SiblingOperationQueue, Arc<ContendedStore>) {
        let store = Arc::new(ContendedStore {
            inner: fixtures::seeded_store().await,
            conflicts: AtomicUsize::new(conflicts),
            save_attempts: AtomicUsize::new(0),
        });
        let coordinator = SortCoordinator::new(store.clone(), Arc::new(HookRegistry::new()));
        (SiblingOperationQueue::new(Arc::new(coordinator)), store)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let (queue, store) = queue_with_conflicts(0).await;

        let outcome = queue
            .reorder_with_retry(fixtures::SUMMER, &[fixtures::SUNSET, fixtures::BEACH], 3)
            .await
            .unwrap();
        assert_eq!(outcome.parent_id, Some(fixtures::SUMMER));
        assert_eq!(store.save_attempts.load(Ordering::SeqCst), 1);

        let sunset = store.get_node(fixtures::SUNSET).await.unwrap().unwrap();
        assert_eq!(sunset.sort_order, 0);
    }

    #[tokio::test]
    async fn test_retries_through_transient_conflicts() {
        let (queue, store) = queue_with_conflicts(2).await;

        let start = std::time::Instant::now();
        queue
            .reorder_with_retry(fixtures::SUMMER, &[fixtures::SUNSET, fixtures::BEACH], 3)
            .await
            .unwrap();

        assert_eq!(store.save_attempts.load(Ordering::SeqCst), 3);
        // 10ms + 20ms of backoff
        assert!(start.elapsed().as_millis() >= 30);

        let beach = store.get_node(fixtures::BEACH).await.unwrap().unwrap();
        assert_eq!(beach.sort_order, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (queue, store) = queue_with_conflicts(5).await;

        let err = queue
            .reorder_with_retry(fixtures::SUMMER, &[fixtures::SUNSET, fixtures::BEACH], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::VersionConflict { .. }));
        assert_eq!(store.save_attempts.load(Ordering::SeqCst), 2);

        let sunset = store.get_node(fixtures::SUNSET).await.unwrap().unwrap();
        assert_eq!(sunset.sort_order, 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let (queue, store) = queue_with_conflicts(0).await;

        let err = queue
            .reorder_with_retry(fixtures::SUMMER, &[fixtures::BEACH, 4040], 3)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.save_attempts.load(Ordering::SeqCst), 0);
    }
}
