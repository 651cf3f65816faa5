//! In-memory NodeStore backend
//!
//! Keeps nodes and content types in hash maps behind a single
//! `tokio::sync::RwLock`. Every batch write validates the whole batch while
//! holding the write lock and only then applies it, which gives the
//! all-or-nothing semantics the `NodeStore` contract requires.

use super::error::StoreError;
use super::node_store::NodeStore;
use crate::models::{ContentType, ContentTypeId, Node, NodeId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// First id handed out by a fresh store
const FIRST_NODE_ID: NodeId = 1000;

#[derive(Debug)]
struct StoreState {
    nodes: HashMap<NodeId, Node>,
    content_types: HashMap<ContentTypeId, ContentType>,
    next_id: NodeId,
}

/// Reference `NodeStore` implementation holding the tree in memory
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                nodes: HashMap::new(),
                content_types: HashMap::new(),
                next_id: FIRST_NODE_ID,
            }),
        }
    }

    /// Register (or replace) a content type
    pub async fn register_content_type(&self, content_type: ContentType) {
        let mut state = self.state.write().await;
        tracing::debug!(
            "Registering content type {} ('{}')",
            content_type.id,
            content_type.alias
        );
        state.content_types.insert(content_type.id, content_type);
    }

    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }
}

fn sorted_by_position(mut nodes: Vec<Node>) -> Vec<Node> {
    nodes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
    nodes
}

#[async_trait]
impl NodeStore for InMemoryStore {
    async fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.state.read().await.nodes.get(&id).cloned())
    }

    async fn get_nodes(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.nodes.get(id).cloned())
            .collect())
    }

    async fn get_children(&self, parent_id: NodeId) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let children = state
            .nodes
            .values()
            .filter(|n| n.parent_id == parent_id)
            .cloned()
            .collect();
        Ok(sorted_by_position(children))
    }

    async fn get_descendants(&self, id: NodeId) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let Some(ancestor) = state.nodes.get(&id) else {
            return Ok(Vec::new());
        };

        let mut descendants: Vec<Node> = state
            .nodes
            .values()
            .filter(|n| n.path.is_descendant_of(&ancestor.path))
            .cloned()
            .collect();
        descendants.sort_by(|a, b| {
            a.level()
                .cmp(&b.level())
                .then(a.sort_order.cmp(&b.sort_order))
                .then(a.id.cmp(&b.id))
        });
        Ok(descendants)
    }

    async fn get_trashed(&self) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut trashed: Vec<Node> = state.nodes.values().filter(|n| n.trashed).cloned().collect();
        trashed.sort_by(|a, b| a.level().cmp(&b.level()).then(a.id.cmp(&b.id)));
        Ok(trashed)
    }

    async fn get_content_type(&self, id: ContentTypeId) -> Result<Option<ContentType>> {
        Ok(self.state.read().await.content_types.get(&id).cloned())
    }

    async fn next_node_id(&self) -> Result<NodeId> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        Ok(id)
    }

    async fn insert_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        let mut state = self.state.write().await;

        let mut batch_ids = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if state.nodes.contains_key(&node.id) || !batch_ids.insert(node.id) {
                return Err(StoreError::DuplicateId(node.id).into());
            }
        }

        for node in &nodes {
            if node.id >= state.next_id {
                state.next_id = node.id + 1;
            }
            state.nodes.insert(node.id, node.clone());
        }

        Ok(nodes)
    }

    async fn save_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        let mut state = self.state.write().await;

        for node in &nodes {
            let stored = state
                .nodes
                .get(&node.id)
                .ok_or(StoreError::NodeNotFound(node.id))?;
            if stored.version != node.version {
                return Err(
                    StoreError::version_conflict(node.id, node.version, stored.version).into(),
                );
            }
        }

        let now = Utc::now();
        let saved: Vec<Node> = nodes
            .into_iter()
            .map(|mut node| {
                node.version += 1;
                node.updated_at = now;
                node
            })
            .collect();

        for node in &saved {
            state.nodes.insert(node.id, node.clone());
        }

        Ok(saved)
    }

    async fn delete_nodes(&self, ids: &[NodeId]) -> Result<usize> {
        let mut state = self.state.write().await;

        if let Some(missing) = ids.iter().find(|id| !state.nodes.contains_key(*id)) {
            return Err(StoreError::NodeNotFound(*missing).into());
        }

        let removed = ids
            .iter()
            .filter(|id| state.nodes.remove(*id).is_some())
            .count();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodePath, ROOT_ID};

    async fn store_with_tree() -> InMemoryStore {
        let store = InMemoryStore::new();
        let photos = Node::new(10, "Photos".to_string(), 1031, &NodePath::root());
        let summer = Node::new(100, "Summer".to_string(), 1031, &photos.path);
        let beach = Node::new(101, "beach.jpg".to_string(), 1032, &summer.path);
        store.insert_nodes(vec![photos, summer, beach]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_advances_next_id() {
        let store = store_with_tree().await;
        assert_eq!(store.next_node_id().await.unwrap(), FIRST_NODE_ID);

        let high = Node::new(5000, "High".to_string(), 1031, &NodePath::root());
        store.insert_nodes(vec![high]).await.unwrap();
        assert_eq!(store.next_node_id().await.unwrap(), 5001);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates_atomically() {
        let store = store_with_tree().await;
        let fresh = Node::new(20, "Documents".to_string(), 1031, &NodePath::root());
        let clash = Node::new(10, "Clash".to_string(), 1031, &NodePath::root());

        let err = store.insert_nodes(vec![fresh, clash]).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::DuplicateId(10))
        );
        assert!(store.get_node(20).await.unwrap().is_none());
        assert_eq!(store.node_count().await, 3);
    }

    #[tokio::test]
    async fn test_children_and_descendants() {
        let store = store_with_tree().await;

        let top = store.get_children(ROOT_ID).await.unwrap();
        assert_eq!(top.iter().map(|n| n.id).collect::<Vec<_>>(), vec![10]);

        let descendants = store.get_descendants(10).await.unwrap();
        assert_eq!(
            descendants.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![100, 101]
        );
        assert!(store.get_descendants(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_rejects_stale_batches() {
        let store = store_with_tree().await;

        let mut summer = store.get_node(100).await.unwrap().unwrap();
        summer.sort_order = 4;
        let saved = store.save_nodes(vec![summer.clone()]).await.unwrap();
        assert_eq!(saved[0].version, 2);

        // `summer` still carries version 1, so the whole batch is refused
        let mut photos = store.get_node(10).await.unwrap().unwrap();
        photos.name = "Pictures".to_string();
        summer.sort_order = 9;
        let err = store.save_nodes(vec![photos, summer]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::VersionConflict { node_id: 100, .. })
        ));

        let photos = store.get_node(10).await.unwrap().unwrap();
        assert_eq!(photos.name, "Photos");
        assert_eq!(store.get_node(100).await.unwrap().unwrap().sort_order, 4);
    }

    #[tokio::test]
    async fn test_delete_is_all_or_nothing() {
        let store = store_with_tree().await;

        let err = store.delete_nodes(&[101, 404]).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::NodeNotFound(404))
        );
        assert!(store.get_node(101).await.unwrap().is_some());

        assert_eq!(store.delete_nodes(&[100, 101]).await.unwrap(), 2);
        assert_eq!(store.node_count().await, 1);
    }
}
