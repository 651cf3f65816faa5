//! NodeStore Trait - Repository Abstraction Layer
//!
//! This module defines the `NodeStore` trait through which every operation in
//! this crate reads and writes the media tree. The persistence engine itself
//! lives behind the trait; `InMemoryStore` is the reference backend.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so network-backed stores fit
//!    behind the same trait
//! 2. **Ownership Semantics**: Write methods take ownership of the nodes they
//!    persist and return the stored versions
//! 3. **Error Handling**: Uses `anyhow::Result`; backends raise
//!    [`StoreError`](super::StoreError) inside it for the failures callers
//!    need to classify (missing node, stale version)
//! 4. **Atomic Batches**: `insert_nodes`, `save_nodes` and `delete_nodes`
//!    either apply to every node in the batch or to none of them
//!
//! # Examples
//!
//! ```rust
//! use mediatree_core::db::{InMemoryStore, NodeStore};
//! use mediatree_core::models::{Node, NodePath};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn NodeStore> = Arc::new(InMemoryStore::new());
//!
//!     let id = store.next_node_id().await?;
//!     let node = Node::new(id, "Photos".to_string(), 1031, &NodePath::root());
//!     store.insert_nodes(vec![node]).await?;
//!
//!     assert!(store.get_node(id).await?.is_some());
//!     Ok(())
//! }
//! ```

use crate::models::{ContentType, ContentTypeId, Node, NodeId};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for media tree persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single store can be shared by
/// every service through an `Arc<dyn NodeStore>`.
///
/// # Method Categories
///
/// - **Lookup**: `get_node`, `get_nodes`, `get_content_type`
/// - **Hierarchy**: `get_children`, `get_descendants`, `get_trashed`
/// - **Batch writes**: `insert_nodes`, `save_nodes`, `delete_nodes`
/// - **Identity**: `next_node_id`
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID
    ///
    /// Returns `Ok(None)` when the node does not exist; sentinel ids never
    /// resolve.
    async fn get_node(&self, id: NodeId) -> Result<Option<Node>>;

    /// Get the nodes that exist among `ids`, in request order
    ///
    /// Missing ids are skipped rather than reported.
    async fn get_nodes(&self, ids: &[NodeId]) -> Result<Vec<Node>>;

    /// Direct children of `parent_id` (trashed or not), ordered by sort order
    ///
    /// `ROOT_ID` yields the top-level nodes.
    async fn get_children(&self, parent_id: NodeId) -> Result<Vec<Node>>;

    /// Every node strictly below `id`, parents before their children
    ///
    /// Returns an empty list when `id` does not exist.
    async fn get_descendants(&self, id: NodeId) -> Result<Vec<Node>>;

    /// Every node currently flagged as trashed
    async fn get_trashed(&self) -> Result<Vec<Node>>;

    async fn get_content_type(&self, id: ContentTypeId) -> Result<Option<ContentType>>;

    /// Reserve a fresh node id
    async fn next_node_id(&self) -> Result<NodeId>;

    /// Insert new nodes as one atomic batch
    ///
    /// # Errors
    ///
    /// Fails without inserting anything if any id already exists.
    async fn insert_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>>;

    /// Save modified nodes as one atomic batch
    ///
    /// Each node's `version` must equal the stored version; the store bumps
    /// it on success and returns the saved nodes.
    ///
    /// # Errors
    ///
    /// Fails without saving anything if any node is missing or stale.
    async fn save_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>>;

    /// Permanently remove nodes as one atomic batch
    ///
    /// # Errors
    ///
    /// Fails without removing anything if any id does not exist.
    async fn delete_nodes(&self, ids: &[NodeId]) -> Result<usize>;
}
