//! Media Tree Service - request-level orchestration
//!
//! Every public operation follows the same shape:
//!
//! 1. resolve and authorize the target through `PathAccessEvaluator`
//! 2. delegate the rule checks to the matching operation component
//! 3. commit one atomic batch through the `NodeStore`
//! 4. broadcast a `DomainEvent` describing the committed change
//!
//! Failures at any step abort the whole operation and are returned as a typed
//! `OperationError`; no event is emitted for them.

use crate::config::{ConfigError, MediaTreeConfig};
use crate::db::{DomainEvent, NodeStore};
use crate::models::{
    ChildQuery, LifecycleState, Node, NodeId, PagedResult, User, ValidationError,
    RECYCLE_BIN_ID, ROOT_ID,
};
use crate::operations::relocation::{self, Destination};
use crate::operations::{
    CreateNodeParams, DeleteOutcome, HookPoint, HookRegistry, LifecycleManager,
    MoveCopyValidator, OperationError, PagingProjector, PathAccessEvaluator,
    SiblingOperationQueue, SortCoordinator, SortOutcome,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Entry point used by the controller layer
///
/// # Examples
///
/// ```rust
/// use mediatree_core::config::MediaTreeConfig;
/// use mediatree_core::db::InMemoryStore;
/// use mediatree_core::models::{ContentType, User};
/// use mediatree_core::services::MediaTreeService;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let store = Arc::new(InMemoryStore::new());
///     store
///         .register_content_type(
///             ContentType::new(1031, "Folder")
///                 .with_allowed_as_root(true)
///                 .with_allowed_children([1031]),
///         )
///         .await;
///
///     let service = MediaTreeService::new(store, MediaTreeConfig::default())?;
///     let admin = User::unrestricted(1, "admin");
///
///     let photos = service.add_folder("Photos", -1, &admin).await?;
///     assert_eq!(photos.path.to_string(), format!("-1,{}", photos.id));
///     Ok(())
/// }
/// ```
pub struct MediaTreeService {
    store: Arc<dyn NodeStore>,
    config: MediaTreeConfig,
    hooks: Arc<HookRegistry>,
    access: PathAccessEvaluator,
    validator: MoveCopyValidator,
    lifecycle: LifecycleManager,
    sort_queue: SiblingOperationQueue,

    /// Broadcast channel for domain events
    event_tx: broadcast::Sender<DomainEvent>,
}

impl MediaTreeService {
    pub fn new(store: Arc<dyn NodeStore>, config: MediaTreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        let hooks = Arc::new(HookRegistry::new());

        Ok(Self {
            access: PathAccessEvaluator::new(store.clone()),
            validator: MoveCopyValidator::new(store.clone()),
            lifecycle: LifecycleManager::new(store.clone(), hooks.clone()),
            sort_queue: Self::sort_queue(&store, &hooks),
            store,
            config,
            hooks,
            event_tx,
        })
    }

    /// Replace the hook registry consulted before every commit
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        let hooks = Arc::new(hooks);
        self.lifecycle = LifecycleManager::new(self.store.clone(), hooks.clone());
        self.sort_queue = Self::sort_queue(&self.store, &hooks);
        self.hooks = hooks;
        self
    }

    fn sort_queue(store: &Arc<dyn NodeStore>, hooks: &Arc<HookRegistry>) -> SiblingOperationQueue {
        let coordinator = SortCoordinator::new(store.clone(), hooks.clone());
        SiblingOperationQueue::new(Arc::new(coordinator))
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub fn config(&self) -> &MediaTreeConfig {
        &self.config
    }

    /// Subscribe to domain events
    ///
    /// Returns a broadcast receiver that receives one event per committed
    /// mutation (created, saved, moved, copied, trashed, erased, sorted,
    /// recycle bin emptied).
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Emit a domain event to all subscribers
    ///
    /// Ignores errors if no subscribers (expected in some tests).
    fn emit_event(&self, event: DomainEvent) {
        tracing::debug!("Emitting {}", event.event_type());
        let _ = self.event_tx.send(event);
    }

    /// Create a node, appended after its future siblings
    ///
    /// No content-type placement rules are applied here; those guard
    /// relocation only. A node created under a trashed parent starts trashed.
    pub async fn create_node(&self, params: CreateNodeParams) -> Result<Node, OperationError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        self.store
            .get_content_type(params.content_type_id)
            .await
            .map_err(|e| OperationError::from_store("resolving content type", e))?
            .ok_or_else(|| OperationError::content_type_not_found(params.content_type_id))?;

        let destination = match params.parent_id {
            Some(parent_id) if !relocation::is_root_destination(parent_id) => {
                let parent = self.require_node(parent_id).await?;
                Destination::under(&parent)
            }
            _ => Destination::root(),
        };

        let siblings = self
            .store
            .get_children(destination.parent_id)
            .await
            .map_err(|e| OperationError::from_store("listing siblings", e))?;

        let id = self
            .store
            .next_node_id()
            .await
            .map_err(|e| OperationError::from_store("allocating node id", e))?;

        let mut node = Node::new(id, name.to_string(), params.content_type_id, &destination.path);
        node.sort_order = relocation::next_sort_order(&siblings);
        node.trashed = destination.trashed;

        self.hooks.check(HookPoint::Saving, std::slice::from_ref(&node))?;

        let node = self
            .store
            .insert_nodes(vec![node])
            .await
            .map_err(|e| OperationError::from_store("inserting node", e))?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::node_not_found(id))?;

        tracing::info!("Created node {} ('{}') at '{}'", node.id, node.name, node.path);
        self.emit_event(DomainEvent::NodeCreated { node: node.clone() });
        Ok(node)
    }

    /// Create a folder under `parent_id` (any negative id means the root)
    pub async fn add_folder(
        &self,
        name: &str,
        parent_id: NodeId,
        user: &User,
    ) -> Result<Node, OperationError> {
        self.authorize_parent(parent_id, user).await?;

        self.create_node(CreateNodeParams {
            name: name.to_string(),
            content_type_id: self.config.folder_content_type_id,
            parent_id: Some(parent_id),
        })
        .await
    }

    /// Create the media item for one uploaded file under `parent_id`
    ///
    /// The content type comes from the file extension: image extensions give
    /// the image type, anything else the file type. Returns `Ok(None)` when
    /// the extension is disallowed; nothing is created then.
    pub async fn add_file(
        &self,
        file_name: &str,
        parent_id: NodeId,
        user: &User,
    ) -> Result<Option<Node>, OperationError> {
        self.authorize_parent(parent_id, user).await?;
        self.create_upload(file_name, parent_id).await
    }

    /// Create one media item per uploaded file name, skipping disallowed
    /// extensions
    ///
    /// Access to the parent is checked once, before anything is created.
    pub async fn add_files(
        &self,
        file_names: &[&str],
        parent_id: NodeId,
        user: &User,
    ) -> Result<Vec<Node>, OperationError> {
        self.authorize_parent(parent_id, user).await?;

        let mut created = Vec::with_capacity(file_names.len());
        for file_name in file_names {
            if let Some(node) = self.create_upload(file_name, parent_id).await? {
                created.push(node);
            }
        }
        Ok(created)
    }

    async fn create_upload(
        &self,
        file_name: &str,
        parent_id: NodeId,
    ) -> Result<Option<Node>, OperationError> {
        let name = file_name.trim().trim_matches('"');
        let Some(content_type_id) = self.config.media_type_for(name) else {
            tracing::warn!("Skipping upload '{}': extension is not allowed", name);
            return Ok(None);
        };

        self.create_node(CreateNodeParams {
            name: name.to_string(),
            content_type_id,
            parent_id: Some(parent_id),
        })
        .await
        .map(Some)
    }

    async fn authorize_parent(&self, parent_id: NodeId, user: &User) -> Result<(), OperationError> {
        let scope = if relocation::is_root_destination(parent_id) {
            ROOT_ID
        } else {
            parent_id
        };
        self.access.authorize(scope, user).await?;
        Ok(())
    }

    /// Save an edited node in place
    ///
    /// Only the name is taken from `node`; placement, lifecycle state and
    /// ordering change through move, delete and sort. `node.version` must
    /// still be the stored version, otherwise the save is a
    /// `VersionConflict`.
    pub async fn save_node(&self, node: Node, user: &User) -> Result<Node, OperationError> {
        let name = node.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let mut staged = self
            .access
            .authorize(node.id, user)
            .await?
            .ok_or_else(|| OperationError::node_not_found(node.id))?;
        staged.name = name.to_string();
        staged.version = node.version;

        self.hooks.check(HookPoint::Saving, std::slice::from_ref(&staged))?;

        let saved = self
            .store
            .save_nodes(vec![staged])
            .await
            .map_err(|e| OperationError::from_store("saving node", e))?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::node_not_found(node.id))?;

        tracing::info!("Saved node {} as '{}' (version {})", saved.id, saved.name, saved.version);
        self.emit_event(DomainEvent::NodeSaved { node: saved.clone() });
        Ok(saved)
    }

    /// Rename a node, reading its current version first
    pub async fn rename_node(
        &self,
        node_id: NodeId,
        name: &str,
        user: &User,
    ) -> Result<Node, OperationError> {
        let mut node = self.get_node_for_user(node_id, user).await?;
        node.name = name.to_string();
        self.save_node(node, user).await
    }

    pub async fn get_node_for_user(&self, id: NodeId, user: &User) -> Result<Node, OperationError> {
        self.access
            .authorize(id, user)
            .await?
            .ok_or_else(|| OperationError::node_not_found(id))
    }

    /// Resolve `ids`, silently dropping unknown ids and nodes outside the
    /// user's scope
    pub async fn get_nodes_for_user(
        &self,
        ids: &[NodeId],
        user: &User,
    ) -> Result<Vec<Node>, OperationError> {
        let nodes = self
            .store
            .get_nodes(ids)
            .await
            .map_err(|e| OperationError::from_store("loading nodes", e))?;

        Ok(Self::visible_to(nodes, user))
    }

    /// Top-level live nodes the user may see, in sort order
    pub async fn get_root_nodes(&self, user: &User) -> Result<Vec<Node>, OperationError> {
        let top_level = self
            .store
            .get_children(ROOT_ID)
            .await
            .map_err(|e| OperationError::from_store("listing root nodes", e))?;

        let live = top_level.into_iter().filter(|n| !n.trashed).collect();
        Ok(Self::visible_to(live, user))
    }

    /// List children of `parent_id` through the paging projector
    ///
    /// - `ROOT_ID`: top-level live nodes, filtered to the user's scope
    /// - `RECYCLE_BIN_ID`: top-level trashed nodes (unrestricted users only)
    /// - a live parent: its live children
    /// - a trashed parent: all of its children, which are trashed with it
    pub async fn get_children_paged(
        &self,
        parent_id: NodeId,
        user: &User,
        query: &ChildQuery,
    ) -> Result<PagedResult<Node>, OperationError> {
        let children = match parent_id {
            ROOT_ID => self.get_root_nodes(user).await?,
            RECYCLE_BIN_ID => {
                self.access.authorize(RECYCLE_BIN_ID, user).await?;
                self.recycle_bin_items().await?
            }
            _ => {
                let parent = self
                    .access
                    .authorize(parent_id, user)
                    .await?
                    .ok_or_else(|| OperationError::node_not_found(parent_id))?;
                let children = self
                    .store
                    .get_children(parent_id)
                    .await
                    .map_err(|e| OperationError::from_store("listing children", e))?;

                if parent.trashed {
                    children
                } else {
                    children.into_iter().filter(|n| !n.trashed).collect()
                }
            }
        };

        Ok(PagingProjector::project(children, query))
    }

    /// Trashed nodes whose parent is not itself trashed
    async fn recycle_bin_items(&self) -> Result<Vec<Node>, OperationError> {
        let trashed = self
            .store
            .get_trashed()
            .await
            .map_err(|e| OperationError::from_store("listing recycle bin", e))?;

        let trashed_ids: HashSet<NodeId> = trashed.iter().map(|n| n.id).collect();
        Ok(trashed
            .into_iter()
            .filter(|n| !trashed_ids.contains(&n.parent_id))
            .collect())
    }

    fn visible_to(nodes: Vec<Node>, user: &User) -> Vec<Node> {
        nodes
            .into_iter()
            .filter(|n| PathAccessEvaluator::has_path_access_to(n, user))
            .collect()
    }

    async fn require_node(&self, id: NodeId) -> Result<Node, OperationError> {
        self.store
            .get_node(id)
            .await
            .map_err(|e| OperationError::from_store("resolving node", e))?
            .ok_or_else(|| OperationError::node_not_found(id))
    }

    /// Move a node and its subtree under `destination_parent_id`
    ///
    /// Moving a trashed subtree under a live parent restores it.
    pub async fn move_node(
        &self,
        node_id: NodeId,
        destination_parent_id: NodeId,
        user: &User,
    ) -> Result<Node, OperationError> {
        self.access.authorize(node_id, user).await?;
        let (node, destination) = self
            .validator
            .validate_with_destination(node_id, destination_parent_id)
            .await?;

        let siblings = self.children_of(destination.parent_id).await?;
        let sort_order =
            relocation::next_sort_order(siblings.iter().filter(|s| s.id != node.id));
        let descendants = self
            .store
            .get_descendants(node.id)
            .await
            .map_err(|e| OperationError::from_store("collecting subtree", e))?;

        let old_parent_id = node.parent_id;
        let staged = relocation::plan_move(node, descendants, &destination, sort_order)?;
        self.hooks.check(HookPoint::Moving, &staged)?;

        let saved = self
            .store
            .save_nodes(staged)
            .await
            .map_err(|e| OperationError::from_store("moving subtree", e))?;
        let subtree_size = saved.len();
        let moved = saved
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::node_not_found(node_id))?;

        tracing::info!(
            "Moved node {} from {} to '{}' ({} node(s))",
            moved.id,
            old_parent_id,
            moved.path,
            subtree_size
        );
        self.emit_event(DomainEvent::NodeMoved {
            node_id: moved.id,
            old_parent_id,
            new_parent_id: moved.parent_id,
            path: moved.path.clone(),
            subtree_size,
        });
        Ok(moved)
    }

    /// Copy a node and its subtree under `destination_parent_id`
    ///
    /// Every copied node gets a fresh id; names, content types and relative
    /// order are kept. Returns the copy of `node_id`.
    pub async fn copy_node(
        &self,
        node_id: NodeId,
        destination_parent_id: NodeId,
        user: &User,
    ) -> Result<Node, OperationError> {
        self.access.authorize(node_id, user).await?;
        let (node, destination) = self
            .validator
            .validate_with_destination(node_id, destination_parent_id)
            .await?;

        let siblings = self.children_of(destination.parent_id).await?;
        let sort_order = relocation::next_sort_order(&siblings);
        let descendants = self
            .store
            .get_descendants(node.id)
            .await
            .map_err(|e| OperationError::from_store("collecting subtree", e))?;

        let mut new_ids = Vec::with_capacity(descendants.len() + 1);
        for _ in 0..=descendants.len() {
            let id = self
                .store
                .next_node_id()
                .await
                .map_err(|e| OperationError::from_store("allocating node id", e))?;
            new_ids.push(id);
        }

        let staged = relocation::plan_copy(&node, &descendants, &destination, sort_order, &new_ids);
        self.hooks.check(HookPoint::Copying, &staged)?;

        let inserted = self
            .store
            .insert_nodes(staged)
            .await
            .map_err(|e| OperationError::from_store("copying subtree", e))?;
        let subtree_size = inserted.len();
        let copy = inserted
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::node_not_found(node_id))?;

        tracing::info!(
            "Copied node {} to {} at '{}' ({} node(s))",
            node_id,
            copy.id,
            copy.path,
            subtree_size
        );
        self.emit_event(DomainEvent::NodeCopied {
            source_id: node_id,
            copy_id: copy.id,
            parent_id: copy.parent_id,
            subtree_size,
        });
        Ok(copy)
    }

    async fn children_of(&self, parent_id: NodeId) -> Result<Vec<Node>, OperationError> {
        self.store
            .get_children(parent_id)
            .await
            .map_err(|e| OperationError::from_store("listing destination children", e))
    }

    /// Trash an active node, or erase an already trashed one
    pub async fn delete_node(
        &self,
        node_id: NodeId,
        user: &User,
    ) -> Result<DeleteOutcome, OperationError> {
        self.access.authorize(node_id, user).await?;
        let outcome = self.lifecycle.request_delete(node_id).await?;

        let event = match outcome.state {
            LifecycleState::Trashed => DomainEvent::NodeTrashed {
                node_id,
                subtree_size: outcome.affected_count,
            },
            LifecycleState::Active | LifecycleState::Erased => DomainEvent::NodeErased {
                node_id,
                subtree_size: outcome.affected_count,
            },
        };
        self.emit_event(event);
        Ok(outcome)
    }

    /// Erase everything in the recycle bin; returns the number of nodes erased
    ///
    /// Emptying an already empty recycle bin succeeds without an event.
    pub async fn empty_recycle_bin(&self, user: &User) -> Result<usize, OperationError> {
        self.access.authorize(RECYCLE_BIN_ID, user).await?;
        let erased_count = self.lifecycle.empty_recycle_bin().await?;

        if erased_count > 0 {
            self.emit_event(DomainEvent::RecycleBinEmptied { erased_count });
        }
        Ok(erased_count)
    }

    /// Reorder the children of `parent_id` to match `node_ids`
    ///
    /// Version conflicts are retried up to `config.sort_retry_limit` times.
    pub async fn sort_children(
        &self,
        parent_id: NodeId,
        node_ids: &[NodeId],
        user: &User,
    ) -> Result<SortOutcome, OperationError> {
        self.access.authorize(parent_id, user).await?;

        let outcome = self
            .sort_queue
            .reorder_with_retry(parent_id, node_ids, self.config.sort_retry_limit)
            .await?;

        if let Some(parent_id) = outcome.parent_id {
            self.emit_event(DomainEvent::ChildrenSorted {
                parent_id,
                node_ids: outcome.node_ids.clone(),
            });
        }
        Ok(outcome)
    }
}
