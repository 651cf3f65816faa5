//! Media Tree Operations
//!
//! The business rules of the tree, each in its own component:
//!
//! - `PathAccessEvaluator` - start-node scoped access checks
//! - `MoveCopyValidator` - relocation rules plus subtree path rewriting
//! - `LifecycleManager` - the `Active → Trashed → Erased` delete state machine
//! - `SortCoordinator` - atomic sibling reordering
//! - `PagingProjector` - filter, order and window over a child listing
//! - `SiblingOperationQueue` - reorder retries on version conflicts
//!
//! Mutating components consult the `HookRegistry` before committing and
//! report failures as `OperationError`.

pub mod access;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod paging;
pub mod relocation;
pub mod sibling_queue;
pub mod sort;

pub use access::{AccessCheck, PathAccessEvaluator};
pub use error::OperationError;
pub use hooks::{HookDecision, HookPoint, HookRegistry, OperationHook};
pub use lifecycle::{DeleteOutcome, LifecycleManager};
pub use paging::PagingProjector;
pub use relocation::{Destination, MoveCopyValidator};
pub use sibling_queue::SiblingOperationQueue;
pub use sort::{SortCoordinator, SortOutcome};

use crate::models::{ContentTypeId, NodeId};
use serde::{Deserialize, Serialize};

/// Parameters for creating a node
///
/// `parent_id` of `None` (or any negative id) creates a top-level node. The
/// new node is appended after its existing siblings.
///
/// # Examples
///
/// ```rust
/// # use mediatree_core::operations::CreateNodeParams;
/// let params = CreateNodeParams {
///     name: "Holiday 2026".to_string(),
///     content_type_id: 1031,
///     parent_id: Some(1034),
/// };
/// assert_eq!(params.parent_id, Some(1034));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    pub name: String,
    pub content_type_id: ContentTypeId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}
