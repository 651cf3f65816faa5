//! Operation hooks - pre-commit veto points
//!
//! Before a mutating operation commits its batch, every staged node is offered
//! to every registered hook. A hook either lets the change proceed or cancels
//! the whole operation, in which case nothing is written and the caller gets
//! `OperationError::Cancelled`.
//!
//! # Examples
//!
//! ```rust
//! use mediatree_core::operations::{HookDecision, HookPoint, HookRegistry};
//! use mediatree_core::models::Node;
//!
//! let mut hooks = HookRegistry::new();
//! hooks.register(|point: HookPoint, node: &Node| {
//!     if point == HookPoint::Erasing && node.name == "keep-me" {
//!         HookDecision::cancel("protected node")
//!     } else {
//!         HookDecision::Proceed
//!     }
//! });
//! assert_eq!(hooks.len(), 1);
//! ```

use super::error::OperationError;
use crate::models::Node;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The mutation a hook is being consulted about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookPoint {
    /// A new node is about to be inserted
    Saving,
    Moving,
    Copying,
    /// A node is about to be flagged as trashed
    Trashing,
    /// A node is about to be permanently removed
    Erasing,
    Sorting,
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookPoint::Saving => "save",
            HookPoint::Moving => "move",
            HookPoint::Copying => "copy",
            HookPoint::Trashing => "trash",
            HookPoint::Erasing => "erase",
            HookPoint::Sorting => "sort",
        };
        f.write_str(name)
    }
}

/// What a hook wants done with the pending operation
///
/// `Default` is intentionally not implemented; handlers must decide explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Proceed,
    Cancel { reason: String },
}

impl HookDecision {
    pub fn cancel(reason: impl Into<String>) -> Self {
        Self::Cancel {
            reason: reason.into(),
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel { .. })
    }
}

/// A pre-commit extension point
pub trait OperationHook: Send + Sync {
    /// Name used in logs when the hook cancels an operation
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Inspect one staged node (in its post-change state)
    fn before(&self, point: HookPoint, node: &Node) -> HookDecision;
}

impl<F> OperationHook for F
where
    F: Fn(HookPoint, &Node) -> HookDecision + Send + Sync,
{
    fn before(&self, point: HookPoint, node: &Node) -> HookDecision {
        self(point, node)
    }
}

/// Ordered collection of hooks consulted before every commit
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn OperationHook>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl OperationHook + 'static) {
        self.hooks.push(Arc::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Offer every staged node to every hook; the first cancel wins
    pub fn check(&self, point: HookPoint, staged: &[Node]) -> Result<(), OperationError> {
        for node in staged {
            for hook in &self.hooks {
                if let HookDecision::Cancel { reason } = hook.before(point, node) {
                    tracing::warn!(
                        "{} operation cancelled by hook '{}' on node {}: {}",
                        point,
                        hook.name(),
                        node.id,
                        reason
                    );
                    return Err(OperationError::cancelled(point, reason));
                }
            }
        }
        Ok(())
    }
}
