//! Domain Events
//!
//! Events broadcast by `MediaTreeService` after a mutation has been committed.
//! Other parts of the system (tree caches, search indexers, UI bridges)
//! subscribe to them instead of coupling to the service.
//!
//! # Event Flow
//!
//! 1. An operation stages its changes and runs the operation hooks
//! 2. The batch is committed through the `NodeStore`
//! 3. Exactly one domain event is sent on the broadcast channel
//!
//! Aborted operations (validation failure, hook veto, store failure) emit
//! nothing.

use crate::models::{Node, NodeId, NodePath};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DomainEvent {
    NodeCreated {
        node: Node,
    },

    /// An existing node was saved in place (renamed)
    NodeSaved {
        node: Node,
    },

    /// A subtree was relocated (or restored from the recycle bin)
    NodeMoved {
        node_id: NodeId,
        old_parent_id: NodeId,
        new_parent_id: NodeId,
        path: NodePath,
        subtree_size: usize,
    },

    NodeCopied {
        source_id: NodeId,
        copy_id: NodeId,
        parent_id: NodeId,
        subtree_size: usize,
    },

    /// A subtree was moved to the recycle bin
    NodeTrashed {
        node_id: NodeId,
        subtree_size: usize,
    },

    /// A trashed subtree was permanently removed
    NodeErased {
        node_id: NodeId,
        subtree_size: usize,
    },

    RecycleBinEmptied {
        erased_count: usize,
    },

    ChildrenSorted {
        parent_id: NodeId,
        node_ids: Vec<NodeId>,
    },
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::NodeCreated { .. } => "node:created",
            DomainEvent::NodeSaved { .. } => "node:saved",
            DomainEvent::NodeMoved { .. } => "node:moved",
            DomainEvent::NodeCopied { .. } => "node:copied",
            DomainEvent::NodeTrashed { .. } => "node:trashed",
            DomainEvent::NodeErased { .. } => "node:erased",
            DomainEvent::RecycleBinEmptied { .. } => "recycle-bin:emptied",
            DomainEvent::ChildrenSorted { .. } => "children:sorted",
        }
    }
}
