//! Data Models
//!
//! This module contains the core data structures of the media tree:
//!
//! - `Node` - A media item or folder, with its materialised `NodePath`
//! - `ContentType` - Root placement and child allow-list rules
//! - `User` - The start-node scope used by access checks
//! - `ChildQuery` / `PagedResult` - Child listing parameters and results

mod content_type;
mod node;
mod paging;
mod path;
mod user;

pub use content_type::ContentType;
pub use node::{
    is_sentinel, ContentTypeId, LifecycleState, Node, NodeId, ValidationError, RECYCLE_BIN_ID,
    ROOT_ID,
};
pub use paging::{ChildQuery, OrderDirection, OrderField, PagedResult};
pub use path::NodePath;
pub use user::User;
