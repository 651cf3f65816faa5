//! MediaTree Core Business Logic Layer
//!
//! This crate provides the rules behind a hierarchical media library: who may
//! see which part of the tree, where nodes may be moved or copied, how a
//! delete walks a node through the recycle bin, and how siblings are sorted
//! and paged.
//!
//! # Architecture
//!
//! - **Materialised paths**: Every node carries its ancestor chain (`-1,1034,1035`);
//!   access and cycle checks are containment tests on that chain
//! - **Atomic batches**: Moves, erasures and sorts commit all-or-nothing
//! - **Optimistic concurrency**: Node versions detect concurrent writers
//! - **Hooks and events**: Pre-commit vetoes, post-commit broadcasts
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NodePath, ContentType, User, paging)
//! - [`db`] - Repository trait, in-memory backend, domain events
//! - [`operations`] - Access, relocation, lifecycle, sort and paging rules
//! - [`services`] - `MediaTreeService`, the request-level API
//! - [`config`] - Service configuration and tracing setup

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::{init_tracing, MediaTreeConfig};
pub use db::{DomainEvent, InMemoryStore, NodeStore};
pub use models::*;
pub use operations::{CreateNodeParams, OperationError};
pub use services::*;
