//! Repository Layer
//!
//! This module defines how the media tree is persisted:
//!
//! - `NodeStore` - the async repository trait every operation goes through
//! - `InMemoryStore` - reference backend with atomic batch writes
//! - `StoreError` - failures backends raise for callers to classify
//! - `DomainEvent` - change notifications broadcast after commits

mod error;
pub mod events;
mod memory_store;
mod node_store;

pub use error::StoreError;
pub use events::DomainEvent;
pub use memory_store::InMemoryStore;
pub use node_store::NodeStore;
