//! Business Services
//!
//! - `MediaTreeService` - the request-level API over the media tree: access
//!   checks, creation, listing, move/copy, delete and sort, with domain
//!   events broadcast after every committed change

pub mod media_service;

pub use media_service::MediaTreeService;
