//! `goodjob-store`: schemaless document store abstraction.
//!
//! Models the storage semantics the API depends on: point reads and writes,
//! merge patches, auto-ID inserts, equality / array-contains / in-set queries
//! with ordering and limit, atomic multi-document batches, idempotent
//! array-union, atomic insert-with-uniqueness-check, and a created-document
//! feed for background triggers.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::{
    BatchOp, Direction, Document, DocumentCreated, DocumentStore, Filter, Query, UniqueCheck,
};
