//! Persistence collaborator boundary.
//!
//! Orders, lines and inventory lots are stored as JSON documents in named,
//! tenant-scoped collections. Multi-record writes go through a [`UnitOfWork`]
//! that is committed atomically after its revision precondition is checked.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use r#trait::{Collection, Precondition, RecordQuery, RecordStore, StoreError, UnitOfWork, WriteOp};
