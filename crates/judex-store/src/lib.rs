//! Storage layer: the judgment collection, the repository abstraction, and
//! its JSON snapshot and in-memory implementations.

mod collection;
mod error;
mod memory;
mod repository;
mod snapshot;

pub use collection::{DedupReport, Store};
pub use error::StoreError;
pub use memory::MemoryRepository;
pub use repository::DocumentRepository;
pub use snapshot::{JsonSnapshot, SnapshotFormat};
