//! Local persistence of the ledger collections.
//!
//! Each collection is stored as one JSON array under a fixed key. Backends
//! only move strings around; (de)serialization lives in `codec`.

pub mod codec;
pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use codec::{load_collection, load_ledger, save_collection, save_ledger};
pub use file::FileStorage;
pub use in_memory::InMemoryStorage;
pub use r#trait::{StorageBackend, StorageError, StorageKey};
