//! Infrastructure layer: local storage, the remote store, sessions, config.

pub mod config;
pub mod remote;
pub mod session;
pub mod storage;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, InvoicerConfig, StorageMode};
pub use remote::{DraftUpdate, InMemoryRemoteStore, PostgresRemoteStore, RemoteStore, RemoteStoreError};
pub use session::{ConfirmDelete, LocalSession, RemoteSession, SessionState};
pub use storage::{FileStorage, InMemoryStorage, StorageBackend, StorageError, StorageKey};
