//! Hosted (multi-user) persistence for templates and drafts.
//!
//! Rows are scoped per user; public templates live in a separate table whose
//! `is_active` flag is toggled by administrators.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryRemoteStore;
pub use postgres::PostgresRemoteStore;
pub use r#trait::{DraftUpdate, RemoteStore, RemoteStoreError};
