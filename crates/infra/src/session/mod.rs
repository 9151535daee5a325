//! Sessions: the explicit owner of a ledger, the invoice being edited and a
//! storage backend.
//!
//! `SessionState` holds the pure part. `LocalSession` persists through a
//! `StorageBackend`; `RemoteSession` keeps templates and drafts on a
//! `RemoteStore` and re-fetches them after every successful change.

pub mod confirm;
pub mod local;
pub mod remote;
pub mod state;

pub use confirm::ConfirmDelete;
pub use local::LocalSession;
pub use remote::RemoteSession;
pub use state::SessionState;
