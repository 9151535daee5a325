use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespaces of the local store, one per ledger collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    Invoices,
    Templates,
    Drafts,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [Self::Invoices, Self::Templates, Self::Drafts];

    /// Key under which the collection is stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Invoices => "invoiceData",
            StorageKey::Templates => "invoiceTemplates",
            StorageKey::Drafts => "invoiceDrafts",
        }
    }
}

impl core::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local storage failure.
///
/// These are infrastructure errors; sessions log them and keep going.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on '{key}': {source}")]
    Io {
        key: StorageKey,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data under '{key}': {source}")]
    Serialization {
        key: StorageKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String blob store keyed by `StorageKey`.
pub trait StorageBackend: Send + Sync {
    /// `Ok(None)` when nothing was ever saved under `key`.
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    /// Overwrite the blob under `key`.
    fn save(&self, key: StorageKey, blob: &str) -> Result<(), StorageError>;
}

impl<S> StorageBackend for Arc<S>
where
    S: StorageBackend + ?Sized,
{
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: StorageKey, blob: &str) -> Result<(), StorageError> {
        (**self).save(key, blob)
    }
}
