//! JSON encoding of ledger collections.

use serde::Serialize;
use serde::de::DeserializeOwned;

use invoicer_invoicing::Ledger;

use super::r#trait::{StorageBackend, StorageError, StorageKey};

/// Load one collection; a never-written key yields an empty vec.
pub fn load_collection<T, S>(storage: &S, key: StorageKey) -> Result<Vec<T>, StorageError>
where
    T: DeserializeOwned,
    S: StorageBackend + ?Sized,
{
    match storage.load(key)? {
        None => Ok(Vec::new()),
        Some(blob) if blob.trim().is_empty() => Ok(Vec::new()),
        Some(blob) => {
            serde_json::from_str(&blob).map_err(|source| StorageError::Serialization { key, source })
        }
    }
}

/// Overwrite one collection with `entries`.
pub fn save_collection<T, S>(storage: &S, key: StorageKey, entries: &[T]) -> Result<(), StorageError>
where
    T: Serialize,
    S: StorageBackend + ?Sized,
{
    let blob =
        serde_json::to_string(entries).map_err(|source| StorageError::Serialization { key, source })?;
    storage.save(key, &blob)
}

/// Load all three collections.
pub fn load_ledger<S>(storage: &S) -> Result<Ledger, StorageError>
where
    S: StorageBackend + ?Sized,
{
    let invoices = load_collection(storage, StorageKey::Invoices)?;
    let templates = load_collection(storage, StorageKey::Templates)?;
    let drafts = load_collection(storage, StorageKey::Drafts)?;

    let ledger = Ledger::from_parts(invoices, templates, drafts);
    tracing::debug!(
        invoices = ledger.invoices.len(),
        templates = ledger.templates.len(),
        drafts = ledger.drafts.len(),
        "loaded ledger"
    );
    Ok(ledger)
}

/// Write all three collections.
pub fn save_ledger<S>(storage: &S, ledger: &Ledger) -> Result<(), StorageError>
where
    S: StorageBackend + ?Sized,
{
    save_collection(storage, StorageKey::Invoices, ledger.invoices.as_slice())?;
    save_collection(storage, StorageKey::Templates, ledger.templates.as_slice())?;
    save_collection(storage, StorageKey::Drafts, ledger.drafts.as_slice())
}
