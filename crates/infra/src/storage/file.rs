//! JSON-file backed local store.
//!
//! One `<key>.json` file per collection under a data directory. Writes go to
//! a temporary sibling first and are renamed into place.

use std::path::{Path, PathBuf};

use super::r#trait::{StorageBackend, StorageError, StorageKey};

const APP_DIR: &str = "invoicer";

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files under `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{app_data_dir}/invoicer`, falling back to `~/.local/share/invoicer`.
    pub fn default_location() -> Result<Self, StorageError> {
        Ok(Self::new(default_data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl StorageBackend for FileStorage {
    fn load(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key, source }),
        }
    }

    fn save(&self, key: StorageKey, blob: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io { key, source })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, blob).map_err(|source| StorageError::Io { key, source })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Io { key, source })?;

        tracing::debug!(key = %key, path = %path.display(), bytes = blob.len(), "wrote collection file");
        Ok(())
    }
}

fn default_data_dir() -> Result<PathBuf, StorageError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or_else(|| {
            StorageError::Backend(
                "failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share"
                    .to_string(),
            )
        })?;

    Ok(base.join(APP_DIR))
}
