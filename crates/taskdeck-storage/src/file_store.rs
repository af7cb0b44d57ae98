use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use taskdeck_core::storage::{KeyValueStore, StoreError};
use tempfile::NamedTempFile;
use tracing::instrument;

/// File-backed store: one file per key under `root`, written via temp file + rename
/// so a crash mid-write never leaves a half-written blob behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self, value), fields(len = value.len()))]
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        write_atomic(&self.path_for(key), value)
    }

    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<String, StoreError> {
        let bytes = fs::read(self.path_for(key)).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    key: key.to_string(),
                }
            } else {
                storage_err(err)
            }
        })?;
        // Invalid UTF-8 is handed back lossily so callers see a corrupt blob, not an I/O error.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[instrument(skip(self))]
    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err(err)),
        }
    }
}

fn write_atomic(path: &Path, value: &str) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| StoreError::Storage {
        reason: "invalid storage path".to_string(),
    })?;
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    tmp.write_all(value.as_bytes()).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// Keys may contain separators; encode them into a safe single path component.
fn sanitize_key(key: &str) -> String {
    format!("{}.json", URL_SAFE_NO_PAD.encode(key))
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}
