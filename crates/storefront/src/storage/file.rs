//! File-backed local store.
//!
//! Layout: `<root>/<scope>/<key>.json`. Writes go to a temporary file first
//! and are renamed into place, so a crash never leaves a half-written record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use zallshop_core::StorageError;

use super::LocalStore;

/// Local store persisting each record as a file under a root directory.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    root: PathBuf,
}

impl FileLocalStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, scope: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_component(scope)?;
        validate_component(key)?;
        Ok(self.root.join(scope).join(format!("{key}.json")))
    }
}

/// Scopes and keys become path components, so only a safe alphabet is accepted.
fn validate_component(value: &str) -> Result<(), StorageError> {
    let valid = !value.is_empty()
        && value.len() <= 128
        && !value.starts_with('.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::Backend(format!(
            "invalid storage path component: {value:?}"
        )))
    }
}

impl LocalStore for FileLocalStore {
    fn get_item(&self, scope: &str, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.record_path(scope, key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, scope: &str, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.record_path(scope, key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, scope: &str, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(scope, key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
