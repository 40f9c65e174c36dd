//! Storage area persisted as a JSON file.
//!
//! The whole area is one JSON object of string values. Every write rewrites
//! the file through a uniquely named temporary sibling and a rename, so a
//! crash never leaves a half-written area behind. Read-modify-write cycles
//! hold an exclusive lock on a `.lock` sibling, so concurrent writers never
//! drop each other's keys.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use super::{StorageArea, StorageError};

/// A storage area backed by a single JSON file.
///
/// Raises no cross-context events; each process re-reads the file on every
/// access instead.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Use `path` as the backing file. Nothing is created until the first
    /// write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Current contents for a read-modify-write. A corrupt file is replaced
    /// rather than blocking every future write.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_all() {
            Err(StorageError::Corrupt { path, source }) => {
                tracing::warn!(path = %path.display(), error = %source, "Replacing corrupt storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    /// Directory holding the area file, created if missing.
    fn parent_dir(&self) -> Result<PathBuf, StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        Ok(parent)
    }

    /// Run a read-modify-write cycle under the exclusive file lock.
    fn update<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _lock = FileLock::acquire(&self.path.with_extension("lock"))?;
        let mut items = self.read_for_update()?;
        if apply(&mut items) {
            self.write_all(&items)?;
        }
        Ok(())
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(items).map_err(std::io::Error::other)?;

        let mut tmp = NamedTempFile::new_in(self.parent_dir()?)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Exclusive advisory lock, released when dropped.
///
/// The lock file stays in place so every writer locks the same inode.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "Failed to release storage lock");
        }
    }
}

impl StorageArea for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| items.remove(key).is_some())
    }
}
