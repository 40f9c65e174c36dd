//! Key/value storage areas holding the persisted cart slot.
//!
//! A [`StorageArea`] is the per-origin local storage a browsing context sees:
//! string keys, string values, whole-value reads and writes. Two backends:
//!
//! - [`memory`] - an in-process [`SharedOrigin`] from which any number of
//!   contexts (tabs) are opened. Writes from one context raise a
//!   [`StorageEvent`] in every other context, never in the writer.
//! - [`file`] - a JSON file holding the whole area, used by the CLI so the
//!   cart survives between invocations.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::{ContextId, MemoryStorage, SharedOrigin, StorageEvents};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A lock guarding the in-memory area was poisoned.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Per-origin key/value storage.
///
/// Every call reads or writes one whole value; there are no partial updates
/// and no transactions.
pub trait StorageArea: Send + Sync {
    /// Value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Succeeds when the key is already absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Change to a storage area, observed from another context of the same
/// origin.
///
/// Consumers must re-read the slot instead of trusting `new_value`: by the
/// time the event is handled a later write may already have landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The changed key. `None` means "anything may have changed", raised
    /// when a context fell behind and events were lost.
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl StorageEvent {
    /// Whether this event may affect `slot`.
    #[must_use]
    pub fn touches(&self, slot: &str) -> bool {
        self.key.as_deref().is_none_or(|key| key == slot)
    }

    pub(crate) const fn resync() -> Self {
        Self {
            key: None,
            old_value: None,
            new_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_touches_slot() {
        let event = StorageEvent {
            key: Some("cart".to_string()),
            old_value: None,
            new_value: Some("{}".to_string()),
        };
        assert!(event.touches("cart"));
        assert!(!event.touches("wishlist"));
    }

    #[test]
    fn test_resync_touches_everything() {
        assert!(StorageEvent::resync().touches("cart"));
        assert!(StorageEvent::resync().touches("anything"));
    }
}
