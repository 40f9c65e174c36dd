//! In-process storage origin shared by several browsing contexts.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::{StorageArea, StorageError, StorageEvent};

/// Buffered events per context before a slow context starts lagging.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Identifier of one browsing context opened on a [`SharedOrigin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct OriginEvent {
    source: ContextId,
    event: StorageEvent,
}

/// One storage origin: a single key/value area plus the channel that
/// carries change events between its contexts.
///
/// Cheaply cloneable; clones refer to the same origin.
#[derive(Clone)]
pub struct SharedOrigin {
    inner: Arc<OriginInner>,
}

struct OriginInner {
    items: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<OriginEvent>,
    next_context: AtomicU64,
}

impl Default for SharedOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedOrigin {
    /// Create an empty origin.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty origin buffering up to `capacity` undelivered events
    /// per context.
    #[must_use]
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(OriginInner {
                items: RwLock::new(HashMap::new()),
                events,
                next_context: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new browsing context on this origin.
    #[must_use]
    pub fn open_context(&self) -> MemoryStorage {
        let id = ContextId(self.inner.next_context.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(context = %id, "Opened storage context");
        MemoryStorage {
            origin: self.clone(),
            context: id,
        }
    }

    fn write(
        &self,
        source: ContextId,
        key: &str,
        new_value: Option<&str>,
    ) -> Result<(), StorageError> {
        let old_value = {
            let mut items = self
                .inner
                .items
                .write()
                .map_err(|_| StorageError::Poisoned)?;
            match new_value {
                Some(value) => items.insert(key.to_owned(), value.to_owned()),
                None => items.remove(key),
            }
        };

        if old_value.as_deref() == new_value {
            return Ok(());
        }

        // No receivers is fine: nobody else is looking.
        let _ = self.inner.events.send(OriginEvent {
            source,
            event: StorageEvent {
                key: Some(key.to_owned()),
                old_value,
                new_value: new_value.map(str::to_owned),
            },
        });
        Ok(())
    }
}

/// A browsing context's view of a [`SharedOrigin`].
pub struct MemoryStorage {
    origin: SharedOrigin,
    context: ContextId,
}

impl MemoryStorage {
    #[must_use]
    pub const fn context_id(&self) -> ContextId {
        self.context
    }

    /// Subscribe to changes made by other contexts of the origin.
    ///
    /// Only writes made after this call are observed.
    #[must_use]
    pub fn events(&self) -> StorageEvents {
        StorageEvents {
            receiver: self.origin.inner.events.subscribe(),
            context: self.context,
        }
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self
            .origin
            .inner
            .items
            .read()
            .map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.origin.write(self.context, key, Some(value))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.origin.write(self.context, key, None)
    }
}

/// Storage events raised by other contexts, as seen by one context.
pub struct StorageEvents {
    receiver: broadcast::Receiver<OriginEvent>,
    context: ContextId,
}

impl StorageEvents {
    /// Next pending event, without waiting.
    ///
    /// If this context fell behind and events were dropped, a single
    /// [`StorageEvent`] with `key: None` is returned in their place.
    pub fn try_next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(origin) if origin.source == self.context => {}
                Ok(origin) => return Some(origin.event),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(context = %self.context, missed, "Storage events lagged");
                    return Some(StorageEvent::resync());
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next event. Returns `None` once the origin is gone.
    pub async fn next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(origin) if origin.source == self.context => {}
                Ok(origin) => return Some(origin.event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(context = %self.context, missed, "Storage events lagged");
                    return Some(StorageEvent::resync());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_share_values() {
        let origin = SharedOrigin::new();
        let a = origin.open_context();
        let b = origin.open_context();

        a.set_item("cart", "{}").unwrap();
        assert_eq!(b.get_item("cart").unwrap().as_deref(), Some("{}"));

        b.remove_item("cart").unwrap();
        assert_eq!(a.get_item("cart").unwrap(), None);
    }

    #[test]
    fn test_distinct_context_ids() {
        let origin = SharedOrigin::new();
        assert_ne!(
            origin.open_context().context_id(),
            origin.open_context().context_id()
        );
    }

    #[test]
    fn test_event_reaches_other_context_only() {
        let origin = SharedOrigin::new();
        let a = origin.open_context();
        let b = origin.open_context();
        let mut a_events = a.events();
        let mut b_events = b.events();

        a.set_item("cart", "{\"x\":1}").unwrap();

        assert_eq!(a_events.try_next(), None);
        let event = b_events.try_next().unwrap();
        assert_eq!(event.key.as_deref(), Some("cart"));
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("{\"x\":1}"));
        assert_eq!(b_events.try_next(), None);
    }

    #[test]
    fn test_unchanged_write_raises_no_event() {
        let origin = SharedOrigin::new();
        let a = origin.open_context();
        let b = origin.open_context();
        a.set_item("cart", "{}").unwrap();

        let mut b_events = b.events();
        a.set_item("cart", "{}").unwrap();
        a.remove_item("missing").unwrap();
        assert_eq!(b_events.try_next(), None);
    }

    #[test]
    fn test_remove_raises_event() {
        let origin = SharedOrigin::new();
        let a = origin.open_context();
        let b = origin.open_context();
        a.set_item("cart", "{}").unwrap();
        let mut b_events = b.events();

        a.remove_item("cart").unwrap();
        let event = b_events.try_next().unwrap();
        assert_eq!(event.old_value.as_deref(), Some("{}"));
        assert_eq!(event.new_value, None);
    }

    #[test]
    fn test_lagging_context_gets_resync() {
        let origin = SharedOrigin::with_event_capacity(2);
        let a = origin.open_context();
        let b = origin.open_context();
        let mut b_events = b.events();

        for i in 0..5 {
            a.set_item("cart", &i.to_string()).unwrap();
        }

        assert_eq!(b_events.try_next(), Some(StorageEvent::resync()));
    }

    #[tokio::test]
    async fn test_async_next() {
        let origin = SharedOrigin::new();
        let a = origin.open_context();
        let b = origin.open_context();
        let mut b_events = b.events();

        a.set_item("cart", "{}").unwrap();
        let event = b_events.next().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("cart"));
    }
}
