//! Cart change notification.
//!
//! The store announces every change through a [`ChangeNotifier`]. A change
//! says *what happened*, never *what the cart now is*: listeners read the
//! current lines back through the store, which re-reads the persisted slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use storecart_core::LineKey;

/// A mutation performed by this context's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    /// One unit of a product was added (new line or merged).
    Added {
        key: LineKey,
        display_name: String,
    },
    Incremented {
        key: LineKey,
    },
    /// One unit was taken off; `removed` is set when the line was deleted.
    Decremented {
        key: LineKey,
        removed: bool,
    },
    Removed {
        key: LineKey,
    },
    Cleared,
}

/// Cart-changed signal delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// This context changed the cart.
    Local(CartMutation),
    /// Another context sharing the storage origin changed the slot.
    Remote,
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&CartChange) + Send + Sync>;

/// Synchronous fan-out of [`CartChange`]s.
///
/// Listeners run on the notifying thread, in subscription order, after the
/// change is persisted. The listener list is not locked while they run, so a
/// listener may subscribe, unsubscribe or mutate the cart again.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CartChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn notify(&self, change: &CartChange) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(change);
        }
    }
}
