//! Application state shared across a browsing context.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::checkout::Checkout;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::presentation::CartPanel;
use crate::storage::{FileStorage, StorageArea, StorageEvents};
use crate::store::CartStore;

/// Everything one browsing context needs: a store over its storage area, the
/// panel rendering it and the checkout reading it.
///
/// This struct is cheaply cloneable via `Arc`. All three parts share the same
/// store, so the panel re-renders after checkout-adjacent mutations too.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<CartStore>,
    panel: Arc<CartPanel>,
    checkout: Checkout,
    remote_sync: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        let task = self
            .remote_sync
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl AppState {
    /// Create a new application state over `storage`.
    ///
    /// The cart slot is initialized to an empty cart if absent.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `storage` - The context's storage area
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be initialized or the initial
    /// render fails.
    pub fn new(config: StorefrontConfig, storage: Arc<dyn StorageArea>) -> Result<Self> {
        let store = Arc::new(CartStore::with_slot(storage, config.storage.slot.clone()));
        store.ensure_initialized()?;

        let panel = CartPanel::attach(Arc::clone(&store), &config.presentation)?;
        let checkout = Checkout::new(Arc::clone(&store), config.checkout.clone());

        tracing::debug!(slot = %config.storage.slot, "Storefront state ready");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                panel,
                checkout,
                remote_sync: Mutex::new(None),
            }),
        })
    }

    /// Create a new application state over the configured storage file.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be initialized or the initial
    /// render fails.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.storage.path.clone()));
        Self::new(config, storage)
    }

    /// Keep this context in step with writes made by other contexts.
    ///
    /// Storage events from `events` are delivered to the store as they
    /// arrive, so the panel re-renders without an explicit sync. Replaces
    /// any earlier sync task. The task stops when the last clone of this
    /// state is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_remote_sync(&self, events: StorageEvents) {
        let task = self.inner.store.spawn_remote_sync(events);
        let previous = self
            .inner
            .remote_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn store(&self) -> &Arc<CartStore> {
        &self.inner.store
    }

    /// Get a reference to the cart panel.
    #[must_use]
    pub fn panel(&self) -> &Arc<CartPanel> {
        &self.inner.panel
    }

    /// Get a reference to the checkout.
    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storecart_core::ProductId;

    use super::*;
    use crate::storage::SharedOrigin;
    use crate::store::ItemSelection;

    #[test]
    fn test_new_initializes_slot() {
        let storage = Arc::new(SharedOrigin::new().open_context());
        let state = AppState::new(StorefrontConfig::default(), Arc::clone(&storage) as _).unwrap();

        assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("{}"));
        assert_eq!(state.panel().fragments().item_count, 0);
    }

    #[test]
    fn test_parts_share_one_store() {
        let state = AppState::new(
            StorefrontConfig::default(),
            Arc::new(SharedOrigin::new().open_context()),
        )
        .unwrap();

        state
            .store()
            .add_item(ItemSelection::new(ProductId::parse("pump-1").unwrap(), "Pump A"))
            .unwrap();

        assert_eq!(state.panel().fragments().item_count, 1);
        let (message, _) = state.checkout().prepare().unwrap();
        assert_eq!(message.total_quantity, 1);
    }

    #[test]
    fn test_custom_slot() {
        let storage = Arc::new(SharedOrigin::new().open_context());
        let mut config = StorefrontConfig::default();
        config.storage.slot = "basket".to_string();

        let state = AppState::new(config, Arc::clone(&storage) as _).unwrap();
        assert_eq!(state.store().slot(), "basket");
        assert!(storage.get_item("basket").unwrap().is_some());
        assert!(storage.get_item("cart").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_spawn_remote_sync_refreshes_panel() {
        let origin = SharedOrigin::new();
        let writer =
            AppState::new(StorefrontConfig::default(), Arc::new(origin.open_context())).unwrap();
        let storage = origin.open_context();
        let events = storage.events();
        let reader = AppState::new(StorefrontConfig::default(), Arc::new(storage)).unwrap();
        reader.spawn_remote_sync(events);

        writer
            .store()
            .add_item(ItemSelection::new(ProductId::parse("pump-1").unwrap(), "Pump A"))
            .unwrap();

        for _ in 0..100 {
            if reader.panel().fragments().item_count == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(reader.panel().fragments().item_count, 1);
        assert!(reader.panel().toasts().visible().is_empty());
    }
}
