//! The cart store.
//!
//! [`CartStore`] is the only writer of the cart slot. Every operation reads
//! the whole persisted cart, applies one [`Cart`] transition, writes the
//! whole cart back and then notifies subscribers. Nothing is cached between
//! calls, so a store always observes writes made by other contexts.
//!
//! # Cross-context consistency
//!
//! Contexts sharing an origin race on the slot: the read-modify-write is not
//! atomic across contexts, so two contexts incrementing the same line at the
//! same moment can lose one increment. The last writer wins. Stores do not
//! lock or version the slot.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::instrument;

use storecart_core::{
    Cart, CartFormatError, CartLine, Decrement, LineKey, ProductId, VariantAttributes,
};

use crate::events::{CartChange, CartMutation, ChangeNotifier, SubscriptionId};
use crate::storage::{StorageArea, StorageError, StorageEvent, StorageEvents};

/// Storage key of the cart slot unless configured otherwise.
pub const DEFAULT_SLOT: &str = "cart";

/// Errors that can occur while persisting the cart.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage area rejected the write.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("Cart format error: {0}")]
    Format(#[from] CartFormatError),
}

/// A product selection passed to [`CartStore::add_item`].
#[derive(Debug, Clone)]
pub struct ItemSelection {
    pub product_id: ProductId,
    pub display_name: String,
    pub attributes: VariantAttributes,
    pub image: Option<String>,
}

impl ItemSelection {
    /// A simple product with no variant attributes and no image.
    #[must_use]
    pub fn new(product_id: ProductId, display_name: impl Into<String>) -> Self {
        Self {
            product_id,
            display_name: display_name.into(),
            attributes: VariantAttributes::new(),
            image: None,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: VariantAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Key this selection resolves to.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::derive(self.product_id.clone(), self.attributes.clone())
    }
}

/// Owner of the persisted cart slot for one browsing context.
pub struct CartStore {
    storage: Arc<dyn StorageArea>,
    slot: String,
    notifier: ChangeNotifier,
}

impl CartStore {
    /// Store using the default `"cart"` slot.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageArea>) -> Self {
        Self::with_slot(storage, DEFAULT_SLOT)
    }

    #[must_use]
    pub fn with_slot(storage: Arc<dyn StorageArea>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
            notifier: ChangeNotifier::new(),
        }
    }

    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Write an empty cart if the slot is absent.
    ///
    /// A present but unreadable value is left in place; reads treat it as an
    /// empty cart and the next mutation replaces it. Returns whether anything
    /// was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the empty cart cannot be written.
    #[instrument(skip_all, fields(slot = %self.slot))]
    pub fn ensure_initialized(&self) -> Result<bool, StoreError> {
        match self.storage.get_item(&self.slot) {
            Ok(Some(_)) => Ok(false),
            Ok(None) => {
                self.save(&Cart::new())?;
                tracing::debug!("Cart initialized");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cart slot unreadable, skipping initialization");
                Ok(false)
            }
        }
    }

    /// Add one unit of the selected product.
    ///
    /// Returns the line as stored after the add.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    #[instrument(skip_all, fields(slot = %self.slot, product_id = %selection.product_id))]
    pub fn add_item(&self, selection: ItemSelection) -> Result<CartLine, StoreError> {
        let key = selection.key();
        let mut cart = self.load();
        let line = cart
            .add(
                key.clone(),
                selection.display_name,
                selection.image,
                Utc::now(),
            )
            .clone();
        tracing::debug!(key = %key, quantity = line.quantity(), "Item added");

        self.commit(
            &cart,
            CartMutation::Added {
                key,
                display_name: line.display_name().to_owned(),
            },
        )?;
        Ok(line)
    }

    /// Add one unit to an existing line. Absent keys are a no-op returning
    /// `false`; nothing is written or notified.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    #[instrument(skip_all, fields(slot = %self.slot, key = %key))]
    pub fn increment(&self, key: &LineKey) -> Result<bool, StoreError> {
        let mut cart = self.load();
        let Some(quantity) = cart.increment(key) else {
            tracing::debug!("Increment on absent line ignored");
            return Ok(false);
        };
        tracing::debug!(quantity, "Line incremented");

        self.commit(&cart, CartMutation::Incremented { key: key.clone() })?;
        Ok(true)
    }

    /// Take one unit off an existing line, deleting it at zero. Absent keys
    /// are a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    #[instrument(skip_all, fields(slot = %self.slot, key = %key))]
    pub fn decrement(&self, key: &LineKey) -> Result<Option<Decrement>, StoreError> {
        let mut cart = self.load();
        let Some(outcome) = cart.decrement(key) else {
            tracing::debug!("Decrement on absent line ignored");
            return Ok(None);
        };
        tracing::debug!(?outcome, "Line decremented");

        self.commit(
            &cart,
            CartMutation::Decremented {
                key: key.clone(),
                removed: outcome == Decrement::Removed,
            },
        )?;
        Ok(Some(outcome))
    }

    /// Delete a line regardless of its quantity. Returns the removed line;
    /// absent keys are a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    #[instrument(skip_all, fields(slot = %self.slot, key = %key))]
    pub fn remove_item(&self, key: &LineKey) -> Result<Option<CartLine>, StoreError> {
        let mut cart = self.load();
        let Some(removed) = cart.remove(key) else {
            tracing::debug!("Remove on absent line ignored");
            return Ok(None);
        };
        tracing::debug!(quantity = removed.quantity(), "Line removed");

        self.commit(&cart, CartMutation::Removed { key: key.clone() })?;
        Ok(Some(removed))
    }

    /// Replace the cart with an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    #[instrument(skip_all, fields(slot = %self.slot))]
    pub fn clear(&self) -> Result<(), StoreError> {
        self.commit(&Cart::new(), CartMutation::Cleared)
    }

    /// Fresh copy of the persisted cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.load()
    }

    /// Lines in insertion order. The returned values are owned snapshots.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.load().lines().cloned().collect()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.load().total_quantity()
    }

    #[must_use]
    pub fn has_items(&self) -> bool {
        self.total_quantity() > 0
    }

    /// Call `listener` after every change, local or remote.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CartChange) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    /// Feed a storage event from another context into this store.
    ///
    /// Events for the cart slot notify subscribers with
    /// [`CartChange::Remote`]; the event's value is ignored, subscribers read
    /// the slot again. Returns whether subscribers were notified.
    pub fn handle_storage_event(&self, event: &StorageEvent) -> bool {
        if !event.touches(&self.slot) {
            return false;
        }
        tracing::debug!(slot = %self.slot, "Cart changed in another context");
        self.notifier.notify(&CartChange::Remote);
        true
    }

    /// Handle every event already queued on `events`. Returns how many
    /// touched the cart slot.
    pub fn sync_remote(&self, events: &mut StorageEvents) -> usize {
        let mut handled = 0;
        while let Some(event) = events.try_next() {
            if self.handle_storage_event(&event) {
                handled += 1;
            }
        }
        handled
    }

    /// Deliver storage events to this store as they arrive.
    ///
    /// Spawns a task on the current tokio runtime that feeds every event from
    /// `events` into [`Self::handle_storage_event`]. The task holds only a
    /// weak reference and ends once the store is dropped or the origin
    /// closes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_remote_sync(self: &Arc<Self>, mut events: StorageEvents) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.handle_storage_event(&event);
            }
            tracing::debug!("Remote cart sync stopped");
        })
    }

    fn load(&self) -> Cart {
        let raw = match self.storage.get_item(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Cart slot unreadable, treating as empty");
                return Cart::new();
            }
        };

        match Cart::from_json(&raw) {
            Ok(decoded) => {
                if decoded.dropped > 0 {
                    tracing::warn!(
                        slot = %self.slot,
                        dropped = decoded.dropped,
                        "Dropped unusable cart entries"
                    );
                }
                decoded.cart
            }
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Cart slot malformed, treating as empty");
                Cart::new()
            }
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let json = cart.to_json()?;
        self.storage.set_item(&self.slot, &json)?;
        Ok(())
    }

    fn commit(&self, cart: &Cart, mutation: CartMutation) -> Result<(), StoreError> {
        self.save(cart)?;
        self.notifier.notify(&CartChange::Local(mutation));
        Ok(())
    }
}
