//! The cart panel: counter, modal list, checkout button and toasts bound to
//! one store.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use url::Url;

use storecart_core::{CartLine, Decrement, LineKey};

use super::{
    BusyControls, CartFragments, PresentationConfig, ToastKind, ToastQueue, render_fragments,
};
use crate::checkout::{Checkout, CheckoutError, LinkOpener};
use crate::events::{CartChange, CartMutation, SubscriptionId};
use crate::store::{CartStore, StoreError};

/// Toast shown when checkout is pressed with an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// Outcome of pressing a busy-guarded control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Press<T> {
    /// The press reached the store.
    Applied(T),
    /// The control was still busy from an earlier press.
    Busy,
}

/// Rendered cart surfaces kept in step with a store.
///
/// The panel re-renders after every local or remote change. Fragments are
/// always derived from a fresh read of the store, never patched in place.
pub struct CartPanel {
    store: Arc<CartStore>,
    fragments: Mutex<CartFragments>,
    toasts: ToastQueue,
    controls: BusyControls,
    subscription: SubscriptionId,
}

impl CartPanel {
    /// Render the current cart and subscribe to changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial render fails.
    pub fn attach(
        store: Arc<CartStore>,
        config: &PresentationConfig,
    ) -> askama::Result<Arc<Self>> {
        let initial = render_fragments(&store.lines())?;

        Ok(Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let subscription = store.subscribe(move |change| {
                if let Some(panel) = weak.upgrade() {
                    panel.on_change(change);
                }
            });

            Self {
                store,
                fragments: Mutex::new(initial),
                toasts: ToastQueue::new(config.toast_duration),
                controls: BusyControls::new(config.busy_hold),
                subscription,
            }
        }))
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<CartStore> {
        &self.store
    }

    /// Current rendered surfaces.
    #[must_use]
    pub fn fragments(&self) -> CartFragments {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub const fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    #[must_use]
    pub const fn controls(&self) -> &BusyControls {
        &self.controls
    }

    /// Re-render every surface from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to render; the previous
    /// fragments are kept.
    pub fn refresh(&self) -> askama::Result<()> {
        let rendered = render_fragments(&self.store.lines())?;
        *self.fragments.lock().unwrap_or_else(PoisonError::into_inner) = rendered;
        Ok(())
    }

    fn on_change(&self, change: &CartChange) {
        if let CartChange::Local(CartMutation::Added { display_name, .. }) = change {
            self.toasts
                .push(format!("{display_name} added to cart"), ToastKind::Success);
        }

        if let Err(e) = self.refresh() {
            tracing::error!(error = %e, "Failed to render cart");
        }
    }

    /// Increase control of a line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    pub async fn press_increase(&self, key: &LineKey) -> Result<Press<bool>, StoreError> {
        let control = format!("increase:{key}");
        match self
            .controls
            .run(&control, || self.store.increment(key))
            .await
        {
            Some(result) => result.map(Press::Applied),
            None => Ok(Press::Busy),
        }
    }

    /// Decrease control of a line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    pub async fn press_decrease(
        &self,
        key: &LineKey,
    ) -> Result<Press<Option<Decrement>>, StoreError> {
        let control = format!("decrease:{key}");
        match self
            .controls
            .run(&control, || self.store.decrement(key))
            .await
        {
            Some(result) => result.map(Press::Applied),
            None => Ok(Press::Busy),
        }
    }

    /// Remove control of a line. Not busy-guarded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be written.
    pub fn press_remove(&self, key: &LineKey) -> Result<Option<CartLine>, StoreError> {
        self.store.remove_item(key)
    }

    /// Checkout button. An empty cart shows a warning toast and opens
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] if the order cannot be formatted.
    pub fn press_checkout(
        &self,
        checkout: &Checkout,
        opener: &dyn LinkOpener,
    ) -> Result<Option<Url>, CheckoutError> {
        match checkout.submit(opener) {
            Ok(url) => Ok(Some(url)),
            Err(CheckoutError::EmptyCart) => {
                self.toasts.push(EMPTY_CART_MESSAGE, ToastKind::Warning);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for CartPanel {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}
