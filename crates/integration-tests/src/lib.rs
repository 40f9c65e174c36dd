//! Integration tests for storecart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storecart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cross_context` - Several tabs sharing one storage origin
//! - `reload` - Carts surviving a reload through the storage file
//! - `checkout_flow` - Panel, busy controls, toasts and checkout together
//!
//! This crate provides the harness: a [`Browser`] owning one storage origin
//! from which [`Tab`]s are opened, each with its own store and panel. Tabs
//! from [`Browser::open_live_tab`] follow other tabs on their own; tabs from
//! [`Browser::open_tab`] only see remote writes when [`Tab::sync`] is called.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use url::Url;

use storecart_core::ProductId;
use storecart_storefront::checkout::LinkOpener;
use storecart_storefront::config::StorefrontConfig;
use storecart_storefront::error::Result;
use storecart_storefront::state::AppState;
use storecart_storefront::storage::{MemoryStorage, SharedOrigin, StorageEvents};
use storecart_storefront::store::ItemSelection;

/// One storage origin shared by every tab opened from it.
#[derive(Clone, Default)]
pub struct Browser {
    origin: SharedOrigin,
    config: StorefrontConfig,
}

impl Browser {
    /// A browser with default configuration and short busy/toast timings.
    #[must_use]
    pub fn new() -> Self {
        let mut config = StorefrontConfig::default();
        config.presentation.busy_hold = Duration::from_millis(20);
        config.presentation.toast_duration = Duration::from_millis(200);
        Self::with_config(config)
    }

    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        Self {
            origin: SharedOrigin::new(),
            config,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> &SharedOrigin {
        &self.origin
    }

    /// Open a tab: a new context on the origin with its own store and panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab's state cannot be created.
    pub fn open_tab(&self) -> Result<Tab> {
        let storage = Arc::new(self.origin.open_context());
        // Subscribe before the state initializes the slot so nothing is missed.
        let events = storage.events();
        let state = AppState::new(self.config.clone(), Arc::clone(&storage) as _)?;
        Ok(Tab {
            storage,
            state,
            events: Some(events),
        })
    }

    /// Open a tab whose store receives storage events from other tabs as
    /// they happen.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab's state cannot be created.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn open_live_tab(&self) -> Result<Tab> {
        let mut tab = self.open_tab()?;
        if let Some(events) = tab.events.take() {
            tab.state.spawn_remote_sync(events);
        }
        Ok(tab)
    }
}

/// A browsing context.
pub struct Tab {
    pub storage: Arc<MemoryStorage>,
    pub state: AppState,
    events: Option<StorageEvents>,
}

impl Tab {
    /// Deliver every pending storage event from other tabs. Returns how many
    /// touched the cart. Always 0 for a live tab.
    pub fn sync(&mut self) -> usize {
        match self.events.as_mut() {
            Some(events) => self.state.store().sync_remote(events),
            None => 0,
        }
    }

    /// Wait up to a second for `check` to hold. Returns whether it did.
    pub async fn settle<F>(&self, check: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        for _ in 0..200 {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        check(self)
    }
}

/// Selection of a simple product.
///
/// # Panics
///
/// Panics if `id` is not a valid product id.
#[must_use]
#[allow(clippy::expect_used)]
pub fn product(id: &str, name: &str) -> ItemSelection {
    ItemSelection::new(ProductId::parse(id).expect("valid product id"), name)
}

/// Records opened links instead of opening them.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<Url>>,
}

impl RecordingOpener {
    #[must_use]
    pub fn opened(&self) -> Vec<Url> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &Url) {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());
    }
}
