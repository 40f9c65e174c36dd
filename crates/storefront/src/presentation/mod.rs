//! Presentation projection of the cart.
//!
//! Everything here is derived from the store and never written back except
//! through store operations. [`render_fragments`] turns one snapshot of lines
//! into the counter badge, the modal list and the checkout button; the
//! [`CartPanel`] keeps those fragments current by re-rendering on every
//! cart change.

pub mod busy;
pub mod panel;
pub mod toast;

use std::time::Duration;

use askama::Template;

use storecart_core::CartLine;

pub use busy::{BusyControls, BusyToken};
pub use panel::{CartPanel, Press};
pub use toast::{Toast, ToastKind, ToastQueue};

/// Timings of the interactive surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationConfig {
    /// How long a quantity control stays disabled after a press.
    pub busy_hold: Duration,
    /// How long a toast stays on screen.
    pub toast_duration: Duration,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            busy_hold: busy::DEFAULT_HOLD,
            toast_duration: toast::DEFAULT_TOAST_DURATION,
        }
    }
}

/// Cart item display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    /// Encoded line key, used to address the line's controls.
    pub key: String,
    pub title: String,
    /// `capacity: 40, head: 10`, or empty for simple products.
    pub variant_title: String,
    pub quantity: u32,
    /// Image reference, or empty.
    pub image: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            key: line.key().encode(),
            title: line.display_name().to_owned(),
            variant_title: line.variant_attributes().to_string(),
            quantity: line.quantity(),
            image: line.image().unwrap_or_default().to_owned(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the view from one snapshot of lines.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            items: lines.iter().map(CartItemView::from).collect(),
            item_count: lines.iter().map(|line| u64::from(line.quantity())).sum(),
        }
    }
}

/// Navbar counter badge fragment. Every counter instance on a page renders
/// from the same fragment.
#[derive(Template)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
    pub hidden: bool,
}

/// Modal list fragment.
#[derive(Template)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Checkout button fragment.
#[derive(Template)]
#[template(path = "partials/checkout_button.html")]
pub struct CheckoutButtonTemplate {
    pub enabled: bool,
}

/// Rendered state of every cart surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartFragments {
    pub counter_html: String,
    pub items_html: String,
    pub checkout_html: String,
    pub item_count: u64,
    pub checkout_enabled: bool,
}

/// Render all surfaces from one snapshot, so they always agree.
///
/// # Errors
///
/// Returns an error if a template fails to render.
pub fn render_fragments(lines: &[CartLine]) -> askama::Result<CartFragments> {
    let cart = CartView::from_lines(lines);
    let count = cart.item_count;
    let checkout_enabled = count > 0;

    Ok(CartFragments {
        counter_html: CartCountTemplate {
            count,
            hidden: count == 0,
        }
        .render()?,
        items_html: CartItemsTemplate { cart }.render()?,
        checkout_html: CheckoutButtonTemplate {
            enabled: checkout_enabled,
        }
        .render()?,
        item_count: count,
        checkout_enabled,
    })
}
