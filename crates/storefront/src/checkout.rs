//! Checkout via a messaging deep link.
//!
//! Checkout does not talk to any backend. The cart is formatted into a
//! plain-text order message which is percent-encoded into a `wa.me` link and
//! handed to a [`LinkOpener`]. An empty cart produces
//! [`CheckoutError::EmptyCart`] and no link.

use std::sync::Arc;

use askama::Template;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use storecart_core::CartLine;

use crate::store::CartStore;

/// Opening line of the order message.
pub const DEFAULT_GREETING: &str = "Halo, saya ingin memesan / menanyakan type yg cocok:";

/// Closing line of the order message.
pub const DEFAULT_CLOSING: &str = "Mohon bantuannya";

/// Base of the messaging deep link.
pub const DEFAULT_BASE_URL: &str = "https://wa.me";

/// Number the order message is sent to.
pub const DEFAULT_PHONE_NUMBER: &str = "6285775230813";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines; nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The order message template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The configured base URL and number do not form a valid URL.
    #[error("Invalid checkout URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Checkout destination and message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub base_url: String,
    /// Digits only, international format without `+`.
    pub phone_number: String,
    pub greeting: String,
    pub closing: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            phone_number: DEFAULT_PHONE_NUMBER.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            closing: DEFAULT_CLOSING.to_string(),
        }
    }
}

struct OrderLineView<'a> {
    name: &'a str,
    variant: String,
    quantity: u32,
}

#[derive(Template)]
#[template(path = "checkout/order_message.txt")]
struct OrderMessageTemplate<'a> {
    greeting: &'a str,
    closing: &'a str,
    lines: Vec<OrderLineView<'a>>,
    total_quantity: u64,
}

/// A formatted order, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    pub text: String,
    pub line_count: usize,
    pub total_quantity: u64,
}

/// Format `lines` into the order message.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] when `lines` is empty, or a
/// template error.
pub fn format_order(
    lines: &[CartLine],
    config: &CheckoutConfig,
) -> Result<OrderMessage, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let total_quantity = lines.iter().map(|line| u64::from(line.quantity())).sum();
    let text = OrderMessageTemplate {
        greeting: &config.greeting,
        closing: &config.closing,
        lines: lines
            .iter()
            .map(|line| OrderLineView {
                name: line.display_name(),
                variant: line.variant_attributes().to_string(),
                quantity: line.quantity(),
            })
            .collect(),
        total_quantity,
    }
    .render()?;

    Ok(OrderMessage {
        text: text.trim_end().to_owned(),
        line_count: lines.len(),
        total_quantity,
    })
}

/// Build `<base>/<number>?text=<message>`.
///
/// Every byte of the message outside `A-Z a-z 0-9 - . _ ~` is
/// percent-encoded. That also escapes `! ' ( ) *`, which
/// `encodeURIComponent` leaves alone; both decode to the same text.
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidUrl`] if the configured base URL and
/// number do not parse.
pub fn deep_link(message: &OrderMessage, config: &CheckoutConfig) -> Result<Url, CheckoutError> {
    let mut url = Url::parse(&format!(
        "{}/{}",
        config.base_url.trim_end_matches('/'),
        config.phone_number
    ))?;
    url.set_query(Some(&format!("text={}", urlencoding::encode(&message.text))));
    Ok(url)
}

/// Sink that opens a deep link in a new browsing context.
///
/// No response is consumed.
pub trait LinkOpener {
    fn open(&self, url: &Url);
}

/// Checkout bound to a store.
#[derive(Clone)]
pub struct Checkout {
    store: Arc<CartStore>,
    config: CheckoutConfig,
}

impl Checkout {
    #[must_use]
    pub const fn new(store: Arc<CartStore>, config: CheckoutConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Format the current cart and build its deep link without opening it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart, or a
    /// formatting error.
    pub fn prepare(&self) -> Result<(OrderMessage, Url), CheckoutError> {
        let message = format_order(&self.store.lines(), &self.config)?;
        let url = deep_link(&message, &self.config)?;
        Ok((message, url))
    }

    /// Format the current cart and open the deep link.
    ///
    /// Nothing is opened for an empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart, or a
    /// formatting error.
    #[instrument(skip_all)]
    pub fn submit(&self, opener: &dyn LinkOpener) -> Result<Url, CheckoutError> {
        let (message, url) = self.prepare()?;
        tracing::info!(
            lines = message.line_count,
            total_quantity = message.total_quantity,
            "Opening checkout link"
        );
        opener.open(&url);
        Ok(url)
    }
}
