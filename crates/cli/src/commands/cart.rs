//! Cart mutation commands.
//!
//! # Usage
//!
//! ```bash
//! storecart init
//! storecart add pump-2 "Pump B" --attr capacity=40 --image img/pump-b.jpg
//! storecart inc 'pump-2?capacity=40'
//! storecart dec pump-1
//! storecart remove pump-1
//! storecart clear
//! ```

#![allow(clippy::print_stdout)]

use storecart_core::{Decrement, LineKey, ProductId, VariantAttributes};
use storecart_storefront::error::{AppError, Result};
use storecart_storefront::presentation::Press;
use storecart_storefront::state::AppState;
use storecart_storefront::store::ItemSelection;
use thiserror::Error;

/// A malformed `--attr` argument.
#[derive(Debug, Error)]
#[error("expected name=value, got '{0}'")]
pub struct AttributeArgError(String);

/// Parse a `name=value` variant attribute argument.
///
/// # Errors
///
/// Returns [`AttributeArgError`] if there is no `=` or the name is empty.
pub fn parse_attribute(arg: &str) -> std::result::Result<(String, String), AttributeArgError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(AttributeArgError(arg.to_string())),
    }
}

/// Create an empty cart if none is stored.
pub fn init(state: &AppState) {
    // AppState::open already initialized the slot
    println!(
        "Cart ready in {} (slot '{}')",
        state.config().storage.path.display(),
        state.store().slot()
    );
}

/// Add one unit of a product.
pub fn add(
    state: &AppState,
    product_id: ProductId,
    name: String,
    attributes: Vec<(String, String)>,
    image: Option<String>,
) -> Result<()> {
    let attributes = VariantAttributes::from_pairs(attributes)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let mut selection = ItemSelection::new(product_id, name).with_attributes(attributes);
    if let Some(image) = image {
        selection = selection.with_image(image);
    }

    let line = state.store().add_item(selection)?;
    for toast in state.panel().toasts().visible() {
        println!("{}", toast.message);
    }
    println!("{}  quantity {}", line.key(), line.quantity());
    Ok(())
}

/// Add one unit to an existing line.
pub async fn increment(state: &AppState, key: &LineKey) -> Result<()> {
    match state.panel().press_increase(key).await? {
        Press::Applied(true) => print_quantity(state, key),
        Press::Applied(false) => println!("{key} is not in the cart"),
        Press::Busy => println!("{key} is busy, try again"),
    }
    Ok(())
}

/// Take one unit off a line.
pub async fn decrement(state: &AppState, key: &LineKey) -> Result<()> {
    match state.panel().press_decrease(key).await? {
        Press::Applied(Some(Decrement::Decremented { quantity })) => {
            println!("{key}  quantity {quantity}");
        }
        Press::Applied(Some(Decrement::Removed)) => println!("{key} removed"),
        Press::Applied(None) => println!("{key} is not in the cart"),
        Press::Busy => println!("{key} is busy, try again"),
    }
    Ok(())
}

/// Remove a line regardless of quantity.
pub fn remove(state: &AppState, key: &LineKey) -> Result<()> {
    match state.panel().press_remove(key)? {
        Some(line) => println!("{key} removed ({} units)", line.quantity()),
        None => println!("{key} is not in the cart"),
    }
    Ok(())
}

/// Empty the cart.
pub fn clear(state: &AppState) -> Result<()> {
    state.store().clear()?;
    println!("Cart cleared");
    Ok(())
}

fn print_quantity(state: &AppState, key: &LineKey) {
    let cart = state.store().cart();
    if let Some(line) = cart.get(key) {
        println!("{key}  quantity {}", line.quantity());
    }
}
