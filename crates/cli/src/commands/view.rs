//! Read-only cart commands.

#![allow(clippy::print_stdout)]

use clap::ValueEnum;

use storecart_core::CartFormatError;
use storecart_storefront::error::Result;
use storecart_storefront::state::AppState;
use storecart_storefront::store::StoreError;

/// A rendered cart surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Surface {
    /// Navbar counter badge
    Counter,
    /// Modal item list
    Items,
    /// Checkout button
    Checkout,
}

/// List cart lines, one per row, in insertion order.
pub fn list(state: &AppState, json: bool) -> Result<()> {
    let cart = state.store().cart();

    if json {
        let json = serde_json::to_string_pretty(&cart)
            .map_err(|e| StoreError::Format(CartFormatError::from(e)))?;
        println!("{json}");
        return Ok(());
    }

    if cart.is_empty() {
        println!("Your cart is empty");
        return Ok(());
    }

    for line in cart.lines() {
        let variant = line.variant_attributes();
        if variant.is_empty() {
            println!("{:>4}  {}  {}", line.quantity(), line.key(), line.display_name());
        } else {
            println!(
                "{:>4}  {}  {} [{variant}]",
                line.quantity(),
                line.key(),
                line.display_name()
            );
        }
    }
    println!("Total items: {}", cart.total_quantity());
    Ok(())
}

/// Print the total quantity.
pub fn count(state: &AppState) {
    println!("{}", state.store().total_quantity());
}

/// Print the rendered fragments currently shown by the panel.
pub fn render(state: &AppState, surface: Option<Surface>) {
    let fragments = state.panel().fragments();

    match surface {
        Some(Surface::Counter) => println!("{}", fragments.counter_html),
        Some(Surface::Items) => println!("{}", fragments.items_html),
        Some(Surface::Checkout) => println!("{}", fragments.checkout_html),
        None => {
            println!("{}", fragments.counter_html);
            println!("{}", fragments.items_html);
            println!("{}", fragments.checkout_html);
        }
    }
}
