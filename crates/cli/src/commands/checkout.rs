//! Checkout command.
//!
//! There is no browser to open the link in, so the link is printed.

#![allow(clippy::print_stdout)]

use storecart_storefront::checkout::LinkOpener;
use storecart_storefront::error::Result;
use storecart_storefront::state::AppState;
use url::Url;

/// Prints the deep link instead of opening it.
struct PrintOpener;

impl LinkOpener for PrintOpener {
    fn open(&self, url: &Url) {
        println!("{url}");
    }
}

/// Format the order and print its deep link. An empty cart prints the
/// warning toast instead.
pub fn run(state: &AppState, show_message: bool) -> Result<()> {
    if show_message && let Ok((message, _)) = state.checkout().prepare() {
        println!("{}\n", message.text);
    }

    let opened = state
        .panel()
        .press_checkout(state.checkout(), &PrintOpener)?;
    if opened.is_none() {
        for toast in state.panel().toasts().visible() {
            println!("{}", toast.message);
        }
    }
    Ok(())
}
