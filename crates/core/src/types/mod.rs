//! Core types for storecart.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod key;
pub mod line;
pub mod variant;

pub use cart::{Cart, CartFormatError, DecodedCart, Decrement};
pub use id::{ProductId, ProductIdError};
pub use key::{KeyError, LineKey};
pub use line::CartLine;
pub use variant::{AttributeError, VariantAttributes};
