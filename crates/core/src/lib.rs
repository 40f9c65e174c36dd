//! storecart Core - Shared cart types.
//!
//! This crate provides the types used across all storecart components:
//! - `storefront` - Cart store, storage areas, presentation and checkout
//! - `cli` - Command-line driver for a single browsing context
//!
//! # Architecture
//!
//! The core crate contains only types and the pure cart state machine - no
//! storage access, no rendering, no clocks. Callers pass the current time in.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, variant attributes, line keys, cart lines and the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
