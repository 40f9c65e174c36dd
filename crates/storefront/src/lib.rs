//! storecart storefront library.
//!
//! The client-side cart of a catalog storefront: a [`store::CartStore`]
//! persisted in a per-origin [`storage::StorageArea`], a
//! [`presentation`] projection kept in step with it, and a
//! [`checkout`] that hands the cart off as a messaging deep link.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod events;
pub mod presentation;
pub mod state;
pub mod storage;
pub mod store;
