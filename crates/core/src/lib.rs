//! Sartoria Core - Shared types library.
//!
//! This crate provides common types used across all Sartoria components:
//! - `storefront` - Client services (session, cart store, catalog, orders)
//! - `cli` - Command-line storefront client
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage access. This keeps it lightweight and fully testable
//! without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and roles
//! - [`cart`] - The cart state machine (line items and derived totals)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartLineItem};
pub use types::*;
