//! Sartoria storefront client library.
//!
//! The non-presentational core of the storefront: an HTTP client for the
//! backend API, the session manager, the persistent cart store, the cached
//! catalog client, and order placement. UI layers (web, CLI) consume these
//! services through [`state::AppState`].
//!
//! # Architecture
//!
//! - All durable client state (token pair, cart snapshot) goes through the
//!   [`storage::Storage`] port, so tests can substitute an in-memory fake.
//! - Services are explicitly constructed instances bundled in `AppState`;
//!   there are no module-level singletons.
//! - The backend API is the source of truth for catalog and orders; the cart
//!   is owned entirely by the client and never round-trips per mutation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart_store;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod orders;
pub mod session;
pub mod state;
pub mod storage;

pub use api::{ApiClient, ApiError, AuthCode};
pub use cart_store::CartStore;
pub use catalog::{CatalogClient, ProductFilter, ProductSort};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{Result, StorefrontError};
pub use orders::{CheckoutError, OrderService};
pub use session::{SessionEndReason, SessionError, SessionManager, SessionState};
pub use state::AppState;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
