//! Crate-level error type.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::orders::CheckoutError;
use crate::session::SessionError;
use crate::storage::StorageError;
use sartoria_core::cart::CartError;

/// Any error this crate can produce, for callers that do not need to
/// branch on the specific subsystem.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenience alias for fallible storefront operations.
pub type Result<T> = std::result::Result<T, StorefrontError>;
