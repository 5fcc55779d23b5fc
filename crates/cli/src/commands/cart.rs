//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! sartoria cart add -s two-piece-suit --size 40R -q 1
//! sartoria cart show
//! sartoria cart update -p 12 --size 40R -q 2
//! sartoria cart remove -p 12 --size 40R
//! sartoria cart clear
//! ```

use sartoria_core::cart::CartError;
use sartoria_core::ProductId;
use sartoria_storefront::{ApiError, AppState};
use thiserror::Error;

/// Errors that can occur in cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// No catalog product with the given slug.
    #[error("No product found with slug: {0}")]
    ProductNotFound(String),

    /// The product exists but does not offer the requested size.
    #[error("Size {0} is not offered. Available sizes: {1}")]
    SizeUnavailable(String, String),

    /// Malformed cart input.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Catalog lookup failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Add a product to the cart by slug.
///
/// Looks up the product in the catalog and snapshots it into the cart.
///
/// # Errors
///
/// Returns an error if the slug is unknown, the size is not offered, the
/// quantity is zero, or the catalog lookup fails.
pub async fn add(
    state: &AppState,
    slug: &str,
    size: &str,
    quantity: u32,
) -> Result<(), CartCommandError> {
    let product = state
        .catalog()
        .product_by_slug(slug)
        .await?
        .ok_or_else(|| CartCommandError::ProductNotFound(slug.to_owned()))?;

    if !product.sizes.iter().any(|s| s == size) {
        return Err(CartCommandError::SizeUnavailable(
            size.to_owned(),
            product.sizes.join(", "),
        ));
    }

    state.cart().add_item(product.line_item(size, quantity))?;

    tracing::info!(
        "Added {} ({}) x{} - cart now {} item(s)",
        product.name,
        size,
        quantity,
        state.cart().total_items()
    );
    Ok(())
}

/// Show the cart contents and totals.
pub fn show(state: &AppState) {
    let cart = state.cart().snapshot();

    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }

    for line in cart.items() {
        tracing::info!(
            "[{}] {} ({}) x{} @ {} = ${}",
            line.product_id,
            line.name,
            line.size,
            line.quantity,
            line.unit_price,
            line.line_total()
        );
    }
    tracing::info!(
        "Total: {} item(s), ${}",
        cart.total_items(),
        cart.total_price()
    );
}

/// Set the quantity of a cart line. Zero removes the line.
pub fn update(state: &AppState, product_id: i64, size: &str, quantity: u32) {
    state
        .cart()
        .update_quantity(ProductId::new(product_id), size, quantity);
    tracing::info!("Cart now {} item(s)", state.cart().total_items());
}

/// Remove a cart line.
pub fn remove(state: &AppState, product_id: i64, size: &str) {
    state.cart().remove_item(ProductId::new(product_id), size);
    tracing::info!("Cart now {} item(s)", state.cart().total_items());
}

/// Empty the cart.
pub fn clear(state: &AppState) {
    state.cart().clear();
    tracing::info!("Cart cleared");
}
