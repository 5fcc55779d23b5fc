//! Checkout and order history commands.
//!
//! # Usage
//!
//! ```bash
//! sartoria checkout
//! sartoria orders
//! ```
//!
//! Both require a saved session (`sartoria login`).

use sartoria_storefront::{AppState, CheckoutError, SessionError};

/// Place an order from the current cart.
///
/// # Errors
///
/// Returns an error if the cart is empty or the authenticated call fails.
pub async fn checkout(state: &AppState) -> Result<(), CheckoutError> {
    let order = state.orders().checkout().await?;

    tracing::info!(
        "Order {} placed: {} line(s), ${}",
        order.number,
        order.items.len(),
        order.total_price
    );
    Ok(())
}

/// Show the authenticated customer's order history.
///
/// # Errors
///
/// Returns an error if the authenticated call fails.
pub async fn history(state: &AppState) -> Result<(), SessionError> {
    let orders = state.orders().history().await?;

    if orders.is_empty() {
        tracing::info!("No orders yet");
        return Ok(());
    }

    for order in &orders {
        tracing::info!(
            "{} - {:?} - {} line(s) - ${} - placed {}",
            order.number,
            order.status,
            order.items.len(),
            order.total_price,
            order.placed_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
