//! Checkout and order history.
//!
//! The order service is the only component that couples the cart to the
//! session: checkout submits the cart through an authenticated call and
//! clears it once the backend confirms the order.

use thiserror::Error;

use crate::cart_store::CartStore;
use crate::models::{CheckoutRequest, Order};
use crate::session::{SessionError, SessionManager};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout was attempted with an empty cart.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// The authenticated call failed (including forced sign-out).
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Places orders and reads order history.
///
/// Cheaply cloneable; shares the session and cart handles.
#[derive(Clone)]
pub struct OrderService {
    session: SessionManager,
    cart: CartStore,
}

impl OrderService {
    /// Create an order service over the given session and cart.
    #[must_use]
    pub const fn new(session: SessionManager, cart: CartStore) -> Self {
        Self { session, cart }
    }

    /// Submit the current cart as an order.
    ///
    /// The cart is cleared only after the backend confirms; on any failure
    /// the cart is left intact so the customer can retry.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] before any network call, or the
    /// underlying session error (authentication, rejection, transport).
    pub async fn checkout(&self) -> Result<Order, CheckoutError> {
        let snapshot = self.cart.snapshot();
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let body = CheckoutRequest {
            items: snapshot.items().to_vec(),
        };
        let order: Order = self.session.post_authenticated("orders", &body).await?;

        tracing::info!(order_id = %order.id, number = %order.number, "order placed");
        self.cart.clear();
        Ok(order)
    }

    /// The authenticated customer's order history.
    ///
    /// # Errors
    ///
    /// Returns the underlying session error.
    pub async fn history(&self) -> Result<Vec<Order>, SessionError> {
        self.session.get_authenticated("orders").await
    }
}
