//! Order and checkout types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sartoria_core::cart::CartLineItem;
use sartoria_core::OrderId;

/// Order status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    InProduction,
    Shipped,
    Delivered,
    Cancelled,
}

/// An order as returned by the backend.
///
/// Line items are the cart snapshots submitted at checkout; the backend
/// echoes them back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Human-facing order number (e.g., "SR-1042").
    pub number: String,
    /// Current status.
    pub status: OrderStatus,
    /// Total charged for the order.
    pub total_price: Decimal,
    /// Line items at time of placement.
    pub items: Vec<CartLineItem>,
    /// When the order was placed.
    pub placed_at: DateTime<Utc>,
}

/// Request body for `POST /orders`: the full cart at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Cart line items to order.
    pub items: Vec<CartLineItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProduction).unwrap(),
            "\"IN_PRODUCTION\""
        );
        let status: OrderStatus = serde_json::from_str("\"SHIPPED\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
    }
}
