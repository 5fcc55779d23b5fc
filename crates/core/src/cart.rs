//! The cart state machine.
//!
//! A [`Cart`] holds an ordered list of line items plus derived totals. Every
//! mutation recomputes `total_items` and `total_price` before returning, so
//! no partial state is ever observable.
//!
//! # Invariants
//!
//! - At most one line item exists per `(product_id, size)` pair; adding an
//!   existing pair increments its quantity instead of duplicating.
//! - `quantity >= 1` on every line. Updating a line to zero removes it.
//! - `total_items` equals the sum of all quantities and `total_price` equals
//!   the sum of `unit_price * quantity` after every operation.
//! - Line items are denormalized snapshots of the product at the time of
//!   adding. They are never re-synced with later catalog changes; the cart
//!   intentionally shows the price and name the customer saw when adding.
//!
//! This module is pure state: persistence and rehydration live in the
//! storefront crate's cart store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Errors for cart contract violations.
///
/// Expected conditions (removing an absent line, updating a line that does
/// not exist) are no-ops, not errors. Only malformed calls fail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CartError {
    /// `add_item` was called with an empty size selector.
    #[error("size must not be empty")]
    EmptySize,
    /// `add_item` was called with a zero quantity.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// One `(product, size)` pairing with a quantity in the cart.
///
/// Product attributes are frozen at the time of adding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Catalog product this line refers to.
    pub product_id: ProductId,
    /// Size selector; together with `product_id` forms the line identity.
    pub size: String,
    /// Product name at time of adding.
    pub name: String,
    /// URL slug at time of adding.
    pub slug: String,
    /// Primary image URL at time of adding.
    pub image: String,
    /// Unit price at time of adding.
    pub unit_price: Price,
    /// Optional color selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional variant selection (e.g., fabric).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Quantity in cart, always >= 1.
    pub quantity: u32,
}

impl CartLineItem {
    /// The line total (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount * Decimal::from(self.quantity)
    }
}

/// The shopping cart: line items in insertion order plus derived totals.
///
/// Constructed empty at session start and rehydrated from storage by the
/// cart store. Mutated only through the operations below; each one leaves
/// the totals consistent before it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartLineItem>,
    total_items: u32,
    total_price: Decimal,
}

impl Cart {
    /// Create a new empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product snapshot to the cart.
    ///
    /// If a line with the same `(product_id, size)` already exists its
    /// quantity is increased by `item.quantity`; otherwise the snapshot is
    /// appended as a new line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptySize`] or [`CartError::ZeroQuantity`] for
    /// malformed input. Callers are expected to clamp quantity to >= 1.
    pub fn add_item(&mut self, item: CartLineItem) -> Result<(), CartError> {
        if item.size.is_empty() {
            return Err(CartError::EmptySize);
        }
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|l| l.product_id == item.product_id && l.size == item.size)
        {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }

        self.recompute();
        Ok(())
    }

    /// Remove the line matching `(product_id, size)`.
    ///
    /// A no-op if no such line exists.
    pub fn remove_item(&mut self, product_id: ProductId, size: &str) {
        self.items
            .retain(|l| !(l.product_id == product_id && l.size == size));
        self.recompute();
    }

    /// Set the quantity of the line matching `(product_id, size)`.
    ///
    /// A quantity of zero behaves exactly like [`Self::remove_item`]. The
    /// value is absolute, not a delta. A no-op if no such line exists.
    pub fn update_quantity(&mut self, product_id: ProductId, size: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id, size);
            return;
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|l| l.product_id == product_id && l.size == size)
        {
            line.quantity = quantity;
        }
        self.recompute();
    }

    /// Empty the cart. Totals reset to zero.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    /// Replace the entire item list wholesale.
    ///
    /// Used once during rehydration; totals are recomputed from the loaded
    /// items rather than trusted from the serialized form.
    pub fn load(&mut self, items: Vec<CartLineItem>) {
        self.items = items;
        self.recompute();
    }

    /// The line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Sum of all line quantities.
    #[must_use]
    pub const fn total_items(&self) -> u32 {
        self.total_items
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    fn recompute(&mut self) {
        self.total_items = self.items.iter().map(|l| l.quantity).sum();
        self.total_price = self.items.iter().map(CartLineItem::line_total).sum();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CurrencyCode;
    use rust_decimal::dec;

    fn line(id: i64, size: &str, price: Decimal, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new(id),
            size: size.to_string(),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            image: format!("/images/product-{id}.jpg"),
            unit_price: Price::new(price, CurrencyCode::USD),
            color: None,
            variant: None,
            quantity,
        }
    }

    /// Asserts the totals invariant against a from-scratch recomputation.
    fn assert_totals_consistent(cart: &Cart) {
        let items: u32 = cart.items().iter().map(|l| l.quantity).sum();
        let price: Decimal = cart.items().iter().map(CartLineItem::line_total).sum();
        assert_eq!(cart.total_items(), items);
        assert_eq!(cart.total_price(), price);
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(250.00), 2)).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), dec!(500.00));
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_add_same_pair_merges_quantities() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 2)).unwrap();
        cart.add_item(line(1, "M", dec!(100), 1)).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), dec!(300));
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_same_product_different_size_is_two_lines() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 1)).unwrap();
        cart.add_item(line(1, "L", dec!(100), 1)).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_items(), 2);
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_add_empty_size_rejected() {
        let mut cart = Cart::new();
        let err = cart.add_item(line(1, "", dec!(100), 1)).unwrap_err();
        assert!(matches!(err, CartError::EmptySize));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let mut cart = Cart::new();
        let err = cart.add_item(line(1, "M", dec!(100), 0)).unwrap_err();
        assert!(matches!(err, CartError::ZeroQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 1)).unwrap();
        cart.add_item(line(2, "S", dec!(50), 2)).unwrap();

        cart.remove_item(ProductId::new(1), "M");

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), dec!(100));
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_remove_absent_line_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 1)).unwrap();
        let before = cart.clone();

        cart.remove_item(ProductId::new(99), "M");
        cart.remove_item(ProductId::new(1), "XL");

        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_absolute() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 2)).unwrap();

        cart.update_quantity(ProductId::new(1), "M", 5);

        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), dec!(500));
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 2)).unwrap();

        cart.update_quantity(ProductId::new(1), "M", 0);

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_update_absent_line_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 2)).unwrap();
        let before = cart.clone();

        cart.update_quantity(ProductId::new(2), "M", 3);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 2)).unwrap();
        cart.add_item(line(2, "L", dec!(75), 1)).unwrap();

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_load_reproduces_totals() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(100), 2)).unwrap();
        cart.add_item(line(2, "L", dec!(75), 1)).unwrap();
        cart.update_quantity(ProductId::new(1), "M", 4);

        let mut restored = Cart::new();
        restored.load(cart.items().to_vec());

        assert_eq!(restored.total_items(), cart.total_items());
        assert_eq!(restored.total_price(), cart.total_price());
        assert_eq!(restored.items(), cart.items());
    }

    #[test]
    fn test_totals_invariant_over_operation_sequence() {
        let mut cart = Cart::new();

        cart.add_item(line(1, "M", dec!(19.99), 3)).unwrap();
        assert_totals_consistent(&cart);
        cart.add_item(line(2, "S", dec!(5.25), 1)).unwrap();
        assert_totals_consistent(&cart);
        cart.update_quantity(ProductId::new(1), "M", 1);
        assert_totals_consistent(&cart);
        cart.add_item(line(1, "M", dec!(19.99), 2)).unwrap();
        assert_totals_consistent(&cart);
        cart.remove_item(ProductId::new(2), "S");
        assert_totals_consistent(&cart);
        cart.update_quantity(ProductId::new(1), "M", 0);
        assert_totals_consistent(&cart);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::new();
        cart.add_item(line(3, "M", dec!(10), 1)).unwrap();
        cart.add_item(line(1, "M", dec!(10), 1)).unwrap();
        cart.add_item(line(2, "M", dec!(10), 1)).unwrap();
        // Merging into an existing line must not reorder it
        cart.add_item(line(1, "M", dec!(10), 1)).unwrap();

        let ids: Vec<i64> = cart.items().iter().map(|l| l.product_id.as_i64()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = Cart::new();
        cart.add_item(line(1, "M", dec!(250.00), 2)).unwrap();

        let json = serde_json::to_string(cart.items()).unwrap();
        let items: Vec<CartLineItem> = serde_json::from_str(&json).unwrap();

        let mut restored = Cart::new();
        restored.load(items);
        assert_eq!(restored, cart);
    }
}
