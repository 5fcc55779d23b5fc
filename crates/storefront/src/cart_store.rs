//! Cart persistence and shared access.
//!
//! [`CartStore`] wraps the pure [`Cart`] state machine with a shared handle
//! and write-through persistence: every successful mutation serializes the
//! line items into the `cart` storage slot. Only the items are persisted;
//! totals are recomputed on rehydration rather than trusted from disk.
//!
//! The cart is deliberately independent of the session: it survives logout
//! and is never cleared by authentication changes. The one session-adjacent
//! mutation, clearing after checkout, is driven by the order service.

use std::sync::{Arc, Mutex, PoisonError};

use sartoria_core::cart::{Cart, CartError, CartLineItem};
use sartoria_core::ProductId;

use crate::storage::{Storage, keys};

/// Shared, persistent shopping cart.
///
/// Cheaply cloneable; all clones share one cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    cart: Mutex<Cart>,
    storage: Arc<dyn Storage>,
}

impl CartStore {
    /// Create a store with an empty cart, ignoring any persisted snapshot.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                cart: Mutex::new(Cart::new()),
                storage,
            }),
        }
    }

    /// Create a store rehydrated from the persisted snapshot.
    ///
    /// A missing, unreadable, or corrupt snapshot degrades to an empty cart;
    /// losing a saved cart is annoying but never fatal.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let store = Self::new(storage);

        let raw = match store.inner.storage.get(keys::CART) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved cart, starting empty");
                None
            }
        };

        if let Some(raw) = raw {
            match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
                Ok(items) => {
                    let mut cart = store.lock_cart();
                    cart.load(items);
                    tracing::debug!(
                        lines = cart.line_count(),
                        total_items = cart.total_items(),
                        "cart rehydrated"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "saved cart is corrupt, starting empty");
                }
            }
        }

        store
    }

    /// Add a product snapshot, merging into an existing `(product, size)`
    /// line if present.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for malformed input (empty size, zero
    /// quantity); the cart is unchanged on error.
    pub fn add_item(&self, item: CartLineItem) -> Result<(), CartError> {
        {
            let mut cart = self.lock_cart();
            cart.add_item(item)?;
        }
        self.persist();
        Ok(())
    }

    /// Remove the line matching `(product_id, size)`. A no-op if absent.
    pub fn remove_item(&self, product_id: ProductId, size: &str) {
        {
            let mut cart = self.lock_cart();
            cart.remove_item(product_id, size);
        }
        self.persist();
    }

    /// Set the quantity of the line matching `(product_id, size)`. Zero
    /// removes the line; the value is absolute. A no-op if absent.
    pub fn update_quantity(&self, product_id: ProductId, size: &str, quantity: u32) {
        {
            let mut cart = self.lock_cart();
            cart.update_quantity(product_id, size, quantity);
        }
        self.persist();
    }

    /// Empty the cart.
    pub fn clear(&self) {
        {
            let mut cart = self.lock_cart();
            cart.clear();
        }
        self.persist();
    }

    /// Snapshot of the full cart state.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock_cart().clone()
    }

    /// Sum of all line quantities (the badge number).
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lock_cart().total_items()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> rust_decimal::Decimal {
        self.lock_cart().total_price()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_cart().is_empty()
    }

    fn lock_cart(&self) -> std::sync::MutexGuard<'_, Cart> {
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the current line items through to storage.
    ///
    /// A persistence failure keeps the in-memory cart authoritative and is
    /// only logged; the customer keeps shopping, the snapshot is just stale.
    fn persist(&self) {
        let serialized = {
            let cart = self.lock_cart();
            serde_json::to_string(cart.items())
        };

        match serialized {
            Ok(json) => {
                if let Err(e) = self.inner.storage.put(keys::CART, &json) {
                    tracing::warn!(error = %e, "failed to persist cart");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize cart");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use rust_decimal::dec;
    use sartoria_core::{CurrencyCode, Price};

    fn line(id: i64, size: &str, price: rust_decimal::Decimal, quantity: u32) -> CartLineItem {
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

    #[test]
    fn test_mutations_write_through_to_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);

        store.add_item(line(1, "M", dec!(100), 2)).unwrap();

        let raw = storage.get(keys::CART).unwrap().unwrap();
        let items: Vec<CartLineItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn test_load_rehydrates_persisted_cart() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let store = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
            store.add_item(line(1, "M", dec!(250.00), 2)).unwrap();
            store.add_item(line(2, "L", dec!(75.00), 1)).unwrap();
        }

        let restored = CartStore::load(Arc::clone(&storage) as Arc<dyn Storage>);

        assert_eq!(restored.total_items(), 3);
        assert_eq!(restored.total_price(), dec!(575.00));
        assert_eq!(restored.snapshot().line_count(), 2);
    }

    #[test]
    fn test_load_with_corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed(keys::CART, "{definitely not a cart");

        let store = CartStore::load(Arc::clone(&storage) as Arc<dyn Storage>);

        assert!(store.is_empty());
        assert_eq!(store.total_items(), 0);
    }

    #[test]
    fn test_load_without_snapshot_starts_empty() {
        let store = CartStore::load(Arc::new(MemoryStorage::new()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_add_leaves_storage_untouched() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);

        assert!(store.add_item(line(1, "", dec!(100), 1)).is_err());

        assert_eq!(storage.get(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        store.add_item(line(1, "M", dec!(100), 1)).unwrap();

        store.clear();

        assert_eq!(storage.get(keys::CART).unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()));
        let other = store.clone();

        store.add_item(line(1, "M", dec!(100), 1)).unwrap();

        assert_eq!(other.total_items(), 1);
    }
}
