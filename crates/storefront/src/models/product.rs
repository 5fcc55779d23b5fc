//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sartoria_core::cart::CartLineItem;
use sartoria_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Primary image URL.
    pub image: String,
    /// Current price.
    pub price: Price,
    /// Available size selectors (e.g., "S", "M", "38R").
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Optional color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional variant (e.g., fabric).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Collection handle this product belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// When the product was published.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Build a cart line snapshot of this product.
    ///
    /// The snapshot freezes name, slug, image, and price at the time of
    /// adding; later catalog changes do not affect lines already in a cart.
    #[must_use]
    pub fn line_item(&self, size: impl Into<String>, quantity: u32) -> CartLineItem {
        CartLineItem {
            product_id: self.id,
            size: size.into(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            image: self.image.clone(),
            unit_price: self.price,
            color: self.color.clone(),
            variant: self.variant.clone(),
            quantity,
        }
    }
}

/// A curated product collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// URL handle (e.g., "suits").
    pub handle: String,
    /// Display title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;
    use sartoria_core::CurrencyCode;

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Two-Piece Suit".to_string(),
            slug: "two-piece-suit".to_string(),
            image: "/images/two-piece-suit.jpg".to_string(),
            price: Price::new(dec!(899.00), CurrencyCode::USD),
            sizes: vec!["38R".to_string(), "40R".to_string()],
            color: Some("Navy".to_string()),
            variant: Some("Wool".to_string()),
            collection: Some("suits".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_item_freezes_snapshot() {
        let mut p = product();
        let line = p.line_item("40R", 2);

        // Mutating the catalog product afterwards must not affect the line
        p.name = "Renamed".to_string();
        p.price = Price::new(dec!(999.00), CurrencyCode::USD);

        assert_eq!(line.name, "Two-Piece Suit");
        assert_eq!(line.unit_price.amount, dec!(899.00));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.size, "40R");
    }

    #[test]
    fn test_product_optional_fields_default() {
        let json = r#"{
            "id": 2,
            "name": "Oxford Shirt",
            "slug": "oxford-shirt",
            "image": "/images/oxford.jpg",
            "price": {"amount": "120.00", "currencyCode": "USD"},
            "createdAt": "2025-03-01T00:00:00Z"
        }"#;

        let p: Product = serde_json::from_str(json).unwrap();
        assert!(p.sizes.is_empty());
        assert!(p.color.is_none());
        assert!(p.collection.is_none());
    }
}
