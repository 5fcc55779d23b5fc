//! Catalog access with short-lived caching.
//!
//! The catalog is public data and changes rarely, so product and collection
//! listings are cached for a few minutes. Client-side filtering and sorting
//! operate on the cached listing; the backend only serves the full lists.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;

use crate::api::{ApiClient, ApiError};
use crate::models::{Collection, Product};

/// How long catalog listings stay cached.
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on cached entries.
const CATALOG_CACHE_CAPACITY: u64 = 64;

const PRODUCTS_KEY: &str = "products";
const COLLECTIONS_KEY: &str = "collections";

#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Collections(Arc<Vec<Collection>>),
}

/// Client-side product filter.
///
/// All criteria are conjunctive; an unset criterion matches everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Collection handle the product must belong to.
    pub collection: Option<String>,
    /// Size selector the product must offer.
    pub size: Option<String>,
    /// Color the product must have (case-insensitive).
    pub color: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// Whether `product` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(collection) = &self.collection
            && product.collection.as_deref() != Some(collection.as_str())
        {
            return false;
        }
        if let Some(size) = &self.size
            && !product.sizes.iter().any(|s| s == size)
        {
            return false;
        }
        if let Some(color) = &self.color
            && !product
                .color
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(color))
        {
            return false;
        }
        if let Some(min) = self.min_price
            && product.price.amount < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price.amount > max
        {
            return false;
        }
        true
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    /// Cheapest first.
    PriceAscending,
    /// Most expensive first.
    PriceDescending,
    /// Most recently published first.
    Newest,
}

impl ProductSort {
    fn apply(self, products: &mut [Product]) {
        match self {
            Self::PriceAscending => products.sort_by_key(|p| p.price.amount),
            Self::PriceDescending => {
                products.sort_by_key(|p| std::cmp::Reverse(p.price.amount));
            }
            Self::Newest => products.sort_by_key(|p| std::cmp::Reverse(p.created_at)),
        }
    }
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Cached read access to the product catalog.
///
/// Cheaply cloneable; all clones share one cache.
#[derive(Clone)]
pub struct CatalogClient {
    api: ApiClient,
    cache: Cache<&'static str, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client over the given API client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            cache: Cache::builder()
                .max_capacity(CATALOG_CACHE_CAPACITY)
                .time_to_live(CATALOG_CACHE_TTL)
                .build(),
        }
    }

    /// All products, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails on a cache miss.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&PRODUCTS_KEY).await {
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(self.api.get("products", None).await?);
        tracing::debug!(count = products.len(), "product listing fetched");
        self.cache
            .insert(PRODUCTS_KEY, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// All collections, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails on a cache miss.
    pub async fn collections(&self) -> Result<Arc<Vec<Collection>>, ApiError> {
        if let Some(CacheValue::Collections(collections)) = self.cache.get(&COLLECTIONS_KEY).await {
            return Ok(collections);
        }

        let collections: Arc<Vec<Collection>> = Arc::new(self.api.get("collections", None).await?);
        self.cache
            .insert(
                COLLECTIONS_KEY,
                CacheValue::Collections(Arc::clone(&collections)),
            )
            .await;
        Ok(collections)
    }

    /// Look up a single product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails on a cache miss.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ApiError> {
        let products = self.products().await?;
        Ok(products.iter().find(|p| p.slug == slug).cloned())
    }

    /// Filtered (and optionally sorted) product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails on a cache miss.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        sort: Option<ProductSort>,
    ) -> Result<Vec<Product>, ApiError> {
        let products = self.products().await?;
        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        if let Some(sort) = sort {
            sort.apply(&mut matched);
        }
        Ok(matched)
    }

    /// Drop all cached listings; the next read refetches.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
