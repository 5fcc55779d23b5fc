//! Catalog browsing commands.
//!
//! # Usage
//!
//! ```bash
//! sartoria products --collection suits --min-price 500 --sort price-asc
//! sartoria collections
//! ```

use rust_decimal::Decimal;
use sartoria_storefront::{ApiError, AppState, ProductFilter, ProductSort};
use thiserror::Error;

/// Errors that can occur in catalog commands.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    /// Unrecognized `--sort` value.
    #[error("Unknown sort order: {0}. Valid orders: price-asc, price-desc, newest")]
    UnknownSort(String),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

fn parse_sort(value: &str) -> Result<ProductSort, CatalogCommandError> {
    match value {
        "price-asc" => Ok(ProductSort::PriceAscending),
        "price-desc" => Ok(ProductSort::PriceDescending),
        "newest" => Ok(ProductSort::Newest),
        other => Err(CatalogCommandError::UnknownSort(other.to_owned())),
    }
}

/// List products matching the given filters.
///
/// # Errors
///
/// Returns an error for an unknown sort order or a failed backend call.
#[allow(clippy::too_many_arguments)]
pub async fn products(
    state: &AppState,
    collection: Option<String>,
    size: Option<String>,
    color: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    sort: Option<&str>,
) -> Result<(), CatalogCommandError> {
    let sort = sort.map(parse_sort).transpose()?;
    let filter = ProductFilter {
        collection,
        size,
        color,
        min_price,
        max_price,
    };

    let products = state.catalog().search(&filter, sort).await?;

    if products.is_empty() {
        tracing::info!("No products match");
        return Ok(());
    }

    for product in &products {
        tracing::info!(
            "{} - {} {} (sizes: {})",
            product.slug,
            product.name,
            product.price,
            product.sizes.join(", ")
        );
    }
    tracing::info!("{} product(s)", products.len());
    Ok(())
}

/// List all collections.
///
/// # Errors
///
/// Returns an error if the backend call fails.
pub async fn collections(state: &AppState) -> Result<(), CatalogCommandError> {
    let collections = state.catalog().collections().await?;

    if collections.is_empty() {
        tracing::info!("No collections");
        return Ok(());
    }

    for collection in collections.iter() {
        match &collection.description {
            Some(description) => {
                tracing::info!("{} - {}: {}", collection.handle, collection.title, description);
            }
            None => tracing::info!("{} - {}", collection.handle, collection.title),
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("price-asc").unwrap(), ProductSort::PriceAscending);
        assert_eq!(parse_sort("price-desc").unwrap(), ProductSort::PriceDescending);
        assert_eq!(parse_sort("newest").unwrap(), ProductSort::Newest);
        assert!(matches!(
            parse_sort("cheapest"),
            Err(CatalogCommandError::UnknownSort(_))
        ));
    }
}
