//! Shared application state.
//!
//! [`AppState`] wires the whole storefront together: one storage backend,
//! one API client, and the managers layered on top. It is constructed
//! explicitly at bootstrap and passed down; nothing in this crate reaches
//! for process-global state.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart_store::CartStore;
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::orders::OrderService;
use crate::session::SessionManager;
use crate::storage::{FileStorage, Storage};

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    session: SessionManager,
    cart: CartStore,
    catalog: CatalogClient,
    orders: OrderService,
}

/// Shared application state.
///
/// Cheaply cloneable; all clones share the same managers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    /// Initialize the full application state with file-backed storage.
    ///
    /// Opens (or creates) the storage file under the configured data
    /// directory and rehydrates the saved cart. The session starts
    /// `Uninitialized`; call `session().initialize()` afterwards to verify
    /// any saved token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the HTTP
    /// client cannot be built.
    pub fn init(config: StorefrontConfig) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(config.storage_path())?);
        Self::with_storage(config, storage)
    }

    /// Initialize with an explicit storage backend (used by tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: StorefrontConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let session = SessionManager::new(api.clone(), Arc::clone(&storage));
        let cart = CartStore::load(Arc::clone(&storage));
        let catalog = CatalogClient::new(api);
        let orders = OrderService::new(session.clone(), cart.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                session,
                cart,
                catalog,
                orders,
            }),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The storage backend shared by all managers.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// The session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// The shared cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// The order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_with_storage_wires_shared_state() {
        let config = StorefrontConfig::new("http://127.0.0.1:9/api", ".").unwrap();
        let state = AppState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap();

        assert!(state.cart().is_empty());
        assert!(!state.session().is_authenticated());

        // Clones observe the same cart
        let clone = state.clone();
        assert!(clone.cart().is_empty());
    }
}
