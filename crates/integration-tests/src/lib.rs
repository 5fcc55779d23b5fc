//! Integration test harness for Sartoria.
//!
//! Spins up an in-process mock of the backend REST API on an ephemeral port
//! so the full client stack (API client, session manager, cart store, order
//! service) can be exercised over real HTTP without external services.
//!
//! The mock implements the same wire contract as the production backend:
//! JSON bodies, camelCase fields, bearer authentication, and the 401 error
//! envelope with the `TOKEN_EXPIRED` / `INVALID_TOKEN` discriminators. Test
//! scenarios are scripted through [`TestBackend`] helpers (expiring an
//! access token, revoking a refresh token, forcing newly issued tokens to
//! be born expired).

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use sartoria_core::OrderId;
use sartoria_core::cart::CartLineItem;
use sartoria_storefront::models::{Order, OrderStatus};
use sartoria_storefront::{AppState, MemoryStorage, Storage, StorefrontConfig};

/// The test account seeded into every backend.
pub const SEED_EMAIL: &str = "ada@example.com";
/// Password of the seeded test account.
pub const SEED_PASSWORD: &str = "secret1";

struct UserRecord {
    id: i64,
    first_name: String,
    last_name: String,
    password: String,
}

#[derive(Default)]
struct BackendState {
    /// Registered accounts, by email.
    users: Mutex<HashMap<String, UserRecord>>,
    /// Live access tokens, mapped to the owning email.
    sessions: Mutex<HashMap<String, String>>,
    /// Access tokens that exist but have expired.
    expired: Mutex<HashMap<String, String>>,
    /// Live refresh tokens, mapped to the owning email.
    refresh_tokens: Mutex<HashMap<String, String>>,
    /// Placed orders, tagged with the owning email.
    orders: Mutex<Vec<(String, Order)>>,
    token_counter: AtomicU64,
    user_counter: AtomicI64,
    order_counter: AtomicI64,
    refresh_calls: AtomicU64,
    /// When set, newly issued access tokens are born expired. Used to
    /// script the "refresh succeeded but the new token still fails" path.
    issue_expired: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BackendState {
    fn seeded() -> Self {
        let state = Self::default();
        state.add_user("Ada", "Lovelace", SEED_EMAIL, SEED_PASSWORD);
        state
    }

    fn add_user(&self, first_name: &str, last_name: &str, email: &str, password: &str) -> i64 {
        let id = self.user_counter.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.users).insert(
            email.to_string(),
            UserRecord {
                id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                password: password.to_string(),
            },
        );
        id
    }

    fn user_json(&self, email: &str) -> Value {
        let users = lock(&self.users);
        let user = users.get(email).expect("user exists");
        json!({
            "id": user.id,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "email": email,
            "role": "customer",
            "createdAt": "2025-01-01T00:00:00Z",
        })
    }

    /// Mint an access/refresh pair for `email`.
    fn issue_pair(&self, email: &str) -> (String, String) {
        let n = self.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");

        if self.issue_expired.load(Ordering::SeqCst) {
            lock(&self.expired).insert(access.clone(), email.to_string());
        } else {
            lock(&self.sessions).insert(access.clone(), email.to_string());
        }
        lock(&self.refresh_tokens).insert(refresh.clone(), email.to_string());
        (access, refresh)
    }

    fn auth_response(&self, email: &str) -> Value {
        let (access, refresh) = self.issue_pair(email);
        json!({
            "user": self.user_json(email),
            "token": access,
            "refreshToken": refresh,
        })
    }
}

fn error_body(status: StatusCode, message: &str, code: Option<&str>) -> (StatusCode, Json<Value>) {
    let mut body = json!({ "message": message });
    if let Some(code) = code {
        body["error"] = json!(code);
    }
    (status, Json(body))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

/// Resolve the bearer token to an email, or the matching 401 envelope.
fn authenticate(
    state: &BackendState,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, Json<Value>)> {
    let Some(token) = bearer_token(headers) else {
        return Err(error_body(
            StatusCode::UNAUTHORIZED,
            "Missing token",
            Some("INVALID_TOKEN"),
        ));
    };
    if let Some(email) = lock(&state.sessions).get(&token) {
        return Ok(email.clone());
    }
    if lock(&state.expired).contains_key(&token) {
        return Err(error_body(
            StatusCode::UNAUTHORIZED,
            "Token expired",
            Some("TOKEN_EXPIRED"),
        ));
    }
    Err(error_body(
        StatusCode::UNAUTHORIZED,
        "Invalid token",
        Some("INVALID_TOKEN"),
    ))
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    let authenticated = lock(&state.users)
        .get(&email)
        .is_some_and(|user| user.password == password);
    if !authenticated {
        return error_body(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
            Some("AUTHENTICATION_FAILED"),
        );
    }

    (StatusCode::OK, Json(state.auth_response(&email)))
}

async fn register(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if lock(&state.users).contains_key(&email) {
        return error_body(StatusCode::BAD_REQUEST, "Email already registered", None);
    }

    state.add_user(
        body["firstName"].as_str().unwrap_or_default(),
        body["lastName"].as_str().unwrap_or_default(),
        &email,
        body["password"].as_str().unwrap_or_default(),
    );
    (StatusCode::CREATED, Json(state.auth_response(&email)))
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let token = body["refreshToken"].as_str().unwrap_or_default().to_string();
    let Some(email) = lock(&state.refresh_tokens).remove(&token) else {
        return error_body(
            StatusCode::UNAUTHORIZED,
            "Invalid refresh token",
            Some("INVALID_TOKEN"),
        );
    };

    (StatusCode::OK, Json(state.auth_response(&email)))
}

async fn verify(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let email = authenticate(&state, &headers)?;
    Ok(Json(state.user_json(&email)))
}

async fn products() -> Json<Value> {
    Json(json!([
        {
            "id": 1,
            "name": "Two-Piece Suit",
            "slug": "two-piece-suit",
            "image": "/images/two-piece-suit.jpg",
            "price": {"amount": "899.00", "currencyCode": "USD"},
            "sizes": ["38R", "40R", "42R"],
            "color": "Navy",
            "variant": "Wool",
            "collection": "suits",
            "createdAt": "2025-02-01T00:00:00Z",
        },
        {
            "id": 2,
            "name": "Oxford Shirt",
            "slug": "oxford-shirt",
            "image": "/images/oxford-shirt.jpg",
            "price": {"amount": "120.00", "currencyCode": "USD"},
            "sizes": ["S", "M", "L"],
            "color": "White",
            "collection": "shirts",
            "createdAt": "2025-03-01T00:00:00Z",
        },
        {
            "id": 3,
            "name": "Double-Breasted Suit",
            "slug": "double-breasted-suit",
            "image": "/images/double-breasted-suit.jpg",
            "price": {"amount": "1250.00", "currencyCode": "USD"},
            "sizes": ["40R", "42R"],
            "color": "Charcoal",
            "variant": "Flannel",
            "collection": "suits",
            "createdAt": "2025-01-15T00:00:00Z",
        },
    ]))
}

async fn collections() -> Json<Value> {
    Json(json!([
        {"handle": "suits", "title": "Suits", "description": "Tailored two and three piece suits"},
        {"handle": "shirts", "title": "Shirts"},
    ]))
}

async fn place_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let email = authenticate(&state, &headers)?;

    let items: Vec<CartLineItem> = serde_json::from_value(body["items"].clone())
        .map_err(|_| error_body(StatusCode::BAD_REQUEST, "Malformed items", None))?;
    if items.is_empty() {
        return Err(error_body(StatusCode::BAD_REQUEST, "Empty order", None));
    }

    let total: Decimal = items.iter().map(CartLineItem::line_total).sum();
    let n = state.order_counter.fetch_add(1, Ordering::SeqCst) + 1;
    let order = Order {
        id: OrderId::new(n),
        number: format!("SR-{}", 1000 + n),
        status: OrderStatus::Pending,
        total_price: total,
        items,
        placed_at: Utc::now(),
    };

    let response = serde_json::to_value(&order).expect("order serializes");
    lock(&state.orders).push((email, order));
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_orders(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let email = authenticate(&state, &headers)?;

    let guard = lock(&state.orders);
    let mine: Vec<&Order> = guard
        .iter()
        .filter(|(owner, _)| *owner == email)
        .map(|(_, order)| order)
        .collect();
    Ok(Json(serde_json::to_value(&mine).expect("orders serialize")))
}

// =============================================================================
// TestBackend
// =============================================================================

/// A running in-process backend.
pub struct TestBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl TestBackend {
    /// Start a backend on an ephemeral local port with the seed account
    /// registered.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::seeded());
        let router = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/refresh", post(refresh))
            .route("/auth/verify", get(verify))
            .route("/products", get(products))
            .route("/collections", get(collections))
            .route("/orders", post(place_order).get(list_orders))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        Self { addr, state }
    }

    /// Base URL for client configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Mint a valid token pair for the seed account, bypassing login.
    #[must_use]
    pub fn issue_session(&self) -> (String, String) {
        self.state.issue_pair(SEED_EMAIL)
    }

    /// Expire a previously issued access token.
    pub fn expire_access(&self, token: &str) {
        if let Some(email) = lock(&self.state.sessions).remove(token) {
            lock(&self.state.expired).insert(token.to_string(), email);
        }
    }

    /// Revoke a previously issued refresh token.
    pub fn revoke_refresh(&self, token: &str) {
        lock(&self.state.refresh_tokens).remove(token);
    }

    /// When enabled, newly issued access tokens are born expired.
    pub fn set_issue_expired(&self, enabled: bool) {
        self.state.issue_expired.store(enabled, Ordering::SeqCst);
    }

    /// Number of `/auth/refresh` calls the backend has seen.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }
}

/// Build an [`AppState`] pointed at `backend`, over fresh in-memory storage.
///
/// Returns the storage handle too so tests can seed or inspect slots.
#[must_use]
pub fn client_state(backend: &TestBackend) -> (AppState, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let state = client_state_with(backend, Arc::clone(&storage));
    (state, storage)
}

/// Build an [`AppState`] pointed at `backend` over the given storage.
#[must_use]
pub fn client_state_with(backend: &TestBackend, storage: Arc<MemoryStorage>) -> AppState {
    let config = StorefrontConfig::new(&backend.base_url(), ".").expect("config");
    AppState::with_storage(config, storage as Arc<dyn Storage>).expect("app state")
}
