//! Session management.
//!
//! The [`SessionManager`] is the single source of truth for "who is logged
//! in". It owns the durable token pair, verifies the stored access token at
//! startup, and keeps the token fresh so callers never handle expiry
//! themselves: an authenticated request that fails with `TOKEN_EXPIRED` is
//! transparently refreshed and retried exactly once.
//!
//! # State machine
//!
//! ```text
//! Uninitialized -> Loading -> { Authenticated, Unauthenticated }
//! ```
//!
//! `Authenticated` and `Unauthenticated` are re-entrant: any operation can
//! return to `Loading` and resolve to either.
//!
//! # Refresh single-flight
//!
//! Concurrent requests that all hit an expired token share one refresh call:
//! the refresh path holds an async mutex, and a caller that observes a token
//! different from the one that failed knows another flight already refreshed.
//! Refresh is idempotent on the backend, so this only trims redundant calls;
//! it does not change any contract.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use sartoria_core::{Email, EmailError};

use crate::api::{ApiClient, ApiError, AuthCode};
use crate::models::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, User};
use crate::storage::{Storage, keys};

/// Minimum password length, checked client-side before registration.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Why a session was forcibly ended.
///
/// Carried to the login entry point so the UI can show a distinguishing
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The access token expired and could not be refreshed.
    SessionExpired,
    /// The token was rejected outright (malformed, revoked).
    InvalidToken,
}

impl SessionEndReason {
    /// Stable reason code for the login UI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
            Self::InvalidToken => "invalid_token",
        }
    }
}

impl std::fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid email format (validated before any network call).
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password and confirmation do not match.
    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// Password too short.
    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    WeakPassword,

    /// An authenticated call was attempted with no stored token.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The backend rejected the operation; the message is the backend's own
    /// wording (e.g., "Invalid credentials").
    #[error("{0}")]
    Rejected(String),

    /// The session was forcibly ended; the caller should navigate to a
    /// login entry point carrying the reason code.
    #[error("session ended: {reason}")]
    SessionEnded {
        /// Why the session ended.
        reason: SessionEndReason,
    },

    /// Transport or decoding failure.
    #[error("API error: {0}")]
    Api(ApiError),
}

/// Map an API error onto the session taxonomy.
///
/// Backend rejections keep their message; everything else is a transport
/// error. 401 handling happens before this in the retry wrapper.
fn map_api_error(err: ApiError) -> SessionError {
    match err {
        ApiError::Backend { message, .. } => SessionError::Rejected(message),
        other => SessionError::Api(other),
    }
}

/// Current session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    /// Startup verification has not run yet.
    #[default]
    Uninitialized,
    /// A verification, login, register, or refresh call is in flight.
    /// `is_authenticated` is not reliable in this state.
    Loading,
    /// The backend confirmed the token; the user is known.
    Authenticated(User),
    /// No verified session.
    Unauthenticated,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Owns the authenticated-user state and the durable token pair.
///
/// Cheaply cloneable; all clones share one state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    state: Mutex<SessionState>,
    /// Serializes refresh calls (single-flight guard).
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Create a new session manager. The state starts `Uninitialized`;
    /// call [`Self::initialize`] at application bootstrap.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                api,
                storage,
                state: Mutex::new(SessionState::Uninitialized),
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        match self.state() {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// True iff the backend has confirmed the current token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated(_))
    }

    /// True while a session operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state(), SessionState::Loading)
    }

    /// Verify any stored token against the backend.
    ///
    /// Called once at startup. A present-but-unverified token never counts
    /// as authenticated: on any verification failure both tokens are cleared
    /// and the session resolves to `Unauthenticated` without surfacing an
    /// error.
    pub async fn initialize(&self) {
        let Some(token) = self.stored_access_token() else {
            self.set_state(SessionState::Unauthenticated);
            return;
        };

        self.set_state(SessionState::Loading);
        match self
            .inner
            .api
            .get::<User>("auth/verify", Some(token.expose_secret()))
            .await
        {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "stored session verified");
                self.set_state(SessionState::Authenticated(user));
            }
            Err(e) => {
                tracing::debug!(error = %e, "stored token failed verification, signing out");
                self.clear_tokens();
                self.set_state(SessionState::Unauthenticated);
            }
        }
    }

    /// Log in with email and password.
    ///
    /// On success both tokens are written to storage and the session becomes
    /// `Authenticated`. On failure the session resolves to `Unauthenticated`
    /// and stored tokens are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidEmail` before any network call, or
    /// `SessionError::Rejected` carrying the backend's message.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let email = Email::parse(email)?;

        self.set_state(SessionState::Loading);
        let body = LoginRequest {
            email: email.into_inner(),
            password: password.to_string(),
        };

        match self
            .inner
            .api
            .post::<AuthResponse, _>("auth/login", &body, None)
            .await
        {
            Ok(auth) => {
                self.store_tokens(&auth.token, &auth.refresh_token);
                self.set_state(SessionState::Authenticated(auth.user.clone()));
                Ok(auth.user)
            }
            Err(err) => {
                self.set_state(SessionState::Unauthenticated);
                Err(map_api_error(err))
            }
        }
    }

    /// Register a new account. Behaves like [`Self::login`] on success.
    ///
    /// The password checks run client-side before any network call; email
    /// uniqueness is enforced by the backend. On backend failure the prior
    /// session state is restored unchanged.
    ///
    /// # Errors
    ///
    /// Returns `PasswordMismatch`, `WeakPassword`, or `InvalidEmail` before
    /// any network call, or `Rejected` with the backend message (e.g., a
    /// duplicate email).
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, SessionError> {
        if password != confirm_password {
            return Err(SessionError::PasswordMismatch);
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(SessionError::WeakPassword);
        }
        let email = Email::parse(email)?;

        let previous = self.state();
        self.set_state(SessionState::Loading);
        let body = RegisterRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.into_inner(),
            password: password.to_string(),
        };

        match self
            .inner
            .api
            .post::<AuthResponse, _>("auth/register", &body, None)
            .await
        {
            Ok(auth) => {
                self.store_tokens(&auth.token, &auth.refresh_token);
                self.set_state(SessionState::Authenticated(auth.user.clone()));
                Ok(auth.user)
            }
            Err(err) => {
                self.set_state(previous);
                Err(map_api_error(err))
            }
        }
    }

    /// Sign out locally: delete both tokens and mark unauthenticated.
    ///
    /// Succeeds without a backend call; server-side invalidation, if any,
    /// is the backend's concern.
    pub fn logout(&self) {
        self.clear_tokens();
        self.set_state(SessionState::Unauthenticated);
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Any failure (missing refresh token, network, backend rejection)
    /// performs a local sign-out and returns `SessionEnded`; refresh
    /// failures are never retryable.
    pub async fn refresh_session(&self) -> Result<(), SessionError> {
        let _guard = self.inner.refresh_lock.lock().await;
        self.refresh_locked().await.map(|_token| ())
    }

    /// Issue an authenticated GET, refreshing the token once on expiry.
    ///
    /// # Errors
    ///
    /// `SessionEnded` on unrecoverable auth failure (after signing out),
    /// `Rejected`/`Api` for other backend or transport failures.
    pub async fn get_authenticated<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, SessionError> {
        self.with_auth_retry(|token| {
            let api = self.inner.api.clone();
            let path = path.to_string();
            async move { api.get::<T>(&path, Some(token.expose_secret())).await }
        })
        .await
    }

    /// Issue an authenticated POST, refreshing the token once on expiry.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_authenticated`].
    pub async fn post_authenticated<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SessionError> {
        self.with_auth_retry(|token| {
            let api = self.inner.api.clone();
            let path = path.to_string();
            async move { api.post::<T, B>(&path, body, Some(token.expose_secret())).await }
        })
        .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn set_state(&self, state: SessionState) {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Read the stored access token. A storage read failure is logged and
    /// treated as signed-out.
    fn stored_access_token(&self) -> Option<SecretString> {
        match self.inner.storage.get(keys::ACCESS_TOKEN) {
            Ok(token) => token.map(SecretString::from),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read access token from storage");
                None
            }
        }
    }

    fn stored_refresh_token(&self) -> Option<String> {
        match self.inner.storage.get(keys::REFRESH_TOKEN) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read refresh token from storage");
                None
            }
        }
    }

    /// Persist both tokens. Storage failure keeps the in-memory session
    /// alive and is only logged; the next startup simply will not find a
    /// saved session.
    fn store_tokens(&self, token: &str, refresh_token: &str) {
        if let Err(e) = self.inner.storage.put(keys::ACCESS_TOKEN, token) {
            tracing::warn!(error = %e, "failed to persist access token");
        }
        if let Err(e) = self.inner.storage.put(keys::REFRESH_TOKEN, refresh_token) {
            tracing::warn!(error = %e, "failed to persist refresh token");
        }
    }

    fn clear_tokens(&self) {
        if let Err(e) = self.inner.storage.remove(keys::ACCESS_TOKEN) {
            tracing::warn!(error = %e, "failed to delete access token");
        }
        if let Err(e) = self.inner.storage.remove(keys::REFRESH_TOKEN) {
            tracing::warn!(error = %e, "failed to delete refresh token");
        }
    }

    /// Refresh body. Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<SecretString, SessionError> {
        let Some(refresh_token) = self.stored_refresh_token() else {
            self.logout();
            return Err(SessionError::SessionEnded {
                reason: SessionEndReason::SessionExpired,
            });
        };

        self.set_state(SessionState::Loading);
        let body = RefreshRequest { refresh_token };

        match self
            .inner
            .api
            .post::<AuthResponse, _>("auth/refresh", &body, None)
            .await
        {
            Ok(auth) => {
                self.store_tokens(&auth.token, &auth.refresh_token);
                self.set_state(SessionState::Authenticated(auth.user));
                Ok(SecretString::from(auth.token))
            }
            Err(err) => {
                tracing::debug!(error = %err, "token refresh failed, signing out");
                self.logout();
                Err(SessionError::SessionEnded {
                    reason: SessionEndReason::SessionExpired,
                })
            }
        }
    }

    /// Single-flight refresh for the retry path.
    ///
    /// `observed` is the token the failed request carried. If another caller
    /// refreshed while this one waited for the lock, the stored token has
    /// already changed and is returned as-is.
    async fn refreshed_token(&self, observed: &SecretString) -> Result<SecretString, SessionError> {
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(current) = self.stored_access_token()
            && current.expose_secret() != observed.expose_secret()
        {
            return Ok(current);
        }

        self.refresh_locked().await
    }

    /// Run an authenticated call with at-most-one refresh-and-retry.
    ///
    /// A `TOKEN_EXPIRED` 401 triggers a single refresh and a single retry;
    /// a second 401 after the retry is a hard failure that signs out. Any
    /// other 401 discriminator signs out immediately.
    async fn with_auth_retry<T, F, Fut>(&self, call: F) -> Result<T, SessionError>
    where
        F: Fn(SecretString) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let token = self
            .stored_access_token()
            .ok_or(SessionError::NotAuthenticated)?;

        match call(token.clone()).await {
            Ok(value) => Ok(value),
            Err(err) => match err.unauthorized_code() {
                Some(AuthCode::TokenExpired) => {
                    let fresh = self.refreshed_token(&token).await?;
                    match call(fresh).await {
                        Ok(value) => Ok(value),
                        Err(retry_err) if retry_err.is_unauthorized() => {
                            self.logout();
                            Err(SessionError::SessionEnded {
                                reason: SessionEndReason::SessionExpired,
                            })
                        }
                        Err(retry_err) => Err(map_api_error(retry_err)),
                    }
                }
                Some(_) => {
                    self.logout();
                    Err(SessionError::SessionEnded {
                        reason: SessionEndReason::InvalidToken,
                    })
                }
                None => Err(map_api_error(err)),
            },
        }
    }
}
