//! HTTP client for the backend REST API.
//!
//! A thin wrapper over `reqwest` that joins paths under the configured base
//! URL, attaches the bearer header when given a token, and parses the
//! backend's error envelope (`{"message": ..., "error": ...}`). The `error`
//! field on 401 responses is the discriminator the session manager branches
//! on for its refresh-and-retry logic.
//!
//! Every request carries the configured timeout, so a hung backend cannot
//! leave callers suspended indefinitely.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::StorefrontConfig;

/// Auth error discriminator carried in 401 bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthCode {
    /// The access token expired; a refresh may recover the session.
    TokenExpired,
    /// The token is malformed or revoked; not recoverable by refresh.
    InvalidToken,
    /// Generic authentication failure; not recoverable by refresh.
    AuthenticationFailed,
    /// Any discriminator this client does not know.
    #[serde(other)]
    Unknown,
}

/// Backend error envelope for non-2xx responses.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<AuthCode>,
}

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not parse as the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the request. `message` is the backend's own
    /// wording and is surfaced verbatim to the UI.
    #[error("{message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Backend-provided message.
        message: String,
        /// Auth discriminator, present on 401 responses.
        code: Option<AuthCode>,
    },

    /// A request path could not be joined under the base URL.
    #[error("invalid API path: {0}")]
    Path(#[from] url::ParseError),
}

impl ApiError {
    /// The auth discriminator, if this is a 401 rejection.
    ///
    /// A 401 without a recognizable discriminator is reported as
    /// [`AuthCode::AuthenticationFailed`]: it is an auth failure either way,
    /// and refresh will not recover it.
    #[must_use]
    pub const fn unauthorized_code(&self) -> Option<AuthCode> {
        match self {
            Self::Backend {
                status: 401, code, ..
            } => match code {
                Some(c) => Some(*c),
                None => Some(AuthCode::AuthenticationFailed),
            },
            _ => None,
        }
    }

    /// Whether this error is any 401 rejection.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Backend { status: 401, .. })
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Sartoria backend REST API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Issue a GET request, optionally authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx response, or an
    /// unexpected response shape.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.inner.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.send(request).await
    }

    /// Issue a POST request with a JSON body, optionally authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx response, or an
    /// unexpected response shape.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.inner.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.send(request).await
    }

    /// Join a relative path under the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send a request and parse the response.
    ///
    /// Reads the body as text first so parse failures can be logged with
    /// the offending payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            tracing::debug!(
                status = %status,
                code = ?body.error,
                "backend rejected request"
            );
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: body.message.unwrap_or_else(|| format!("HTTP {status}")),
                code: body.error,
            });
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }
}
