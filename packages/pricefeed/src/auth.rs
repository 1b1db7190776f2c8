//! Bearer-token acquisition for API-gated marketplaces.
//!
//! The contract is deliberately lossy: `get_access_token` returns a
//! valid credential or `None`, never an error. Any failure: missing
//! credentials, network trouble, a rejected exchange: downgrades the
//! owning adapter to its fallback method instead of failing the fetch.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::security::{ClientCredentials, SecretString};

/// Safety margin subtracted from a token's lifetime so a credential is
/// never used when it could expire mid-request.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer credential with its expiry.
#[derive(Debug, Clone)]
pub struct ApiCredential {
    /// Bearer token (secret)
    pub access_token: SecretString,

    /// Instant after which the token must not be used
    pub expires_at: DateTime<Utc>,
}

impl ApiCredential {
    /// True while the credential is safely inside its lifetime.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Raw token-endpoint exchange.
///
/// Split from the authenticator so the caching contract can be tested
/// without a network, and so a different grant flow slots in without
/// touching callers.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange client credentials for `(access_token, expires_in_secs)`.
    async fn exchange(&self, credentials: &ClientCredentials) -> AuthResult<(String, i64)>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Client-credentials exchange against an OAuth token endpoint.
pub struct HttpTokenExchange {
    http: reqwest::Client,
    token_url: String,
    scope: String,
}

impl HttpTokenExchange {
    /// Create an exchange against the given token endpoint.
    pub fn new(token_url: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("failed to create HTTP client"),
            token_url: token_url.into(),
            scope: scope.into(),
        }
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(&self, credentials: &ClientCredentials) -> AuthResult<(String, i64)> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(
                &credentials.client_id,
                Some(credentials.client_secret.expose()),
            )
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Exchange(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(Box::new(e)))?;

        match (body.access_token, body.expires_in) {
            (Some(token), Some(expires_in)) if !token.is_empty() && expires_in > 0 => {
                Ok((token, expires_in))
            }
            _ => Err(AuthError::MalformedResponse),
        }
    }
}

/// Caches a bearer credential and refreshes it on expiry.
pub struct TokenAuthenticator {
    exchange: Box<dyn TokenExchange>,
    credentials: Option<ClientCredentials>,
    cached: Mutex<Option<ApiCredential>>,
}

impl TokenAuthenticator {
    /// Create an authenticator over the given exchange.
    ///
    /// `credentials: None` models the unconfigured state: every token
    /// request answers `None` immediately and adapters use their
    /// fallback method.
    pub fn new(exchange: impl TokenExchange + 'static, credentials: Option<ClientCredentials>) -> Self {
        Self {
            exchange: Box::new(exchange),
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid credential, refreshing if needed; `None` on any
    /// failure.
    pub async fn get_access_token(&self) -> Option<ApiCredential> {
        let Some(credentials) = &self.credentials else {
            debug!("no client credentials configured, skipping token request");
            return None;
        };

        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(credential) = cached.as_ref() {
            if credential.is_valid_at(now) {
                return Some(credential.clone());
            }
            debug!("cached token expired, refreshing");
        }

        match self.exchange.exchange(credentials).await {
            Ok((token, expires_in)) => {
                let credential = ApiCredential {
                    access_token: SecretString::new(token),
                    expires_at: now
                        + ChronoDuration::seconds((expires_in - EXPIRY_MARGIN_SECS).max(0)),
                };
                *cached = Some(credential.clone());
                Some(credential)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                *cached = None;
                None
            }
        }
    }

    /// Invalidate the cached credential (e.g. after the stored client
    /// credentials change).
    pub async fn clear_token(&self) {
        *self.cached.lock().await = None;
    }
}
