//! Typed errors for the pricefeed library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Most marketplace failures never surface to the caller: adapters
//! convert them to "no result for this source" and the fetch degrades
//! to the remaining sources. The types below exist so those failures
//! can be logged with their category intact (auth vs. transport vs.
//! parse) before being absorbed.

use thiserror::Error;

/// Errors that can occur at the pricefeed facade.
#[derive(Debug, Error)]
pub enum PriceFeedError {
    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Keyword table could not be read
    #[error("keyword table error: {0}")]
    TagTable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors that can occur while fetching from one marketplace.
///
/// A `FetchError` is never fatal for a query: the strategy chain logs
/// it and moves on to the next access method or source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (DNS, TLS, connection)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request exceeded its time bound
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Invalid URL construction
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Response shape did not match any known layout.
    ///
    /// Signals markup drift that needs a selector-profile update.
    #[error("unrecognized response shape from {src}")]
    UnrecognizedShape { src: String },
}

/// Errors that can occur during token acquisition.
///
/// The authenticator absorbs all of these into "no token available";
/// they exist for diagnostics only.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No client credentials configured
    #[error("no client credentials configured")]
    MissingCredentials,

    /// Token endpoint unreachable
    #[error("token exchange failed: {0}")]
    Exchange(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Token endpoint rejected the credentials
    #[error("token request rejected: HTTP {status}")]
    Rejected { status: u16 },

    /// Token response body missing expected fields
    #[error("malformed token response")]
    MalformedResponse,
}

impl FetchError {
    /// Classify a reqwest failure, preserving timeout as its own variant.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http(Box::new(err))
        }
    }
}

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, PriceFeedError>;

/// Result type alias for single-marketplace fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for token operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;
