//! Error types for the X post server.

use thiserror::Error;

/// Errors produced by the credential manager and the post client.
#[derive(Error, Debug)]
pub enum XPostError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// X API returned a non-success status
    #[error("X API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Token endpoint returned an unusable response
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// No usable credential source is configured
    #[error(
        "No X credentials available: set X_BEARER_TOKEN, or set X_CLIENT_ID, \
         X_CLIENT_SECRET and X_REFRESH_TOKEN to enable OAuth2 token refresh"
    )]
    AuthUnavailable,
}

/// Result type for X post operations.
pub type XPostResult<T> = Result<T, XPostError>;
