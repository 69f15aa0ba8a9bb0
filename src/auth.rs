//! Credential manager: token state, OAuth2 refresh exchange, fallback chain.
//!
//! One [`TokenManager`] instance exists per process. Every outbound post
//! asks it for a currently valid bearer token; the manager serves the
//! cached token while it is fresh, refreshes it when it is not, and falls
//! back to the statically configured token when refresh is unavailable or
//! fails.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    config::{Config, RefreshCredentials},
    error::{XPostError, XPostResult},
    types::TokenResponse,
};

/// Safety margin subtracted from the provider-reported token lifetime.
///
/// A token is treated as expired five minutes before the provider says it
/// is, so a request never goes out with a token that lapses mid-flight.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Paired access token and expiry. The two fields are only ever written
/// together.
#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    /// Initial state: no token, expiry at the epoch so the first use always
    /// goes through validation.
    fn expired() -> Self {
        Self {
            access_token: String::new(),
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && now < self.expires_at
    }
}

/// Owns the process-wide credential state and produces a usable bearer
/// token on demand.
#[derive(Debug)]
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    refresh: Option<RefreshCredentials>,
    fallback_token: Option<String>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// Create a token manager from configuration.
    pub fn new(config: &Config) -> XPostResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("x-post-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            token_url: config.token_url.clone(),
            refresh: config.refresh_credentials(),
            fallback_token: config.bearer_token.clone(),
            state: Mutex::new(TokenState::expired()),
        })
    }

    /// Produce a currently valid bearer token, or fail with
    /// [`XPostError::AuthUnavailable`] when no credential source can supply
    /// one.
    ///
    /// Precedence: the cached access token while it is still fresh (zero
    /// I/O), then a refresh exchange when the full triad is configured,
    /// then the static fallback token. Refresh failures are absorbed here;
    /// the fallback token is returned as-is and never cached into state.
    ///
    /// The state lock is held across the refresh await, so overlapping
    /// calls serialize and at most one refresh is in flight at a time.
    pub async fn acquire_token(&self) -> XPostResult<String> {
        let mut state = self.state.lock().await;

        if state.is_valid(Utc::now()) {
            debug!("Using cached access token");
            return Ok(state.access_token.clone());
        }

        if let Some(creds) = &self.refresh {
            match self.refresh_exchange(creds).await {
                Ok(fresh) => {
                    *state = fresh;
                    return Ok(state.access_token.clone());
                }
                Err(e) => {
                    warn!(error = %e, "Token refresh failed, falling back to static token");
                }
            }
        }

        self.fallback_token
            .clone()
            .ok_or(XPostError::AuthUnavailable)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Any failure (non-success status, transport error, malformed body)
    /// leaves the stored state untouched; `acquire_token` degrades to the
    /// fallback chain.
    async fn refresh_exchange(&self, creds: &RefreshCredentials) -> XPostResult<TokenState> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", creds.refresh_token.as_str()),
        ];

        debug!(token_url = %self.token_url, "Refreshing access token");

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(XPostError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN.as_secs());

        // An out-of-range lifetime is an unusable response, not a panic;
        // the exchange fails and the caller degrades to the fallback chain.
        let expires_at = i64::try_from(lifetime)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                XPostError::InvalidTokenResponse(format!(
                    "expires_in {} is out of range",
                    token.expires_in
                ))
            })?;

        debug!(expires_in = token.expires_in, "Access token refreshed");

        Ok(TokenState {
            access_token: token.access_token,
            expires_at,
        })
    }
}

#[cfg(test)]
impl TokenManager {
    async fn seed(&self, token: &str, expires_at: DateTime<Utc>) {
        *self.state.lock().await = TokenState {
            access_token: token.into(),
            expires_at,
        };
    }

    async fn snapshot(&self) -> (String, DateTime<Utc>) {
        let state = self.state.lock().await;
        (state.access_token.clone(), state.expires_at)
    }
}
