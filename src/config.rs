//! Server configuration, sourced from the environment at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the X post server.
///
/// Credential sources are independent: the static bearer token works on its
/// own, and the OAuth2 refresh triad works on its own. Absence of all of
/// them is a valid startup state; every post attempt then fails with a
/// remediation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Static fallback bearer token (`X_BEARER_TOKEN`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// OAuth2 client ID (`X_CLIENT_ID`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth2 client secret (`X_CLIENT_SECRET`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// OAuth2 refresh token (`X_REFRESH_TOKEN`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Base URL for the X API v2 (default: <https://api.x.com>)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// OAuth2 token endpoint (default: `<api_url>/2/oauth2/token`)
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

fn default_api_url() -> String {
    "https://api.x.com".into()
}

fn default_token_url() -> String {
    token_url_for(&default_api_url())
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Derive the token endpoint from an API base URL.
fn token_url_for(api_url: &str) -> String {
    format!("{}/2/oauth2/token", api_url.trim_end_matches('/'))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Config {
    /// Read configuration from the environment. Empty values count as
    /// absent.
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = env_nonempty("X_API_URL").unwrap_or_else(default_api_url);
        let token_url = env_nonempty("X_TOKEN_URL").unwrap_or_else(|| token_url_for(&api_url));

        Self {
            bearer_token: env_nonempty("X_BEARER_TOKEN"),
            client_id: env_nonempty("X_CLIENT_ID"),
            client_secret: env_nonempty("X_CLIENT_SECRET"),
            refresh_token: env_nonempty("X_REFRESH_TOKEN"),
            api_url,
            token_url,
            timeout: default_timeout(),
        }
    }

    /// The refresh triad, when all three parts are configured. A partial
    /// triad means refresh is unavailable for the process lifetime.
    #[must_use]
    pub fn refresh_credentials(&self) -> Option<RefreshCredentials> {
        match (&self.client_id, &self.client_secret, &self.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Some(RefreshCredentials {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                })
            }
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bearer_token: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            api_url: default_api_url(),
            token_url: default_token_url(),
            timeout: default_timeout(),
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// The three values required for an OAuth2 refresh exchange.
#[derive(Debug, Clone)]
pub struct RefreshCredentials {
    /// OAuth2 client ID
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Long-lived refresh token
    pub refresh_token: String,
}
