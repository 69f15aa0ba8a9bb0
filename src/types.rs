//! Wire types for the X API v2 and the tool surface.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Tweet creation
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /2/tweets`.
///
/// Optional members serialize to absent keys, not `null`; callers asserting
/// on the exact body shape depend on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTweetRequest {
    /// Tweet text
    pub text: String,

    /// Reply settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<TweetReply>,

    /// Quote tweet ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_tweet_id: Option<String>,
}

/// Tweet reply settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetReply {
    /// ID of the tweet being replied to
    pub in_reply_to_tweet_id: String,
}

/// Create tweet response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTweetResponse {
    /// Created tweet data; the provider may omit it
    #[serde(default)]
    pub data: Option<CreatedTweet>,
}

/// Created tweet data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTweet {
    /// Tweet ID
    pub id: String,

    /// Tweet text
    pub text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth2 token endpoint
// ─────────────────────────────────────────────────────────────────────────────

/// Token response from the OAuth2 token endpoint.
///
/// Both fields are required; a response missing either is treated as a
/// failed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Lifetime in seconds.
    pub expires_in: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool surface
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments of a single `send_tweet` invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRequest {
    /// Tweet text (required, non-empty)
    pub text: String,

    /// Tweet ID to reply to
    #[serde(default)]
    pub reply_to_tweet_id: Option<String>,

    /// Tweet ID to quote. Independent of the reply target; a post can be
    /// both a reply and a quote.
    #[serde(default)]
    pub quote_tweet_id: Option<String>,
}

/// Outcome of a single post attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The post was created.
    Success {
        /// ID of the created tweet.
        id: String,
        /// Echoed tweet text.
        text: String,
    },
    /// The post was not created.
    Failure {
        /// Diagnostic carried back as tool-call content.
        message: String,
    },
}
