//! X API post client: builds and sends the single authenticated
//! status-post request, and maps every response shape into a
//! [`PostOutcome`].

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    auth::TokenManager,
    config::Config,
    error::XPostResult,
    types::{CreateTweetRequest, CreateTweetResponse, PostOutcome, PostRequest, TweetReply},
};

/// Marker surfaced when the provider response omits an expected field.
const MISSING_FIELD: &str = "unknown";

/// Client for the X API v2 status-post endpoint.
#[derive(Debug)]
pub struct XApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
}

impl XApiClient {
    /// Create a new API client from configuration.
    pub fn new(config: &Config, tokens: Arc<TokenManager>) -> XPostResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("x-post-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Post a status update with the best currently valid credential.
    ///
    /// One attempt, no retries: a post is not idempotent, so a retry could
    /// double-publish. Every failure mode comes back as
    /// [`PostOutcome::Failure`]; this never panics and never propagates an
    /// error.
    #[instrument(
        skip(self, request),
        fields(
            has_reply = request.reply_to_tweet_id.is_some(),
            has_quote = request.quote_tweet_id.is_some(),
        )
    )]
    pub async fn post_update(&self, request: &PostRequest) -> PostOutcome {
        let token = match self.tokens.acquire_token().await {
            Ok(token) => token,
            Err(e) => {
                return PostOutcome::Failure {
                    message: e.to_string(),
                };
            }
        };

        let body = CreateTweetRequest {
            text: request.text.clone(),
            reply: request
                .reply_to_tweet_id
                .clone()
                .map(|id| TweetReply {
                    in_reply_to_tweet_id: id,
                }),
            quote_tweet_id: request.quote_tweet_id.clone(),
        };

        match self.send_post(&body, &token).await {
            Ok(outcome) => outcome,
            Err(e) => PostOutcome::Failure {
                message: e.to_string(),
            },
        }
    }

    async fn send_post(
        &self,
        body: &CreateTweetRequest,
        token: &str,
    ) -> XPostResult<PostOutcome> {
        let url = format!("{}/2/tweets", self.base_url);
        debug!(url = %url, "Posting status update");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Ok(PostOutcome::Failure {
                message: error_body(&bytes),
            });
        }

        let parsed: CreateTweetResponse = serde_json::from_slice(&bytes)?;
        let (id, text) = parsed.data.map_or_else(
            || (MISSING_FIELD.to_string(), MISSING_FIELD.to_string()),
            |data| (data.id, data.text),
        );

        Ok(PostOutcome::Success { id, text })
    }
}

/// Render a non-success response body verbatim. Bodies that parse as JSON
/// are re-serialized compactly; anything else is carried through as text.
fn error_body(bytes: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .and_then(|value| serde_json::to_string(&value))
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}
