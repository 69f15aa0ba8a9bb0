//! x-post-mcp
//!
//! A line-oriented JSON-RPC (MCP) server exposing a single tool,
//! `send_tweet`, that posts a status update to the X API v2.
//!
//! The interesting machinery is the credential lifecycle: every outbound
//! post asks the token manager for a currently valid bearer token. The
//! manager serves the cached token while it is fresh, refreshes it against
//! the OAuth2 token endpoint when it is not, and falls back to a statically
//! configured bearer token when refresh is unavailable or fails.
//!
//! ## Credential precedence
//!
//! 1. Cached access token, while valid (a 5-minute safety margin is
//!    subtracted from the provider-reported lifetime at refresh time)
//! 2. OAuth2 refresh exchange (`X_CLIENT_ID`, `X_CLIENT_SECRET`,
//!    `X_REFRESH_TOKEN`)
//! 3. Static bearer token (`X_BEARER_TOKEN`)

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod auth;
mod client;
mod config;
mod error;
mod server;
mod types;

pub use auth::{TOKEN_EXPIRY_MARGIN, TokenManager};
pub use client::XApiClient;
pub use config::{Config, RefreshCredentials};
pub use error::{XPostError, XPostResult};
pub use server::XPostServer;
pub use types::{PostOutcome, PostRequest};
