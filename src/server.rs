//! MCP server: JSON-RPC envelope handling and method dispatch.
//!
//! Speaks the line-oriented MCP protocol on behalf of `main`: `initialize`,
//! `tools/list` and `tools/call`, with one registered tool (`send_tweet`).
//! Tool-level problems come back as `isError` results; only envelope-level
//! problems (parse failure, unknown method) become JSON-RPC errors.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::{
    auth::TokenManager,
    client::XApiClient,
    config::Config,
    error::XPostResult,
    types::{PostOutcome, PostRequest},
};

/// MCP protocol revision this server speaks.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// The single tool exposed over `tools/list` and `tools/call`.
const TOOL_SEND_TWEET: &str = "send_tweet";

/// MCP server exposing the X status-post tool.
pub struct XPostServer {
    client: XApiClient,
}

impl XPostServer {
    /// Create the server, wiring the credential manager into the post
    /// client.
    pub fn new(config: &Config) -> XPostResult<Self> {
        let tokens = Arc::new(TokenManager::new(config)?);
        let client = XApiClient::new(config, tokens)?;
        Ok(Self { client })
    }

    /// Handle one JSON-RPC message. Returns `None` for notifications,
    /// which get no response line.
    pub async fn handle_message(&self, message: &str) -> Option<Value> {
        let request: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(_) => return Some(rpc_error(Value::Null, -32700, "Parse error")),
        };

        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        let result = match method {
            "initialize" => self.handle_initialize(),
            "notifications/initialized" => return None,
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tool_call(&params).await,
            _ => {
                return Some(rpc_error(
                    id,
                    -32601,
                    &format!("Method not found: {method}"),
                ));
            }
        };

        Some(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    #[instrument(skip(self))]
    fn handle_initialize(&self) -> Value {
        info!("Initializing MCP session");

        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "x-post-mcp",
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({
            "tools": [{
                "name": TOOL_SEND_TWEET,
                "description": "Post a new tweet to X (Twitter)",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "The content of the tweet"
                        },
                        "reply_to_tweet_id": {
                            "type": "string",
                            "description": "Optional: Tweet ID to reply to"
                        },
                        "quote_tweet_id": {
                            "type": "string",
                            "description": "Optional: Tweet ID to quote"
                        }
                    },
                    "required": ["text"]
                }
            }]
        })
    }

    #[instrument(skip(self, params))]
    async fn handle_tool_call(&self, params: &Value) -> Value {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        if name != TOOL_SEND_TWEET {
            warn!(tool = name, "Unknown tool requested");
            return error_content(&format!("Unknown tool: {name}"));
        }

        let request = match parse_post_request(&args) {
            Ok(request) => request,
            Err(message) => return error_content(&message),
        };

        info!(chars = request.text.chars().count(), "Posting tweet");

        match self.client.post_update(&request).await {
            PostOutcome::Success { id, text } => text_content(&format!(
                "Tweet posted successfully!\nID: {id}\nText: {text}"
            )),
            PostOutcome::Failure { message } => error_content(&format!("Error: {message}")),
        }
    }
}

fn parse_post_request(args: &Value) -> Result<PostRequest, String> {
    let text = args
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| "Missing 'text' argument".to_string())?;

    Ok(PostRequest {
        text: text.to_string(),
        reply_to_tweet_id: optional_id(args, "reply_to_tweet_id"),
        quote_tweet_id: optional_id(args, "quote_tweet_id"),
    })
}

/// Empty strings count as absent, so the request body omits the key.
fn optional_id(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

fn text_content(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

fn error_content(text: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": true
    })
}

fn rpc_error(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn test_server(mock_server: &MockServer) -> XPostServer {
        let config = Config {
            bearer_token: Some("test_token".into()),
            api_url: mock_server.uri(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        XPostServer::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .await
            .unwrap();

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "x-post-mcp");
    }

    #[tokio::test]
    async fn test_initialized_notification_gets_no_response() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_exposes_send_tweet() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .await
            .unwrap();

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "send_tweet");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["text"]));
    }

    #[tokio::test]
    async fn test_unknown_method_is_rpc_error() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#)
            .await
            .unwrap();

        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_unparseable_line_is_parse_error() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server.handle_message("{not json").await.unwrap();

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_tool_call_posts_and_renders_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": { "id": "1234567890", "text": "hello world" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let server = test_server(&mock_server);
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"send_tweet","arguments":{"text":"hello world"}}}"#,
            )
            .await
            .unwrap();

        let result = &response["result"];
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Tweet posted successfully!"));
        assert!(text.contains("ID: 1234567890"));
        assert!(text.contains("Text: hello world"));
    }

    #[tokio::test]
    async fn test_tool_call_failure_sets_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "detail": "Forbidden"
            })))
            .mount(&mock_server)
            .await;

        let server = test_server(&mock_server);
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"send_tweet","arguments":{"text":"hello"}}}"#,
            )
            .await
            .unwrap();

        let result = &response["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: "));
        assert!(text.contains(r#""detail":"Forbidden""#));
    }

    #[tokio::test]
    async fn test_empty_reply_and_quote_ids_are_omitted_from_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(serde_json::json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": { "id": "1", "text": "hello" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let server = test_server(&mock_server);
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"send_tweet","arguments":{"text":"hello","reply_to_tweet_id":"","quote_tweet_id":""}}}"#,
            )
            .await
            .unwrap();

        assert!(response["result"].get("isError").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tool_level_error() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"delete_tweet","arguments":{}}}"#,
            )
            .await
            .unwrap();

        let result = &response["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Unknown tool: delete_tweet");
    }

    #[tokio::test]
    async fn test_missing_text_argument_is_tool_level_error() {
        let mock_server = MockServer::start().await;
        let server = test_server(&mock_server);

        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"send_tweet","arguments":{"reply_to_tweet_id":"42"}}}"#,
            )
            .await
            .unwrap();

        let result = &response["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Missing 'text' argument");
    }
}
