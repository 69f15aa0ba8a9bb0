//! x-post-mcp — Main entrypoint
//!
//! A line-oriented JSON-RPC (MCP) server that exposes a single tool for
//! posting status updates to X, with an OAuth2 refresh-token credential
//! lifecycle behind it.

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use x_post_mcp::{Config, XPostServer};

fn main() -> Result<()> {
    // Logs go to stderr; stdout is the protocol channel.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("x-post-mcp server starting");

    run_rpc_loop()
}

/// Run the JSON-RPC loop on stdin/stdout, one message per line.
fn run_rpc_loop() -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    let config = Config::from_env();
    let server = XPostServer::new(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = runtime.block_on(server.handle_message(&line)) else {
            continue;
        };

        let response_json = serde_json::to_string(&response)?;
        writeln!(stdout, "{response_json}")?;
        stdout.flush()?;
    }

    Ok(())
}
