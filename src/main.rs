//! Airtable MCP server - main entry point.
//!
//! Starts an HTTP server exposing the MCP tool set over two transports:
//! - `POST /mcp`: streamable HTTP (one request, one response)
//! - `GET /sse` + `POST /sse/message`: server-sent-event sessions

use airtable_mcp::rpc::{router, AppState};
use airtable_mcp::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize observability
    airtable_mcp::observability::init_tracing();

    // Build shared state (tool registry + upstream clients)
    let state = AppState::new(&config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;

    tracing::info!("🚀 Airtable MCP server listening on {}", config.server.listen_addr);
    tracing::info!("  ✓ POST /mcp: streamable HTTP transport");
    tracing::info!("  ✓ GET /sse: SSE transport");
    tracing::info!("  ✓ Token exchange: {}", config.upstream.token_endpoint);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
