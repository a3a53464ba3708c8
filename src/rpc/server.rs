//! HTTP transport — axum router exposing the MCP entry points.
//!
//! Two variants route into the same dispatch layer:
//!
//! - `POST /mcp`: one JSON-RPC request per call, response in the HTTP body.
//! - `GET /sse` + `POST /sse/message?sessionId=<id>`: the GET opens a
//!   server-sent-event stream whose first event announces the message
//!   endpoint; responses to posted requests are pushed over the stream.
//!
//! Any other path returns `404 Not found`.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;
use uuid::Uuid;

use crate::airtable::AirtableClient;
use crate::auth::{Credentials, TokenExchanger};
use crate::rpc::dispatch;
use crate::tools::ToolRegistry;
use crate::types::{Config, Error, Result};

/// Shared server state.
///
/// The tool registry is immutable after startup; the HTTP clients share one
/// connection pool; the session map exists only for the SSE transport.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub exchanger: TokenExchanger,
    pub airtable: AirtableClient,
    sessions: SseSessions,
    sse_channel_capacity: usize,
}

impl AppState {
    /// Build the server state from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let token_endpoint = Url::parse(&config.upstream.token_endpoint)
            .map_err(|e| Error::validation(format!("invalid token endpoint: {e}")))?;
        let airtable_base = Url::parse(&config.upstream.airtable_base_url)
            .map_err(|e| Error::validation(format!("invalid airtable base URL: {e}")))?;
        let http = reqwest::Client::new();

        Ok(Self {
            registry: Arc::new(ToolRegistry::new()),
            exchanger: TokenExchanger::new(http.clone(), token_endpoint),
            airtable: AirtableClient::new(http, airtable_base),
            sessions: SseSessions::default(),
            sse_channel_capacity: config.server.sse_channel_capacity,
        })
    }
}

/// Build the MCP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/sse", get(handle_sse_connect))
        .route("/sse/message", post(handle_sse_message))
        .fallback(handle_not_found)
        .with_state(state)
}

async fn handle_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Standard variant: JSON-RPC request in, JSON-RPC response out.
async fn handle_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> axum::response::Response {
    let creds = Credentials::from_headers(&headers);
    match dispatch::handle_payload(&state, &creds, &body).await {
        Some(response) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            response.to_wire(),
        )
            .into_response(),
        // Notification: acknowledged, nothing to send back
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Streaming variant: open a session stream. The first event names the
/// message endpoint; subsequent `message` events carry JSON-RPC responses.
async fn handle_sse_connect(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(state.sse_channel_capacity);
    state.sessions.insert(session_id, tx);
    tracing::info!(%session_id, "sse session opened");

    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };
    let endpoint = futures::stream::once(async move {
        Ok(Event::default()
            .event("endpoint")
            .data(format!("/sse/message?sessionId={session_id}")))
    });
    let messages = ReceiverStream::new(rx).map(move |payload: String| {
        // the guard unregisters the session when this stream is dropped
        let _ = &guard;
        Ok(Event::default().event("message").data(payload))
    });

    Sse::new(endpoint.chain(messages)).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionQuery {
    session_id: Uuid,
}

/// Streaming variant: accept a request and push its response (if any) over
/// the owning session's stream.
async fn handle_sse_message(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let Some(tx) = state.sessions.get(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "Unknown session");
    };

    let creds = Credentials::from_headers(&headers);
    if let Some(response) = dispatch::handle_payload(&state, &creds, &body).await {
        if tx.send(response.to_wire()).await.is_err() {
            tracing::warn!(session_id = %query.session_id, "sse session gone, dropping response");
        }
    }
    (StatusCode::ACCEPTED, "Accepted")
}

/// Registry of live SSE sessions, keyed by session id.
#[derive(Debug, Clone, Default)]
struct SseSessions {
    inner: Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>,
}

impl SseSessions {
    fn insert(&self, id: Uuid, tx: mpsc::Sender<String>) {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, tx);
    }

    fn remove(&self, id: &Uuid) {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(id);
    }

    fn get(&self, id: &Uuid) -> Option<mpsc::Sender<String>> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

/// Removes the session entry when the SSE stream is dropped.
#[derive(Debug)]
struct SessionGuard {
    id: Uuid,
    sessions: SseSessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        tracing::info!(session_id = %self.id, "sse session closed");
    }
}
