//! End-to-end tests — validates transport→dispatch→token exchange→Airtable
//! relay round-trips against mock upstreams on real sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use airtable_mcp::rpc::{router, AppState};
use airtable_mcp::Config;

const GOOD_HEADERS: &[(&str, &str)] = &[("access-token", "good-token"), ("x-connection", "conn-1")];

/// Call counters shared with the mock upstream handlers.
#[derive(Clone, Default)]
struct UpstreamState {
    token_hits: Arc<AtomicUsize>,
    airtable_hits: Arc<AtomicUsize>,
}

/// Mock token service + Airtable API on one router.
fn mock_upstreams(state: UpstreamState) -> Router {
    Router::new()
        .route("/api/token", get(token_handler))
        .route("/v0/meta/whoami", get(whoami_handler))
        .route("/v0/meta/bases", get(bases_handler))
        .route("/v0/meta/bases/{base_id}/tables", get(tables_handler))
        .route(
            "/v0/{base_id}/{table_name}",
            get(records_handler).post(create_handler),
        )
        .route(
            "/v0/{base_id}/{table_name}/{record_id}",
            patch(update_handler).delete(delete_handler),
        )
        .with_state(state)
}

async fn token_handler(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.token_hits.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-connection").is_none() {
        return (StatusCode::BAD_REQUEST, "missing x-connection").into_response();
    }
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if auth != "Bearer good-token" {
        return (StatusCode::UNAUTHORIZED, "token rejected").into_response();
    }
    Json(json!({"accessToken": "at-12345"})).into_response()
}

fn reject_bad_auth(headers: &HeaderMap) -> Option<axum::response::Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if auth != "Bearer at-12345" {
        return Some((StatusCode::UNAUTHORIZED, "bad airtable token").into_response());
    }
    None
}

async fn records_handler(
    State(state): State<UpstreamState>,
    Path((base_id, table_name)): Path<(String, String)>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    Json(json!({"base": base_id, "records": [{"id": "rec1"}], "table": table_name})).into_response()
}

async fn create_handler(
    State(state): State<UpstreamState>,
    Path((base_id, table_name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    if table_name == "Broken" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": {"type": "INVALID_REQUEST"}})),
        )
            .into_response();
    }
    Json(json!({"base": base_id, "id": "rec-new", "createdFields": body["fields"]}))
        .into_response()
}

async fn update_handler(
    State(state): State<UpstreamState>,
    Path((_base_id, _table_name, record_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    Json(json!({"id": record_id, "updatedFields": body["fields"]})).into_response()
}

async fn delete_handler(
    State(state): State<UpstreamState>,
    Path((_base_id, _table_name, record_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    Json(json!({"deleted": true, "id": record_id})).into_response()
}

async fn whoami_handler(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    Json(json!({"id": "usrMock"})).into_response()
}

async fn bases_handler(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    Json(json!({"bases": [{"id": "app1", "name": "Base One"}]})).into_response()
}

async fn tables_handler(
    State(state): State<UpstreamState>,
    Path(base_id): Path<String>,
    headers: HeaderMap,
) -> axum::response::Response {
    state.airtable_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = reject_bad_auth(&headers) {
        return response;
    }
    Json(json!({"base": base_id, "tables": [{"id": "tbl1", "name": "Tasks"}]})).into_response()
}

/// Helper: serve a router on an ephemeral port, return its address.
async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Helper: spin up mock upstreams + the real server, return the server's
/// base URL and the upstream counters.
async fn start_stack() -> (String, UpstreamState) {
    let upstream = UpstreamState::default();
    let mock_addr = spawn_app(mock_upstreams(upstream.clone())).await;

    let mut config = Config::default();
    config.upstream.token_endpoint = format!("http://{mock_addr}/api/token");
    config.upstream.airtable_base_url = format!("http://{mock_addr}");

    let state = AppState::new(&config).unwrap();
    let server_addr = spawn_app(router(state)).await;
    (format!("http://{server_addr}"), upstream)
}

/// Helper: send a JSON-RPC request to `/mcp`, decode the response.
async fn rpc_call(base: &str, headers: &[(&str, &str)], body: Value) -> Value {
    let client = reqwest::Client::new();
    let mut request = client.post(format!("{base}/mcp")).body(body.to_string());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = request.send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

/// Extract the relayed text payload from a tool result.
fn content_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let (base, _upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        &[],
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "airtable-mcp");

    let response = rpc_call(
        &base,
        &[],
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}}),
    )
    .await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 7);
    assert!(tools.iter().any(|t| t["name"] == "update_record"));
}

#[tokio::test]
async fn test_missing_credentials_hit_no_upstream() {
    let (base, upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        &[],
        tool_call(1, "list_records", json!({"baseId": "appX", "tableName": "Tasks"})),
    )
    .await;

    assert_eq!(response["error"]["code"], -32001);
    assert_eq!(upstream.token_hits.load(Ordering::SeqCst), 0);
    assert_eq!(upstream.airtable_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_service_failure_propagates_body() {
    let (base, upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        &[("access-token", "bad-token"), ("x-connection", "conn-1")],
        tool_call(1, "whoami", json!({})),
    )
    .await;

    assert_eq!(response["error"]["code"], -32002);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("token rejected"));
    assert_eq!(upstream.airtable_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_list_records_relays_json_body() {
    let (base, upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        GOOD_HEADERS,
        tool_call(1, "list_records", json!({"baseId": "appX", "tableName": "My Tasks"})),
    )
    .await;

    assert!(response.get("error").is_none());
    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["base"], "appX");
    // percent-encoded on the wire, decoded back by the mock's path extractor
    assert_eq!(relayed["table"], "My Tasks");
    assert_eq!(upstream.token_hits.load(Ordering::SeqCst), 1);
    assert_eq!(upstream.airtable_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_record_posts_fields() {
    let (base, _upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        GOOD_HEADERS,
        tool_call(
            1,
            "create_record",
            json!({"baseId": "appX", "tableName": "Tasks", "fields": {"Name": "Widget"}}),
        ),
    )
    .await;

    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["id"], "rec-new");
    assert_eq!(relayed["createdFields"]["Name"], "Widget");
}

#[tokio::test]
async fn test_update_and_delete_target_record_path() {
    let (base, _upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        GOOD_HEADERS,
        tool_call(
            1,
            "update_record",
            json!({"baseId": "appX", "tableName": "Tasks", "recordId": "recY", "fields": {"Status": "Done"}}),
        ),
    )
    .await;
    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["id"], "recY");
    assert_eq!(relayed["updatedFields"]["Status"], "Done");

    let response = rpc_call(
        &base,
        GOOD_HEADERS,
        tool_call(
            2,
            "delete_record",
            json!({"baseId": "appX", "tableName": "Tasks", "recordId": "recY"}),
        ),
    )
    .await;
    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["deleted"], true);
    assert_eq!(relayed["id"], "recY");
}

#[tokio::test]
async fn test_meta_tools() {
    let (base, upstream) = start_stack().await;

    let response = rpc_call(&base, GOOD_HEADERS, tool_call(1, "whoami", json!({}))).await;
    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["id"], "usrMock");

    let response = rpc_call(&base, GOOD_HEADERS, tool_call(2, "list_bases", json!({}))).await;
    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["bases"][0]["id"], "app1");

    let response = rpc_call(
        &base,
        GOOD_HEADERS,
        tool_call(3, "list_tables", json!({"baseId": "appZ"})),
    )
    .await;
    let relayed: Value = serde_json::from_str(content_text(&response)).unwrap();
    assert_eq!(relayed["base"], "appZ");
    assert_eq!(relayed["tables"][0]["name"], "Tasks");

    // one token exchange + one Airtable call per invocation
    assert_eq!(upstream.token_hits.load(Ordering::SeqCst), 3);
    assert_eq!(upstream.airtable_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_airtable_error_relayed_as_content() {
    let (base, _upstream) = start_stack().await;

    let response = rpc_call(
        &base,
        GOOD_HEADERS,
        tool_call(
            1,
            "create_record",
            json!({"baseId": "appX", "tableName": "Broken", "fields": {"Name": "Widget"}}),
        ),
    )
    .await;

    // Upstream failure is content, not an error response
    assert!(response.get("error").is_none());
    let raw_body = r#"{"error":{"type":"INVALID_REQUEST"}}"#;
    let expected = serde_json::Value::String(raw_body.to_string()).to_string();
    assert_eq!(content_text(&response), expected);
}

#[tokio::test]
async fn test_unknown_path_returns_not_found() {
    let (base, _upstream) = start_stack().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/other"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "Not found");
}

#[tokio::test]
async fn test_notification_returns_accepted() {
    let (base, _upstream) = start_stack().await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/mcp"))
        .body(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.text().await.unwrap().is_empty());
}

/// Helper: pull the next non-comment SSE event (event name, data) from a
/// byte stream, buffering partial frames.
async fn next_event(
    stream: &mut (impl Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin),
    buf: &mut String,
) -> (String, String) {
    loop {
        if let Some(pos) = buf.find("\n\n") {
            let raw: String = buf.drain(..pos + 2).collect();
            let mut event = String::new();
            let mut data = String::new();
            for line in raw.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    event = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data.push_str(rest.trim_start());
                }
            }
            if event.is_empty() && data.is_empty() {
                continue; // keep-alive comment
            }
            return (event, data);
        }
        let chunk = stream.next().await.expect("sse stream ended").unwrap();
        buf.push_str(&String::from_utf8_lossy(&chunk));
    }
}

#[tokio::test]
async fn test_sse_round_trip() {
    let (base, _upstream) = start_stack().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/sse")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut stream = response.bytes_stream();
    let mut buf = String::new();

    let (event, endpoint) = tokio::time::timeout(
        Duration::from_secs(5),
        next_event(&mut stream, &mut buf),
    )
    .await
    .unwrap();
    assert_eq!(event, "endpoint");
    assert!(endpoint.starts_with("/sse/message?sessionId="));

    let post = client
        .post(format!("{base}{endpoint}"))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), StatusCode::ACCEPTED);

    let (event, data) = tokio::time::timeout(
        Duration::from_secs(5),
        next_event(&mut stream, &mut buf),
    )
    .await
    .unwrap();
    assert_eq!(event, "message");
    let response: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_sse_unknown_session() {
    let (base, _upstream) = start_stack().await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!(
            "{base}/sse/message?sessionId=00000000-0000-0000-0000-000000000000"
        ))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
