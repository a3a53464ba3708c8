//! JSON-RPC method dispatch and tool execution.
//!
//! Routes `initialize`, `tools/list`, and `tools/call`; swallows
//! notifications. Tool execution follows one template: deserialize the typed
//! input, exchange the caller's header credentials for an access token, issue
//! the matching Airtable call, and wrap the relayed text in the MCP content
//! envelope. No state is carried between invocations.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::Credentials;
use crate::rpc::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::rpc::server::AppState;
use crate::tools::{
    CreateRecordInput, DeleteRecordInput, ListRecordsInput, ListTablesInput, UpdateRecordInput,
};
use crate::types::{Error, Result};

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Parse a raw request body and dispatch it. Returns `None` when no response
/// should be sent (notifications).
pub async fn handle_payload(
    state: &AppState,
    creds: &Credentials,
    payload: &str,
) -> Option<JsonRpcResponse> {
    match serde_json::from_str::<JsonRpcRequest>(payload) {
        Ok(request) => dispatch(state, creds, request).await,
        Err(e) => Some(JsonRpcResponse::error(
            Value::Null,
            -32700,
            format!("parse error: {e}"),
        )),
    }
}

/// Dispatch a parsed request to the appropriate handler.
pub async fn dispatch(
    state: &AppState,
    creds: &Credentials,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        tracing::debug!(method = %request.method, "ignoring notification");
        return None;
    }
    let id = request.id.clone().unwrap_or(Value::Null);

    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(
            id,
            -32600,
            "invalid JSON-RPC version".to_string(),
        ));
    }

    Some(match request.method.as_str() {
        "initialize" => handle_initialize(id),
        "tools/list" => handle_list_tools(state, id),
        "tools/call" => handle_tool_call(state, creds, id, &request.params).await,
        other => JsonRpcResponse::error(id, -32601, format!("unknown method: {other}")),
    })
}

/// Handles the initialize request.
fn handle_initialize(id: Value) -> JsonRpcResponse {
    let result = serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": "airtable-mcp",
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {}
        }
    });

    JsonRpcResponse::success(id, result)
}

/// Handles the tools/list request.
fn handle_list_tools(state: &AppState, id: Value) -> JsonRpcResponse {
    let tools: Vec<Value> = state
        .registry
        .list_entries()
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema,
            })
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": tools }))
}

/// Handles the tools/call request.
async fn handle_tool_call(
    state: &AppState,
    creds: &Credentials,
    id: Value,
    params: &Value,
) -> JsonRpcResponse {
    let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()));

    match execute_tool(state, creds, tool_name, arguments).await {
        Ok(text) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            }),
        ),
        Err(e) => {
            if e.is_server_error() {
                tracing::error!(tool = tool_name, error = %e, "tool call failed");
            } else {
                tracing::warn!(tool = tool_name, error = %e, "tool call rejected");
            }
            JsonRpcResponse::from_app_error(id, &e)
        }
    }
}

/// Execute a tool by name.
///
/// Input parsing and tool-name resolution happen before any network call, so
/// bad parameters or an unknown tool never reach the token service.
async fn execute_tool(
    state: &AppState,
    creds: &Credentials,
    name: &str,
    arguments: Value,
) -> Result<String> {
    match name {
        "list_records" => {
            let input: ListRecordsInput = parse_input(arguments)?;
            let access_token = authorize(state, creds).await?;
            state
                .airtable
                .list_records(&access_token, &input.base_id, &input.table_name)
                .await
        }
        "create_record" => {
            let input: CreateRecordInput = parse_input(arguments)?;
            let access_token = authorize(state, creds).await?;
            state
                .airtable
                .create_record(
                    &access_token,
                    &input.base_id,
                    &input.table_name,
                    &input.fields,
                )
                .await
        }
        "update_record" => {
            let input: UpdateRecordInput = parse_input(arguments)?;
            let access_token = authorize(state, creds).await?;
            state
                .airtable
                .update_record(
                    &access_token,
                    &input.base_id,
                    &input.table_name,
                    &input.record_id,
                    &input.fields,
                )
                .await
        }
        "delete_record" => {
            let input: DeleteRecordInput = parse_input(arguments)?;
            let access_token = authorize(state, creds).await?;
            state
                .airtable
                .delete_record(
                    &access_token,
                    &input.base_id,
                    &input.table_name,
                    &input.record_id,
                )
                .await
        }
        "whoami" => {
            let access_token = authorize(state, creds).await?;
            state.airtable.whoami(&access_token).await
        }
        "list_bases" => {
            let access_token = authorize(state, creds).await?;
            state.airtable.list_bases(&access_token).await
        }
        "list_tables" => {
            let input: ListTablesInput = parse_input(arguments)?;
            let access_token = authorize(state, creds).await?;
            state
                .airtable
                .list_tables(&access_token, &input.base_id)
                .await
        }
        _ => Err(Error::not_found(format!("unknown tool: {name}"))),
    }
}

fn parse_input<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| Error::validation(format!("invalid parameters: {e}")))
}

/// Read the credential pair and exchange it for an access token.
async fn authorize(state: &AppState, creds: &Credentials) -> Result<String> {
    let (token, connection) = creds.require()?;
    state.exchanger.exchange(token, connection).await
}
