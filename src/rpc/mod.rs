//! MCP transport layer — JSON-RPC protocol types, dispatch, HTTP server.

pub mod dispatch;
pub mod protocol;
pub mod server;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::{router, AppState};
