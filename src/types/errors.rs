//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the Airtable MCP server.
#[derive(Error, Debug)]
pub enum Error {
    /// Required credential headers are absent (raised before any network call).
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// The token service rejected the exchange (body surfaced verbatim).
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Invalid tool parameters or malformed request payloads.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown tool or method.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Outbound HTTP transport errors (connect failures, body read errors).
    #[error("upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to a JSON-RPC 2.0 error code.
    ///
    /// Standard codes: `-32601` method not found, `-32602` invalid params,
    /// `-32603` internal. Implementation-defined server codes (`-32000` to
    /// `-32099`) cover the credential and upstream failure classes.
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            Error::MissingCredentials(_) => -32001,
            Error::TokenExchange(_) => -32002,
            Error::Validation(_) => -32602,
            Error::NotFound(_) => -32601,
            Error::Internal(_) | Error::Io(_) => -32603,
            Error::Serialization(_) => -32012,
            Error::Upstream(_) => -32010,
        }
    }

    /// True if this error indicates a server-side fault worth `error`-level
    /// logging (client mistakes log at `warn`).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Error::Internal(_) | Error::Io(_) | Error::Serialization(_) | Error::Upstream(_)
        )
    }
}

// Convenience constructors
impl Error {
    pub fn missing_credentials(msg: impl Into<String>) -> Self {
        Self::MissingCredentials(msg.into())
    }

    pub fn token_exchange(msg: impl Into<String>) -> Self {
        Self::TokenExchange(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
