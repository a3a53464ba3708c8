//! Configuration structures.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};

/// Global server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream endpoint configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub listen_addr: String,

    /// Bounded channel capacity for SSE session streams.
    pub sse_channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            sse_channel_capacity: 64,
        }
    }
}

/// Upstream endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Token exchange endpoint (GET, bearer-authenticated).
    pub token_endpoint: String,

    /// Airtable REST API base URL.
    pub airtable_base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            token_endpoint: "https://curlmate.dev/api/token".to_string(),
            airtable_base_url: "https://api.airtable.com".to_string(),
        }
    }
}

impl Config {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `AIRTABLE_MCP_LISTEN_ADDR`,
    /// `AIRTABLE_MCP_TOKEN_ENDPOINT`, `AIRTABLE_MCP_API_BASE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("AIRTABLE_MCP_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        }
        if let Ok(endpoint) = std::env::var("AIRTABLE_MCP_TOKEN_ENDPOINT") {
            config.upstream.token_endpoint = endpoint;
        }
        if let Ok(base) = std::env::var("AIRTABLE_MCP_API_BASE") {
            config.upstream.airtable_base_url = base;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.server.sse_channel_capacity, 64);
        assert_eq!(
            config.upstream.token_endpoint,
            "https://curlmate.dev/api/token"
        );
        assert_eq!(config.upstream.airtable_base_url, "https://api.airtable.com");
    }
}
