//! Request authentication — header credentials and token exchange.
//!
//! Every tool call carries an opaque caller token and a connection identifier
//! in request headers. The pair is exchanged at an external token service for
//! an Airtable access token, used for exactly one outbound call and then
//! discarded. Nothing is cached or persisted.

use axum::http::HeaderMap;
use reqwest::header;
use serde::Deserialize;
use url::Url;

use crate::types::{Error, Result};

/// Header carrying the caller's bearer token.
pub const ACCESS_TOKEN_HEADER: &str = "access-token";

/// Header naming the upstream Airtable connection to use.
pub const CONNECTION_HEADER: &str = "x-connection";

/// Raw credential pair read from an incoming request's headers.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Option<String>,
    connection: Option<String>,
}

impl Credentials {
    /// Extract the credential pair from request headers. Absent or
    /// non-UTF-8 values are treated as missing.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        Self {
            token: get(ACCESS_TOKEN_HEADER),
            connection: get(CONNECTION_HEADER),
        }
    }

    /// Both values, or a missing-credentials error before any network call.
    pub fn require(&self) -> Result<(&str, &str)> {
        match (self.token.as_deref(), self.connection.as_deref()) {
            (Some(token), Some(connection)) => Ok((token, connection)),
            _ => Err(Error::missing_credentials(
                "missing access token or connection in headers",
            )),
        }
    }
}

/// Successful token-service response body.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Client for the external token exchange endpoint.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    endpoint: Url,
}

impl TokenExchanger {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Exchange the caller token + connection id for an Airtable access token.
    ///
    /// A non-success status fails the call with the service's response body
    /// surfaced verbatim; a success body without a string `accessToken` field
    /// fails validation.
    pub async fn exchange(&self, token: &str, connection: &str) -> Result<String> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(CONNECTION_HEADER, connection)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::warn!(%status, "token exchange rejected");
            return Err(Error::token_exchange(body));
        }

        let parsed: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::token_exchange(format!("invalid token response: {e}")))?;
        Ok(parsed.access_token)
    }
}
