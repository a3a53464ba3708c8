//! Airtable REST relay — uniform wrappers over the seven data-access calls.
//!
//! Each operation issues exactly one bearer-authenticated HTTP request and
//! relays the response body back as text. A non-success status from Airtable
//! is not an error here: the stringified body is returned as normal content
//! and interpretation is left to the caller. Only transport-level failures
//! (connect errors, unreadable bodies, invalid JSON on a success status)
//! surface as `Err`.

use std::collections::BTreeMap;

use reqwest::{header, Method};
use url::Url;

use crate::types::{Error, Result};

/// Client for the Airtable REST API.
#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AirtableClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// GET `/v0/{baseId}/{tableName}`
    pub async fn list_records(
        &self,
        access_token: &str,
        base_id: &str,
        table_name: &str,
    ) -> Result<String> {
        let url = self.endpoint(&["v0", base_id, table_name])?;
        self.relay(Method::GET, url, None, access_token).await
    }

    /// POST `/v0/{baseId}/{tableName}` with `{"fields": {...}}`
    pub async fn create_record(
        &self,
        access_token: &str,
        base_id: &str,
        table_name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<String> {
        let url = self.endpoint(&["v0", base_id, table_name])?;
        let body = serde_json::json!({ "fields": fields });
        self.relay(Method::POST, url, Some(&body), access_token)
            .await
    }

    /// PATCH `/v0/{baseId}/{tableName}/{recordId}` with `{"fields": {...}}`
    pub async fn update_record(
        &self,
        access_token: &str,
        base_id: &str,
        table_name: &str,
        record_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<String> {
        let url = self.endpoint(&["v0", base_id, table_name, record_id])?;
        let body = serde_json::json!({ "fields": fields });
        self.relay(Method::PATCH, url, Some(&body), access_token)
            .await
    }

    /// DELETE `/v0/{baseId}/{tableName}/{recordId}`
    pub async fn delete_record(
        &self,
        access_token: &str,
        base_id: &str,
        table_name: &str,
        record_id: &str,
    ) -> Result<String> {
        let url = self.endpoint(&["v0", base_id, table_name, record_id])?;
        self.relay(Method::DELETE, url, None, access_token).await
    }

    /// GET `/v0/meta/whoami`
    pub async fn whoami(&self, access_token: &str) -> Result<String> {
        let url = self.endpoint(&["v0", "meta", "whoami"])?;
        self.relay(Method::GET, url, None, access_token).await
    }

    /// GET `/v0/meta/bases`
    pub async fn list_bases(&self, access_token: &str) -> Result<String> {
        let url = self.endpoint(&["v0", "meta", "bases"])?;
        self.relay(Method::GET, url, None, access_token).await
    }

    /// GET `/v0/meta/bases/{baseId}/tables`
    pub async fn list_tables(&self, access_token: &str, base_id: &str) -> Result<String> {
        let url = self.endpoint(&["v0", "meta", "bases", base_id, "tables"])?;
        self.relay(Method::GET, url, None, access_token).await
    }

    /// Build an endpoint URL from path segments. Segments are
    /// percent-encoded, so table names with spaces or slashes stay intact.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::internal("airtable base URL cannot be a base"))?
            .extend(segments);
        Ok(url)
    }

    /// Issue one request and convert the response to relay text.
    async fn relay(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        access_token: &str,
    ) -> Result<String> {
        let mut request = self
            .http
            .request(method, url.clone())
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            relay_success(&text)
        } else {
            tracing::debug!(%status, path = url.path(), "airtable returned non-success");
            Ok(relay_failure(&text))
        }
    }
}

/// Success bodies are parsed and re-serialized compactly.
fn relay_success(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    Ok(value.to_string())
}

/// Failure bodies are relayed as a JSON-encoded string (quoted and escaped),
/// matching the wire shape callers already parse.
fn relay_failure(body: &str) -> String {
    serde_json::Value::String(body.to_string()).to_string()
}
