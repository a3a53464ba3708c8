//! Core types for the Airtable MCP server.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the server and upstreams

mod config;
mod errors;

pub use config::{Config, ServerConfig, UpstreamConfig};
pub use errors::{Error, Result};
