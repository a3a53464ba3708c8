//! # Airtable MCP Server
//!
//! MCP server exposing Airtable data-access operations as callable tools,
//! authenticating each call by exchanging caller-supplied header credentials
//! for an Airtable access token at an external token service.
//!
//! ## Architecture
//!
//! Every tool invocation is independent and stateless:
//! ```text
//!   POST /mcp ──┐
//!               ├─→ dispatch ─→ credentials ─→ token exchange ─→ Airtable REST
//!   GET  /sse ──┘                (headers)     (external GET)    (one call, relayed)
//! ```
//!
//! Upstream failures from Airtable are relayed as normal tool content;
//! missing credentials and token-exchange rejections fail the call before or
//! at the exchange step.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod airtable;
pub mod auth;
pub mod rpc;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
