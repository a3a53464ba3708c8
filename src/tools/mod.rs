//! Tool infrastructure — definitions, typed inputs, registry.
//!
//! Tool metadata is declared here and frozen into a registry at startup;
//! execution lives in the RPC dispatch layer.

mod definitions;
mod registry;

pub use definitions::{
    available_tools, CreateRecordInput, DeleteRecordInput, ListRecordsInput, ListTablesInput,
    ToolDefinition, UpdateRecordInput,
};
pub use registry::ToolRegistry;
