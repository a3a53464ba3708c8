//! MCP tool definitions.
//!
//! Defines the Airtable tools available to MCP clients, with hand-written
//! JSON Schemas and the typed input structs the dispatcher deserializes
//! arguments into. Property names are camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tool metadata exposed by the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// All available tools.
pub fn available_tools() -> Vec<ToolDefinition> {
    vec![
        list_records_tool(),
        create_record_tool(),
        update_record_tool(),
        delete_record_tool(),
        whoami_tool(),
        list_bases_tool(),
        list_tables_tool(),
    ]
}

fn list_records_tool() -> ToolDefinition {
    ToolDefinition {
        name: "list_records".to_string(),
        description: "List records from an Airtable table".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "baseId": {
                    "type": "string",
                    "description": "Airtable base identifier."
                },
                "tableName": {
                    "type": "string",
                    "description": "Table name or table ID within the base."
                }
            },
            "required": ["baseId", "tableName"]
        }),
    }
}

fn create_record_tool() -> ToolDefinition {
    ToolDefinition {
        name: "create_record".to_string(),
        description: "Create a new record in an Airtable table".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "baseId": {
                    "type": "string",
                    "description": "Airtable base identifier."
                },
                "tableName": {
                    "type": "string",
                    "description": "Table name or table ID within the base."
                },
                "fields": {
                    "type": "object",
                    "description": "Field values for the new record.",
                    "additionalProperties": {"type": "string"}
                }
            },
            "required": ["baseId", "tableName", "fields"]
        }),
    }
}

fn update_record_tool() -> ToolDefinition {
    ToolDefinition {
        name: "update_record".to_string(),
        description: "Update an existing record in an Airtable table".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "baseId": {
                    "type": "string",
                    "description": "Airtable base identifier."
                },
                "tableName": {
                    "type": "string",
                    "description": "Table name or table ID within the base."
                },
                "recordId": {
                    "type": "string",
                    "description": "Identifier of the record to update."
                },
                "fields": {
                    "type": "object",
                    "description": "Field values to set on the record.",
                    "additionalProperties": {"type": "string"}
                }
            },
            "required": ["baseId", "tableName", "recordId", "fields"]
        }),
    }
}

fn delete_record_tool() -> ToolDefinition {
    ToolDefinition {
        name: "delete_record".to_string(),
        description: "Delete a record from an Airtable table".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "baseId": {
                    "type": "string",
                    "description": "Airtable base identifier."
                },
                "tableName": {
                    "type": "string",
                    "description": "Table name or table ID within the base."
                },
                "recordId": {
                    "type": "string",
                    "description": "Identifier of the record to delete."
                }
            },
            "required": ["baseId", "tableName", "recordId"]
        }),
    }
}

fn whoami_tool() -> ToolDefinition {
    ToolDefinition {
        name: "whoami".to_string(),
        description: "Get information about the authenticated Airtable user".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

fn list_bases_tool() -> ToolDefinition {
    ToolDefinition {
        name: "list_bases".to_string(),
        description: "List all bases accessible to the authenticated user".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

fn list_tables_tool() -> ToolDefinition {
    ToolDefinition {
        name: "list_tables".to_string(),
        description: "List all tables in a specific base".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "baseId": {
                    "type": "string",
                    "description": "Airtable base identifier."
                }
            },
            "required": ["baseId"]
        }),
    }
}

/// Input for `list_records`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsInput {
    pub base_id: String,
    pub table_name: String,
}

/// Input for `create_record`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordInput {
    pub base_id: String,
    pub table_name: String,
    pub fields: BTreeMap<String, String>,
}

/// Input for `update_record`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordInput {
    pub base_id: String,
    pub table_name: String,
    pub record_id: String,
    pub fields: BTreeMap<String, String>,
}

/// Input for `delete_record`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordInput {
    pub base_id: String,
    pub table_name: String,
    pub record_id: String,
}

/// Input for `list_tables`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTablesInput {
    pub base_id: String,
}
