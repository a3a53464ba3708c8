//! Tool registry — immutable tool set built once at startup.

use std::collections::HashMap;

use crate::tools::definitions::{available_tools, ToolDefinition};

/// Read-only registry of the tools this server exposes. Built once and
/// shared across concurrent invocations; never mutated after startup.
#[derive(Debug)]
pub struct ToolRegistry {
    entries: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Build the registry from the full tool set.
    pub fn new() -> Self {
        let entries = available_tools()
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        Self { entries }
    }

    /// Get a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.entries.get(name)
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// List all tool definitions, sorted by name.
    pub fn list_entries(&self) -> Vec<&ToolDefinition> {
        let mut entries: Vec<&ToolDefinition> = self.entries.values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
