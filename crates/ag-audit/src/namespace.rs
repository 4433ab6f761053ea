// namespace.rs - Tool identifier namespace convention.
//
// Tools can be addressed with or without a namespace prefix: the gateway
// records "mcp:search" while the registry lists "search". Both spellings
// name the same tool, so every comparison goes through `same_tool`.

use serde::{Deserialize, Serialize};

/// Prefix the MCP gateway puts in front of tool ids.
pub const DEFAULT_TOOL_PREFIX: &str = "mcp:";

/// The prefix convention used to compare tool identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolNamespace {
    prefix: String,
}

impl ToolNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The id with the namespace prefix removed, if it has one.
    pub fn strip<'a>(&self, tool_id: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            return tool_id;
        }
        tool_id.strip_prefix(self.prefix.as_str()).unwrap_or(tool_id)
    }

    /// The id with the namespace prefix added, if it lacks one.
    pub fn qualify(&self, tool_id: &str) -> String {
        format!("{}{}", self.prefix, self.strip(tool_id))
    }

    /// True when both ids name the same tool, ignoring the prefix.
    pub fn same_tool(&self, a: &str, b: &str) -> bool {
        self.strip(a) == self.strip(b)
    }
}

impl Default for ToolNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_PREFIX)
    }
}
