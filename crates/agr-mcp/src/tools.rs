// SPDX-License-Identifier: MIT OR Apache-2.0
//! The fixed tool catalog.
//!
//! Five tools, each with a JSON-Schema input schema generated from its param
//! struct. The manifest and `tools/list` both read [`tool_definitions`], so
//! the two can never drift apart.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default `list_agents` page size.
pub const LIST_AGENTS_DEFAULT_LIMIT: usize = 100;

/// Hard `list_agents` page cap.
pub const LIST_AGENTS_MAX_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Tool results
// ---------------------------------------------------------------------------

/// One content block of a tool result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolContent {
    /// Content kind; always `"text"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// JSON-stringified payload or error message.
    pub text: String,
}

/// The result payload of `tools/call`.
///
/// Store failures become `is_error: true` results — they are not JSON-RPC
/// errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResult {
    /// Content blocks.
    pub content: Vec<ToolContent>,
    /// Set when the tool failed.
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Wrap a serialisable payload as a single text block.
    #[must_use]
    pub fn json<T: Serialize>(payload: &T) -> Self {
        let text = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
        Self {
            content: vec![ToolContent {
                kind: "text".into(),
                text,
            }],
            is_error: false,
        }
    }

    /// Wrap an error message. The message must already be boundary-safe.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text".into(),
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tool params
// ---------------------------------------------------------------------------

/// Params for `list_agents`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListAgentsParams {
    /// Exclude soft-deleted agents. Defaults to `true`.
    #[serde(default)]
    pub active_only: Option<bool>,
    /// Page size; defaults to 100, capped at 1000. Zero and negative values
    /// fall back to the default.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Params for `get_agent`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetAgentParams {
    /// Agent slug.
    pub agent_id: String,
}

/// Params for `get_model_config`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetModelConfigParams {
    /// `"global"` (default) or `"workspace"`.
    #[serde(default)]
    pub scope: Option<String>,
    /// Workspace id, required when `scope` is `"workspace"`.
    #[serde(default)]
    pub workspace_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// One entry of the tool catalog.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDef {
    /// Tool name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON-Schema for the arguments object.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| serde_json::json!({}))
}

fn empty_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// The five fixed tools, in catalog order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "list_agents",
            description: "List registered agents (summary view)",
            input_schema: schema_of::<ListAgentsParams>(),
        },
        ToolDef {
            name: "get_agent",
            description: "Fetch one agent including its active prompt",
            input_schema: schema_of::<GetAgentParams>(),
        },
        ToolDef {
            name: "get_discovery",
            description: "Compose a discovery snapshot of the registry",
            input_schema: empty_schema(),
        },
        ToolDef {
            name: "list_mcp_servers",
            description: "List registered MCP servers (credentials stripped)",
            input_schema: empty_schema(),
        },
        ToolDef {
            name: "get_model_config",
            description: "Read the model configuration for a scope",
            input_schema: schema_of::<GetModelConfigParams>(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_five_tools_in_order() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "list_agents",
                "get_agent",
                "get_discovery",
                "list_mcp_servers",
                "get_model_config"
            ]
        );
    }

    #[test]
    fn every_tool_has_an_object_schema() {
        for def in tool_definitions() {
            let value = serde_json::to_value(&def).unwrap();
            assert!(value["inputSchema"].is_object(), "{} schema", def.name);
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn get_agent_schema_requires_agent_id() {
        let defs = tool_definitions();
        let get_agent = defs.iter().find(|d| d.name == "get_agent").unwrap();
        let required = get_agent.input_schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "agent_id"));
    }

    #[test]
    fn tool_result_serialization() {
        let ok = ToolResult::json(&serde_json::json!({"a": 1}));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["content"][0]["type"], "text");
        assert!(value.get("isError").is_none(), "isError omitted on success");

        let failed = ToolResult::error("agent 'x' not found");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["text"], "agent 'x' not found");
    }

    #[test]
    fn tool_result_text_is_json_payload() {
        let result = ToolResult::json(&serde_json::json!({"agents": [], "total": 0}));
        let text = &result.content[0].text;
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["total"], 0);
    }
}
