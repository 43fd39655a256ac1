// SPDX-License-Identifier: MIT OR Apache-2.0
//! The public MCP manifest served at `/mcp.json`.

use crate::service::McpServerInfo;
use crate::tools::tool_definitions;
use serde_json::{json, Value};

/// Build the manifest document.
///
/// The tool list is the live catalog — the same vector `tools/list` serves —
/// so the two stay in lockstep by construction.
#[must_use]
pub fn build_manifest(info: &McpServerInfo) -> Value {
    json!({
        "name": info.name,
        "version": info.version,
        "description": info.description,
        "transport": {
            "streamableHttp": {
                "url": format!("{}/mcp/v1", info.external_url)
            }
        },
        "authentication": {"type": "bearer"},
        "tools": tool_definitions()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> McpServerInfo {
        McpServerInfo {
            name: "agent-registry".into(),
            version: "0.1.0".into(),
            description: "agent registry control plane".into(),
            external_url: "https://reg.example.com".into(),
        }
    }

    #[test]
    fn manifest_matches_live_tool_catalog() {
        let manifest = build_manifest(&info());
        let manifest_names: Vec<&str> = manifest["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        let live_names: Vec<&str> = tool_definitions().iter().map(|d| d.name).collect();
        assert_eq!(manifest_names, live_names);
    }

    #[test]
    fn transport_url_appends_mcp_v1() {
        let manifest = build_manifest(&info());
        assert_eq!(
            manifest["transport"]["streamableHttp"]["url"],
            "https://reg.example.com/mcp/v1"
        );
        assert_eq!(manifest["authentication"]["type"], "bearer");
    }
}
