// SPDX-License-Identifier: MIT OR Apache-2.0
//! agr-a2a
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Projection of internal agents into externally-safe A2A cards.
//!
//! The card types only carry fields that are allowed to leave the process —
//! exclusion of internal fields (`system_prompt`, `trust_overrides`,
//! provenance, raw tools) is by construction, not by filtering. Tool lists
//! are re-parsed defensively: malformed shapes degrade to the synthetic
//! skill instead of failing the projection.

use agr_core::Agent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A2A protocol version stamped on every card.
pub const PROTOCOL_VERSION: &str = "0.3.0";

// ---------------------------------------------------------------------------
// Card types
// ---------------------------------------------------------------------------

/// Organization block on a card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardProvider {
    /// Operating organization.
    pub organization: String,
    /// Organization URL.
    pub url: String,
}

/// One capability an agent advertises, projected from a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    /// Skill id (the tool name, or the agent slug for synthetic skills).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Classification tags.
    pub tags: Vec<String>,
    /// Example prompts. Attached to the first skill only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

/// An externally-safe A2A agent card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Public management-API URL of the agent.
    pub url: String,
    /// Internal version number, stringified.
    pub version: String,
    /// A2A protocol version, always [`PROTOCOL_VERSION`].
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Operating organization.
    pub provider: CardProvider,
    /// Transport capabilities.
    pub capabilities: Value,
    /// Accepted input modes.
    #[serde(rename = "defaultInputModes")]
    pub default_input_modes: Vec<String>,
    /// Produced output modes.
    #[serde(rename = "defaultOutputModes")]
    pub default_output_modes: Vec<String>,
    /// Advertised skills. Never empty.
    pub skills: Vec<Skill>,
    /// Supported security schemes.
    #[serde(rename = "securitySchemes")]
    pub security_schemes: Value,
    /// Security requirements.
    pub security: Vec<Value>,
}

fn security_schemes() -> Value {
    serde_json::json!({"bearerAuth": {"type": "http", "scheme": "bearer"}})
}

fn capabilities() -> Value {
    serde_json::json!({"streaming": false, "pushNotifications": false})
}

// ---------------------------------------------------------------------------
// Tool → skill projection
// ---------------------------------------------------------------------------

/// Project a serialized tool list into skills.
///
/// The input is treated as untrusted: a non-array value, or entries that are
/// not objects with string `name`/`source`, contribute nothing. Callers fall
/// back to the synthetic skill when the result is empty.
#[must_use]
pub fn skills_from_tools(tools: &Value) -> Vec<Skill> {
    let Some(entries) = tools.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            let name = obj.get("name")?.as_str()?;
            if name.is_empty() {
                return None;
            }
            let source = obj.get("source")?.as_str()?;
            let mut tags = vec![source.to_string()];
            if let Some(label) = obj.get("server_label").and_then(Value::as_str)
                && !label.is_empty()
            {
                tags.push(label.to_string());
            }
            Some(Skill {
                id: name.to_string(),
                name: name.to_string(),
                description: obj
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                tags,
                examples: None,
            })
        })
        .collect()
}

fn synthetic_skill(agent: &Agent) -> Skill {
    Skill {
        id: agent.id.clone(),
        name: agent.name.clone(),
        description: agent.description.clone(),
        tags: vec!["agent".into()],
        examples: None,
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project one agent into its card.
///
/// `external_url` is concatenated verbatim — a configured trailing slash
/// flows through into the card URL unchanged.
#[must_use]
pub fn project_agent(agent: &Agent, external_url: &str, provider: &CardProvider) -> AgentCard {
    let tools_value = serde_json::to_value(&agent.tools).unwrap_or(Value::Null);
    let mut skills = skills_from_tools(&tools_value);
    if skills.is_empty() {
        skills.push(synthetic_skill(agent));
    }
    if !agent.example_prompts.is_empty() {
        skills[0].examples = Some(agent.example_prompts.clone());
    }

    AgentCard {
        name: agent.name.clone(),
        description: agent.description.clone(),
        url: format!("{external_url}/api/v1/agents/{}", agent.id),
        version: agent.version.to_string(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        provider: provider.clone(),
        capabilities: capabilities(),
        default_input_modes: vec!["text".into()],
        default_output_modes: vec!["text".into()],
        skills,
        security_schemes: security_schemes(),
        security: vec![serde_json::json!({"bearerAuth": []})],
    }
}

/// Aggregate all active agents into the single registry-level card served at
/// the well-known path. Each agent appears as one skill.
#[must_use]
pub fn aggregate_card(
    agents: &[Agent],
    external_url: &str,
    provider: &CardProvider,
    registry_version: &str,
) -> AgentCard {
    let skills: Vec<Skill> = agents
        .iter()
        .filter(|a| a.is_active)
        .map(|agent| Skill {
            id: agent.id.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            tags: vec!["agent".into()],
            examples: None,
        })
        .collect();

    AgentCard {
        name: "Agent Registry".into(),
        description: "Directory of agents registered with this control plane".into(),
        url: format!("{external_url}/api/v1/agents"),
        version: registry_version.to_string(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        provider: provider.clone(),
        capabilities: capabilities(),
        default_input_modes: vec!["text".into()],
        default_output_modes: vec!["text".into()],
        skills,
        security_schemes: security_schemes(),
        security: vec![serde_json::json!({"bearerAuth": []})],
    }
}

// ---------------------------------------------------------------------------
// ETag
// ---------------------------------------------------------------------------

/// Strong, quoted ETag over a serialized payload.
///
/// Stable for identical bytes; changes iff the content changes.
#[must_use]
pub fn strong_etag(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut hex = String::with_capacity(2 + digest.len() * 2);
    hex.push('"');
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.push('"');
    hex
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
