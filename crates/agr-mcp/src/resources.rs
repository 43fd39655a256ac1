// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resource URIs.
//!
//! Four shapes exist: `agent://{slug}`, `prompt://{slug}/active`,
//! `config://model`, and `config://context`. Anything else — other schemes,
//! extra path segments, traversal attempts — is a malformed URI and maps to
//! `invalid params` at the dispatcher.

use serde_json::{json, Value};

/// A parsed, known resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `agent://{slug}` — the full agent record.
    Agent(String),
    /// `prompt://{slug}/active` — the agent's active prompt.
    ActivePrompt(String),
    /// `config://model` — the model configuration.
    ModelConfig,
    /// `config://context` — the context-budget configuration.
    ContextConfig,
}

fn is_clean_slug(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl ResourceUri {
    /// Parse a URI string, rejecting every shape outside the fixed set.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        if let Some(rest) = uri.strip_prefix("agent://") {
            return is_clean_slug(rest).then(|| Self::Agent(rest.to_string()));
        }
        if let Some(rest) = uri.strip_prefix("prompt://") {
            let (slug, tail) = rest.split_once('/')?;
            return (tail == "active" && is_clean_slug(slug))
                .then(|| Self::ActivePrompt(slug.to_string()));
        }
        match uri {
            "config://model" => Some(Self::ModelConfig),
            "config://context" => Some(Self::ContextConfig),
            _ => None,
        }
    }

    /// Canonical string form.
    #[must_use]
    pub fn to_uri(&self) -> String {
        match self {
            Self::Agent(slug) => format!("agent://{slug}"),
            Self::ActivePrompt(slug) => format!("prompt://{slug}/active"),
            Self::ModelConfig => "config://model".into(),
            Self::ContextConfig => "config://context".into(),
        }
    }
}

/// The four fixed RFC 6570 resource templates.
#[must_use]
pub fn resource_templates() -> Value {
    json!({
        "resourceTemplates": [
            {
                "uriTemplate": "agent://{agentId}",
                "name": "Agent record",
                "mimeType": "application/json"
            },
            {
                "uriTemplate": "prompt://{agentId}/active",
                "name": "Active prompt of an agent",
                "mimeType": "application/json"
            },
            {
                "uriTemplate": "config://model",
                "name": "Model configuration",
                "mimeType": "application/json"
            },
            {
                "uriTemplate": "config://context",
                "name": "Context configuration",
                "mimeType": "application/json"
            }
        ]
    })
}

/// Wrap a JSON payload as a resource read result for `uri`.
#[must_use]
pub fn read_result(uri: &str, payload: &Value) -> Value {
    json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": payload.to_string()
        }]
    })
}
