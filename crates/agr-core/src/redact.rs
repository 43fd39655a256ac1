// SPDX-License-Identifier: MIT OR Apache-2.0
//! Redaction rules applied at every read boundary.
//!
//! Two rules cover the whole registry: MCP server credentials are stripped
//! entirely, and every value under a `headers` object inside an endpoint
//! config is replaced with [`REDACTED`].

use crate::McpServer;
use serde_json::Value;

/// Literal substituted for redacted header values.
pub const REDACTED: &str = "***REDACTED***";

/// Return a copy of `config` with every value under a top-level `headers`
/// object replaced by [`REDACTED`].
///
/// Non-object configs and non-object `headers` values pass through untouched;
/// redaction never fails a read.
#[must_use]
pub fn redact_config_headers(config: &Value) -> Value {
    let mut out = config.clone();
    if let Some(obj) = out.as_object_mut()
        && let Some(headers) = obj.get_mut("headers")
        && let Some(map) = headers.as_object_mut()
    {
        for (_, v) in map.iter_mut() {
            *v = Value::String(REDACTED.to_string());
        }
    }
    out
}

/// Projection of an [`McpServer`] with the credential removed.
///
/// This is the only MCP-server shape that leaves the process.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct McpServerView {
    /// Unique label.
    pub label: String,
    /// Server endpoint URL.
    pub url: String,
    /// Authentication scheme.
    pub auth_type: crate::McpAuthType,
    /// Circuit-breaker settings.
    pub circuit_breaker: crate::CircuitBreakerConfig,
    /// Tool re-discovery interval.
    pub discovery_interval_secs: u64,
    /// Enable flag.
    pub is_enabled: bool,
    /// Creation instant.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last-update instant.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&McpServer> for McpServerView {
    fn from(server: &McpServer) -> Self {
        Self {
            label: server.label.clone(),
            url: server.url.clone(),
            auth_type: server.auth_type,
            circuit_breaker: server.circuit_breaker.clone(),
            discovery_interval_secs: server.discovery_interval_secs,
            is_enabled: server.is_enabled,
            created_at: server.created_at,
            updated_at: server.updated_at,
        }
    }
}
