// SPDX-License-Identifier: MIT OR Apache-2.0
//! agr-core
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The stable contract for the agent registry: resource types, identity
//! types, pagination, validation, and redaction rules shared by every
//! protocol surface.

/// Pagination parameters and pages.
pub mod page;
/// Redaction rules for credentials and header maps.
pub mod redact;
/// Scoped configuration overlays and merge semantics.
pub mod scope;
/// Input validation: slugs, tools, URLs, size caps.
pub mod validate;

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Current contract version string reported by the health endpoint and the
/// MCP `serverInfo` payload.
pub const CONTRACT_VERSION: &str = "agr/v1";

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// The primary registry resource: a named agent definition.
///
/// `id` is a lowercase-underscore slug, unique across the registry.
/// Deletion is soft — it flips [`Agent::is_active`] and preserves history.
/// `version` increments on every successful mutation and never decreases.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Agent {
    /// Slug identifier, `^[a-z][a-z0-9_]{2,}$`.
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Ordered tool list.
    pub tools: Vec<Tool>,

    /// Opaque per-agent trust overrides (JSON object).
    pub trust_overrides: serde_json::Value,

    /// Example prompts surfaced to clients.
    pub example_prompts: Vec<String>,

    /// Soft-delete flag.
    pub is_active: bool,

    /// Monotonic mutation counter.
    pub version: i64,

    /// Actor that created the agent. Preserved across every mutation.
    pub created_by: String,

    /// Creation instant. Preserved across every mutation.
    pub created_at: DateTime<Utc>,

    /// Last-update instant — the optimistic-concurrency token.
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Summary view used by list projections and the discovery snapshot
    /// (`include_tools = false`).
    #[must_use]
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}

/// Tool summary-free projection of an [`Agent`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AgentSummary {
    /// Slug identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Mutation counter.
    pub version: i64,
    /// Last-update instant.
    pub updated_at: DateTime<Utc>,
}

/// Immutable pre-mutation snapshot of an agent.
///
/// The `(agent_id, version)` tuple is unique; history is append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentVersion {
    /// Slug of the agent this snapshot belongs to.
    pub agent_id: String,
    /// Version number the snapshot captured.
    pub version: i64,
    /// The full agent value as it was at that version.
    pub snapshot: Agent,
    /// Actor whose mutation recorded this snapshot. For a rollback this is
    /// the rollback actor; the entity's own `created_by` is untouched.
    pub created_by: String,
    /// Instant the snapshot was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Where a tool is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    /// Built into the runtime.
    Internal,
    /// Served by a registered MCP server.
    Mcp,
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("internal"),
            Self::Mcp => f.write_str("mcp"),
        }
    }
}

/// A tool attached to an agent.
///
/// When `source` is [`ToolSource::Mcp`], `server_label` must name a
/// registered MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Tool {
    /// Tool name, unique within the agent.
    pub name: String,
    /// Implementation source.
    pub source: ToolSource,
    /// MCP server label; empty for internal tools.
    #[serde(default)]
    pub server_label: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Execution mode a prompt is authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// Retrieval-augmented, read-only.
    RagReadonly,
    /// Tool calling restricted to safe tools.
    ToolcallingSafe,
    /// Unrestricted tool calling.
    ToolcallingAuto,
}

/// A system prompt scoped to one agent.
///
/// At most one prompt per agent has `is_active = true`; activation is an
/// atomic swap in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    /// Prompt key.
    pub id: Uuid,
    /// Owning agent slug.
    pub agent_id: String,
    /// System prompt text, capped at [`validate::MAX_PROMPT_BYTES`].
    pub system_prompt: String,
    /// Declared template variables (JSON object of name → description).
    pub template_variables: serde_json::Value,
    /// Authoring mode.
    pub mode: PromptMode,
    /// Monotonic per-prompt mutation counter.
    pub version: i64,
    /// Whether this prompt is the agent's active one.
    pub is_active: bool,
    /// Actor that created the prompt.
    pub created_by: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last-update instant.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Model endpoints
// ---------------------------------------------------------------------------

/// Upstream provider family for a model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// OpenAI-compatible.
    Openai,
    /// Azure OpenAI.
    Azure,
    /// Anthropic.
    Anthropic,
    /// Local Ollama.
    Ollama,
    /// Anything else speaking a supported wire protocol.
    Custom,
}

/// Whether an endpoint is pinned to one model or serves an allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EndpointMode {
    /// Exactly one model; `model_name` is required.
    Fixed,
    /// Caller picks from `allowed_models`, which must be non-empty.
    Flexible,
}

/// A registered model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelEndpoint {
    /// Stable slug identifier.
    pub slug: String,
    /// Provider family.
    pub provider: Provider,
    /// Endpoint base URL. Scheme must be http/https and the host must not
    /// fall into loopback, link-local, private, or metadata ranges.
    pub url: String,
    /// Fixed vs flexible model selection.
    pub mode: EndpointMode,
    /// Pinned model for [`EndpointMode::Fixed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Allowlist for [`EndpointMode::Flexible`].
    #[serde(default)]
    pub allowed_models: Vec<String>,
    /// Optional workspace scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Monotonic mutation counter.
    pub version: i64,
    /// Creating actor.
    pub created_by: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last-update instant.
    pub updated_at: DateTime<Utc>,
}

/// One configuration revision of a model endpoint.
///
/// `version` auto-increments within the endpoint; at most one revision per
/// endpoint is active. `config.headers` values are redacted on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelEndpointVersion {
    /// Owning endpoint slug.
    pub endpoint_slug: String,
    /// Auto-incremented revision number, starting at 1.
    pub version: i64,
    /// Opaque configuration, capped at [`validate::MAX_VERSION_CONFIG_BYTES`].
    pub config: serde_json::Value,
    /// Whether this is the endpoint's active revision.
    pub is_active: bool,
    /// Free-form change note.
    #[serde(default)]
    pub change_note: String,
    /// Creating actor.
    pub created_by: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MCP servers
// ---------------------------------------------------------------------------

/// Authentication scheme used to reach an external MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum McpAuthType {
    /// No credential.
    None,
    /// `Authorization: Bearer` token.
    Bearer,
    /// HTTP basic credentials.
    Basic,
    /// Custom header credential.
    Header,
}

/// Circuit-breaker settings for an external MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a half-open probe.
    pub reset_timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 60,
        }
    }
}

/// A registered external tool provider speaking MCP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpServer {
    /// Unique label.
    pub label: String,
    /// Server endpoint URL.
    pub url: String,
    /// Authentication scheme.
    pub auth_type: McpAuthType,
    /// Credential material. Never projected to any surface.
    #[serde(default)]
    pub auth_credential: String,
    /// Circuit-breaker settings.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Tool re-discovery interval.
    pub discovery_interval_secs: u64,
    /// Enable flag; delete is a soft flip to `false`.
    pub is_enabled: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last-update instant.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Trust & signal configuration
// ---------------------------------------------------------------------------

/// Action taken when a trust decision is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrustAction {
    /// Permit without asking.
    Allow,
    /// Refuse outright.
    Deny,
    /// Escalate to an interactive approval.
    Prompt,
}

/// Registry-wide trust defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustDefaults {
    /// Action applied when no rule matches.
    pub default_action: TrustAction,
    /// Whether MCP-sourced tools are trusted at all by default.
    pub allow_mcp_tools: bool,
    /// Last-update instant.
    pub updated_at: DateTime<Utc>,
    /// Last updating actor.
    pub updated_by: String,
}

/// A single trust rule matched against tool names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustRule {
    /// Rule key.
    pub id: Uuid,
    /// Tool-name pattern (exact name or `prefix*`).
    pub pattern: String,
    /// Action applied on match.
    pub action: TrustAction,
    /// Higher priorities are evaluated first.
    pub priority: i64,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Telemetry signal configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalConfig {
    /// Master switch.
    pub enabled: bool,
    /// Fraction of requests sampled, in `[0.0, 1.0]`.
    pub sample_rate: f64,
    /// Optional downstream collector URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_url: Option<String>,
    /// Last-update instant.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Model / context configuration
// ---------------------------------------------------------------------------

/// Model-selection configuration. Scoped: a global value plus optional
/// per-workspace overlays (see [`scope`]).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ModelConfig {
    /// Default model identifier.
    pub default_model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-call output token cap.
    pub max_tokens: i64,
    /// Maximum tool-call rounds per turn.
    pub max_tool_rounds: i64,
    /// Embedding model identifier.
    pub embedding_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 4096,
            max_tool_rounds: 8,
            embedding_model: "text-embedding-3-small".into(),
        }
    }
}

/// Context-window budget configuration. Scoped like [`ModelConfig`].
///
/// These fields are disjoint from [`ModelConfig`] — the two resources
/// partition cleanly and no field appears in both.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ContextConfig {
    /// Default context window in tokens.
    pub default_context_window: i64,
    /// Default output-token budget.
    pub default_max_output_tokens: i64,
    /// History budget in tokens.
    pub history_budget_tokens: i64,
    /// History budget in messages.
    pub history_budget_messages: i64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_context_window: 128_000,
            default_max_output_tokens: 8192,
            history_budget_tokens: 64_000,
            history_budget_messages: 200,
        }
    }
}

/// Which scope a configuration read targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigScope {
    /// The registry-wide value.
    Global,
    /// A per-workspace overlay merged over the global value.
    Workspace(String),
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Access role attached to a session or API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access.
    Viewer,
    /// Read-write on non-administrative resources.
    Editor,
    /// Full access.
    Admin,
}

impl Role {
    /// Parse a role string; unknown or empty strings yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Self::Viewer),
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns `true` if this role meets or exceeds `required`.
    #[must_use]
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Stable string tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque session token (cookie value).
    pub token: String,
    /// Owning user id.
    pub user_id: String,
    /// Granted role.
    pub role: Role,
    /// Double-submit CSRF token bound to the session.
    pub csrf_token: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// A service credential presented as `Authorization: Bearer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Prefixed opaque key string (`agr_…`).
    pub key: String,
    /// Owning user id.
    pub user_id: String,
    /// Granted role.
    pub role: Role,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Time helpers
// ---------------------------------------------------------------------------

/// Produce an update instant strictly after `prev`.
///
/// Wall clocks can stand still between two mutations of the same row; the
/// concurrency token must still advance, so the result is nudged forward by
/// one nanosecond when `now` has not moved past `prev`.
#[must_use]
pub fn next_instant(prev: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > prev { now } else { prev + Duration::nanoseconds(1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(nanos: i64) -> DateTime<Utc> {
        Utc.timestamp_nanos(nanos)
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Admin.at_least(Role::Editor));
        assert!(Role::Editor.at_least(Role::Viewer));
        assert!(!Role::Viewer.at_least(Role::Editor));
        assert!(Role::Viewer.at_least(Role::Viewer));
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("Admin"), None);
    }

    #[test]
    fn tool_source_serde_tags() {
        assert_eq!(
            serde_json::to_string(&ToolSource::Internal).unwrap(),
            "\"internal\""
        );
        assert_eq!(serde_json::to_string(&ToolSource::Mcp).unwrap(), "\"mcp\"");
    }

    #[test]
    fn prompt_mode_serde_tags() {
        assert_eq!(
            serde_json::to_string(&PromptMode::RagReadonly).unwrap(),
            "\"rag_readonly\""
        );
        assert_eq!(
            serde_json::to_string(&PromptMode::ToolcallingAuto).unwrap(),
            "\"toolcalling_auto\""
        );
    }

    #[test]
    fn next_instant_advances_past_stalled_clock() {
        let prev = t(1_000);
        assert_eq!(next_instant(prev, t(500)), t(1_001));
        assert_eq!(next_instant(prev, t(1_000)), t(1_001));
        assert_eq!(next_instant(prev, t(2_000)), t(2_000));
    }

    #[test]
    fn model_and_context_config_fields_partition() {
        let model = serde_json::to_value(ModelConfig::default()).unwrap();
        let context = serde_json::to_value(ContextConfig::default()).unwrap();
        let model_keys: Vec<&String> = model.as_object().unwrap().keys().collect();
        for key in context.as_object().unwrap().keys() {
            assert!(
                !model_keys.contains(&key),
                "field {key} appears in both configs"
            );
        }
    }

    #[test]
    fn agent_summary_drops_tools() {
        let agent = Agent {
            id: "billing_helper".into(),
            name: "Billing helper".into(),
            description: "answers billing questions".into(),
            tools: vec![Tool {
                name: "lookup_invoice".into(),
                source: ToolSource::Internal,
                server_label: String::new(),
                description: "fetch an invoice".into(),
            }],
            trust_overrides: serde_json::json!({}),
            example_prompts: vec!["What did I pay in May?".into()],
            is_active: true,
            version: 3,
            created_by: "ops".into(),
            created_at: t(1),
            updated_at: t(2),
        };
        let summary = agent.summary();
        assert_eq!(summary.id, "billing_helper");
        assert_eq!(summary.version, 3);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("trust_overrides").is_none());
    }
}
