// SPDX-License-Identifier: MIT OR Apache-2.0
//! Store capability traits and mutation input types.
//!
//! Handlers depend on the narrowest trait that covers their route group,
//! which keeps test doubles small. Every mutation that takes an `etag`
//! re-checks it under the store's own lock — the handler-level check is a
//! fast path, the store check is authoritative.

use crate::patch::AgentPatch;
use crate::StoreError;
use agr_core::page::Page;
use agr_core::scope::{ContextConfigOverride, ModelConfigOverride};
use agr_core::{
    Agent, AgentVersion, ApiKey, ContextConfig, EndpointMode, McpAuthType, McpServer,
    ModelConfig, ModelEndpoint, ModelEndpointVersion, Prompt, PromptMode, Provider, Session,
    SignalConfig, TrustDefaults, TrustRule,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// List queries
// ---------------------------------------------------------------------------

/// Filter + window for list operations.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Exclude soft-deleted rows. Defaults to `true` at the surface layer.
    pub active_only: bool,
    /// Case-insensitive match against name/description, when supported.
    pub q: Option<String>,
    /// Items to skip.
    pub offset: usize,
    /// Items to return.
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Input for creating an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAgent {
    /// Slug identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Ordered tool list.
    #[serde(default)]
    pub tools: Vec<agr_core::Tool>,
    /// Opaque trust overrides.
    #[serde(default)]
    pub trust_overrides: Value,
    /// Example prompts.
    #[serde(default)]
    pub example_prompts: Vec<String>,
}

/// Input for a full (`PUT`) agent update. Missing fields reset to their
/// defaults; identity, audit fields, and the version counter are preserved
/// by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentUpdate {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Ordered tool list.
    #[serde(default)]
    pub tools: Vec<agr_core::Tool>,
    /// Opaque trust overrides.
    #[serde(default)]
    pub trust_overrides: Value,
    /// Example prompts.
    #[serde(default)]
    pub example_prompts: Vec<String>,
}

/// Agent lifecycle capabilities.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// List agents matching `query`, with the pre-window total.
    async fn list(&self, query: &ListQuery) -> Result<Page<Agent>, StoreError>;

    /// Fetch one agent, soft-deleted or not.
    async fn get(&self, id: &str) -> Result<Agent, StoreError>;

    /// Create an agent. Duplicate slugs fail with [`StoreError::Conflict`].
    async fn create(&self, input: NewAgent, actor: &str) -> Result<Agent, StoreError>;

    /// Replace the mutable fields. `etag` must equal the current
    /// `updated_at`; a pre-mutation snapshot is appended and `version`
    /// increments by one.
    async fn update(
        &self,
        id: &str,
        input: AgentUpdate,
        etag: DateTime<Utc>,
        actor: &str,
    ) -> Result<Agent, StoreError>;

    /// Apply a typed partial update under the same contract as `update`.
    async fn patch(
        &self,
        id: &str,
        patch: AgentPatch,
        etag: DateTime<Utc>,
        actor: &str,
    ) -> Result<Agent, StoreError>;

    /// Soft delete: flips `is_active` to `false`, preserving history.
    async fn delete(&self, id: &str, actor: &str) -> Result<Agent, StoreError>;

    /// Full snapshot history, oldest first.
    async fn list_versions(&self, id: &str) -> Result<Vec<AgentVersion>, StoreError>;

    /// One snapshot by version number.
    async fn get_version(&self, id: &str, version: i64) -> Result<AgentVersion, StoreError>;

    /// Materialize snapshot `version` as the new latest version.
    ///
    /// History is append-only; `created_by` of the resulting row is `actor`
    /// and the entity's `created_at` is preserved.
    async fn rollback(&self, id: &str, version: i64, actor: &str) -> Result<Agent, StoreError>;
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Input for creating a prompt under an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrompt {
    /// System prompt text.
    pub system_prompt: String,
    /// Declared template variables.
    #[serde(default)]
    pub template_variables: Value,
    /// Authoring mode.
    pub mode: PromptMode,
}

/// Prompt lifecycle capabilities, always scoped to an agent slug.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// All prompts for an agent, oldest first.
    async fn list(&self, agent_id: &str) -> Result<Vec<Prompt>, StoreError>;

    /// One prompt by id.
    async fn get(&self, agent_id: &str, prompt_id: Uuid) -> Result<Prompt, StoreError>;

    /// The agent's active prompt, if any.
    async fn get_active(&self, agent_id: &str) -> Result<Option<Prompt>, StoreError>;

    /// Create a prompt (inactive until activated).
    async fn create(
        &self,
        agent_id: &str,
        input: NewPrompt,
        actor: &str,
    ) -> Result<Prompt, StoreError>;

    /// Atomically make `prompt_id` the agent's single active prompt.
    async fn activate(&self, agent_id: &str, prompt_id: Uuid) -> Result<Prompt, StoreError>;

    /// Materialize snapshot `version` of `prompt_id` as its new latest
    /// version.
    async fn rollback(
        &self,
        agent_id: &str,
        prompt_id: Uuid,
        version: i64,
        actor: &str,
    ) -> Result<Prompt, StoreError>;

    /// Snapshot history of one prompt, oldest first.
    async fn list_versions(&self, agent_id: &str, prompt_id: Uuid)
        -> Result<Vec<Prompt>, StoreError>;
}

// ---------------------------------------------------------------------------
// Model endpoints
// ---------------------------------------------------------------------------

/// Input for registering a model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModelEndpoint {
    /// Stable slug.
    pub slug: String,
    /// Provider family.
    pub provider: Provider,
    /// Endpoint base URL.
    pub url: String,
    /// Fixed vs flexible model selection.
    pub mode: EndpointMode,
    /// Pinned model for fixed endpoints.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Allowlist for flexible endpoints.
    #[serde(default)]
    pub allowed_models: Vec<String>,
    /// Optional workspace scope.
    #[serde(default)]
    pub workspace_id: Option<String>,
}

/// Input for appending an endpoint configuration revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEndpointVersion {
    /// Opaque configuration blob.
    pub config: Value,
    /// Free-form change note.
    #[serde(default)]
    pub change_note: String,
}

/// Model-endpoint lifecycle capabilities.
#[async_trait]
pub trait ModelEndpointStore: Send + Sync {
    /// List endpoints.
    async fn list(&self, query: &ListQuery) -> Result<Page<ModelEndpoint>, StoreError>;

    /// One endpoint by slug.
    async fn get(&self, slug: &str) -> Result<ModelEndpoint, StoreError>;

    /// Register an endpoint. Duplicate slugs conflict.
    async fn create(&self, input: NewModelEndpoint, actor: &str)
        -> Result<ModelEndpoint, StoreError>;

    /// Replace the mutable endpoint fields under the etag contract.
    async fn update(
        &self,
        slug: &str,
        input: NewModelEndpoint,
        etag: DateTime<Utc>,
    ) -> Result<ModelEndpoint, StoreError>;

    /// Soft delete.
    async fn delete(&self, slug: &str) -> Result<ModelEndpoint, StoreError>;

    /// Configuration revisions, oldest first, headers redacted.
    async fn list_versions(&self, slug: &str) -> Result<Vec<ModelEndpointVersion>, StoreError>;

    /// One revision, headers redacted.
    async fn get_version(
        &self,
        slug: &str,
        version: i64,
    ) -> Result<ModelEndpointVersion, StoreError>;

    /// Append a revision. The version number auto-increments within the
    /// endpoint and the new revision atomically becomes the active one.
    async fn create_version(
        &self,
        slug: &str,
        input: NewEndpointVersion,
        actor: &str,
    ) -> Result<ModelEndpointVersion, StoreError>;

    /// Atomically make `version` the endpoint's single active revision.
    async fn activate_version(
        &self,
        slug: &str,
        version: i64,
    ) -> Result<ModelEndpointVersion, StoreError>;

    /// Active revision number per endpoint slug, for discovery projection.
    async fn active_version(&self, slug: &str)
        -> Result<Option<ModelEndpointVersion>, StoreError>;
}

// ---------------------------------------------------------------------------
// MCP servers
// ---------------------------------------------------------------------------

/// Input for registering an external MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMcpServer {
    /// Unique label.
    pub label: String,
    /// Server endpoint URL.
    pub url: String,
    /// Authentication scheme.
    pub auth_type: McpAuthType,
    /// Credential material.
    #[serde(default)]
    pub auth_credential: String,
    /// Circuit-breaker settings.
    #[serde(default)]
    pub circuit_breaker: agr_core::CircuitBreakerConfig,
    /// Tool re-discovery interval.
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_secs: u64,
}

fn default_discovery_interval() -> u64 {
    300
}

/// Input for a full (`PUT`) MCP-server update. Missing fields reset to
/// their defaults, mirroring the other resources' replacement semantics;
/// the label, enable flag, and creation instant are preserved by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerUpdate {
    /// Server endpoint URL.
    pub url: String,
    /// Authentication scheme.
    pub auth_type: McpAuthType,
    /// Credential material.
    #[serde(default)]
    pub auth_credential: String,
    /// Circuit-breaker settings.
    #[serde(default)]
    pub circuit_breaker: agr_core::CircuitBreakerConfig,
    /// Tool re-discovery interval.
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_secs: u64,
}

/// MCP-server registry capabilities.
#[async_trait]
pub trait McpServerStore: Send + Sync {
    /// All registered servers.
    async fn list(&self) -> Result<Vec<McpServer>, StoreError>;

    /// One server by label.
    async fn get(&self, label: &str) -> Result<McpServer, StoreError>;

    /// Register a server. Duplicate labels conflict.
    async fn create(&self, input: NewMcpServer) -> Result<McpServer, StoreError>;

    /// Replace the mutable fields under the etag contract.
    async fn update(
        &self,
        label: &str,
        input: McpServerUpdate,
        etag: DateTime<Utc>,
    ) -> Result<McpServer, StoreError>;

    /// Soft delete: flips `is_enabled` to `false`.
    async fn delete(&self, label: &str) -> Result<McpServer, StoreError>;
}

// ---------------------------------------------------------------------------
// Trust / signal / scoped configs
// ---------------------------------------------------------------------------

/// Trust configuration capabilities.
#[async_trait]
pub trait TrustStore: Send + Sync {
    /// Current trust defaults, if configured.
    async fn get_defaults(&self) -> Result<Option<TrustDefaults>, StoreError>;

    /// Replace trust defaults.
    async fn put_defaults(&self, defaults: TrustDefaults) -> Result<TrustDefaults, StoreError>;

    /// All rules, highest priority first.
    async fn list_rules(&self) -> Result<Vec<TrustRule>, StoreError>;

    /// Add a rule.
    async fn create_rule(&self, rule: TrustRule) -> Result<TrustRule, StoreError>;

    /// Remove a rule.
    async fn delete_rule(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Signal-config capabilities.
#[async_trait]
pub trait SignalConfigStore: Send + Sync {
    /// Current signal config, if configured.
    async fn get(&self) -> Result<Option<SignalConfig>, StoreError>;

    /// Replace the signal config.
    async fn put(&self, config: SignalConfig) -> Result<SignalConfig, StoreError>;
}

/// Scoped model/context configuration capabilities.
#[async_trait]
pub trait ScopedConfigStore: Send + Sync {
    /// Global model config, if set.
    async fn model_global(&self) -> Result<Option<ModelConfig>, StoreError>;

    /// Effective model config for a workspace (overlay merged over global).
    async fn model_effective(&self, workspace_id: &str)
        -> Result<Option<ModelConfig>, StoreError>;

    /// Replace the global model config.
    async fn put_model_global(&self, config: ModelConfig) -> Result<ModelConfig, StoreError>;

    /// Replace a workspace overlay.
    async fn put_model_override(
        &self,
        workspace_id: &str,
        overlay: ModelConfigOverride,
    ) -> Result<ModelConfigOverride, StoreError>;

    /// Global context config, if set.
    async fn context_global(&self) -> Result<Option<ContextConfig>, StoreError>;

    /// Effective context config for a workspace.
    async fn context_effective(
        &self,
        workspace_id: &str,
    ) -> Result<Option<ContextConfig>, StoreError>;

    /// Replace the global context config.
    async fn put_context_global(&self, config: ContextConfig)
        -> Result<ContextConfig, StoreError>;

    /// Replace a workspace context overlay.
    async fn put_context_override(
        &self,
        workspace_id: &str,
        overlay: ContextConfigOverride,
    ) -> Result<ContextConfigOverride, StoreError>;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Session lookup used by the auth pipeline.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a session token.
    async fn get(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Insert a session (login flows and tests).
    async fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Drop a session.
    async fn remove(&self, token: &str) -> Result<(), StoreError>;
}

/// API-key lookup used by the auth pipeline.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Resolve a bearer key.
    async fn get(&self, key: &str) -> Result<Option<ApiKey>, StoreError>;

    /// Insert a key (provisioning flows and tests).
    async fn insert(&self, key: ApiKey) -> Result<(), StoreError>;
}
