// SPDX-License-Identifier: MIT OR Apache-2.0
//! Discovery snapshot composition.
//!
//! The snapshot fans out one read per participating store with
//! `tokio::try_join!` — the first failure drops the sibling futures and the
//! whole composition fails; partial snapshots are never produced. Each
//! component read is individually consistent; the aggregate makes no
//! global-snapshot claim.

use crate::contract::{
    AgentStore, ListQuery, McpServerStore, ModelEndpointStore, ScopedConfigStore, TrustStore,
};
use crate::StoreError;
use agr_core::redact::McpServerView;
use agr_core::{AgentSummary, EndpointMode, Provider, TrustDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A model endpoint as projected into the discovery snapshot: summary fields
/// plus the active revision number and its redacted config inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointView {
    /// Endpoint slug.
    pub slug: String,
    /// Provider family.
    pub provider: Provider,
    /// Endpoint base URL.
    pub url: String,
    /// Fixed vs flexible model selection.
    pub mode: EndpointMode,
    /// Pinned model, when fixed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Model allowlist, when flexible.
    #[serde(default)]
    pub allowed_models: Vec<String>,
    /// Workspace scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Active revision number, if any revision is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_version: Option<i64>,
    /// Redacted config of the active revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// The composed discovery snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySnapshot {
    /// Active agents, summary view (no tools).
    pub agents: Vec<AgentSummary>,
    /// Registered MCP servers, credentials stripped.
    pub mcp_servers: Vec<McpServerView>,
    /// Trust defaults, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_defaults: Option<TrustDefaults>,
    /// Global model config, `{}` when unset.
    pub model_config: Value,
    /// Active model endpoints with their active revisions.
    pub model_endpoints: Vec<EndpointView>,
}

/// Compose a discovery snapshot from the participating stores.
///
/// # Errors
///
/// Returns the first [`StoreError`] any component read produced; siblings
/// are cancelled at their next suspension point.
pub async fn compose_discovery(
    agents: &dyn AgentStore,
    servers: &dyn McpServerStore,
    trust: &dyn TrustStore,
    configs: &dyn ScopedConfigStore,
    endpoints: &dyn ModelEndpointStore,
) -> Result<DiscoverySnapshot, StoreError> {
    let agent_query = ListQuery {
        active_only: true,
        q: None,
        offset: 0,
        limit: usize::MAX,
    };
    let endpoint_query = ListQuery {
        active_only: true,
        q: None,
        offset: 0,
        limit: usize::MAX,
    };

    let (agent_page, server_list, trust_defaults, model_config, endpoint_page) = tokio::try_join!(
        agents.list(&agent_query),
        servers.list(),
        trust.get_defaults(),
        configs.model_global(),
        endpoints.list(&endpoint_query),
    )?;

    let mut endpoint_views = Vec::with_capacity(endpoint_page.items.len());
    for endpoint in &endpoint_page.items {
        let active = endpoints.active_version(&endpoint.slug).await?;
        endpoint_views.push(EndpointView {
            slug: endpoint.slug.clone(),
            provider: endpoint.provider,
            url: endpoint.url.clone(),
            mode: endpoint.mode,
            model_name: endpoint.model_name.clone(),
            allowed_models: endpoint.allowed_models.clone(),
            workspace_id: endpoint.workspace_id.clone(),
            active_version: active.as_ref().map(|r| r.version),
            config: active.map(|r| r.config),
        });
    }

    Ok(DiscoverySnapshot {
        agents: agent_page.items.iter().map(|a| a.summary()).collect(),
        mcp_servers: server_list.iter().map(McpServerView::from).collect(),
        trust_defaults,
        model_config: model_config
            .map(|c| serde_json::to_value(c).unwrap_or_else(|_| serde_json::json!({})))
            .unwrap_or_else(|| serde_json::json!({})),
        model_endpoints: endpoint_views,
    })
}
