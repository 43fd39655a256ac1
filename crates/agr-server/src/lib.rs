// SPDX-License-Identifier: MIT OR Apache-2.0
//! agr-server
#![deny(unsafe_code)]
//!
//! The HTTP control plane: one axum application exposing the versioned REST
//! management API, the public A2A discovery surface, and the MCP JSON-RPC
//! endpoint, all over the same store objects.

/// Response envelope helpers.
pub mod envelope;
/// Route handlers grouped by resource.
pub mod handlers;
/// Mutation bookkeeping: If-Match parsing, audit, events.
pub mod lifecycle;
/// Middleware chain.
pub mod middleware;

use agr_auth::RateLimiter;
use agr_config::RegistryConfig;
use agr_events::{AuditSink, EventBus, MemoryAuditSink};
use agr_mcp::service::McpStores;
use agr_mcp::{McpServerInfo, McpService};
use agr_store::{
    AgentStore, ApiKeyStore, McpServerStore, MemoryStore, ModelEndpointStore, PromptStore,
    ScopedConfigStore, SessionStore, SignalConfigStore, TrustStore,
};
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

/// Everything the handler tier needs, cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Agent store.
    pub agents: Arc<dyn AgentStore>,
    /// Prompt store.
    pub prompts: Arc<dyn PromptStore>,
    /// Model-endpoint store.
    pub endpoints: Arc<dyn ModelEndpointStore>,
    /// MCP-server store.
    pub servers: Arc<dyn McpServerStore>,
    /// Trust store.
    pub trust: Arc<dyn TrustStore>,
    /// Signal-config store.
    pub signal: Arc<dyn SignalConfigStore>,
    /// Scoped-config store.
    pub configs: Arc<dyn ScopedConfigStore>,
    /// Session lookup.
    pub sessions: Arc<dyn SessionStore>,
    /// API-key lookup.
    pub api_keys: Arc<dyn ApiKeyStore>,
    /// Audit destination.
    pub audit: Arc<dyn AuditSink>,
    /// Change-event bus.
    pub events: EventBus,
    /// Shared rate limiter.
    pub limiter: RateLimiter,
    /// MCP dispatcher.
    pub mcp: Arc<McpService>,
    /// Server configuration.
    pub config: Arc<RegistryConfig>,
}

impl AppState {
    /// Wire up application state over one in-memory store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, config: RegistryConfig) -> Self {
        let audit: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
        Self::with_audit(store, config, audit)
    }

    /// Wire up application state with an explicit audit sink.
    #[must_use]
    pub fn with_audit(
        store: Arc<MemoryStore>,
        config: RegistryConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let mcp = Arc::new(McpService::new(
            McpStores {
                agents: store.clone(),
                prompts: store.clone(),
                endpoints: store.clone(),
                servers: store.clone(),
                trust: store.clone(),
                configs: store.clone(),
            },
            McpServerInfo {
                name: "agent-registry".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                description: "Agent registry and multi-protocol control plane".into(),
                external_url: config.external_url.clone(),
            },
        ));
        Self {
            agents: store.clone(),
            prompts: store.clone(),
            endpoints: store.clone(),
            servers: store.clone(),
            trust: store.clone(),
            signal: store.clone(),
            configs: store.clone(),
            sessions: store.clone(),
            api_keys: store,
            audit,
            events: EventBus::new(),
            limiter: RateLimiter::new(),
            mcp,
            config: Arc::new(config),
        }
    }
}

/// Build the full application router with the complete middleware chain.
#[must_use]
pub fn build_app(state: AppState) -> Router {
    // Protected management surface. Auth runs before the rate limiter so
    // budgets are keyed by resolved identity.
    let api = Router::new()
        // The literal a2a-index segment must win over `{id}`.
        .route("/agents/a2a-index", get(handlers::agents::a2a_index))
        .route(
            "/agents",
            get(handlers::agents::list).post(handlers::agents::create),
        )
        .route(
            "/agents/{id}",
            get(handlers::agents::get_one)
                .put(handlers::agents::update)
                .patch(handlers::agents::patch)
                .delete(handlers::agents::delete_one),
        )
        .route("/agents/{id}/rollback", post(handlers::agents::rollback))
        .route("/agents/{id}/versions", get(handlers::agents::versions))
        .route(
            "/agents/{id}/versions/{version}",
            get(handlers::agents::version),
        )
        .route("/agents/{id}/agent-card", get(handlers::agents::agent_card))
        .route(
            "/agents/{id}/prompts",
            get(handlers::prompts::list).post(handlers::prompts::create),
        )
        .route(
            "/agents/{id}/prompts/active",
            get(handlers::prompts::active),
        )
        .route(
            "/agents/{id}/prompts/rollback",
            post(handlers::prompts::rollback),
        )
        .route("/agents/{id}/prompts/{pid}", get(handlers::prompts::get_one))
        .route(
            "/agents/{id}/prompts/{pid}/activate",
            post(handlers::prompts::activate),
        )
        .route(
            "/model-endpoints",
            get(handlers::endpoints::list).post(handlers::endpoints::create),
        )
        .route(
            "/model-endpoints/{slug}",
            get(handlers::endpoints::get_one)
                .put(handlers::endpoints::update)
                .delete(handlers::endpoints::delete_one),
        )
        .route(
            "/model-endpoints/{slug}/versions",
            get(handlers::endpoints::versions).post(handlers::endpoints::create_version),
        )
        .route(
            "/model-endpoints/{slug}/versions/{version}",
            get(handlers::endpoints::version),
        )
        .route(
            "/model-endpoints/{slug}/versions/{version}/activate",
            post(handlers::endpoints::activate_version),
        )
        .route(
            "/mcp-servers",
            get(handlers::servers::list).post(handlers::servers::create),
        )
        .route(
            "/mcp-servers/{label}",
            get(handlers::servers::get_one)
                .put(handlers::servers::update)
                .delete(handlers::servers::delete_one),
        )
        .route(
            "/trust-defaults",
            get(handlers::trust::get_defaults).put(handlers::trust::put_defaults),
        )
        .route(
            "/trust-rules",
            get(handlers::trust::list_rules).post(handlers::trust::create_rule),
        )
        .route("/trust-rules/{id}", delete(handlers::trust::delete_rule))
        .route(
            "/signal-config",
            get(handlers::trust::get_signal).put(handlers::trust::put_signal),
        )
        .route(
            "/model-config",
            get(handlers::configs::get_model).put(handlers::configs::put_model),
        )
        .route(
            "/workspaces/{wid}/model-config",
            get(handlers::configs::get_workspace_model)
                .put(handlers::configs::put_workspace_model),
        )
        .route(
            "/context-config",
            get(handlers::configs::get_context).put(handlers::configs::put_context),
        )
        .route(
            "/workspaces/{wid}/context-config",
            get(handlers::configs::get_workspace_context)
                .put(handlers::configs::put_workspace_context),
        )
        .route("/discovery", get(handlers::discovery::snapshot))
        .route("/audit-log", get(handlers::audit::list))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::authenticate));

    // MCP transport: bearer-authenticated, same body cap, no CSRF (the
    // surface is for service credentials).
    let mcp = Router::new()
        .route(
            "/mcp",
            post(handlers::mcp::rpc)
                .delete(handlers::mcp::end_session)
                .get(handlers::mcp::method_not_allowed),
        )
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::authenticate));

    // Public surface: no auth, no rate limit. The well-known route is
    // mounted here, ahead of any fallback, so it always resolves.
    let public = Router::new()
        .route("/healthz", get(handlers::public::healthz))
        .route("/readyz", get(handlers::public::readyz))
        .route("/.well-known/agent.json", get(handlers::public::well_known))
        .route("/mcp.json", get(handlers::public::manifest));

    Router::new()
        .nest("/api/v1", api)
        .merge(mcp)
        .merge(public)
        .layer(DefaultBodyLimit::max(agr_core::validate::MAX_BODY_BYTES))
        .layer(from_fn(middleware::body_cap))
        .layer(from_fn(middleware::security_headers))
        .layer(middleware::cors_layer())
        .layer(from_fn(middleware::recover))
        .layer(from_fn(middleware::access_log))
        .layer(from_fn(middleware::real_ip))
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}
