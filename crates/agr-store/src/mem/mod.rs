// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory store implementation.
//!
//! Each resource family lives behind one `tokio::sync::RwLock`; every
//! mutation takes the write guard, which makes the etag re-check, the
//! snapshot append, the version increment, and the single-active swap one
//! atomic unit. No I/O happens under a lock.

mod agents;
mod configs;
mod endpoints;
mod prompts;
mod servers;

use agr_core::scope::{ContextConfigOverride, ModelConfigOverride};
use agr_core::{
    Agent, AgentVersion, ApiKey, ContextConfig, McpServer, ModelConfig, ModelEndpoint,
    ModelEndpointVersion, Prompt, Session, SignalConfig, TrustDefaults, TrustRule,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct AgentTable {
    pub items: HashMap<String, Agent>,
    pub history: HashMap<String, Vec<AgentVersion>>,
}

#[derive(Default)]
pub(crate) struct PromptTable {
    pub items: HashMap<Uuid, Prompt>,
    pub history: HashMap<Uuid, Vec<Prompt>>,
}

#[derive(Default)]
pub(crate) struct EndpointTable {
    pub items: HashMap<String, ModelEndpoint>,
    pub revisions: HashMap<String, Vec<ModelEndpointVersion>>,
}

#[derive(Default)]
pub(crate) struct TrustTable {
    pub defaults: Option<TrustDefaults>,
    pub rules: HashMap<Uuid, TrustRule>,
}

#[derive(Default)]
pub(crate) struct ConfigTable {
    pub model_global: Option<ModelConfig>,
    pub model_overrides: HashMap<String, ModelConfigOverride>,
    pub context_global: Option<ContextConfig>,
    pub context_overrides: HashMap<String, ContextConfigOverride>,
}

/// In-memory store backing every capability trait.
///
/// Suitable for tests and single-node deployments; a persistent
/// implementation replaces this struct without touching the handler tier.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) agents: RwLock<AgentTable>,
    pub(crate) prompts: RwLock<PromptTable>,
    pub(crate) endpoints: RwLock<EndpointTable>,
    pub(crate) servers: RwLock<HashMap<String, McpServer>>,
    pub(crate) trust: RwLock<TrustTable>,
    pub(crate) signal: RwLock<Option<SignalConfig>>,
    pub(crate) configs: RwLock<ConfigTable>,
    pub(crate) sessions: RwLock<HashMap<String, Session>>,
    pub(crate) api_keys: RwLock<HashMap<String, ApiKey>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
