// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-RPC method dispatch.
//!
//! [`McpService::handle`] takes a raw request body and produces zero, one,
//! or many response values plus an optional fresh session id (set only when
//! the body contained an `initialize`). Batches preserve request order and
//! skip notifications; an empty batch is itself a protocol error.

use crate::jsonrpc::{
    error_response, parse_request, result_response, ParsedRequest, RpcError, INVALID_PARAMS,
};
use crate::prompts::{arguments_from_variables, get_result, substitute};
use crate::resources::{read_result, resource_templates, ResourceUri};
use crate::session::McpSessionStore;
use crate::tools::{
    tool_definitions, GetAgentParams, GetModelConfigParams, ListAgentsParams, ToolResult,
    LIST_AGENTS_DEFAULT_LIMIT, LIST_AGENTS_MAX_LIMIT,
};
use crate::MCP_PROTOCOL_VERSION;
use agr_core::page::PageParams;
use agr_core::redact::McpServerView;
use agr_store::{
    compose_discovery, AgentStore, ListQuery, McpServerStore, ModelEndpointStore, PromptStore,
    ScopedConfigStore, StoreError, TrustStore,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Service wiring
// ---------------------------------------------------------------------------

/// Server identity reported by `initialize` and the manifest.
#[derive(Debug, Clone)]
pub struct McpServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Externally visible base URL.
    pub external_url: String,
}

/// Store handles the MCP surface reads from. These are the same objects the
/// REST handlers hold, which is what guarantees identical observable data.
#[derive(Clone)]
pub struct McpStores {
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
    /// Scoped-config store.
    pub configs: Arc<dyn ScopedConfigStore>,
}

/// The response bodies produced for one request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// Nothing to send (the body was all notifications).
    None,
    /// A single response object.
    Single(Value),
    /// A batch response, in request order.
    Batch(Vec<Value>),
}

/// Dispatch result: the response(s) plus a session id when one was created.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// Response bodies.
    pub outcome: RpcOutcome,
    /// Fresh session id from an `initialize` in this body.
    pub session_id: Option<String>,
}

/// The MCP method dispatcher.
#[derive(Clone)]
pub struct McpService {
    stores: McpStores,
    sessions: McpSessionStore,
    info: McpServerInfo,
}

impl McpService {
    /// Wire up a service over the given stores.
    #[must_use]
    pub fn new(stores: McpStores, info: McpServerInfo) -> Self {
        Self {
            stores,
            sessions: McpSessionStore::new(),
            info,
        }
    }

    /// The session store, for transport-level teardown.
    #[must_use]
    pub fn sessions(&self) -> &McpSessionStore {
        &self.sessions
    }

    /// Server identity, for the manifest route.
    #[must_use]
    pub fn info(&self) -> &McpServerInfo {
        &self.info
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Handle a raw request body.
    pub async fn handle(&self, body: &[u8]) -> DispatchResult {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(_) => {
                return DispatchResult {
                    outcome: RpcOutcome::Single(error_response(
                        Value::Null,
                        RpcError::parse_error(),
                    )),
                    session_id: None,
                };
            }
        };

        match value {
            Value::Array(elements) => {
                if elements.is_empty() {
                    return DispatchResult {
                        outcome: RpcOutcome::Single(error_response(
                            Value::Null,
                            RpcError::invalid_request("empty batch"),
                        )),
                        session_id: None,
                    };
                }
                let mut responses = Vec::new();
                let mut session_id = None;
                for element in &elements {
                    let (response, session) = self.handle_value(element).await;
                    if let Some(response) = response {
                        responses.push(response);
                    }
                    if session.is_some() {
                        session_id = session;
                    }
                }
                let outcome = if responses.is_empty() {
                    RpcOutcome::None
                } else {
                    RpcOutcome::Batch(responses)
                };
                DispatchResult {
                    outcome,
                    session_id,
                }
            }
            other => {
                let (response, session_id) = self.handle_value(&other).await;
                DispatchResult {
                    outcome: response.map_or(RpcOutcome::None, RpcOutcome::Single),
                    session_id,
                }
            }
        }
    }

    async fn handle_value(&self, value: &Value) -> (Option<Value>, Option<String>) {
        let request = match parse_request(value) {
            ParsedRequest::Ok(request) => request,
            ParsedRequest::Err { id, error } => {
                return (Some(error_response(id, error)), None);
            }
        };

        let is_notification = request.id.is_none();
        let mut session_id = None;

        let result = match request.method.as_str() {
            "initialize" => {
                let (result, session) = self.initialize(&request.params).await;
                session_id = Some(session);
                Ok(result)
            }
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": tool_definitions()})),
            "tools/call" => self.call_tool(&request.params).await,
            "resources/list" => self.list_resources().await,
            "resources/read" => self.read_resource(&request.params).await,
            "resources/templates/list" => Ok(resource_templates()),
            "prompts/list" => self.list_prompts().await,
            "prompts/get" => self.get_prompt(&request.params).await,
            other => Err(RpcError::method_not_found(other)),
        };

        if is_notification {
            // Notifications never get a response, success or failure.
            return (None, session_id);
        }

        let id = request.id.unwrap_or(Value::Null);
        let response = match result {
            Ok(result) => result_response(id, result),
            Err(error) => error_response(id, error),
        };
        (Some(response), session_id)
    }

    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    async fn initialize(&self, params: &Value) -> (Value, String) {
        let requested_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(MCP_PROTOCOL_VERSION)
            .to_string();
        let client_info = params.get("clientInfo").cloned().unwrap_or(Value::Null);
        let session = self.sessions.create(requested_version, client_info).await;
        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "serverInfo": {"name": self.info.name, "version": self.info.version},
            "capabilities": {"tools": {}, "resources": {}, "prompts": {}}
        });
        (result, session.id)
    }

    // -----------------------------------------------------------------------
    // Tools
    // -----------------------------------------------------------------------

    async fn call_tool(&self, params: &Value) -> Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing tool name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = match name {
            "list_agents" => {
                let parsed: ListAgentsParams = serde_json::from_value(arguments)
                    .map_err(|e| RpcError::invalid_params(format!("bad arguments: {e}")))?;
                self.tool_list_agents(parsed).await
            }
            "get_agent" => {
                let parsed: GetAgentParams = serde_json::from_value(arguments)
                    .map_err(|e| RpcError::invalid_params(format!("bad arguments: {e}")))?;
                self.tool_get_agent(&parsed.agent_id).await
            }
            "get_discovery" => self.tool_get_discovery().await,
            "list_mcp_servers" => self.tool_list_mcp_servers().await,
            "get_model_config" => {
                let parsed: GetModelConfigParams = serde_json::from_value(arguments)
                    .map_err(|e| RpcError::invalid_params(format!("bad arguments: {e}")))?;
                self.tool_get_model_config(parsed).await?
            }
            other => {
                return Err(RpcError::new(
                    INVALID_PARAMS,
                    format!("unknown tool: {other}"),
                ));
            }
        };

        serde_json::to_value(&result).map_err(|_| RpcError::internal())
    }

    async fn tool_list_agents(&self, params: ListAgentsParams) -> ToolResult {
        let page = PageParams::from_raw_capped(
            None,
            params.limit,
            LIST_AGENTS_DEFAULT_LIMIT,
            LIST_AGENTS_MAX_LIMIT,
        );
        let query = ListQuery {
            active_only: params.active_only.unwrap_or(true),
            q: None,
            offset: page.offset,
            limit: page.limit,
        };
        match self.stores.agents.list(&query).await {
            Ok(page) => {
                let summaries: Vec<_> = page.items.iter().map(|a| a.summary()).collect();
                ToolResult::json(&json!({"agents": summaries, "total": page.total}))
            }
            Err(err) => tool_error(err),
        }
    }

    async fn tool_get_agent(&self, agent_id: &str) -> ToolResult {
        let agent = match self.stores.agents.get(agent_id).await {
            Ok(agent) => agent,
            Err(err) => return tool_error(err),
        };
        let active_prompt = match self.stores.prompts.get_active(agent_id).await {
            Ok(prompt) => prompt,
            Err(err) => return tool_error(err),
        };
        let mut payload = serde_json::to_value(&agent).unwrap_or(Value::Null);
        if let Some(obj) = payload.as_object_mut() {
            obj.insert(
                "active_prompt".into(),
                serde_json::to_value(&active_prompt).unwrap_or(Value::Null),
            );
        }
        ToolResult::json(&payload)
    }

    async fn tool_get_discovery(&self) -> ToolResult {
        match compose_discovery(
            self.stores.agents.as_ref(),
            self.stores.servers.as_ref(),
            self.stores.trust.as_ref(),
            self.stores.configs.as_ref(),
            self.stores.endpoints.as_ref(),
        )
        .await
        {
            Ok(snapshot) => ToolResult::json(&snapshot),
            Err(err) => tool_error(err),
        }
    }

    async fn tool_list_mcp_servers(&self) -> ToolResult {
        match self.stores.servers.list().await {
            Ok(servers) => {
                let views: Vec<McpServerView> = servers.iter().map(McpServerView::from).collect();
                ToolResult::json(&json!({"servers": views}))
            }
            Err(err) => tool_error(err),
        }
    }

    async fn tool_get_model_config(
        &self,
        params: GetModelConfigParams,
    ) -> Result<ToolResult, RpcError> {
        let config = match params.scope.as_deref() {
            None | Some("global") => self.stores.configs.model_global().await,
            Some("workspace") => {
                let workspace_id = params.workspace_id.as_deref().ok_or_else(|| {
                    RpcError::invalid_params("workspace scope requires workspace_id")
                })?;
                self.stores.configs.model_effective(workspace_id).await
            }
            Some(other) => {
                return Err(RpcError::invalid_params(format!("unknown scope '{other}'")));
            }
        };
        Ok(match config {
            Ok(Some(config)) => ToolResult::json(&config),
            Ok(None) => ToolResult::json(&json!({})),
            Err(err) => tool_error(err),
        })
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    async fn list_resources(&self) -> Result<Value, RpcError> {
        let agents = self
            .stores
            .agents
            .list(&ListQuery {
                active_only: true,
                q: None,
                offset: 0,
                limit: usize::MAX,
            })
            .await
            .map_err(|_| RpcError::internal())?;

        let mut resources = Vec::with_capacity(agents.items.len() * 2 + 2);
        for agent in &agents.items {
            resources.push(json!({
                "uri": format!("agent://{}", agent.id),
                "name": agent.name,
                "description": agent.description,
                "mimeType": "application/json"
            }));
        }
        for agent in &agents.items {
            resources.push(json!({
                "uri": format!("prompt://{}/active", agent.id),
                "name": format!("Active prompt of {}", agent.name),
                "mimeType": "application/json"
            }));
        }
        resources.push(json!({
            "uri": "config://model",
            "name": "Model configuration",
            "mimeType": "application/json"
        }));
        resources.push(json!({
            "uri": "config://context",
            "name": "Context configuration",
            "mimeType": "application/json"
        }));
        Ok(json!({"resources": resources}))
    }

    async fn read_resource(&self, params: &Value) -> Result<Value, RpcError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing uri"))?;
        let parsed = ResourceUri::parse(uri)
            .ok_or_else(|| RpcError::invalid_params(format!("malformed resource uri: {uri}")))?;

        let payload = match &parsed {
            ResourceUri::Agent(slug) => {
                let agent = self
                    .stores
                    .agents
                    .get(slug)
                    .await
                    .map_err(|e| unknown_resource(uri, e))?;
                serde_json::to_value(&agent).map_err(|_| RpcError::internal())?
            }
            ResourceUri::ActivePrompt(slug) => {
                self.stores
                    .agents
                    .get(slug)
                    .await
                    .map_err(|e| unknown_resource(uri, e))?;
                let prompt = self
                    .stores
                    .prompts
                    .get_active(slug)
                    .await
                    .map_err(|_| RpcError::internal())?;
                json!({
                    "agent_id": slug,
                    "active_prompt": serde_json::to_value(&prompt).unwrap_or(Value::Null)
                })
            }
            ResourceUri::ModelConfig => {
                let config = self
                    .stores
                    .configs
                    .model_global()
                    .await
                    .map_err(|_| RpcError::internal())?;
                config
                    .map(|c| serde_json::to_value(c).unwrap_or_else(|_| json!({})))
                    .unwrap_or_else(|| json!({}))
            }
            ResourceUri::ContextConfig => {
                let config = self
                    .stores
                    .configs
                    .context_global()
                    .await
                    .map_err(|_| RpcError::internal())?;
                config
                    .map(|c| serde_json::to_value(c).unwrap_or_else(|_| json!({})))
                    .unwrap_or_else(|| json!({}))
            }
        };

        Ok(read_result(uri, &payload))
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    async fn list_prompts(&self) -> Result<Value, RpcError> {
        let agents = self
            .stores
            .agents
            .list(&ListQuery {
                active_only: true,
                q: None,
                offset: 0,
                limit: usize::MAX,
            })
            .await
            .map_err(|_| RpcError::internal())?;

        let mut prompts = Vec::with_capacity(agents.items.len());
        for agent in &agents.items {
            let active = self
                .stores
                .prompts
                .get_active(&agent.id)
                .await
                .map_err(|_| RpcError::internal())?;
            let arguments = active
                .as_ref()
                .map(|p| arguments_from_variables(&p.template_variables))
                .unwrap_or_default();
            prompts.push(json!({
                "name": agent.id,
                "description": agent.description,
                "arguments": arguments
            }));
        }
        Ok(json!({"prompts": prompts}))
    }

    async fn get_prompt(&self, params: &Value) -> Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing prompt name"))?;
        let arguments = params
            .get("arguments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);

        let agent = self
            .stores
            .agents
            .get(name)
            .await
            .map_err(|_| RpcError::invalid_params(format!("unknown prompt: {name}")))?;
        let active = self
            .stores
            .prompts
            .get_active(name)
            .await
            .map_err(|_| RpcError::internal())?;

        let text = active
            .map(|p| substitute(&p.system_prompt, &arguments))
            .unwrap_or_default();
        Ok(get_result(&agent.description, text))
    }
}

/// Map a store failure onto an `isError` tool result with a boundary-safe
/// message.
fn tool_error(err: StoreError) -> ToolResult {
    ToolResult::error(err.into_registry().public_message().to_string())
}

/// A syntactically valid URI that names nothing readable.
fn unknown_resource(uri: &str, err: StoreError) -> RpcError {
    match err {
        StoreError::NotFound(_) => {
            RpcError::invalid_params(format!("unknown resource: {uri}"))
        }
        _ => RpcError::internal(),
    }
}
