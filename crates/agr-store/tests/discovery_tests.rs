// SPDX-License-Identifier: MIT OR Apache-2.0
//! Discovery composition tests: projection shape and redaction.

use agr_core::{EndpointMode, McpAuthType, Provider, ToolSource};
use agr_store::{
    compose_discovery, AgentStore, McpServerStore, MemoryStore, ModelEndpointStore, NewAgent,
    NewEndpointVersion, NewMcpServer, NewModelEndpoint,
};

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    let agents: &dyn AgentStore = &store;
    agents
        .create(
            NewAgent {
                id: "billing_helper".into(),
                name: "Billing helper".into(),
                description: "answers billing questions".into(),
                tools: vec![agr_core::Tool {
                    name: "lookup_invoice".into(),
                    source: ToolSource::Internal,
                    server_label: String::new(),
                    description: String::new(),
                }],
                trust_overrides: serde_json::json!({}),
                example_prompts: vec![],
            },
            "ops",
        )
        .await
        .unwrap();
    agents
        .create(
            NewAgent {
                id: "retired_bot".into(),
                name: "Retired".into(),
                description: String::new(),
                tools: vec![],
                trust_overrides: serde_json::json!({}),
                example_prompts: vec![],
            },
            "ops",
        )
        .await
        .unwrap();
    agents.delete("retired_bot", "ops").await.unwrap();

    let servers: &dyn McpServerStore = &store;
    servers
        .create(NewMcpServer {
            label: "doc_tools".into(),
            url: "https://mcp.example.com".into(),
            auth_type: McpAuthType::Bearer,
            auth_credential: "top-secret-token".into(),
            circuit_breaker: Default::default(),
            discovery_interval_secs: 300,
        })
        .await
        .unwrap();

    let endpoints: &dyn ModelEndpointStore = &store;
    endpoints
        .create(
            NewModelEndpoint {
                slug: "main_llm".into(),
                provider: Provider::Anthropic,
                url: "https://api.anthropic.com".into(),
                mode: EndpointMode::Fixed,
                model_name: Some("claude-sonnet".into()),
                allowed_models: vec![],
                workspace_id: None,
            },
            "ops",
        )
        .await
        .unwrap();
    endpoints
        .create_version(
            "main_llm",
            NewEndpointVersion {
                config: serde_json::json!({
                    "headers": {"x-api-key": "sk-ant-secret"},
                    "timeout_ms": 30_000
                }),
                change_note: "initial".into(),
            },
            "ops",
        )
        .await
        .unwrap();

    store
}

#[tokio::test]
async fn snapshot_excludes_inactive_agents_and_secrets() {
    let store = seeded_store().await;
    let snapshot = compose_discovery(&store, &store, &store, &store, &store)
        .await
        .unwrap();

    assert_eq!(snapshot.agents.len(), 1);
    assert_eq!(snapshot.agents[0].id, "billing_helper");

    assert_eq!(snapshot.mcp_servers.len(), 1);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(!json.contains("top-secret-token"));
    assert!(!json.contains("auth_credential"));
    assert!(!json.contains("sk-ant-secret"));
    assert!(json.contains("***REDACTED***"));
}

#[tokio::test]
async fn snapshot_carries_active_revision_inline() {
    let store = seeded_store().await;
    let snapshot = compose_discovery(&store, &store, &store, &store, &store)
        .await
        .unwrap();

    assert_eq!(snapshot.model_endpoints.len(), 1);
    let endpoint = &snapshot.model_endpoints[0];
    assert_eq!(endpoint.slug, "main_llm");
    assert_eq!(endpoint.active_version, Some(1));
    let config = endpoint.config.as_ref().unwrap();
    assert_eq!(config["headers"]["x-api-key"], "***REDACTED***");
    assert_eq!(config["timeout_ms"], 30_000);
}

#[tokio::test]
async fn missing_model_config_is_empty_object() {
    let store = seeded_store().await;
    let snapshot = compose_discovery(&store, &store, &store, &store, &store)
        .await
        .unwrap();
    assert_eq!(snapshot.model_config, serde_json::json!({}));
}

#[tokio::test]
async fn agents_appear_without_tools() {
    let store = seeded_store().await;
    let snapshot = compose_discovery(&store, &store, &store, &store, &store)
        .await
        .unwrap();
    let value = serde_json::to_value(&snapshot.agents).unwrap();
    assert!(value[0].get("tools").is_none());
}
