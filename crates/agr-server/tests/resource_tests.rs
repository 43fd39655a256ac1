// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resource-specific surface tests: prompts, model endpoints, MCP servers,
//! trust/signal config, scoped configs, discovery, and the audit trail.

mod common;

use axum::http::StatusCode;
use common::{agent_body, body_json, test_app, ADMIN_KEY, EDITOR_KEY, VIEWER_KEY};
use serde_json::json;

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prompt_lifecycle_create_activate_read() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/agents", EDITOR_KEY, agent_body("billing"))
        .await;

    // No active prompt yet.
    let resp = app
        .get("/api/v1/agents/billing/prompts/active", VIEWER_KEY)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let created = body_json(
        app.send_json(
            "POST",
            "/api/v1/agents/billing/prompts",
            EDITOR_KEY,
            json!({
                "system_prompt": "Answer {{audience}} questions.",
                "template_variables": {"audience": "who is asking"},
                "mode": "rag_readonly"
            }),
        )
        .await,
    )
    .await;
    let prompt_id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["is_active"], false);
    assert_eq!(created["data"]["version"], 1);

    let resp = app
        .send_json(
            "POST",
            &format!("/api/v1/agents/billing/prompts/{prompt_id}/activate"),
            EDITOR_KEY,
            json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["is_active"], true);

    let active = body_json(
        app.get("/api/v1/agents/billing/prompts/active", VIEWER_KEY)
            .await,
    )
    .await;
    assert_eq!(active["data"]["id"].as_str().unwrap(), prompt_id);
}

#[tokio::test]
async fn activation_swaps_between_prompts() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/agents", EDITOR_KEY, agent_body("billing"))
        .await;
    let mut ids = Vec::new();
    for i in 0..2 {
        let created = body_json(
            app.send_json(
                "POST",
                "/api/v1/agents/billing/prompts",
                EDITOR_KEY,
                json!({
                    "system_prompt": format!("prompt {i}"),
                    "mode": "toolcalling_safe"
                }),
            )
            .await,
        )
        .await;
        ids.push(created["data"]["id"].as_str().unwrap().to_string());
    }

    for id in &ids {
        app.send_json(
            "POST",
            &format!("/api/v1/agents/billing/prompts/{id}/activate"),
            EDITOR_KEY,
            json!({}),
        )
        .await;
    }

    let listed = body_json(app.get("/api/v1/agents/billing/prompts", VIEWER_KEY).await).await;
    let active: Vec<&serde_json::Value> = listed["data"]["prompts"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["is_active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"].as_str().unwrap(), ids[1]);
}

#[tokio::test]
async fn oversize_prompt_is_rejected() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/agents", EDITOR_KEY, agent_body("billing"))
        .await;
    let resp = app
        .send_json(
            "POST",
            "/api/v1/agents/billing/prompts",
            EDITOR_KEY,
            json!({
                "system_prompt": "x".repeat(100 * 1024 + 1),
                "mode": "rag_readonly"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn prompt_rollback_round_trip() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/agents", EDITOR_KEY, agent_body("billing"))
        .await;
    let created = body_json(
        app.send_json(
            "POST",
            "/api/v1/agents/billing/prompts",
            EDITOR_KEY,
            json!({"system_prompt": "v1 text", "mode": "rag_readonly"}),
        )
        .await,
    )
    .await;
    let prompt_id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = app
        .send_json(
            "POST",
            "/api/v1/agents/billing/prompts/rollback",
            EDITOR_KEY,
            json!({"prompt_id": prompt_id, "version": 1}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["version"], 2);
    assert_eq!(body["data"]["system_prompt"], "v1 text");
}

// ---------------------------------------------------------------------------
// Model endpoints
// ---------------------------------------------------------------------------

fn endpoint_body(slug: &str) -> serde_json::Value {
    json!({
        "slug": slug,
        "provider": "openai",
        "url": "https://api.openai.com/v1",
        "mode": "fixed",
        "model_name": "gpt-4o"
    })
}

#[tokio::test]
async fn endpoint_version_creates_auto_increment_with_one_active() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, endpoint_body("main_llm"))
        .await;

    for i in 0..2 {
        let resp = app
            .send_json(
                "POST",
                "/api/v1/model-endpoints/main_llm/versions",
                EDITOR_KEY,
                json!({"config": {"attempt": i}, "change_note": format!("rev {i}")}),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let listed = body_json(
        app.get("/api/v1/model-endpoints/main_llm/versions", VIEWER_KEY)
            .await,
    )
    .await;
    let revisions = listed["data"]["versions"].as_array().unwrap();
    let numbers: Vec<i64> = revisions
        .iter()
        .map(|r| r["version"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);
    let active: Vec<_> = revisions.iter().filter(|r| r["is_active"] == true).collect();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn endpoint_ssrf_and_mode_constraints() {
    let app = test_app().await;

    let mut blocked = endpoint_body("bad_llm");
    blocked["url"] = json!("http://169.254.169.254/latest");
    let resp = app
        .send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, blocked)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut conflicted = endpoint_body("both_modes");
    conflicted["allowed_models"] = json!(["extra"]);
    let resp = app
        .send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, conflicted)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut flexible = endpoint_body("flex_llm");
    flexible["mode"] = json!("flexible");
    flexible["model_name"] = serde_json::Value::Null;
    flexible["allowed_models"] = json!([]);
    let resp = app
        .send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, flexible)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn version_config_headers_are_redacted() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, endpoint_body("main_llm"))
        .await;
    app.send_json(
        "POST",
        "/api/v1/model-endpoints/main_llm/versions",
        EDITOR_KEY,
        json!({"config": {"headers": {"Authorization": "Bearer sk-live"}}}),
    )
    .await;

    let body = body_json(
        app.get("/api/v1/model-endpoints/main_llm/versions/1", VIEWER_KEY)
            .await,
    )
    .await;
    assert_eq!(
        body["data"]["config"]["headers"]["Authorization"],
        "***REDACTED***"
    );
    assert!(!body.to_string().contains("sk-live"));
}

#[tokio::test]
async fn oversize_version_config_is_rejected() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, endpoint_body("main_llm"))
        .await;
    let resp = app
        .send_json(
            "POST",
            "/api/v1/model-endpoints/main_llm/versions",
            EDITOR_KEY,
            json!({"config": {"blob": "x".repeat(32 * 1024)}}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn activate_older_endpoint_version() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, endpoint_body("main_llm"))
        .await;
    for i in 0..2 {
        app.send_json(
            "POST",
            "/api/v1/model-endpoints/main_llm/versions",
            EDITOR_KEY,
            json!({"config": {"rev": i}}),
        )
        .await;
    }
    let resp = app
        .send_json(
            "POST",
            "/api/v1/model-endpoints/main_llm/versions/1/activate",
            EDITOR_KEY,
            json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["version"], 1);
}

// ---------------------------------------------------------------------------
// MCP servers (admin)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mcp_server_mutations_are_admin_only_and_reads_redacted() {
    let app = test_app().await;
    let server = json!({
        "label": "doc_tools",
        "url": "https://mcp.example.com",
        "auth_type": "bearer",
        "auth_credential": "top-secret"
    });

    let resp = app
        .send_json("POST", "/api/v1/mcp-servers", EDITOR_KEY, server.clone())
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .send_json("POST", "/api/v1/mcp-servers", ADMIN_KEY, server)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert!(!body.to_string().contains("top-secret"));

    let listed = body_json(app.get("/api/v1/mcp-servers", VIEWER_KEY).await).await;
    assert!(!listed.to_string().contains("top-secret"));
    assert!(!listed.to_string().contains("auth_credential"));
    assert_eq!(listed["data"]["servers"][0]["label"], "doc_tools");
}

#[tokio::test]
async fn mcp_server_put_is_full_replacement() {
    let app = test_app().await;
    let created = body_json(
        app.send_json(
            "POST",
            "/api/v1/mcp-servers",
            ADMIN_KEY,
            json!({
                "label": "doc_tools",
                "url": "https://mcp.example.com",
                "auth_type": "bearer",
                "auth_credential": "top-secret",
                "discovery_interval_secs": 120
            }),
        )
        .await,
    )
    .await;
    let etag = created["data"]["updated_at"].as_str().unwrap().to_string();

    // Absent fields reset to their defaults, like every other PUT.
    let resp = app
        .send_json_if_match(
            "PUT",
            "/api/v1/mcp-servers/doc_tools",
            ADMIN_KEY,
            &etag,
            json!({"url": "https://mcp2.example.com", "auth_type": "none"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["url"], "https://mcp2.example.com");
    assert_eq!(body["data"]["auth_type"], "none");
    assert_eq!(body["data"]["discovery_interval_secs"], 300);
    assert_eq!(body["data"]["is_enabled"], true);

    // An empty body is not a valid full representation.
    let listed = body_json(app.get("/api/v1/mcp-servers/doc_tools", ADMIN_KEY).await).await;
    let etag = listed["data"]["updated_at"].as_str().unwrap().to_string();
    let resp = app
        .send_json_if_match("PUT", "/api/v1/mcp-servers/doc_tools", ADMIN_KEY, &etag, json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn mcp_server_put_with_stale_etag_conflicts() {
    let app = test_app().await;
    let created = body_json(
        app.send_json(
            "POST",
            "/api/v1/mcp-servers",
            ADMIN_KEY,
            json!({"label": "doc_tools", "url": "https://mcp.example.com", "auth_type": "none"}),
        )
        .await,
    )
    .await;
    let etag = created["data"]["updated_at"].as_str().unwrap().to_string();

    let body = json!({"url": "https://mcp2.example.com", "auth_type": "none"});
    let resp = app
        .send_json_if_match("PUT", "/api/v1/mcp-servers/doc_tools", ADMIN_KEY, &etag, body.clone())
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .send_json_if_match("PUT", "/api/v1/mcp-servers/doc_tools", ADMIN_KEY, &etag, body)
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn mcp_server_delete_disables() {
    let app = test_app().await;
    app.send_json(
        "POST",
        "/api/v1/mcp-servers",
        ADMIN_KEY,
        json!({"label": "doc_tools", "url": "https://mcp.example.com", "auth_type": "none"}),
    )
    .await;
    let resp = app
        .send_json("DELETE", "/api/v1/mcp-servers/doc_tools", ADMIN_KEY, json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["is_enabled"], false);
}

// ---------------------------------------------------------------------------
// Trust & signal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trust_defaults_and_rules_round_trip() {
    let app = test_app().await;

    let resp = app
        .send_json(
            "PUT",
            "/api/v1/trust-defaults",
            ADMIN_KEY,
            json!({"default_action": "prompt", "allow_mcp_tools": true}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(app.get("/api/v1/trust-defaults", VIEWER_KEY).await).await;
    assert_eq!(body["data"]["default_action"], "prompt");

    let resp = app
        .send_json(
            "POST",
            "/api/v1/trust-rules",
            ADMIN_KEY,
            json!({"pattern": "delete_*", "action": "deny", "priority": 10}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let rule_id = body_json(resp).await["data"]["id"].as_str().unwrap().to_string();

    let resp = app
        .send_json(
            "DELETE",
            &format!("/api/v1/trust-rules/{rule_id}"),
            ADMIN_KEY,
            json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn signal_config_validates_sample_rate() {
    let app = test_app().await;
    let resp = app
        .send_json(
            "PUT",
            "/api/v1/signal-config",
            ADMIN_KEY,
            json!({"enabled": true, "sample_rate": 1.5}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send_json(
            "PUT",
            "/api/v1/signal-config",
            ADMIN_KEY,
            json!({"enabled": true, "sample_rate": 0.25}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Scoped configs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn workspace_config_merges_over_global() {
    let app = test_app().await;

    // Unset global reads as an empty object.
    let body = body_json(app.get("/api/v1/model-config", VIEWER_KEY).await).await;
    assert_eq!(body["data"], json!({}));

    app.send_json(
        "PUT",
        "/api/v1/model-config",
        EDITOR_KEY,
        json!({
            "default_model": "gpt-4o-mini",
            "temperature": 0.2,
            "max_tokens": 4096,
            "max_tool_rounds": 8,
            "embedding_model": "text-embedding-3-small"
        }),
    )
    .await;
    app.send_json(
        "PUT",
        "/api/v1/workspaces/acme/model-config",
        EDITOR_KEY,
        json!({"default_model": "claude-sonnet"}),
    )
    .await;

    let body = body_json(
        app.get("/api/v1/workspaces/acme/model-config", VIEWER_KEY)
            .await,
    )
    .await;
    assert_eq!(body["data"]["default_model"], "claude-sonnet");
    assert_eq!(body["data"]["temperature"], 0.2);

    // Untouched workspaces read the global value.
    let body = body_json(
        app.get("/api/v1/workspaces/other/model-config", VIEWER_KEY)
            .await,
    )
    .await;
    assert_eq!(body["data"]["default_model"], "gpt-4o-mini");
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discovery_snapshot_shape_and_redaction() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/agents", EDITOR_KEY, agent_body("billing"))
        .await;
    app.send_json(
        "POST",
        "/api/v1/mcp-servers",
        ADMIN_KEY,
        json!({"label": "doc_tools", "url": "https://mcp.example.com",
               "auth_type": "bearer", "auth_credential": "top-secret"}),
    )
    .await;
    app.send_json("POST", "/api/v1/model-endpoints", EDITOR_KEY, endpoint_body("main_llm"))
        .await;
    app.send_json(
        "POST",
        "/api/v1/model-endpoints/main_llm/versions",
        EDITOR_KEY,
        json!({"config": {"headers": {"x-api-key": "sk-secret"}}}),
    )
    .await;

    let resp = app.get("/api/v1/discovery", VIEWER_KEY).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let data = &body["data"];
    assert!(data["fetched_at"].is_string());
    assert_eq!(data["agents"][0]["id"], "billing");
    assert!(data["agents"][0].get("tools").is_none(), "summary view only");
    assert_eq!(data["model_endpoints"][0]["active_version"], 1);
    assert_eq!(
        data["model_endpoints"][0]["config"]["headers"]["x-api-key"],
        "***REDACTED***"
    );

    let text = body.to_string();
    assert!(!text.contains("top-secret"));
    assert!(!text.contains("sk-secret"));
    assert!(!text.contains("auth_credential"));
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mutations_leave_audit_entries() {
    let app = test_app().await;
    app.send_json("POST", "/api/v1/agents", EDITOR_KEY, agent_body("billing"))
        .await;
    app.send_json("DELETE", "/api/v1/agents/billing", EDITOR_KEY, json!({}))
        .await;

    let resp = app.get("/api/v1/audit-log", VIEWER_KEY).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body = body_json(app.get("/api/v1/audit-log", ADMIN_KEY).await).await;
    let entries = body["data"]["entries"].as_array().unwrap();
    assert!(entries.len() >= 2);
    // Newest first.
    assert_eq!(entries[0]["action"], "delete");
    assert_eq!(entries[0]["resource_id"], "billing");
    assert!(entries[0]["request_id"].is_string());
}
