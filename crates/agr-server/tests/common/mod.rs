// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared test harness: a router over a seeded in-memory store with one
//! credential per role.
#![allow(dead_code)]

use agr_config::RegistryConfig;
use agr_core::{ApiKey, Role, Session};
use agr_server::{build_app, AppState};
use agr_store::{ApiKeyStore, MemoryStore, SessionStore};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

pub const VIEWER_KEY: &str = "agr_viewer_key";
pub const EDITOR_KEY: &str = "agr_editor_key";
pub const ADMIN_KEY: &str = "agr_admin_key";
pub const ADMIN_SESSION: &str = "admin-session-token";
pub const ADMIN_CSRF: &str = "admin-csrf-token";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub async fn test_app() -> TestApp {
    test_app_with_config(RegistryConfig {
        external_url: "https://reg.example.com".into(),
        provider_organization: Some("Acme".into()),
        provider_url: Some("https://acme.example.com".into()),
        ..Default::default()
    })
    .await
}

pub async fn test_app_with_config(config: RegistryConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let keys: &dyn ApiKeyStore = store.as_ref();
    for (key, role) in [
        (VIEWER_KEY, Role::Viewer),
        (EDITOR_KEY, Role::Editor),
        (ADMIN_KEY, Role::Admin),
    ] {
        keys.insert(ApiKey {
            key: key.into(),
            user_id: format!("user-{role}"),
            role,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    let sessions: &dyn SessionStore = store.as_ref();
    sessions
        .insert(Session {
            token: ADMIN_SESSION.into(),
            user_id: "admin-user".into(),
            role: Role::Admin,
            csrf_token: ADMIN_CSRF.into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let router = build_app(AppState::new(store.clone(), config));
    TestApp { router, store }
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, key: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        key: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("authorization", format!("Bearer {key}"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn send_json_if_match(
        &self,
        method: &str,
        uri: &str,
        key: &str,
        if_match: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("authorization", format!("Bearer {key}"))
                .header("content-type", "application/json")
                .header("if-match", if_match)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

pub fn agent_body(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("Agent {id}"),
        "description": "created by tests",
        "tools": [
            {"name": "lookup_invoice", "source": "internal", "description": "fetch an invoice"},
            {"name": "search_docs", "source": "mcp", "server_label": "doc_tools",
             "description": "search documentation"}
        ],
        "example_prompts": ["What did I pay in May?"]
    })
}
