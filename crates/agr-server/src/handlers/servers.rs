// SPDX-License-Identifier: MIT OR Apache-2.0
//! External MCP-server registry. Admin-gated mutations; every read strips
//! the stored credential.

use super::{decode, require_admin};
use crate::envelope::{run, ReqMeta};
use crate::lifecycle::{record_mutation, require_if_match};
use crate::AppState;
use agr_auth::AuthContext;
use agr_core::redact::McpServerView;
use agr_error::RegistryError;
use agr_events::ChangeKind;
use agr_store::{McpServerStore, McpServerUpdate, NewMcpServer};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Extension;
use serde_json::json;

/// `GET /api/v1/mcp-servers`
pub async fn list(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let servers = state.servers.list().await?;
        let views: Vec<McpServerView> = servers.iter().map(McpServerView::from).collect();
        Ok((
            StatusCode::OK,
            json!({"servers": views, "total": views.len()}),
        ))
    })
    .await
}

/// `POST /api/v1/mcp-servers` (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let input: NewMcpServer = decode(&body)?;
        if input.label.trim().is_empty() {
            return Err(RegistryError::validation("label must not be empty"));
        }
        if input.url.trim().is_empty() {
            return Err(RegistryError::validation("url must not be empty"));
        }
        let server = state.servers.create(input).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "create",
            ChangeKind::Created,
            "mcp_server",
            &server.label,
        )
        .await;
        Ok((StatusCode::CREATED, McpServerView::from(&server)))
    })
    .await
}

/// `GET /api/v1/mcp-servers/{label}`
pub async fn get_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(label): Path<String>,
) -> Response {
    run(meta, async move {
        let server = state.servers.get(&label).await?;
        Ok((StatusCode::OK, McpServerView::from(&server)))
    })
    .await
}

/// `PUT /api/v1/mcp-servers/{label}` (admin, If-Match) — full replacement
/// of the mutable field set, like every other versioned resource.
pub async fn update(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(label): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let etag = require_if_match(&headers)?;
        let input: McpServerUpdate = decode(&body)?;
        if input.url.trim().is_empty() {
            return Err(RegistryError::validation("url must not be empty"));
        }
        let server = state.servers.update(&label, input, etag).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "mcp_server",
            &server.label,
        )
        .await;
        Ok((StatusCode::OK, McpServerView::from(&server)))
    })
    .await
}

/// `DELETE /api/v1/mcp-servers/{label}` (admin) — disables the server.
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(label): Path<String>,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let server = state.servers.delete(&label).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "delete",
            ChangeKind::Deleted,
            "mcp_server",
            &server.label,
        )
        .await;
        Ok((StatusCode::OK, McpServerView::from(&server)))
    })
    .await
}
