// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agent CRUD, versioning, rollback, and the per-agent A2A projections.

use super::{decode, decode_value, list_query, require_editor};
use crate::envelope::{run, ReqMeta};
use crate::lifecycle::{record_mutation, require_if_match};
use crate::AppState;
use agr_a2a::{project_agent, CardProvider};
use agr_auth::AuthContext;
use agr_core::page::PageParams;
use agr_core::validate::{validate_agent_fields, validate_slug, validate_tool};
use agr_error::RegistryError;
use agr_events::ChangeKind;
use agr_store::{AgentPatch, AgentStore, AgentUpdate, ListQuery, NewAgent};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

pub(crate) fn card_provider(state: &AppState) -> CardProvider {
    CardProvider {
        organization: state
            .config
            .provider_organization
            .clone()
            .unwrap_or_default(),
        url: state.config.provider_url.clone().unwrap_or_default(),
    }
}

/// `GET /api/v1/agents`
pub async fn list(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    run(meta, async move {
        let query = list_query(&params);
        let page = state.agents.list(&query).await?;
        Ok((
            StatusCode::OK,
            json!({"agents": page.items, "total": page.total}),
        ))
    })
    .await
}

/// `POST /api/v1/agents` (editor)
pub async fn create(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: NewAgent = decode(&body)?;
        validate_slug(&input.id)?;
        validate_agent_fields(&input.name, &input.tools, &input.trust_overrides)?;
        let agent = state.agents.create(input, &auth.user_id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "create",
            ChangeKind::Created,
            "agent",
            &agent.id,
        )
        .await;
        Ok((StatusCode::CREATED, agent))
    })
    .await
}

/// `GET /api/v1/agents/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(id): Path<String>,
) -> Response {
    run(meta, async move {
        let agent = state.agents.get(&id).await?;
        Ok((StatusCode::OK, agent))
    })
    .await
}

/// `PUT /api/v1/agents/{id}` (editor, If-Match)
pub async fn update(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let etag = require_if_match(&headers)?;
        let input: AgentUpdate = decode(&body)?;
        validate_agent_fields(&input.name, &input.tools, &input.trust_overrides)?;
        let agent = state.agents.update(&id, input, etag, &auth.user_id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "agent",
            &agent.id,
        )
        .await;
        Ok((StatusCode::OK, agent))
    })
    .await
}

/// `PATCH /api/v1/agents/{id}` (editor, If-Match)
pub async fn patch(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let etag = require_if_match(&headers)?;
        let value = decode_value(&body)?;
        // Wrong-typed fields fail the whole call as a validation error.
        let patch = AgentPatch::from_value(&value).map_err(RegistryError::from)?;
        if let Some(ref tools) = patch.tools {
            for tool in tools {
                validate_tool(tool)?;
            }
        }
        let agent = state.agents.patch(&id, patch, etag, &auth.user_id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "patch",
            ChangeKind::Updated,
            "agent",
            &agent.id,
        )
        .await;
        Ok((StatusCode::OK, agent))
    })
    .await
}

/// `DELETE /api/v1/agents/{id}` (editor) — soft delete.
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let agent = state.agents.delete(&id, &auth.user_id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "delete",
            ChangeKind::Deleted,
            "agent",
            &agent.id,
        )
        .await;
        Ok((StatusCode::OK, agent))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct RollbackBody {
    version: i64,
}

/// `POST /api/v1/agents/{id}/rollback` (editor)
pub async fn rollback(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: RollbackBody = decode(&body)?;
        let agent = state
            .agents
            .rollback(&id, input.version, &auth.user_id)
            .await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "rollback",
            ChangeKind::RolledBack,
            "agent",
            &agent.id,
        )
        .await;
        Ok((StatusCode::OK, agent))
    })
    .await
}

/// `GET /api/v1/agents/{id}/versions`
pub async fn versions(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(id): Path<String>,
) -> Response {
    run(meta, async move {
        let versions = state.agents.list_versions(&id).await?;
        Ok((
            StatusCode::OK,
            json!({"versions": versions, "total": versions.len()}),
        ))
    })
    .await
}

/// `GET /api/v1/agents/{id}/versions/{version}`
pub async fn version(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path((id, version)): Path<(String, String)>,
) -> Response {
    run(meta, async move {
        let version: i64 = version
            .parse()
            .map_err(|_| RegistryError::validation("version must be an integer"))?;
        let snapshot = state.agents.get_version(&id, version).await?;
        Ok((StatusCode::OK, snapshot))
    })
    .await
}

/// `GET /api/v1/agents/{id}/agent-card`
pub async fn agent_card(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(id): Path<String>,
) -> Response {
    run(meta, async move {
        let agent = state.agents.get(&id).await?;
        let card = project_agent(&agent, &state.config.external_url, &card_provider(&state));
        Ok((StatusCode::OK, card))
    })
    .await
}

/// `GET /api/v1/agents/a2a-index`
pub async fn a2a_index(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    run(meta, async move {
        let page = PageParams::from_raw(
            super::query_i64(&params, "offset"),
            super::query_i64(&params, "limit"),
        );
        let query = ListQuery {
            active_only: true,
            q: params.get("q").cloned().filter(|q| !q.is_empty()),
            offset: page.offset,
            limit: page.limit,
        };
        let page = state.agents.list(&query).await?;
        let provider = card_provider(&state);
        let cards: Vec<_> = page
            .items
            .iter()
            .map(|agent| project_agent(agent, &state.config.external_url, &provider))
            .collect();
        Ok((
            StatusCode::OK,
            json!({"agent_cards": cards, "total": page.total}),
        ))
    })
    .await
}
