// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prompt lifecycle nested under an agent: list, read, create, atomic
//! activation, and rollback.

use super::{decode, require_editor};
use crate::envelope::{run, ReqMeta};
use crate::lifecycle::record_mutation;
use crate::AppState;
use agr_auth::AuthContext;
use agr_core::validate::validate_prompt_text;
use agr_error::RegistryError;
use agr_events::ChangeKind;
use agr_store::{AgentStore, NewPrompt, PromptStore};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// A syntactically bad prompt id reads as an absent resource.
fn parse_prompt_id(raw: &str) -> Result<Uuid, RegistryError> {
    Uuid::parse_str(raw).map_err(|_| RegistryError::not_found(format!("prompt '{raw}'")))
}

/// `GET /api/v1/agents/{id}/prompts`
pub async fn list(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(id): Path<String>,
) -> Response {
    run(meta, async move {
        state.agents.get(&id).await?;
        let prompts = state.prompts.list(&id).await?;
        Ok((
            StatusCode::OK,
            json!({"prompts": prompts, "total": prompts.len()}),
        ))
    })
    .await
}

/// `GET /api/v1/agents/{id}/prompts/active`
pub async fn active(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(id): Path<String>,
) -> Response {
    run(meta, async move {
        state.agents.get(&id).await?;
        let prompt = state
            .prompts
            .get_active(&id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("agent '{id}' has no active prompt")))?;
        Ok((StatusCode::OK, prompt))
    })
    .await
}

/// `GET /api/v1/agents/{id}/prompts/{pid}`
pub async fn get_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path((id, pid)): Path<(String, String)>,
) -> Response {
    run(meta, async move {
        let pid = parse_prompt_id(&pid)?;
        let prompt = state.prompts.get(&id, pid).await?;
        Ok((StatusCode::OK, prompt))
    })
    .await
}

/// `POST /api/v1/agents/{id}/prompts` (editor)
pub async fn create(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        state.agents.get(&id).await?;
        let input: NewPrompt = decode(&body)?;
        validate_prompt_text(&input.system_prompt)?;
        if !input.template_variables.is_object() && !input.template_variables.is_null() {
            return Err(RegistryError::validation(
                "template_variables must be a JSON object",
            ));
        }
        let prompt = state.prompts.create(&id, input, &auth.user_id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "create",
            ChangeKind::Created,
            "prompt",
            &prompt.id.to_string(),
        )
        .await;
        Ok((StatusCode::CREATED, prompt))
    })
    .await
}

/// `POST /api/v1/agents/{id}/prompts/{pid}/activate` (editor)
pub async fn activate(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path((id, pid)): Path<(String, String)>,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let pid = parse_prompt_id(&pid)?;
        let prompt = state.prompts.activate(&id, pid).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "activate",
            ChangeKind::Activated,
            "prompt",
            &prompt.id.to_string(),
        )
        .await;
        Ok((StatusCode::OK, prompt))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct PromptRollbackBody {
    prompt_id: Uuid,
    version: i64,
}

/// `POST /api/v1/agents/{id}/prompts/rollback` (editor)
pub async fn rollback(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: PromptRollbackBody = decode(&body)?;
        let prompt = state
            .prompts
            .rollback(&id, input.prompt_id, input.version, &auth.user_id)
            .await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "rollback",
            ChangeKind::RolledBack,
            "prompt",
            &prompt.id.to_string(),
        )
        .await;
        Ok((StatusCode::OK, prompt))
    })
    .await
}
