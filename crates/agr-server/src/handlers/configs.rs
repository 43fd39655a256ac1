// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scoped model and context configuration: one global value per kind plus
//! per-workspace overlays; a workspace read always returns the merged
//! effective value.

use super::{decode, require_editor};
use crate::envelope::{run, ReqMeta};
use crate::lifecycle::record_mutation;
use crate::AppState;
use agr_auth::AuthContext;
use agr_core::scope::{ContextConfigOverride, ModelConfigOverride};
use agr_core::{ContextConfig, ModelConfig};
use agr_events::ChangeKind;
use agr_store::ScopedConfigStore;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use serde_json::json;

fn or_empty<T: serde::Serialize>(value: Option<T>) -> serde_json::Value {
    value
        .map(|v| serde_json::to_value(v).unwrap_or_else(|_| json!({})))
        .unwrap_or_else(|| json!({}))
}

/// `GET /api/v1/model-config`
pub async fn get_model(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let config = state.configs.model_global().await?;
        Ok((StatusCode::OK, or_empty(config)))
    })
    .await
}

/// `PUT /api/v1/model-config` (editor)
pub async fn put_model(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: ModelConfig = decode(&body)?;
        let config = state.configs.put_model_global(input).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "model_config",
            "global",
        )
        .await;
        Ok((StatusCode::OK, config))
    })
    .await
}

/// `GET /api/v1/workspaces/{wid}/model-config`
pub async fn get_workspace_model(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(wid): Path<String>,
) -> Response {
    run(meta, async move {
        let config = state.configs.model_effective(&wid).await?;
        Ok((StatusCode::OK, or_empty(config)))
    })
    .await
}

/// `PUT /api/v1/workspaces/{wid}/model-config` (editor)
pub async fn put_workspace_model(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(wid): Path<String>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: ModelConfigOverride = decode(&body)?;
        let overlay = state.configs.put_model_override(&wid, input).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "model_config",
            &wid,
        )
        .await;
        Ok((StatusCode::OK, overlay))
    })
    .await
}

/// `GET /api/v1/context-config`
pub async fn get_context(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let config = state.configs.context_global().await?;
        Ok((StatusCode::OK, or_empty(config)))
    })
    .await
}

/// `PUT /api/v1/context-config` (editor)
pub async fn put_context(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: ContextConfig = decode(&body)?;
        let config = state.configs.put_context_global(input).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "context_config",
            "global",
        )
        .await;
        Ok((StatusCode::OK, config))
    })
    .await
}

/// `GET /api/v1/workspaces/{wid}/context-config`
pub async fn get_workspace_context(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(wid): Path<String>,
) -> Response {
    run(meta, async move {
        let config = state.configs.context_effective(&wid).await?;
        Ok((StatusCode::OK, or_empty(config)))
    })
    .await
}

/// `PUT /api/v1/workspaces/{wid}/context-config` (editor)
pub async fn put_workspace_context(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(wid): Path<String>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: ContextConfigOverride = decode(&body)?;
        let overlay = state.configs.put_context_override(&wid, input).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "context_config",
            &wid,
        )
        .await;
        Ok((StatusCode::OK, overlay))
    })
    .await
}
