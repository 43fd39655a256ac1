// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model-endpoint CRUD and configuration revisions.

use super::{decode, list_query, require_editor};
use crate::envelope::{run, ReqMeta};
use crate::lifecycle::{record_mutation, require_if_match};
use crate::AppState;
use agr_auth::AuthContext;
use agr_core::validate::{validate_endpoint_parts, validate_version_config};
use agr_error::RegistryError;
use agr_events::ChangeKind;
use agr_store::{ModelEndpointStore, NewEndpointVersion, NewModelEndpoint};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Extension;
use serde_json::json;
use std::collections::HashMap;

fn validate_input(input: &NewModelEndpoint) -> Result<(), RegistryError> {
    validate_endpoint_parts(
        &input.slug,
        &input.url,
        input.mode,
        input.model_name.as_deref(),
        &input.allowed_models,
    )
}

fn parse_version(raw: &str) -> Result<i64, RegistryError> {
    raw.parse()
        .map_err(|_| RegistryError::validation("version must be an integer"))
}

/// `GET /api/v1/model-endpoints`
pub async fn list(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    run(meta, async move {
        let query = list_query(&params);
        let page = state.endpoints.list(&query).await?;
        Ok((
            StatusCode::OK,
            json!({"endpoints": page.items, "total": page.total}),
        ))
    })
    .await
}

/// `POST /api/v1/model-endpoints` (editor)
pub async fn create(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: NewModelEndpoint = decode(&body)?;
        validate_input(&input)?;
        let endpoint = state.endpoints.create(input, &auth.user_id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "create",
            ChangeKind::Created,
            "model_endpoint",
            &endpoint.slug,
        )
        .await;
        Ok((StatusCode::CREATED, endpoint))
    })
    .await
}

/// `GET /api/v1/model-endpoints/{slug}`
pub async fn get_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(slug): Path<String>,
) -> Response {
    run(meta, async move {
        let endpoint = state.endpoints.get(&slug).await?;
        Ok((StatusCode::OK, endpoint))
    })
    .await
}

/// `PUT /api/v1/model-endpoints/{slug}` (editor, If-Match)
pub async fn update(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let etag = require_if_match(&headers)?;
        let input: NewModelEndpoint = decode(&body)?;
        validate_input(&input)?;
        let endpoint = state.endpoints.update(&slug, input, etag).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "model_endpoint",
            &endpoint.slug,
        )
        .await;
        Ok((StatusCode::OK, endpoint))
    })
    .await
}

/// `DELETE /api/v1/model-endpoints/{slug}` (editor) — soft delete.
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<String>,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let endpoint = state.endpoints.delete(&slug).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "delete",
            ChangeKind::Deleted,
            "model_endpoint",
            &endpoint.slug,
        )
        .await;
        Ok((StatusCode::OK, endpoint))
    })
    .await
}

/// `GET /api/v1/model-endpoints/{slug}/versions`
pub async fn versions(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path(slug): Path<String>,
) -> Response {
    run(meta, async move {
        let revisions = state.endpoints.list_versions(&slug).await?;
        Ok((
            StatusCode::OK,
            json!({"versions": revisions, "total": revisions.len()}),
        ))
    })
    .await
}

/// `GET /api/v1/model-endpoints/{slug}/versions/{version}`
pub async fn version(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Path((slug, version)): Path<(String, String)>,
) -> Response {
    run(meta, async move {
        let version = parse_version(&version)?;
        let revision = state.endpoints.get_version(&slug, version).await?;
        Ok((StatusCode::OK, revision))
    })
    .await
}

/// `POST /api/v1/model-endpoints/{slug}/versions` (editor)
pub async fn create_version(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<String>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let input: NewEndpointVersion = decode(&body)?;
        validate_version_config(&input.config)?;
        let revision = state
            .endpoints
            .create_version(&slug, input, &auth.user_id)
            .await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "create_version",
            ChangeKind::Created,
            "model_endpoint_version",
            &format!("{slug}/{}", revision.version),
        )
        .await;
        Ok((StatusCode::CREATED, revision))
    })
    .await
}

/// `POST /api/v1/model-endpoints/{slug}/versions/{version}/activate` (editor)
pub async fn activate_version(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path((slug, version)): Path<(String, String)>,
) -> Response {
    run(meta.clone(), async move {
        require_editor(&auth)?;
        let version = parse_version(&version)?;
        let revision = state.endpoints.activate_version(&slug, version).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "activate",
            ChangeKind::Activated,
            "model_endpoint_version",
            &format!("{slug}/{}", revision.version),
        )
        .await;
        Ok((StatusCode::OK, revision))
    })
    .await
}
