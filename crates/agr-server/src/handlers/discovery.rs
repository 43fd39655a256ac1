// SPDX-License-Identifier: MIT OR Apache-2.0
//! The discovery snapshot endpoint.

use crate::envelope::{run, ReqMeta};
use crate::AppState;
use agr_error::RegistryError;
use agr_store::compose_discovery;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use chrono::{SecondsFormat, Utc};

/// `GET /api/v1/discovery` (viewer+, discovery-scoped rate limit)
///
/// Fans out over the participating stores; the first failure cancels the
/// siblings and the whole request fails — partial snapshots never leave the
/// process.
pub async fn snapshot(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let snapshot = compose_discovery(
            state.agents.as_ref(),
            state.servers.as_ref(),
            state.trust.as_ref(),
            state.configs.as_ref(),
            state.endpoints.as_ref(),
        )
        .await
        .map_err(|e| RegistryError::internal(e.to_string()))?;

        let mut payload = serde_json::to_value(&snapshot)
            .map_err(|e| RegistryError::internal(e.to_string()))?;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert(
                "fetched_at".into(),
                serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        Ok((StatusCode::OK, payload))
    })
    .await
}
