// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only audit-log view over the audit sink.

use super::{query_i64, require_admin};
use crate::envelope::{run, ReqMeta};
use crate::AppState;
use agr_auth::AuthContext;
use agr_core::page::PageParams;
use agr_error::RegistryError;
use agr_events::AuditSink;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use serde_json::json;
use std::collections::HashMap;

/// `GET /api/v1/audit-log` (admin)
pub async fn list(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    run(meta, async move {
        require_admin(&auth)?;
        let page = PageParams::from_raw(query_i64(&params, "offset"), query_i64(&params, "limit"));
        let entries = state
            .audit
            .list(page.offset, page.limit)
            .await
            .map_err(|e| RegistryError::internal(e.to_string()))?;
        Ok((
            StatusCode::OK,
            json!({"entries": entries, "total": entries.len()}),
        ))
    })
    .await
}
