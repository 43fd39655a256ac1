// SPDX-License-Identifier: MIT OR Apache-2.0
//! Public, unauthenticated routes: liveness, readiness, the aggregate A2A
//! card, and the MCP manifest.
//!
//! The well-known card is the one REST-side response that skips the
//! envelope — it is the raw card, ETag-cached for a minute.

use super::agents::card_provider;
use crate::envelope::{err_response, run, ReqMeta};
use crate::AppState;
use agr_a2a::{aggregate_card, strong_etag};
use agr_error::RegistryError;
use agr_mcp::build_manifest;
use agr_store::{AgentStore, ListQuery};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Extension;
use chrono::Utc;
use serde_json::json;

/// `GET /healthz`
pub async fn healthz(Extension(meta): Extension<ReqMeta>) -> Response {
    run(meta, async move {
        Ok((
            StatusCode::OK,
            json!({
                "status": "ok",
                "contract_version": agr_core::CONTRACT_VERSION,
                "time": Utc::now().to_rfc3339(),
            }),
        ))
    })
    .await
}

/// `GET /readyz` — readiness includes a store round trip.
pub async fn readyz(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        state
            .agents
            .list(&ListQuery {
                active_only: true,
                q: None,
                offset: 0,
                limit: 1,
            })
            .await
            .map_err(|e| RegistryError::internal(e.to_string()))?;
        Ok((StatusCode::OK, json!({"status": "ready"})))
    })
    .await
}

/// `GET /.well-known/agent.json`
///
/// Aggregates every active agent into one registry card. Emits a strong
/// ETag over the serialized payload and honors `If-None-Match`.
pub async fn well_known(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    headers: HeaderMap,
) -> Response {
    let page = match state
        .agents
        .list(&ListQuery {
            active_only: true,
            q: None,
            offset: 0,
            limit: usize::MAX,
        })
        .await
    {
        Ok(page) => page,
        Err(e) => return err_response(&meta, &RegistryError::internal(e.to_string())),
    };

    let card = aggregate_card(
        &page.items,
        &state.config.external_url,
        &card_provider(&state),
        env!("CARGO_PKG_VERSION"),
    );
    let body = match serde_json::to_vec(&card) {
        Ok(body) => body,
        Err(e) => return err_response(&meta, &RegistryError::internal(e.to_string())),
    };
    let etag = strong_etag(&body);

    let matched = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|inm| inm.split(',').any(|candidate| candidate.trim() == etag));

    let mut response = if matched {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        response
    } else {
        let mut response = Response::new(axum::body::Body::from(body));
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    };

    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=60"),
    );
    response
}

/// `GET /mcp.json` — the raw MCP manifest, cached for an hour.
pub async fn manifest(State(state): State<AppState>) -> Response {
    let manifest = build_manifest(state.mcp.info());
    let body = serde_json::to_vec(&manifest).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(axum::body::Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    response
}
