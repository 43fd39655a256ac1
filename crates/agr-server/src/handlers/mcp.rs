// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP transport for the MCP JSON-RPC endpoint.
//!
//! POST carries JSON-RPC bodies (single or batch); DELETE tears down the
//! session named by `Mcp-Session-Id`; GET is not part of the transport.
//! Parse errors stay inside the JSON-RPC envelope at HTTP 200; only
//! transport-level violations (content type, size) use HTTP status codes.

use crate::AppState;
use agr_mcp::{RpcOutcome, SESSION_HEADER};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

fn json_body(status: StatusCode, value: &Value) -> Response {
    let bytes = serde_json::to_vec(value).unwrap_or_else(|_| b"null".to_vec());
    let mut response = Response::new(axum::body::Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// `POST /mcp`
pub async fn rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let result = state.mcp.handle(&body).await;

    let mut response = match result.outcome {
        RpcOutcome::None => StatusCode::ACCEPTED.into_response(),
        RpcOutcome::Single(value) => json_body(StatusCode::OK, &value),
        RpcOutcome::Batch(values) => json_body(StatusCode::OK, &Value::Array(values)),
    };

    if let Some(session_id) = result.session_id
        && let Ok(value) = HeaderValue::from_str(&session_id)
    {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// `DELETE /mcp` — terminate the session named by the header, if any.
pub async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        state.mcp.sessions().remove(session_id).await;
    }
    StatusCode::NO_CONTENT.into_response()
}

/// `GET /mcp` — the transport has no GET semantics.
pub async fn method_not_allowed() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}
