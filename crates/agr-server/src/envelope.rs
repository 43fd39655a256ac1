// SPDX-License-Identifier: MIT OR Apache-2.0
//! The uniform response envelope.
//!
//! Every REST handler replies
//! `{success, data?, error?, meta: {request_id, timestamp}}`. Two surfaces
//! opt out: the raw well-known card and the JSON-RPC endpoint. Internal
//! error causes are logged here and never serialized.

use agr_error::RegistryError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// Request/response correlation header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context propagated to handlers, audit entries, and events.
#[derive(Debug, Clone)]
pub struct ReqMeta {
    /// Correlation id, inbound or generated.
    pub request_id: String,
    /// Best-effort client address.
    pub remote_ip: String,
}

fn meta_value(meta: &ReqMeta) -> serde_json::Value {
    json!({
        "request_id": meta.request_id,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
    })
}

/// Build a success response in the envelope.
pub fn ok_response<T: Serialize>(meta: &ReqMeta, status: StatusCode, data: T) -> Response {
    let body = json!({
        "success": true,
        "data": data,
        "meta": meta_value(meta),
    });
    json_response(status, &body)
}

/// Build an error response in the envelope, redacting internal causes.
pub fn err_response(meta: &ReqMeta, err: &RegistryError) -> Response {
    if err.code == agr_error::ErrorCode::Internal {
        // The original message and source stay in the log only.
        error!(
            request_id = %meta.request_id,
            error = %err,
            source = err.source.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            "internal error"
        );
    }
    let body = json!({
        "success": false,
        "error": err.to_body(),
        "meta": meta_value(meta),
    });
    json_response(
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        &body,
    )
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(bytes.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Run a fallible handler body and wrap either arm in the envelope.
///
/// Handlers call this with an async block so `?` works on anything
/// convertible to [`RegistryError`].
pub async fn run<T, F>(meta: ReqMeta, fut: F) -> Response
where
    T: Serialize,
    F: Future<Output = Result<(StatusCode, T), RegistryError>>,
{
    match fut.await {
        Ok((status, data)) => ok_response(&meta, status, data),
        Err(err) => err_response(&meta, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agr_error::ErrorCode;
    use http_body_util::BodyExt;

    fn meta() -> ReqMeta {
        ReqMeta {
            request_id: "req-1".into(),
            remote_ip: "127.0.0.1".into(),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope_shape() {
        let response = ok_response(&meta(), StatusCode::CREATED, json!({"id": "x"}));
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], "x");
        assert_eq!(body["meta"]["request_id"], "req-1");
        assert!(body["meta"]["timestamp"].as_str().unwrap().contains('T'));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn error_envelope_shape() {
        let err = RegistryError::new(ErrorCode::Conflict, "slug taken");
        let response = err_response(&meta(), &err);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["message"], "slug taken");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn internal_errors_are_redacted() {
        let err = RegistryError::internal("pg: connect 10.0.0.5 refused");
        let response = err_response(&meta(), &err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "internal error");
        assert!(!body.to_string().contains("10.0.0.5"));
    }
}
