// SPDX-License-Identifier: MIT OR Apache-2.0
//! Middleware chain for the control plane.
//!
//! Outermost to innermost: request-id assignment, real-IP extraction, access
//! log, panic recovery, same-origin CORS, security headers, body-size cap,
//! then (on protected routers) authentication and rate limiting.

use crate::envelope::{err_response, ReqMeta, REQUEST_ID_HEADER};
use crate::AppState;
use agr_auth::{resolve_credentials, RateScope, RequestCredentials};
use agr_core::validate::MAX_BODY_BYTES;
use agr_error::{ErrorCode, RegistryError};
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use futures::FutureExt;
use tower_http::cors::{AllowOrigin, CorsLayer};
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

fn fallback_meta() -> ReqMeta {
    ReqMeta {
        request_id: Uuid::new_v4().to_string(),
        remote_ip: "unknown".into(),
    }
}

fn req_meta(req: &Request) -> ReqMeta {
    req.extensions()
        .get::<ReqMeta>()
        .cloned()
        .unwrap_or_else(fallback_meta)
}

// ---------------------------------------------------------------------------
// Request id
// ---------------------------------------------------------------------------

/// Reuse the inbound `X-Request-Id` or generate one, and echo it on the
/// response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(ReqMeta {
        request_id: id.clone(),
        remote_ip: "unknown".into(),
    });

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

// ---------------------------------------------------------------------------
// Real IP
// ---------------------------------------------------------------------------

/// Fill in the client address from forwarding headers.
pub async fn real_ip(mut req: Request, next: Next) -> Response {
    let ip = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            req.headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "unknown".into());

    if let Some(meta) = req.extensions_mut().get_mut::<ReqMeta>() {
        meta.remote_ip = ip;
    }
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Access log
// ---------------------------------------------------------------------------

/// Log method, path, status, and duration with structured fields.
pub async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_id = req_meta(&req).request_id;
    let start = Instant::now();

    let response = next.run(req).await;

    info!(
        http.method = %method,
        http.path = %path,
        http.status = response.status().as_u16(),
        http.duration_ms = start.elapsed().as_millis() as u64,
        request_id = %request_id,
        "request completed"
    );
    response
}

// ---------------------------------------------------------------------------
// Panic recovery
// ---------------------------------------------------------------------------

/// Convert handler panics into an enveloped 500 instead of a dropped
/// connection.
pub async fn recover(req: Request, next: Next) -> Response {
    let meta = req_meta(&req);
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            error!(request_id = %meta.request_id, "handler panicked");
            err_response(&meta, &RegistryError::internal("handler panicked"))
        }
    }
}

// ---------------------------------------------------------------------------
// CORS (same-origin only)
// ---------------------------------------------------------------------------

/// CORS layer that only acknowledges same-origin requests.
///
/// The predicate compares the `Origin` authority against the request's own
/// `Host`; anything else gets no CORS headers at all and stays opaque to
/// browsers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, parts| {
            let host = parts
                .headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok());
            let origin = origin.to_str().ok();
            match (origin, host) {
                (Some(origin), Some(host)) => origin
                    .strip_prefix("http://")
                    .or_else(|| origin.strip_prefix("https://"))
                    .is_some_and(|authority| authority == host),
                _ => false,
            }
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::IF_MATCH,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

// ---------------------------------------------------------------------------
// Security headers
// ---------------------------------------------------------------------------

/// Response hardening applied to every reply, errors and public routes
/// included.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=63072000; includeSubDomains"),
    );
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );
    response
}

// ---------------------------------------------------------------------------
// Body cap
// ---------------------------------------------------------------------------

/// Reject declared-oversize bodies before any parsing happens.
///
/// Bodies without a `Content-Length` fall through to the extractor-level
/// limit.
pub async fn body_cap(req: Request, next: Next) -> Response {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(length) = declared
        && length > MAX_BODY_BYTES
    {
        let meta = req_meta(&req);
        return err_response(
            &meta,
            &RegistryError::new(
                ErrorCode::PayloadTooLarge,
                format!("request body exceeds {MAX_BODY_BYTES} bytes"),
            ),
        );
    }
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Resolve credentials and attach an [`agr_auth::AuthContext`] extension.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let meta = req_meta(&req);
    let safe_method = matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS);

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let cookie = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let csrf = req
        .headers()
        .get(agr_auth::CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let credentials = RequestCredentials {
        authorization: authorization.as_deref(),
        cookie: cookie.as_deref(),
        csrf_header: csrf.as_deref(),
        safe_method,
    };

    match resolve_credentials(&credentials, state.sessions.as_ref(), state.api_keys.as_ref()).await
    {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => err_response(&meta, &err),
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

fn scope_for(req: &Request) -> RateScope {
    if req.uri().path().ends_with("/discovery") {
        RateScope::Discovery
    } else if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        RateScope::ApiRead
    } else {
        RateScope::ApiMutation
    }
}

/// Enforce the per-scope token bucket and report the budget on every
/// response in the scope.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let meta = req_meta(&req);
    let scope = scope_for(&req);
    let identity = req
        .extensions()
        .get::<agr_auth::AuthContext>()
        .map(|ctx| ctx.user_id.clone())
        .unwrap_or_else(|| meta.remote_ip.clone());

    let decision = state.limiter.check(scope, &identity).await;

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        err_response(
            &meta,
            &RegistryError::new(ErrorCode::RateLimited, "rate limit exceeded"),
        )
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
    if !decision.allowed {
        headers.insert("retry-after", HeaderValue::from_static("60"));
    }
    response
}

