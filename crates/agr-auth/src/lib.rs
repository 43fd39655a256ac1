// SPDX-License-Identifier: MIT OR Apache-2.0
//! agr-auth
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The authentication and authorization pipeline: credential resolution
//! (bearer API key first, then session cookie), CSRF double-submit
//! verification for cookie-backed mutations, role gating, and the
//! token-bucket rate limiter.

/// Token-bucket rate limiting keyed by `(scope, identity)`.
pub mod ratelimit;

pub use ratelimit::{RateDecision, RateLimiter, RateScope};

use agr_core::Role;
use agr_error::{ErrorCode, RegistryError};
use agr_store::{ApiKeyStore, SessionStore};

/// Session cookie name. The `__Host-` prefix binds it to the origin host
/// over HTTPS with `Path=/` and no `Domain` attribute.
pub const SESSION_COOKIE: &str = "__Host-session";

/// CSRF double-submit cookie name.
pub const CSRF_COOKIE: &str = "__Host-csrf";

/// Header carrying the CSRF token on non-safe methods.
pub const CSRF_HEADER: &str = "x-csrf-token";

// ---------------------------------------------------------------------------
// AuthContext
// ---------------------------------------------------------------------------

/// How a request authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// `Authorization: Bearer` API key.
    ApiKey,
    /// Session cookie.
    Session,
}

/// Identity attached to a request after credential resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Resolved user id.
    pub user_id: String,
    /// Granted role.
    pub role: Role,
    /// Which credential resolved.
    pub method: AuthMethod,
}

// ---------------------------------------------------------------------------
// Cookie parsing
// ---------------------------------------------------------------------------

/// Extract a cookie value by name from a `Cookie` header.
#[must_use]
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

// ---------------------------------------------------------------------------
// Credential resolution
// ---------------------------------------------------------------------------

/// Raw credential material pulled off a request.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials<'a> {
    /// `Authorization` header value, if present.
    pub authorization: Option<&'a str>,
    /// `Cookie` header value, if present.
    pub cookie: Option<&'a str>,
    /// `X-CSRF-Token` header value, if present.
    pub csrf_header: Option<&'a str>,
    /// `true` for GET/HEAD/OPTIONS — CSRF is not checked for those.
    pub safe_method: bool,
}

/// Resolve request credentials against the session and API-key stores.
///
/// Resolution order: bearer API key, then session cookie, then 401. API-key
/// requests bypass CSRF entirely (they carry no cookies); session-backed
/// non-safe methods must double-submit the CSRF token via header and cookie,
/// both equal to the session's own token.
///
/// # Errors
///
/// `UNAUTHORIZED` for missing or unresolvable credentials, `FORBIDDEN` for a
/// failed CSRF check, `INTERNAL` for store failures.
pub async fn resolve_credentials(
    creds: &RequestCredentials<'_>,
    sessions: &dyn SessionStore,
    api_keys: &dyn ApiKeyStore,
) -> Result<AuthContext, RegistryError> {
    if let Some(authorization) = creds.authorization {
        let key = authorization
            .strip_prefix("Bearer ")
            .or_else(|| authorization.strip_prefix("bearer "))
            .ok_or_else(|| {
                RegistryError::new(ErrorCode::Unauthorized, "malformed Authorization header")
            })?;
        let resolved = api_keys
            .get(key.trim())
            .await
            .map_err(|e| RegistryError::internal(e.to_string()))?
            .ok_or_else(|| RegistryError::new(ErrorCode::Unauthorized, "invalid API key"))?;
        return Ok(AuthContext {
            user_id: resolved.user_id,
            role: resolved.role,
            method: AuthMethod::ApiKey,
        });
    }

    let Some(cookie_header) = creds.cookie else {
        return Err(RegistryError::new(
            ErrorCode::Unauthorized,
            "authentication required",
        ));
    };
    let Some(token) = cookie_value(cookie_header, SESSION_COOKIE) else {
        return Err(RegistryError::new(
            ErrorCode::Unauthorized,
            "authentication required",
        ));
    };

    let session = sessions
        .get(token)
        .await
        .map_err(|e| RegistryError::internal(e.to_string()))?
        .ok_or_else(|| RegistryError::new(ErrorCode::Unauthorized, "invalid session"))?;

    if !creds.safe_method {
        let header_token = creds.csrf_header.unwrap_or_default();
        let cookie_token = cookie_value(cookie_header, CSRF_COOKIE).unwrap_or_default();
        if header_token.is_empty()
            || header_token != session.csrf_token
            || cookie_token != session.csrf_token
        {
            return Err(RegistryError::new(
                ErrorCode::Forbidden,
                "CSRF token missing or mismatched",
            ));
        }
    }

    Ok(AuthContext {
        user_id: session.user_id,
        role: session.role,
        method: AuthMethod::Session,
    })
}

// ---------------------------------------------------------------------------
// Role gating
// ---------------------------------------------------------------------------

/// Gate a resolved identity against a minimum role.
///
/// A valid credential with an insufficient role is `FORBIDDEN`, never 401.
pub fn require_role(ctx: &AuthContext, required: Role) -> Result<(), RegistryError> {
    if ctx.role.at_least(required) {
        Ok(())
    } else {
        Err(RegistryError::new(
            ErrorCode::Forbidden,
            format!("requires role '{required}' or higher"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use agr_core::{ApiKey, Session};
    use agr_store::MemoryStore;
    use chrono::Utc;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let sessions: &dyn SessionStore = &store;
        sessions
            .insert(Session {
                token: "sess-token".into(),
                user_id: "alice".into(),
                role: Role::Editor,
                csrf_token: "csrf-123".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let keys: &dyn ApiKeyStore = &store;
        keys.insert(ApiKey {
            key: "agr_live_abc".into(),
            user_id: "service".into(),
            role: Role::Viewer,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        store
    }

    #[test]
    fn cookie_parsing() {
        let header = "__Host-session=tok; __Host-csrf=c1; theme=dark";
        assert_eq!(cookie_value(header, SESSION_COOKIE), Some("tok"));
        assert_eq!(cookie_value(header, CSRF_COOKIE), Some("c1"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[tokio::test]
    async fn bearer_key_resolves_first() {
        let store = seeded().await;
        let ctx = resolve_credentials(
            &RequestCredentials {
                authorization: Some("Bearer agr_live_abc"),
                cookie: Some("__Host-session=sess-token"),
                csrf_header: None,
                safe_method: false,
            },
            &store,
            &store,
        )
        .await
        .unwrap();
        assert_eq!(ctx.user_id, "service");
        assert_eq!(ctx.method, AuthMethod::ApiKey);
    }

    #[tokio::test]
    async fn api_key_bypasses_csrf() {
        let store = seeded().await;
        let ctx = resolve_credentials(
            &RequestCredentials {
                authorization: Some("Bearer agr_live_abc"),
                cookie: None,
                csrf_header: None,
                safe_method: false,
            },
            &store,
            &store,
        )
        .await
        .unwrap();
        assert_eq!(ctx.role, Role::Viewer);
    }

    #[tokio::test]
    async fn unknown_key_is_unauthorized() {
        let store = seeded().await;
        let err = resolve_credentials(
            &RequestCredentials {
                authorization: Some("Bearer agr_bogus"),
                ..Default::default()
            },
            &store,
            &store,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn session_safe_method_needs_no_csrf() {
        let store = seeded().await;
        let ctx = resolve_credentials(
            &RequestCredentials {
                authorization: None,
                cookie: Some("__Host-session=sess-token"),
                csrf_header: None,
                safe_method: true,
            },
            &store,
            &store,
        )
        .await
        .unwrap();
        assert_eq!(ctx.user_id, "alice");
        assert_eq!(ctx.method, AuthMethod::Session);
    }

    #[tokio::test]
    async fn session_mutation_requires_double_submit() {
        let store = seeded().await;
        let good = RequestCredentials {
            authorization: None,
            cookie: Some("__Host-session=sess-token; __Host-csrf=csrf-123"),
            csrf_header: Some("csrf-123"),
            safe_method: false,
        };
        resolve_credentials(&good, &store, &store).await.unwrap();

        // Header missing.
        let err = resolve_credentials(
            &RequestCredentials {
                csrf_header: None,
                ..good.clone()
            },
            &store,
            &store,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        // Cookie token mismatched.
        let err = resolve_credentials(
            &RequestCredentials {
                cookie: Some("__Host-session=sess-token; __Host-csrf=other"),
                ..good.clone()
            },
            &store,
            &store,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        // Header token mismatched.
        let err = resolve_credentials(
            &RequestCredentials {
                csrf_header: Some("wrong"),
                ..good
            },
            &store,
            &store,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn no_credentials_is_unauthorized() {
        let store = seeded().await;
        let err = resolve_credentials(&RequestCredentials::default(), &store, &store)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn role_gate_distinguishes_401_from_403() {
        let viewer = AuthContext {
            user_id: "v".into(),
            role: Role::Viewer,
            method: AuthMethod::Session,
        };
        let err = require_role(&viewer, Role::Editor).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        require_role(&viewer, Role::Viewer).unwrap();

        let admin = AuthContext {
            user_id: "a".into(),
            role: Role::Admin,
            method: AuthMethod::ApiKey,
        };
        require_role(&admin, Role::Editor).unwrap();
    }
}
