// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mutation bookkeeping shared by every resource handler: `If-Match`
//! parsing, and the post-commit audit + event pair.

use crate::envelope::ReqMeta;
use crate::AppState;
use agr_error::{ErrorCode, RegistryError};
use agr_events::{record_best_effort, AuditEntry, ChangeEvent, ChangeKind};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

/// Parse the required `If-Match` header as an RFC 3339 instant.
///
/// A missing header is a validation failure (the caller never read the
/// resource); a present-but-stale one becomes a conflict at the store.
pub fn require_if_match(headers: &HeaderMap) -> Result<DateTime<Utc>, RegistryError> {
    let raw = headers
        .get("if-match")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            RegistryError::new(ErrorCode::Validation, "If-Match header is required")
        })?;
    // Tolerate an ETag-style quoted value.
    let raw = raw.trim().trim_matches('"');
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| {
            RegistryError::new(
                ErrorCode::Validation,
                "If-Match must be the resource's updated_at instant (RFC 3339)",
            )
        })
}

/// Record the audit entry and publish the change event for a committed
/// mutation. Neither path can fail the request.
pub async fn record_mutation(
    state: &AppState,
    meta: &ReqMeta,
    actor: &str,
    action: &str,
    kind: ChangeKind,
    resource_type: &str,
    resource_id: &str,
) {
    let now = Utc::now();
    record_best_effort(
        state.audit.as_ref(),
        AuditEntry {
            actor: actor.to_string(),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            ip_address: meta.remote_ip.clone(),
            request_id: meta.request_id.clone(),
            at: now,
        },
    )
    .await;

    state.events.publish(ChangeEvent {
        kind,
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        timestamp: now,
        actor: actor.to_string(),
    });
}
