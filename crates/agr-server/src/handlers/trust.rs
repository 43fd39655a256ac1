// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trust defaults, trust rules, and signal configuration.

use super::{decode, require_admin};
use crate::envelope::{run, ReqMeta};
use crate::lifecycle::record_mutation;
use crate::AppState;
use agr_auth::AuthContext;
use agr_core::validate::validate_outbound_url;
use agr_core::{SignalConfig, TrustAction, TrustDefaults, TrustRule};
use agr_error::RegistryError;
use agr_events::ChangeKind;
use agr_store::{SignalConfigStore, TrustStore};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// `GET /api/v1/trust-defaults`
pub async fn get_defaults(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let defaults = state.trust.get_defaults().await?;
        Ok((StatusCode::OK, json!(defaults)))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct TrustDefaultsBody {
    default_action: TrustAction,
    #[serde(default)]
    allow_mcp_tools: bool,
}

/// `PUT /api/v1/trust-defaults` (admin)
pub async fn put_defaults(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let input: TrustDefaultsBody = decode(&body)?;
        let defaults = state
            .trust
            .put_defaults(TrustDefaults {
                default_action: input.default_action,
                allow_mcp_tools: input.allow_mcp_tools,
                updated_at: Utc::now(),
                updated_by: auth.user_id.clone(),
            })
            .await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "trust_defaults",
            "trust_defaults",
        )
        .await;
        Ok((StatusCode::OK, defaults))
    })
    .await
}

/// `GET /api/v1/trust-rules`
pub async fn list_rules(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let rules = state.trust.list_rules().await?;
        Ok((StatusCode::OK, json!({"rules": rules, "total": rules.len()})))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct TrustRuleBody {
    pattern: String,
    action: TrustAction,
    #[serde(default)]
    priority: i64,
}

/// `POST /api/v1/trust-rules` (admin)
pub async fn create_rule(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let input: TrustRuleBody = decode(&body)?;
        if input.pattern.trim().is_empty() {
            return Err(RegistryError::validation("pattern must not be empty"));
        }
        let rule = state
            .trust
            .create_rule(TrustRule {
                id: Uuid::new_v4(),
                pattern: input.pattern,
                action: input.action,
                priority: input.priority,
                created_at: Utc::now(),
            })
            .await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "create",
            ChangeKind::Created,
            "trust_rule",
            &rule.id.to_string(),
        )
        .await;
        Ok((StatusCode::CREATED, rule))
    })
    .await
}

/// `DELETE /api/v1/trust-rules/{id}` (admin)
pub async fn delete_rule(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let id = Uuid::parse_str(&id)
            .map_err(|_| RegistryError::not_found(format!("trust rule '{id}'")))?;
        state.trust.delete_rule(id).await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "delete",
            ChangeKind::Deleted,
            "trust_rule",
            &id.to_string(),
        )
        .await;
        Ok((StatusCode::OK, json!({"deleted": id})))
    })
    .await
}

/// `GET /api/v1/signal-config`
pub async fn get_signal(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
) -> Response {
    run(meta, async move {
        let config = state.signal.get().await?;
        Ok((StatusCode::OK, json!(config)))
    })
    .await
}

#[derive(Debug, Deserialize)]
struct SignalConfigBody {
    enabled: bool,
    sample_rate: f64,
    #[serde(default)]
    sink_url: Option<String>,
}

/// `PUT /api/v1/signal-config` (admin)
pub async fn put_signal(
    State(state): State<AppState>,
    Extension(meta): Extension<ReqMeta>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Response {
    run(meta.clone(), async move {
        require_admin(&auth)?;
        let input: SignalConfigBody = decode(&body)?;
        if !(0.0..=1.0).contains(&input.sample_rate) {
            return Err(RegistryError::validation(
                "sample_rate must be between 0.0 and 1.0",
            ));
        }
        if let Some(ref url) = input.sink_url {
            validate_outbound_url(url)?;
        }
        let config = state
            .signal
            .put(SignalConfig {
                enabled: input.enabled,
                sample_rate: input.sample_rate,
                sink_url: input.sink_url,
                updated_at: Utc::now(),
            })
            .await?;
        record_mutation(
            &state,
            &meta,
            &auth.user_id,
            "update",
            ChangeKind::Updated,
            "signal_config",
            "signal_config",
        )
        .await;
        Ok((StatusCode::OK, config))
    })
    .await
}
