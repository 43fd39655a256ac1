// SPDX-License-Identifier: MIT OR Apache-2.0
//! Route handlers, grouped by resource.

pub mod agents;
pub mod audit;
pub mod configs;
pub mod discovery;
pub mod endpoints;
pub mod mcp;
pub mod prompts;
pub mod public;
pub mod servers;
pub mod trust;

use agr_core::page::PageParams;
use agr_core::Role;
use agr_error::RegistryError;
use agr_store::ListQuery;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Parse an integer query value; anything unparseable reads as absent.
pub(crate) fn query_i64(params: &HashMap<String, String>, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.parse::<i64>().ok())
}

/// Parse a boolean query value; anything unparseable reads as absent.
pub(crate) fn query_bool(params: &HashMap<String, String>, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.parse::<bool>().ok())
}

/// Standard list query from raw query params: `active_only` defaults to
/// `true`, pagination clamped to the REST defaults.
pub(crate) fn list_query(params: &HashMap<String, String>) -> ListQuery {
    let page = PageParams::from_raw(query_i64(params, "offset"), query_i64(params, "limit"));
    ListQuery {
        active_only: query_bool(params, "active_only").unwrap_or(true),
        q: params.get("q").cloned().filter(|q| !q.is_empty()),
        offset: page.offset,
        limit: page.limit,
    }
}

/// Decode a JSON request body into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, RegistryError> {
    serde_json::from_slice(body)
        .map_err(|e| RegistryError::validation(format!("invalid request body: {e}")))
}

/// Decode a JSON request body into a raw value.
pub(crate) fn decode_value(body: &Bytes) -> Result<serde_json::Value, RegistryError> {
    serde_json::from_slice(body)
        .map_err(|e| RegistryError::validation(format!("invalid request body: {e}")))
}

/// Editor-or-better gate.
pub(crate) fn require_editor(ctx: &agr_auth::AuthContext) -> Result<(), RegistryError> {
    agr_auth::require_role(ctx, Role::Editor)
}

/// Admin gate.
pub(crate) fn require_admin(ctx: &agr_auth::AuthContext) -> Result<(), RegistryError> {
    agr_auth::require_role(ctx, Role::Admin)
}
