// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input validation shared by every mutation path.
//!
//! Handlers validate before touching the store; the store re-validates
//! nothing. All functions return [`RegistryError`] with
//! [`ErrorCode::Validation`](agr_error::ErrorCode::Validation) so surfaces
//! map them uniformly to 400.

use crate::{EndpointMode, ModelEndpoint, PromptMode, Tool, ToolSource};
use agr_error::RegistryError;
use serde_json::Value;
use std::net::IpAddr;
use url::{Host, Url};

/// Maximum system-prompt size in bytes (100 KiB).
pub const MAX_PROMPT_BYTES: usize = 100 * 1024;

/// Maximum endpoint-version config size in bytes (32 KiB).
pub const MAX_VERSION_CONFIG_BYTES: usize = 32 * 1024;

/// Maximum request body size in bytes (1 MiB), enforced before parsing.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Validate an agent or endpoint slug: `^[a-z][a-z0-9_]{2,}$`.
pub fn validate_slug(slug: &str) -> Result<(), RegistryError> {
    let mut chars = slug.chars();
    let valid_head = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if slug.len() < 3 || !valid_head || !valid_tail {
        return Err(RegistryError::validation(format!(
            "invalid slug '{slug}': expected lowercase letters, digits, and underscores, \
             starting with a letter, at least 3 characters"
        )));
    }
    Ok(())
}

/// Validate a single tool entry.
///
/// MCP-sourced tools must carry a non-empty `server_label`.
pub fn validate_tool(tool: &Tool) -> Result<(), RegistryError> {
    if tool.name.trim().is_empty() {
        return Err(RegistryError::validation("tool name must not be empty"));
    }
    if tool.source == ToolSource::Mcp && tool.server_label.trim().is_empty() {
        return Err(RegistryError::validation(format!(
            "tool '{}' has source 'mcp' but no server_label",
            tool.name
        )));
    }
    Ok(())
}

/// Validate the mutable agent fields shared by create and update.
pub fn validate_agent_fields(
    name: &str,
    tools: &[Tool],
    trust_overrides: &Value,
) -> Result<(), RegistryError> {
    if name.trim().is_empty() {
        return Err(RegistryError::validation("name must not be empty"));
    }
    for tool in tools {
        validate_tool(tool)?;
    }
    if !trust_overrides.is_object() && !trust_overrides.is_null() {
        return Err(RegistryError::validation(
            "trust_overrides must be a JSON object",
        ));
    }
    Ok(())
}

/// Validate a system prompt body against the size cap.
pub fn validate_prompt_text(system_prompt: &str) -> Result<(), RegistryError> {
    if system_prompt.len() > MAX_PROMPT_BYTES {
        return Err(RegistryError::validation(format!(
            "system_prompt exceeds {MAX_PROMPT_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Validate a prompt mode string outside of typed deserialization paths.
pub fn parse_prompt_mode(s: &str) -> Result<PromptMode, RegistryError> {
    match s {
        "rag_readonly" => Ok(PromptMode::RagReadonly),
        "toolcalling_safe" => Ok(PromptMode::ToolcallingSafe),
        "toolcalling_auto" => Ok(PromptMode::ToolcallingAuto),
        other => Err(RegistryError::validation(format!(
            "unknown prompt mode '{other}'"
        ))),
    }
}

/// Validate an endpoint-version config blob against the size cap.
pub fn validate_version_config(config: &Value) -> Result<(), RegistryError> {
    let serialized = serde_json::to_vec(config)
        .map_err(|e| RegistryError::validation(format!("config is not serialisable: {e}")))?;
    if serialized.len() > MAX_VERSION_CONFIG_BYTES {
        return Err(RegistryError::validation(format!(
            "config exceeds {MAX_VERSION_CONFIG_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Validate a model endpoint definition: slug, URL, and mode constraints.
pub fn validate_endpoint(endpoint: &ModelEndpoint) -> Result<(), RegistryError> {
    validate_endpoint_parts(
        &endpoint.slug,
        &endpoint.url,
        endpoint.mode,
        endpoint.model_name.as_deref(),
        &endpoint.allowed_models,
    )
}

/// Validate endpoint fields before an entity exists (create/update inputs).
pub fn validate_endpoint_parts(
    slug: &str,
    url: &str,
    mode: EndpointMode,
    model_name: Option<&str>,
    allowed_models: &[String],
) -> Result<(), RegistryError> {
    validate_slug(slug)?;
    validate_outbound_url(url)?;
    match mode {
        EndpointMode::Fixed => {
            if model_name.is_none_or(|m| m.trim().is_empty()) {
                return Err(RegistryError::validation(
                    "fixed endpoints require model_name",
                ));
            }
            if !allowed_models.is_empty() {
                return Err(RegistryError::validation(
                    "fixed endpoints must not set allowed_models",
                ));
            }
        }
        EndpointMode::Flexible => {
            if allowed_models.is_empty() {
                return Err(RegistryError::validation(
                    "flexible endpoints require a non-empty allowed_models list",
                ));
            }
            if model_name.is_some() {
                return Err(RegistryError::validation(
                    "flexible endpoints must not set model_name",
                ));
            }
        }
    }
    Ok(())
}

/// Validate an outbound URL: http/https only, and the host must not land in
/// loopback, link-local, private, or cloud-metadata address space.
pub fn validate_outbound_url(raw: &str) -> Result<(), RegistryError> {
    let url = Url::parse(raw)
        .map_err(|_| RegistryError::validation(format!("invalid URL '{raw}'")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RegistryError::validation(format!(
                "unsupported URL scheme '{other}'"
            )));
        }
    }

    match url.host() {
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip))?,
        Some(Host::Domain(domain)) => check_domain(domain)?,
        None => return Err(RegistryError::validation("URL has no host")),
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), RegistryError> {
    let blocked = match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
        }
    };
    if blocked {
        return Err(RegistryError::validation(format!(
            "URL host {ip} is in a blocked address range"
        )));
    }
    Ok(())
}

fn check_domain(domain: &str) -> Result<(), RegistryError> {
    let lower = domain.to_ascii_lowercase();
    let blocked = lower == "localhost"
        || lower.ends_with(".localhost")
        || lower == "metadata"
        || lower == "metadata.google.internal"
        || lower.ends_with(".internal");
    if blocked {
        return Err(RegistryError::validation(format!(
            "URL host '{domain}' is not routable"
        )));
    }
    Ok(())
}
