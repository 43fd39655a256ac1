// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the agent registry
//! server.
//!
//! This crate provides [`RegistryConfig`] — bind address, external URL,
//! provider identity — together with helpers for loading from TOML files,
//! applying `AGR_*` environment overrides, and producing advisory
//! [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The external URL carries a trailing slash, which flows verbatim into
    /// projected agent-card URLs.
    TrailingSlashExternalUrl,
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::TrailingSlashExternalUrl => {
                write!(f, "external_url ends with '/', card URLs will contain '//'")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config type
// ---------------------------------------------------------------------------

/// Top-level runtime configuration for the registry server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Externally visible base URL, used verbatim when building agent-card
    /// and manifest URLs.
    #[serde(default = "default_external_url")]
    pub external_url: String,

    /// Organization name reported in A2A provider blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_organization: Option<String>,

    /// Organization URL reported in A2A provider blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8180".into()
}

fn default_external_url() -> String {
    "http://127.0.0.1:8180".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            external_url: default_external_url(),
            provider_organization: None,
            provider_url: None,
            log_level: Some("info".into()),
        }
    }
}

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`RegistryConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`RegistryConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<RegistryConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => RegistryConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`RegistryConfig`].
pub fn parse_toml(content: &str) -> Result<RegistryConfig, ConfigError> {
    toml::from_str::<RegistryConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `AGR_BIND`
/// - `AGR_EXTERNAL_URL`
/// - `AGR_PROVIDER_ORGANIZATION`
/// - `AGR_PROVIDER_URL`
/// - `AGR_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut RegistryConfig) {
    if let Ok(val) = std::env::var("AGR_BIND") {
        config.bind = val;
    }
    if let Ok(val) = std::env::var("AGR_EXTERNAL_URL") {
        config.external_url = val;
    }
    if let Ok(val) = std::env::var("AGR_PROVIDER_ORGANIZATION") {
        config.provider_organization = Some(val);
    }
    if let Ok(val) = std::env::var("AGR_PROVIDER_URL") {
        config.provider_url = Some(val);
    }
    if let Ok(val) = std::env::var("AGR_LOG_LEVEL") {
        config.log_level = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (unparseable bind address, non-HTTP external URL, unknown log
/// level) come back as [`ConfigError::ValidationError`]; soft issues come
/// back as warnings.
pub fn validate_config(config: &RegistryConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.bind.parse::<std::net::SocketAddr>().is_err() {
        errors.push(format!("invalid bind address '{}'", config.bind));
    }

    if !config.external_url.starts_with("http://") && !config.external_url.starts_with("https://") {
        errors.push(format!(
            "external_url '{}' must start with http:// or https://",
            config.external_url
        ));
    } else if config.external_url.ends_with('/') {
        warnings.push(ConfigWarning::TrailingSlashExternalUrl);
    }

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if config.provider_organization.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "provider_organization".into(),
            hint: "agent cards will carry an empty provider block".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // -- 1. Default config is valid ------------------------------------------

    #[test]
    fn default_config_is_valid() {
        let cfg = RegistryConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(!warnings.is_empty(), "should have advisory warnings");
    }

    // -- 2. Parse from TOML string -------------------------------------------

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            bind = "0.0.0.0:9000"
            external_url = "https://registry.example.com"
            provider_organization = "Acme"
            log_level = "debug"
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:9000");
        assert_eq!(cfg.external_url, "https://registry.example.com");
        assert_eq!(cfg.provider_organization.as_deref(), Some("Acme"));
    }

    // -- 3. Invalid TOML produces ParseError ---------------------------------

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let err = parse_toml("this is [not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_wrong_types_gives_parse_error() {
        let err = parse_toml("bind = 42").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    // -- 4. Validation errors -------------------------------------------------

    #[test]
    fn validation_catches_bad_bind() {
        let cfg = RegistryConfig {
            bind: "not-an-addr".into(),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_non_http_external_url() {
        let cfg = RegistryConfig {
            external_url: "ftp://registry".into(),
            ..Default::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = RegistryConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    // -- 5. Trailing slash is advisory, not fatal ------------------------------

    #[test]
    fn trailing_slash_warns_but_passes() {
        let cfg = RegistryConfig {
            external_url: "https://registry.example.com/".into(),
            ..Default::default()
        };
        let warnings = validate_config(&cfg).unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::TrailingSlashExternalUrl))
        );
    }

    // -- 6. Env overrides beat file values -------------------------------------

    #[test]
    #[allow(unsafe_code)]
    fn env_overrides_applied() {
        let mut cfg = RegistryConfig::default();
        // Env manipulation is process-global; keep the touched keys unique to
        // this test.
        unsafe {
            std::env::set_var("AGR_EXTERNAL_URL", "https://override.example.com");
        }
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("AGR_EXTERNAL_URL");
        }
        assert_eq!(cfg.external_url, "https://override.example.com");
    }

    // -- 7. Load from file / missing file --------------------------------------

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "bind = \"127.0.0.1:7777\"\nlog_level = \"warn\"").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:7777");
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/registry.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    // -- 8. Roundtrip -----------------------------------------------------------

    #[test]
    fn toml_roundtrip() {
        let cfg = RegistryConfig {
            bind: "0.0.0.0:8443".into(),
            external_url: "https://r.example.com".into(),
            provider_organization: Some("Acme".into()),
            provider_url: Some("https://acme.example.com".into()),
            log_level: Some("debug".into()),
        };
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: RegistryConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }

    #[test]
    fn empty_toml_parses_to_defaults() {
        let cfg = parse_toml("").unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:8180");
    }
}
