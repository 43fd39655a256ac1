// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scoped configuration overlays.
//!
//! Model and context configuration exist once globally and may be overlaid
//! per workspace. An overlay only carries the fields it sets; merging takes
//! the workspace value when set and falls back to the global value otherwise.

use crate::{ContextConfig, ModelConfig};
use serde::{Deserialize, Serialize};

/// Partial [`ModelConfig`] applied on top of the global value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelConfigOverride {
    /// Overrides [`ModelConfig::default_model`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Overrides [`ModelConfig::temperature`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Overrides [`ModelConfig::max_tokens`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    /// Overrides [`ModelConfig::max_tool_rounds`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<i64>,
    /// Overrides [`ModelConfig::embedding_model`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

impl ModelConfigOverride {
    /// Merge this overlay over `base`, producing the effective config.
    #[must_use]
    pub fn merge_over(&self, base: &ModelConfig) -> ModelConfig {
        ModelConfig {
            default_model: self
                .default_model
                .clone()
                .unwrap_or_else(|| base.default_model.clone()),
            temperature: self.temperature.unwrap_or(base.temperature),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            max_tool_rounds: self.max_tool_rounds.unwrap_or(base.max_tool_rounds),
            embedding_model: self
                .embedding_model
                .clone()
                .unwrap_or_else(|| base.embedding_model.clone()),
        }
    }

    /// `true` when the overlay sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default_model.is_none()
            && self.temperature.is_none()
            && self.max_tokens.is_none()
            && self.max_tool_rounds.is_none()
            && self.embedding_model.is_none()
    }
}

/// Partial [`ContextConfig`] applied on top of the global value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextConfigOverride {
    /// Overrides [`ContextConfig::default_context_window`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_context_window: Option<i64>,
    /// Overrides [`ContextConfig::default_max_output_tokens`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_output_tokens: Option<i64>,
    /// Overrides [`ContextConfig::history_budget_tokens`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_budget_tokens: Option<i64>,
    /// Overrides [`ContextConfig::history_budget_messages`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_budget_messages: Option<i64>,
}

impl ContextConfigOverride {
    /// Merge this overlay over `base`, producing the effective config.
    #[must_use]
    pub fn merge_over(&self, base: &ContextConfig) -> ContextConfig {
        ContextConfig {
            default_context_window: self
                .default_context_window
                .unwrap_or(base.default_context_window),
            default_max_output_tokens: self
                .default_max_output_tokens
                .unwrap_or(base.default_max_output_tokens),
            history_budget_tokens: self
                .history_budget_tokens
                .unwrap_or(base.history_budget_tokens),
            history_budget_messages: self
                .history_budget_messages
                .unwrap_or(base.history_budget_messages),
        }
    }

    /// `true` when the overlay sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default_context_window.is_none()
            && self.default_max_output_tokens.is_none()
            && self.history_budget_tokens.is_none()
            && self.history_budget_messages.is_none()
    }
}
