// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed PATCH application.
//!
//! A PATCH body arrives as a JSON object; each recognised field is converted
//! to its typed form individually so one wrong-typed field fails the whole
//! call with a field-level validation message. Unknown fields are rejected
//! rather than ignored.

use crate::StoreError;
use agr_core::Tool;
use serde_json::Value;

/// Typed partial update for an agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New tool list.
    pub tools: Option<Vec<Tool>>,
    /// New trust overrides.
    pub trust_overrides: Option<Value>,
    /// New example prompts.
    pub example_prompts: Option<Vec<String>>,
    /// New active flag (re-activation of a soft-deleted agent).
    pub is_active: Option<bool>,
}

impl AgentPatch {
    /// Parse a PATCH body, checking every field's type.
    pub fn from_value(body: &Value) -> Result<Self, StoreError> {
        let map = body
            .as_object()
            .ok_or_else(|| StoreError::Invalid("patch body must be a JSON object".into()))?;

        let mut patch = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "name" => patch.name = Some(expect_string(key, value)?),
                "description" => patch.description = Some(expect_string(key, value)?),
                "tools" => {
                    let tools: Vec<Tool> = serde_json::from_value(value.clone()).map_err(|e| {
                        StoreError::Invalid(format!("field 'tools' is not a tool list: {e}"))
                    })?;
                    patch.tools = Some(tools);
                }
                "trust_overrides" => {
                    if !value.is_object() && !value.is_null() {
                        return Err(StoreError::Invalid(
                            "field 'trust_overrides' must be an object".into(),
                        ));
                    }
                    patch.trust_overrides = Some(value.clone());
                }
                "example_prompts" => {
                    let prompts: Vec<String> =
                        serde_json::from_value(value.clone()).map_err(|_| {
                            StoreError::Invalid(
                                "field 'example_prompts' must be a string array".into(),
                            )
                        })?;
                    patch.example_prompts = Some(prompts);
                }
                "is_active" => {
                    patch.is_active = Some(value.as_bool().ok_or_else(|| {
                        StoreError::Invalid("field 'is_active' must be a boolean".into())
                    })?);
                }
                other => {
                    return Err(StoreError::Invalid(format!(
                        "unknown patch field '{other}'"
                    )));
                }
            }
        }
        Ok(patch)
    }

    /// `true` when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tools.is_none()
            && self.trust_overrides.is_none()
            && self.example_prompts.is_none()
            && self.is_active.is_none()
    }
}

fn expect_string(key: &str, value: &Value) -> Result<String, StoreError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| StoreError::Invalid(format!("field '{key}' must be a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_known_fields() {
        let patch = AgentPatch::from_value(&json!({
            "name": "New name",
            "example_prompts": ["one", "two"],
            "is_active": false
        }))
        .unwrap();
        assert_eq!(patch.name.as_deref(), Some("New name"));
        assert_eq!(patch.example_prompts.as_deref(), Some(&["one".to_string(), "two".to_string()][..]));
        assert_eq!(patch.is_active, Some(false));
        assert!(patch.description.is_none());
    }

    #[test]
    fn wrong_typed_name_fails_validation() {
        let err = AgentPatch::from_value(&json!({"name": 123})).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn wrong_typed_tools_fails_validation() {
        let err = AgentPatch::from_value(&json!({"tools": "not-a-list"})).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = AgentPatch::from_value(&json!({"slug": "nope"})).unwrap_err();
        assert!(err.to_string().contains("unknown patch field"));
    }

    #[test]
    fn non_object_body_rejected() {
        assert!(AgentPatch::from_value(&json!([1, 2])).is_err());
        assert!(AgentPatch::from_value(&json!("str")).is_err());
    }

    #[test]
    fn empty_object_is_empty_patch() {
        let patch = AgentPatch::from_value(&json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn trust_overrides_null_allowed() {
        let patch = AgentPatch::from_value(&json!({"trust_overrides": null})).unwrap();
        assert_eq!(patch.trust_overrides, Some(Value::Null));
        assert!(AgentPatch::from_value(&json!({"trust_overrides": [1]})).is_err());
    }
}
