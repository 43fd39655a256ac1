// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prompt projection.
//!
//! Each agent contributes one prompt definition named by its slug. The
//! definition's arguments come from the active prompt's declared template
//! variables; `prompts/get` substitutes `{{var}}` placeholders with supplied
//! arguments and leaves unsupplied ones literal.

use serde_json::{json, Map, Value};

/// Substitute `{{var}}` placeholders in `template` with values from `args`.
///
/// Only supplied variables are replaced; everything else — including
/// placeholders for variables the prompt never declared — stays byte-for-byte
/// intact.
#[must_use]
pub fn substitute(template: &str, args: &Map<String, Value>) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        let needle = format!("{{{{{name}}}}}");
        let replacement = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out = out.replace(&needle, &replacement);
    }
    out
}

/// Argument declarations derived from a prompt's `template_variables` object.
///
/// Each key becomes one argument; a string value doubles as its description.
#[must_use]
pub fn arguments_from_variables(template_variables: &Value) -> Vec<Value> {
    let Some(map) = template_variables.as_object() else {
        return Vec::new();
    };
    map.iter()
        .map(|(name, description)| {
            json!({
                "name": name,
                "description": description.as_str().unwrap_or_default(),
                "required": false
            })
        })
        .collect()
}

/// Build a `prompts/get` result from a substituted prompt body.
#[must_use]
pub fn get_result(description: &str, text: String) -> Value {
    json!({
        "description": description,
        "messages": [{
            "role": "user",
            "content": {"type": "text", "text": text}
        }]
    })
}
