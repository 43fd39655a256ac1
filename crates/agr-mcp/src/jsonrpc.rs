// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-RPC 2.0 envelope helpers.
//!
//! Requests are picked apart from raw [`Value`]s rather than typed structs
//! so that malformed shapes map onto the right protocol error instead of a
//! deserialization failure, and so that ids round-trip verbatim (numbers and
//! strings alike).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    /// Standard JSON-RPC error code.
    pub code: i64,
    /// Short description.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Build an error with no data payload.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// `-32700` parse error.
    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "parse error")
    }

    /// `-32600` invalid request.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    /// `-32601` method not found.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
    }

    /// `-32602` invalid params.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    /// `-32603` internal error. The message is deliberately generic.
    pub fn internal() -> Self {
        Self::new(INTERNAL_ERROR, "internal error")
    }
}

/// A parsed request: `id` preserved verbatim, `None` for notifications.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Request id. `None` means notification; an explicit JSON `null` is
    /// kept as `Some(Value::Null)` and echoed back.
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Raw params value, defaulting to `null`.
    pub params: Value,
}

/// Result of picking apart one element of a request body.
pub enum ParsedRequest {
    /// A well-formed request or notification.
    Ok(RpcRequest),
    /// The element was malformed; respond with this error (unless the
    /// element had no id at all and could never receive a response — the
    /// spec still answers shape errors with `id: null`).
    Err {
        /// Id to echo, `Value::Null` when unknown.
        id: Value,
        /// The protocol error.
        error: RpcError,
    },
}

/// Pick apart a single JSON value as a JSON-RPC request object.
#[must_use]
pub fn parse_request(value: &Value) -> ParsedRequest {
    let Some(obj) = value.as_object() else {
        return ParsedRequest::Err {
            id: Value::Null,
            error: RpcError::invalid_request("request must be an object"),
        };
    };

    let id = obj.get("id").cloned();
    let echo_id = id.clone().unwrap_or(Value::Null);

    match obj.get("jsonrpc").and_then(Value::as_str) {
        Some("2.0") => {}
        _ => {
            return ParsedRequest::Err {
                id: echo_id,
                error: RpcError::invalid_request("missing or invalid jsonrpc version"),
            };
        }
    }

    let Some(method) = obj.get("method").and_then(Value::as_str) else {
        return ParsedRequest::Err {
            id: echo_id,
            error: RpcError::invalid_request("missing method"),
        };
    };

    ParsedRequest::Ok(RpcRequest {
        id,
        method: method.to_string(),
        params: obj.get("params").cloned().unwrap_or(Value::Null),
    })
}

/// Build a success response echoing `id` verbatim.
#[must_use]
pub fn result_response(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

/// Build an error response echoing `id` verbatim.
#[must_use]
pub fn error_response(id: Value, error: RpcError) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": error})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_with_numeric_id() {
        let value = json!({"jsonrpc": "2.0", "id": 42, "method": "ping"});
        match parse_request(&value) {
            ParsedRequest::Ok(req) => {
                assert_eq!(req.id, Some(json!(42)));
                assert_eq!(req.method, "ping");
                assert!(req.params.is_null());
            }
            ParsedRequest::Err { .. } => panic!("expected ok"),
        }
    }

    #[test]
    fn string_ids_are_preserved_verbatim() {
        let value = json!({"jsonrpc": "2.0", "id": "req-7", "method": "ping"});
        let ParsedRequest::Ok(req) = parse_request(&value) else {
            panic!("expected ok");
        };
        assert_eq!(req.id, Some(json!("req-7")));
        let resp = result_response(req.id.unwrap(), json!({}));
        assert_eq!(resp["id"], "req-7");
    }

    #[test]
    fn missing_id_means_notification() {
        let value = json!({"jsonrpc": "2.0", "method": "initialized"});
        let ParsedRequest::Ok(req) = parse_request(&value) else {
            panic!("expected ok");
        };
        assert!(req.id.is_none());
    }

    #[test]
    fn missing_jsonrpc_field_is_invalid_request() {
        let value = json!({"id": 1, "method": "ping"});
        let ParsedRequest::Err { id, error } = parse_request(&value) else {
            panic!("expected err");
        };
        assert_eq!(id, json!(1));
        assert_eq!(error.code, INVALID_REQUEST);
    }

    #[test]
    fn wrong_jsonrpc_version_is_invalid_request() {
        let value = json!({"jsonrpc": "1.0", "id": 1, "method": "ping"});
        let ParsedRequest::Err { error, .. } = parse_request(&value) else {
            panic!("expected err");
        };
        assert_eq!(error.code, INVALID_REQUEST);
    }

    #[test]
    fn non_object_is_invalid_request_with_null_id() {
        let ParsedRequest::Err { id, error } = parse_request(&json!("ping")) else {
            panic!("expected err");
        };
        assert!(id.is_null());
        assert_eq!(error.code, INVALID_REQUEST);
    }

    #[test]
    fn error_codes_are_standard() {
        assert_eq!(RpcError::parse_error().code, -32700);
        assert_eq!(RpcError::invalid_request("x").code, -32600);
        assert_eq!(RpcError::method_not_found("m").code, -32601);
        assert_eq!(RpcError::invalid_params("p").code, -32602);
        assert_eq!(RpcError::internal().code, -32603);
    }

    #[test]
    fn error_response_shape() {
        let resp = error_response(json!(3), RpcError::method_not_found("nope"));
        assert_eq!(resp["jsonrpc"], "2.0");
        assert_eq!(resp["id"], 3);
        assert_eq!(resp["error"]["code"], -32601);
        assert!(resp.get("result").is_none());
    }
}
