// SPDX-License-Identifier: MIT OR Apache-2.0
//! agr-mcp
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The MCP surface: a JSON-RPC 2.0 dispatcher over the same stores the REST
//! handlers use, plus the tools/resources/prompts projection and the public
//! manifest.
//!
//! Protocol-level failures (unknown method or tool, invalid params,
//! malformed URIs) surface as JSON-RPC error objects; store failures
//! surface as successful responses whose tool result carries
//! `isError: true`. The two never mix.

/// JSON-RPC 2.0 envelope types and error codes.
pub mod jsonrpc;
/// Public MCP manifest.
pub mod manifest;
/// Prompt projection with `{{var}}` substitution.
pub mod prompts;
/// Resource URIs and reads.
pub mod resources;
/// JSON-RPC session store.
pub mod session;
/// Method dispatch.
pub mod service;
/// Fixed tool catalog.
pub mod tools;

pub use jsonrpc::{RpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
pub use manifest::build_manifest;
pub use service::{DispatchResult, McpService, McpServerInfo, RpcOutcome};
pub use session::{McpSession, McpSessionStore};

/// MCP protocol revision negotiated by `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

/// Name of the session id header on the HTTP transport.
pub const SESSION_HEADER: &str = "mcp-session-id";
