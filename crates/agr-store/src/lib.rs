// SPDX-License-Identifier: MIT OR Apache-2.0
//! agr-store
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Store contracts and the in-memory reference implementation.
//!
//! Each resource kind exposes a narrow capability trait to the handler tier;
//! nothing above this crate ever touches a backing map directly. The traits
//! carry the whole lifecycle contract: optimistic concurrency via the
//! last-update instant, pre-mutation version snapshots, per-endpoint version
//! auto-increment, atomic single-active swaps, and soft deletion.

/// Capability traits and mutation input types.
pub mod contract;
/// Parallel discovery snapshot composition.
pub mod discovery;
/// In-memory store implementation.
pub mod mem;
/// Typed PATCH application.
pub mod patch;

pub use contract::*;
pub use discovery::{DiscoverySnapshot, EndpointView, compose_discovery};
pub use mem::MemoryStore;
pub use patch::AgentPatch;

use agr_error::{ErrorCode, RegistryError};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failure surfaced by a store capability.
///
/// The envelope layer maps these to the public taxonomy; `Internal` message
/// content never crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested key does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A natural-key collision.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller's concurrency token no longer matches the row.
    #[error("stale concurrency token for {0}")]
    Stale(String),

    /// The mutation input was rejected by the store.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Unexpected internal failure.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Map to the public error taxonomy.
    #[must_use]
    pub fn into_registry(self) -> RegistryError {
        match self {
            Self::NotFound(msg) => RegistryError::new(ErrorCode::NotFound, msg),
            Self::Conflict(msg) => RegistryError::new(ErrorCode::Conflict, msg),
            Self::Stale(what) => RegistryError::new(
                ErrorCode::Conflict,
                format!("resource changed since it was read: {what}"),
            ),
            Self::Invalid(msg) => RegistryError::new(ErrorCode::Validation, msg),
            Self::Internal(msg) => RegistryError::internal(msg),
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        err.into_registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_taxonomy() {
        assert_eq!(
            StoreError::NotFound("agent 'x'".into())
                .into_registry()
                .code,
            ErrorCode::NotFound
        );
        assert_eq!(
            StoreError::Conflict("slug taken".into())
                .into_registry()
                .code,
            ErrorCode::Conflict
        );
        assert_eq!(
            StoreError::Stale("agent 'x'".into()).into_registry().code,
            ErrorCode::Conflict
        );
        assert_eq!(
            StoreError::Invalid("bad field".into()).into_registry().code,
            ErrorCode::Validation
        );
        assert_eq!(
            StoreError::Internal("lock poisoned".into())
                .into_registry()
                .code,
            ErrorCode::Internal
        );
    }

    #[test]
    fn internal_store_message_is_redacted_at_boundary() {
        let err: RegistryError = StoreError::Internal("pg: host 10.1.2.3 down".into()).into();
        assert_eq!(err.public_message(), "internal error");
    }
}
