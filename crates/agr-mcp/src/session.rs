// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-RPC session store.
//!
//! Sessions are created by `initialize` and torn down by `DELETE` on the
//! endpoint. They are informational: method calls are served with or without
//! a session header. The map is mutex-guarded and every touch is O(1).

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One negotiated protocol session.
#[derive(Debug, Clone, PartialEq)]
pub struct McpSession {
    /// 64-hex-character opaque id.
    pub id: String,
    /// Protocol version the client asked for (echoed, not enforced).
    pub protocol_version: String,
    /// Client-reported implementation info.
    pub client_info: Value,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Generate a fresh 64-hex session id from random UUID material.
#[must_use]
pub fn new_session_id() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Mutex-guarded session map.
#[derive(Clone, Default)]
pub struct McpSessionStore {
    inner: Arc<Mutex<HashMap<String, McpSession>>>,
}

impl McpSessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return it.
    pub async fn create(&self, protocol_version: String, client_info: Value) -> McpSession {
        let session = McpSession {
            id: new_session_id(),
            protocol_version,
            client_info,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .await
            .insert(session.id.clone(), session.clone());
        session
    }

    /// Look up a session by id.
    pub async fn get(&self, id: &str) -> Option<McpSession> {
        self.inner.lock().await.get(id).cloned()
    }

    /// Remove a session; `true` if it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.inner.lock().await.remove(id).is_some()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// `true` when no sessions exist.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_64_hex() {
        let id = new_session_id();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn create_get_remove_roundtrip() {
        let store = McpSessionStore::new();
        let session = store
            .create("2025-03-26".into(), serde_json::json!({"name": "cli"}))
            .await;
        assert_eq!(store.len().await, 1);

        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched.protocol_version, "2025-03-26");
        assert_eq!(fetched.client_info["name"], "cli");

        assert!(store.remove(&session.id).await);
        assert!(!store.remove(&session.id).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_create_and_delete_is_race_free() {
        let store = McpSessionStore::new();
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let s = store.create("2025-03-26".into(), Value::Null).await;
                assert!(store.get(&s.id).await.is_some());
                assert!(store.remove(&s.id).await);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(store.is_empty().await);
    }
}
