// SPDX-License-Identifier: MIT OR Apache-2.0
//! MCP-server registry on the in-memory store.

use super::MemoryStore;
use crate::contract::{McpServerStore, McpServerUpdate, NewMcpServer};
use crate::StoreError;
use agr_core::{next_instant, McpServer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl McpServerStore for MemoryStore {
    async fn list(&self) -> Result<Vec<McpServer>, StoreError> {
        let servers = self.servers.read().await;
        let mut items: Vec<McpServer> = servers.values().cloned().collect();
        items.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(items)
    }

    async fn get(&self, label: &str) -> Result<McpServer, StoreError> {
        self.servers
            .read()
            .await
            .get(label)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("mcp server '{label}'")))
    }

    async fn create(&self, input: NewMcpServer) -> Result<McpServer, StoreError> {
        let mut servers = self.servers.write().await;
        if servers.contains_key(&input.label) {
            return Err(StoreError::Conflict(format!(
                "mcp server '{}' already exists",
                input.label
            )));
        }
        let now = Utc::now();
        let server = McpServer {
            label: input.label.clone(),
            url: input.url,
            auth_type: input.auth_type,
            auth_credential: input.auth_credential,
            circuit_breaker: input.circuit_breaker,
            discovery_interval_secs: input.discovery_interval_secs,
            is_enabled: true,
            created_at: now,
            updated_at: now,
        };
        servers.insert(input.label, server.clone());
        Ok(server)
    }

    async fn update(
        &self,
        label: &str,
        input: McpServerUpdate,
        etag: DateTime<Utc>,
    ) -> Result<McpServer, StoreError> {
        let mut servers = self.servers.write().await;
        let current = servers
            .get(label)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("mcp server '{label}'")))?;
        if current.updated_at != etag {
            return Err(StoreError::Stale(format!("mcp server '{label}'")));
        }
        let next = McpServer {
            url: input.url,
            auth_type: input.auth_type,
            auth_credential: input.auth_credential,
            circuit_breaker: input.circuit_breaker,
            discovery_interval_secs: input.discovery_interval_secs,
            updated_at: next_instant(current.updated_at, Utc::now()),
            // Identity, enable state, and provenance survive the update.
            label: current.label,
            is_enabled: current.is_enabled,
            created_at: current.created_at,
        };
        servers.insert(label.to_string(), next.clone());
        Ok(next)
    }

    async fn delete(&self, label: &str) -> Result<McpServer, StoreError> {
        let mut servers = self.servers.write().await;
        let server = servers
            .get_mut(label)
            .ok_or_else(|| StoreError::NotFound(format!("mcp server '{label}'")))?;
        server.is_enabled = false;
        server.updated_at = next_instant(server.updated_at, Utc::now());
        Ok(server.clone())
    }
}
