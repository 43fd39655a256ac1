// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agent lifecycle on the in-memory store.

use super::MemoryStore;
use crate::contract::{AgentStore, AgentUpdate, ListQuery, NewAgent};
use crate::patch::AgentPatch;
use crate::StoreError;
use agr_core::page::{Page, PageParams};
use agr_core::{next_instant, Agent, AgentVersion};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Null trust overrides normalise to the empty object so reads are uniform.
fn normalize_overrides(value: Value) -> Value {
    if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    }
}

fn matches_query(agent: &Agent, query: &ListQuery) -> bool {
    if query.active_only && !agent.is_active {
        return false;
    }
    if let Some(ref q) = query.q {
        let q = q.to_lowercase();
        return agent.name.to_lowercase().contains(&q)
            || agent.description.to_lowercase().contains(&q);
    }
    true
}

#[async_trait]
impl AgentStore for MemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Page<Agent>, StoreError> {
        let table = self.agents.read().await;
        let mut items: Vec<Agent> = table
            .items
            .values()
            .filter(|a| matches_query(a, query))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(PageParams {
            offset: query.offset,
            limit: query.limit,
        }
        .slice(&items))
    }

    async fn get(&self, id: &str) -> Result<Agent, StoreError> {
        self.agents
            .read()
            .await
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))
    }

    async fn create(&self, input: NewAgent, actor: &str) -> Result<Agent, StoreError> {
        let mut table = self.agents.write().await;
        if table.items.contains_key(&input.id) {
            return Err(StoreError::Conflict(format!(
                "agent '{}' already exists",
                input.id
            )));
        }
        let now = Utc::now();
        let agent = Agent {
            id: input.id.clone(),
            name: input.name,
            description: input.description,
            tools: input.tools,
            trust_overrides: normalize_overrides(input.trust_overrides),
            example_prompts: input.example_prompts,
            is_active: true,
            version: 1,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        };
        table.items.insert(input.id, agent.clone());
        Ok(agent)
    }

    async fn update(
        &self,
        id: &str,
        input: AgentUpdate,
        etag: DateTime<Utc>,
        actor: &str,
    ) -> Result<Agent, StoreError> {
        let mut table = self.agents.write().await;
        let agent = table
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))?;
        if agent.updated_at != etag {
            return Err(StoreError::Stale(format!("agent '{id}'")));
        }

        archive(&mut table.history, &agent, actor);

        let next = Agent {
            name: input.name,
            description: input.description,
            tools: input.tools,
            trust_overrides: normalize_overrides(input.trust_overrides),
            example_prompts: input.example_prompts,
            version: agent.version + 1,
            updated_at: next_instant(agent.updated_at, Utc::now()),
            // Identity and provenance survive every update.
            id: agent.id,
            is_active: agent.is_active,
            created_by: agent.created_by,
            created_at: agent.created_at,
        };
        table.items.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn patch(
        &self,
        id: &str,
        patch: AgentPatch,
        etag: DateTime<Utc>,
        actor: &str,
    ) -> Result<Agent, StoreError> {
        let mut table = self.agents.write().await;
        let agent = table
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))?;
        if agent.updated_at != etag {
            return Err(StoreError::Stale(format!("agent '{id}'")));
        }

        archive(&mut table.history, &agent, actor);

        let mut next = agent.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(tools) = patch.tools {
            next.tools = tools;
        }
        if let Some(overrides) = patch.trust_overrides {
            next.trust_overrides = normalize_overrides(overrides);
        }
        if let Some(prompts) = patch.example_prompts {
            next.example_prompts = prompts;
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        next.version = agent.version + 1;
        next.updated_at = next_instant(agent.updated_at, Utc::now());
        table.items.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn delete(&self, id: &str, actor: &str) -> Result<Agent, StoreError> {
        let mut table = self.agents.write().await;
        let agent = table
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))?;

        archive(&mut table.history, &agent, actor);

        let mut next = agent.clone();
        next.is_active = false;
        next.version = agent.version + 1;
        next.updated_at = next_instant(agent.updated_at, Utc::now());
        table.items.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn list_versions(&self, id: &str) -> Result<Vec<AgentVersion>, StoreError> {
        let table = self.agents.read().await;
        let agent = table
            .items
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))?;
        let mut versions = table.history.get(id).cloned().unwrap_or_default();
        versions.push(live_snapshot(agent));
        Ok(versions)
    }

    async fn get_version(&self, id: &str, version: i64) -> Result<AgentVersion, StoreError> {
        let table = self.agents.read().await;
        let agent = table
            .items
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))?;
        if agent.version == version {
            return Ok(live_snapshot(agent));
        }
        table
            .history
            .get(id)
            .and_then(|h| h.iter().find(|v| v.version == version))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}' version {version}")))
    }

    async fn rollback(&self, id: &str, version: i64, actor: &str) -> Result<Agent, StoreError> {
        let mut table = self.agents.write().await;
        let agent = table
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))?;
        let target = if agent.version == version {
            agent.clone()
        } else {
            table
                .history
                .get(id)
                .and_then(|h| h.iter().find(|v| v.version == version))
                .map(|v| v.snapshot.clone())
                .ok_or_else(|| {
                    StoreError::NotFound(format!("agent '{id}' version {version}"))
                })?
        };

        archive(&mut table.history, &agent, actor);

        // Materialize the snapshot's content as a new latest version; the
        // entity's provenance fields stay untouched.
        let next = Agent {
            name: target.name,
            description: target.description,
            tools: target.tools,
            trust_overrides: target.trust_overrides,
            example_prompts: target.example_prompts,
            is_active: target.is_active,
            version: agent.version + 1,
            updated_at: next_instant(agent.updated_at, Utc::now()),
            id: agent.id,
            created_by: agent.created_by,
            created_at: agent.created_at,
        };
        table.items.insert(id.to_string(), next.clone());
        Ok(next)
    }
}

fn archive(
    history: &mut std::collections::HashMap<String, Vec<AgentVersion>>,
    agent: &Agent,
    actor: &str,
) {
    history
        .entry(agent.id.clone())
        .or_default()
        .push(AgentVersion {
            agent_id: agent.id.clone(),
            version: agent.version,
            snapshot: agent.clone(),
            created_by: actor.to_string(),
            recorded_at: Utc::now(),
        });
}

fn live_snapshot(agent: &Agent) -> AgentVersion {
    AgentVersion {
        agent_id: agent.id.clone(),
        version: agent.version,
        snapshot: agent.clone(),
        created_by: agent.created_by.clone(),
        recorded_at: agent.updated_at,
    }
}
