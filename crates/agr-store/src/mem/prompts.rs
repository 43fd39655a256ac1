// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prompt lifecycle on the in-memory store.
//!
//! The single-active invariant is enforced inside the write guard: an
//! activation flips the target on and every sibling with the same agent slug
//! off in one critical section.

use super::MemoryStore;
use crate::contract::{NewPrompt, PromptStore};
use crate::StoreError;
use agr_core::{next_instant, Prompt};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl PromptStore for MemoryStore {
    async fn list(&self, agent_id: &str) -> Result<Vec<Prompt>, StoreError> {
        let table = self.prompts.read().await;
        let mut prompts: Vec<Prompt> = table
            .items
            .values()
            .filter(|p| p.agent_id == agent_id)
            .cloned()
            .collect();
        prompts.sort_by_key(|p| p.created_at);
        Ok(prompts)
    }

    async fn get(&self, agent_id: &str, prompt_id: Uuid) -> Result<Prompt, StoreError> {
        let table = self.prompts.read().await;
        table
            .items
            .get(&prompt_id)
            .filter(|p| p.agent_id == agent_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("prompt {prompt_id} for agent '{agent_id}'"))
            })
    }

    async fn get_active(&self, agent_id: &str) -> Result<Option<Prompt>, StoreError> {
        let table = self.prompts.read().await;
        Ok(table
            .items
            .values()
            .find(|p| p.agent_id == agent_id && p.is_active)
            .cloned())
    }

    async fn create(
        &self,
        agent_id: &str,
        input: NewPrompt,
        actor: &str,
    ) -> Result<Prompt, StoreError> {
        let mut table = self.prompts.write().await;
        let now = Utc::now();
        let prompt = Prompt {
            id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            system_prompt: input.system_prompt,
            template_variables: if input.template_variables.is_null() {
                serde_json::json!({})
            } else {
                input.template_variables
            },
            mode: input.mode,
            version: 1,
            is_active: false,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        };
        table.items.insert(prompt.id, prompt.clone());
        Ok(prompt)
    }

    async fn activate(&self, agent_id: &str, prompt_id: Uuid) -> Result<Prompt, StoreError> {
        let mut table = self.prompts.write().await;
        if !table
            .items
            .get(&prompt_id)
            .is_some_and(|p| p.agent_id == agent_id)
        {
            return Err(StoreError::NotFound(format!(
                "prompt {prompt_id} for agent '{agent_id}'"
            )));
        }

        // Swap: deactivate every sibling, then activate the target. One write
        // guard makes this atomic under concurrent activations.
        for prompt in table.items.values_mut() {
            if prompt.agent_id == agent_id && prompt.is_active && prompt.id != prompt_id {
                prompt.is_active = false;
                prompt.updated_at = next_instant(prompt.updated_at, Utc::now());
            }
        }
        let target = table
            .items
            .get_mut(&prompt_id)
            .ok_or_else(|| StoreError::NotFound(format!("prompt {prompt_id}")))?;
        if !target.is_active {
            target.is_active = true;
            target.updated_at = next_instant(target.updated_at, Utc::now());
        }
        Ok(target.clone())
    }

    async fn rollback(
        &self,
        agent_id: &str,
        prompt_id: Uuid,
        version: i64,
        _actor: &str,
    ) -> Result<Prompt, StoreError> {
        let mut table = self.prompts.write().await;
        let current = table
            .items
            .get(&prompt_id)
            .filter(|p| p.agent_id == agent_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("prompt {prompt_id} for agent '{agent_id}'"))
            })?;

        let target = if current.version == version {
            current.clone()
        } else {
            table
                .history
                .get(&prompt_id)
                .and_then(|h| h.iter().find(|p| p.version == version))
                .cloned()
                .ok_or_else(|| {
                    StoreError::NotFound(format!("prompt {prompt_id} version {version}"))
                })?
        };

        table
            .history
            .entry(prompt_id)
            .or_default()
            .push(current.clone());

        let next = Prompt {
            system_prompt: target.system_prompt,
            template_variables: target.template_variables,
            mode: target.mode,
            version: current.version + 1,
            updated_at: next_instant(current.updated_at, Utc::now()),
            // Identity, activation state, and provenance stay put.
            id: current.id,
            agent_id: current.agent_id,
            is_active: current.is_active,
            created_by: current.created_by,
            created_at: current.created_at,
        };
        table.items.insert(prompt_id, next.clone());
        Ok(next)
    }

    async fn list_versions(
        &self,
        agent_id: &str,
        prompt_id: Uuid,
    ) -> Result<Vec<Prompt>, StoreError> {
        let table = self.prompts.read().await;
        let current = table
            .items
            .get(&prompt_id)
            .filter(|p| p.agent_id == agent_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("prompt {prompt_id} for agent '{agent_id}'"))
            })?;
        let mut versions = table.history.get(&prompt_id).cloned().unwrap_or_default();
        versions.push(current);
        Ok(versions)
    }
}
