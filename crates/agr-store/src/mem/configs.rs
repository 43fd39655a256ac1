// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trust, signal, scoped-config, and credential tables on the in-memory
//! store.

use super::MemoryStore;
use crate::contract::{
    ApiKeyStore, ScopedConfigStore, SessionStore, SignalConfigStore, TrustStore,
};
use crate::StoreError;
use agr_core::scope::{ContextConfigOverride, ModelConfigOverride};
use agr_core::{ApiKey, ContextConfig, ModelConfig, Session, SignalConfig, TrustDefaults, TrustRule};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl TrustStore for MemoryStore {
    async fn get_defaults(&self) -> Result<Option<TrustDefaults>, StoreError> {
        Ok(self.trust.read().await.defaults.clone())
    }

    async fn put_defaults(&self, defaults: TrustDefaults) -> Result<TrustDefaults, StoreError> {
        self.trust.write().await.defaults = Some(defaults.clone());
        Ok(defaults)
    }

    async fn list_rules(&self) -> Result<Vec<TrustRule>, StoreError> {
        let table = self.trust.read().await;
        let mut rules: Vec<TrustRule> = table.rules.values().cloned().collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        Ok(rules)
    }

    async fn create_rule(&self, rule: TrustRule) -> Result<TrustRule, StoreError> {
        let mut table = self.trust.write().await;
        if table.rules.contains_key(&rule.id) {
            return Err(StoreError::Conflict(format!(
                "trust rule {} already exists",
                rule.id
            )));
        }
        table.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn delete_rule(&self, id: Uuid) -> Result<(), StoreError> {
        let mut table = self.trust.write().await;
        table
            .rules
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("trust rule {id}")))
    }
}

#[async_trait]
impl SignalConfigStore for MemoryStore {
    async fn get(&self) -> Result<Option<SignalConfig>, StoreError> {
        Ok(self.signal.read().await.clone())
    }

    async fn put(&self, config: SignalConfig) -> Result<SignalConfig, StoreError> {
        *self.signal.write().await = Some(config.clone());
        Ok(config)
    }
}

#[async_trait]
impl ScopedConfigStore for MemoryStore {
    async fn model_global(&self) -> Result<Option<ModelConfig>, StoreError> {
        Ok(self.configs.read().await.model_global.clone())
    }

    async fn model_effective(
        &self,
        workspace_id: &str,
    ) -> Result<Option<ModelConfig>, StoreError> {
        let table = self.configs.read().await;
        let Some(ref global) = table.model_global else {
            return Ok(None);
        };
        Ok(Some(match table.model_overrides.get(workspace_id) {
            Some(overlay) => overlay.merge_over(global),
            None => global.clone(),
        }))
    }

    async fn put_model_global(&self, config: ModelConfig) -> Result<ModelConfig, StoreError> {
        self.configs.write().await.model_global = Some(config.clone());
        Ok(config)
    }

    async fn put_model_override(
        &self,
        workspace_id: &str,
        overlay: ModelConfigOverride,
    ) -> Result<ModelConfigOverride, StoreError> {
        self.configs
            .write()
            .await
            .model_overrides
            .insert(workspace_id.to_string(), overlay.clone());
        Ok(overlay)
    }

    async fn context_global(&self) -> Result<Option<ContextConfig>, StoreError> {
        Ok(self.configs.read().await.context_global.clone())
    }

    async fn context_effective(
        &self,
        workspace_id: &str,
    ) -> Result<Option<ContextConfig>, StoreError> {
        let table = self.configs.read().await;
        let Some(ref global) = table.context_global else {
            return Ok(None);
        };
        Ok(Some(match table.context_overrides.get(workspace_id) {
            Some(overlay) => overlay.merge_over(global),
            None => global.clone(),
        }))
    }

    async fn put_context_global(
        &self,
        config: ContextConfig,
    ) -> Result<ContextConfig, StoreError> {
        self.configs.write().await.context_global = Some(config.clone());
        Ok(config)
    }

    async fn put_context_override(
        &self,
        workspace_id: &str,
        overlay: ContextConfigOverride,
    ) -> Result<ContextConfigOverride, StoreError> {
        self.configs
            .write()
            .await
            .context_overrides
            .insert(workspace_id.to_string(), overlay.clone());
        Ok(overlay)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session);
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<ApiKey>, StoreError> {
        Ok(self.api_keys.read().await.get(key).cloned())
    }

    async fn insert(&self, key: ApiKey) -> Result<(), StoreError> {
        self.api_keys.write().await.insert(key.key.clone(), key);
        Ok(())
    }
}
