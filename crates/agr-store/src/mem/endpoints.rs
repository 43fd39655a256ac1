// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model-endpoint lifecycle on the in-memory store.
//!
//! Revision numbers auto-increment under the write guard, so N concurrent
//! `create_version` calls yield exactly `{1…N}`. Creating or activating a
//! revision performs the single-active swap in the same critical section.

use super::MemoryStore;
use crate::contract::{ListQuery, ModelEndpointStore, NewEndpointVersion, NewModelEndpoint};
use crate::StoreError;
use agr_core::page::{Page, PageParams};
use agr_core::redact::redact_config_headers;
use agr_core::{next_instant, ModelEndpoint, ModelEndpointVersion};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

fn redacted(revision: &ModelEndpointVersion) -> ModelEndpointVersion {
    let mut out = revision.clone();
    out.config = redact_config_headers(&out.config);
    out
}

#[async_trait]
impl ModelEndpointStore for MemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Page<ModelEndpoint>, StoreError> {
        let table = self.endpoints.read().await;
        let mut items: Vec<ModelEndpoint> = table
            .items
            .values()
            .filter(|e| !query.active_only || e.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(PageParams {
            offset: query.offset,
            limit: query.limit,
        }
        .slice(&items))
    }

    async fn get(&self, slug: &str) -> Result<ModelEndpoint, StoreError> {
        self.endpoints
            .read()
            .await
            .items
            .get(slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("model endpoint '{slug}'")))
    }

    async fn create(
        &self,
        input: NewModelEndpoint,
        actor: &str,
    ) -> Result<ModelEndpoint, StoreError> {
        let mut table = self.endpoints.write().await;
        if table.items.contains_key(&input.slug) {
            return Err(StoreError::Conflict(format!(
                "model endpoint '{}' already exists",
                input.slug
            )));
        }
        let now = Utc::now();
        let endpoint = ModelEndpoint {
            slug: input.slug.clone(),
            provider: input.provider,
            url: input.url,
            mode: input.mode,
            model_name: input.model_name,
            allowed_models: input.allowed_models,
            workspace_id: input.workspace_id,
            is_active: true,
            version: 1,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        };
        table.items.insert(input.slug, endpoint.clone());
        Ok(endpoint)
    }

    async fn update(
        &self,
        slug: &str,
        input: NewModelEndpoint,
        etag: DateTime<Utc>,
    ) -> Result<ModelEndpoint, StoreError> {
        let mut table = self.endpoints.write().await;
        let current = table
            .items
            .get(slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("model endpoint '{slug}'")))?;
        if current.updated_at != etag {
            return Err(StoreError::Stale(format!("model endpoint '{slug}'")));
        }
        let next = ModelEndpoint {
            provider: input.provider,
            url: input.url,
            mode: input.mode,
            model_name: input.model_name,
            allowed_models: input.allowed_models,
            workspace_id: input.workspace_id,
            version: current.version + 1,
            updated_at: next_instant(current.updated_at, Utc::now()),
            slug: current.slug,
            is_active: current.is_active,
            created_by: current.created_by,
            created_at: current.created_at,
        };
        table.items.insert(slug.to_string(), next.clone());
        Ok(next)
    }

    async fn delete(&self, slug: &str) -> Result<ModelEndpoint, StoreError> {
        let mut table = self.endpoints.write().await;
        let current = table
            .items
            .get_mut(slug)
            .ok_or_else(|| StoreError::NotFound(format!("model endpoint '{slug}'")))?;
        current.is_active = false;
        current.version += 1;
        current.updated_at = next_instant(current.updated_at, Utc::now());
        Ok(current.clone())
    }

    async fn list_versions(&self, slug: &str) -> Result<Vec<ModelEndpointVersion>, StoreError> {
        let table = self.endpoints.read().await;
        if !table.items.contains_key(slug) {
            return Err(StoreError::NotFound(format!("model endpoint '{slug}'")));
        }
        Ok(table
            .revisions
            .get(slug)
            .map(|revs| revs.iter().map(redacted).collect())
            .unwrap_or_default())
    }

    async fn get_version(
        &self,
        slug: &str,
        version: i64,
    ) -> Result<ModelEndpointVersion, StoreError> {
        let table = self.endpoints.read().await;
        table
            .revisions
            .get(slug)
            .and_then(|revs| revs.iter().find(|r| r.version == version))
            .map(|r| redacted(r))
            .ok_or_else(|| {
                StoreError::NotFound(format!("model endpoint '{slug}' version {version}"))
            })
    }

    async fn create_version(
        &self,
        slug: &str,
        input: NewEndpointVersion,
        actor: &str,
    ) -> Result<ModelEndpointVersion, StoreError> {
        let mut table = self.endpoints.write().await;
        if !table.items.contains_key(slug) {
            return Err(StoreError::NotFound(format!("model endpoint '{slug}'")));
        }
        let revisions = table.revisions.entry(slug.to_string()).or_default();
        let next_version = revisions.iter().map(|r| r.version).max().unwrap_or(0) + 1;

        // The fresh revision becomes the active one; last writer wins.
        for revision in revisions.iter_mut() {
            revision.is_active = false;
        }
        let revision = ModelEndpointVersion {
            endpoint_slug: slug.to_string(),
            version: next_version,
            config: input.config,
            is_active: true,
            change_note: input.change_note,
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };
        revisions.push(revision.clone());
        Ok(redacted(&revision))
    }

    async fn activate_version(
        &self,
        slug: &str,
        version: i64,
    ) -> Result<ModelEndpointVersion, StoreError> {
        let mut table = self.endpoints.write().await;
        let revisions = table
            .revisions
            .get_mut(slug)
            .ok_or_else(|| StoreError::NotFound(format!("model endpoint '{slug}'")))?;
        if !revisions.iter().any(|r| r.version == version) {
            return Err(StoreError::NotFound(format!(
                "model endpoint '{slug}' version {version}"
            )));
        }
        let mut activated = None;
        for revision in revisions.iter_mut() {
            revision.is_active = revision.version == version;
            if revision.is_active {
                activated = Some(revision.clone());
            }
        }
        activated
            .map(|r| redacted(&r))
            .ok_or_else(|| StoreError::Internal("activation lost its target".into()))
    }

    async fn active_version(
        &self,
        slug: &str,
    ) -> Result<Option<ModelEndpointVersion>, StoreError> {
        let table = self.endpoints.read().await;
        Ok(table
            .revisions
            .get(slug)
            .and_then(|revs| revs.iter().find(|r| r.is_active))
            .map(redacted))
    }
}
