// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change-event dispatch and the audit contract.
//!
//! Mutations publish a [`ChangeEvent`] after committing and record an
//! [`AuditEntry`] through the [`AuditSink`] trait. Both paths are
//! fire-and-forget: the event queue is bounded and drops with a metric when
//! full, and audit failures are logged without failing the request.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A resource was created.
    Created,
    /// A resource was updated or patched.
    Updated,
    /// A resource was soft-deleted.
    Deleted,
    /// A version became the active one.
    Activated,
    /// A historical version was materialized as the new latest.
    RolledBack,
}

/// A change notification published after a successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Resource kind, e.g. `"agent"`, `"prompt"`.
    pub resource_type: String,
    /// Resource key within its kind.
    pub resource_id: String,
    /// When the mutation committed.
    pub timestamp: DateTime<Utc>,
    /// Actor that performed the mutation.
    pub actor: String,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default bound on the in-flight event queue.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Bounded fan-out bus for [`ChangeEvent`]s.
///
/// `publish` never blocks the mutation path. Slow subscribers lag and lose
/// the oldest events; the bus counts what was dropped instead of exerting
/// backpressure.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
    published: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a bus with the given queue capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            published: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a bus with [`DEFAULT_EVENT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Publish an event. Never blocks and never fails the caller.
    pub fn publish(&self, event: ChangeEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(event).is_err() {
            // No subscribers; the event is dropped on the floor.
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("change event dropped: no subscribers");
        }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Total events handed to the bus.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Events dropped because nobody was listening.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// One audit record, written after every successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Actor that performed the action.
    pub actor: String,
    /// Action verb, e.g. `"create"`, `"rollback"`.
    pub action: String,
    /// Resource kind.
    pub resource_type: String,
    /// Resource key.
    pub resource_id: String,
    /// Remote address the request arrived from.
    pub ip_address: String,
    /// Request id the mutation ran under.
    pub request_id: String,
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
}

/// Failure writing an audit record.
#[derive(Debug, thiserror::Error)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

/// Destination for audit records.
///
/// Implementations are external collaborators; the registry only promises to
/// call [`AuditSink::record`] after successful mutations and to log (not
/// propagate) failures.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one entry.
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;

    /// Read back a window of entries, newest first.
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<AuditEntry>, AuditError>;
}

/// Record an entry, swallowing and logging any failure.
pub async fn record_best_effort(sink: &dyn AuditSink, entry: AuditEntry) {
    if let Err(err) = sink.record(entry).await {
        warn!(error = %err, "audit write failed; request continues");
    }
}

/// In-memory audit sink used by tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: ChangeKind, id: &str) -> ChangeEvent {
        ChangeEvent {
            kind,
            resource_type: "agent".into(),
            resource_id: id.into(),
            timestamp: Utc::now(),
            actor: "tester".into(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(event(ChangeKind::Created, "billing"));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.kind, ChangeKind::Created);
        assert_eq!(got.resource_id, "billing");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_counted_not_fatal() {
        let bus = EventBus::new();
        bus.publish(event(ChangeKind::Deleted, "x"));
        assert_eq!(bus.published_count(), 1);
        assert_eq!(bus.dropped_count(), 1);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();
        for i in 0..10 {
            bus.publish(event(ChangeKind::Updated, &format!("a{i}")));
        }
        // The oldest events were evicted; recv reports the lag first.
        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(n)) => assert!(n > 0),
            other => panic!("expected Lagged, got {other:?}"),
        }
    }

    #[test]
    fn event_serde_uses_type_tag() {
        let json = serde_json::to_value(event(ChangeKind::RolledBack, "a")).unwrap();
        assert_eq!(json["type"], "rolled_back");
        assert_eq!(json["resource_type"], "agent");
    }

    #[tokio::test]
    async fn memory_sink_lists_newest_first() {
        let sink = MemoryAuditSink::new();
        for i in 0..3 {
            sink.record(AuditEntry {
                actor: "u".into(),
                action: "create".into(),
                resource_type: "agent".into(),
                resource_id: format!("a{i}"),
                ip_address: "127.0.0.1".into(),
                request_id: "r".into(),
                at: Utc::now(),
            })
            .await
            .unwrap();
        }
        let listed = sink.list(0, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].resource_id, "a2");
        assert_eq!(listed[1].resource_id, "a1");
    }

    #[tokio::test]
    async fn record_best_effort_swallows_failures() {
        struct FailingSink;
        #[async_trait]
        impl AuditSink for FailingSink {
            async fn record(&self, _entry: AuditEntry) -> Result<(), AuditError> {
                Err(AuditError("sink offline".into()))
            }
            async fn list(&self, _o: usize, _l: usize) -> Result<Vec<AuditEntry>, AuditError> {
                Ok(vec![])
            }
        }
        // Must not panic or propagate.
        record_best_effort(
            &FailingSink,
            AuditEntry {
                actor: "u".into(),
                action: "delete".into(),
                resource_type: "agent".into(),
                resource_id: "a".into(),
                ip_address: "127.0.0.1".into(),
                request_id: "r".into(),
                at: Utc::now(),
            },
        )
        .await;
    }
}
