//! Notification outbox.
//!
//! Transitions enqueue rendered events here as part of their success
//! path; an independent dispatch pass drains them later. A delivery
//! failure leaves the event queued for the next pass, so a flaky
//! backend delays notifications but never loses them or a transition.

use crate::error::DeskError;
use crate::notify::{Notifier, NotifyEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;
use uuid::Uuid;

/// A queued notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: i64,
    pub complaint_id: Uuid,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
    pub queued_at: DateTime<Utc>,
    pub dispatched: bool,
}

/// Queue depth snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutboxStats {
    pub pending: usize,
    pub dispatched: usize,
}

/// Store-backed notification queue
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Queue rendered events for later dispatch
    async fn enqueue(&self, events: &[NotifyEvent]) -> Result<(), DeskError>;

    /// Oldest undispatched entries, up to `limit`
    async fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, DeskError>;

    /// Record a successful delivery
    async fn mark_dispatched(&self, id: i64) -> Result<(), DeskError>;

    /// Queue depth
    async fn stats(&self) -> Result<OutboxStats, DeskError>;
}

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub failed: usize,
}

/// One dispatch pass: deliver pending entries through `notifier`,
/// marking each dispatched on success. Failed entries stay queued.
pub async fn drain_once(
    outbox: &dyn Outbox,
    notifier: &dyn Notifier,
    batch: usize,
) -> Result<DrainReport, DeskError> {
    let entries = outbox.pending(batch).await?;
    let mut report = DrainReport::default();

    for entry in entries {
        match notifier
            .notify(&entry.recipient_email, &entry.subject, &entry.body)
            .await
        {
            Ok(()) => {
                outbox.mark_dispatched(entry.id).await?;
                report.delivered += 1;
            }
            Err(e) => {
                warn!(
                    "Delivery failed for outbox entry {} ({}): {}",
                    entry.id, entry.subject, e
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

// ============================================================================
// Memory Outbox (Testing)
// ============================================================================

/// In-memory outbox for tests
pub struct MemoryOutbox {
    entries: Arc<Mutex<Vec<OutboxEntry>>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every entry ever queued, dispatched or not
    pub fn entries(&self) -> Vec<OutboxEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Subjects of every entry queued so far
    pub fn subjects(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.subject.clone())
            .collect()
    }
}

impl Default for MemoryOutbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Outbox for MemoryOutbox {
    async fn enqueue(&self, events: &[NotifyEvent]) -> Result<(), DeskError> {
        let mut entries = self.entries.lock().unwrap();
        for event in events {
            let id = entries.len() as i64 + 1;
            entries.push(OutboxEntry {
                id,
                complaint_id: event.complaint_id,
                recipient_email: event.recipient_email.clone(),
                subject: event.subject.clone(),
                body: event.body.clone(),
                queued_at: Utc::now(),
                dispatched: false,
            });
        }
        Ok(())
    }

    async fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, DeskError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.dispatched)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(&self, id: i64) -> Result<(), DeskError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.dispatched = true;
                Ok(())
            }
            None => Err(DeskError::NotFound(format!("outbox entry {}", id))),
        }
    }

    async fn stats(&self) -> Result<OutboxStats, DeskError> {
        let entries = self.entries.lock().unwrap();
        let dispatched = entries.iter().filter(|e| e.dispatched).count();
        Ok(OutboxStats {
            pending: entries.len() - dispatched,
            dispatched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::FakeNotifier;

    fn events(n: usize) -> Vec<NotifyEvent> {
        (0..n)
            .map(|i| NotifyEvent {
                complaint_id: Uuid::new_v4(),
                recipient_email: format!("user{}@example.edu", i),
                subject: format!("Subject {}", i),
                body: "body".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_enqueue_and_drain() {
        let outbox = MemoryOutbox::new();
        let notifier = FakeNotifier::new();
        outbox.enqueue(&events(3)).await.unwrap();

        let report = drain_once(&outbox, &notifier, 10).await.unwrap();
        assert_eq!(report, DrainReport { delivered: 3, failed: 0 });
        assert_eq!(notifier.sent().len(), 3);

        let stats = outbox.stats().await.unwrap();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.dispatched, 3);
    }

    #[tokio::test]
    async fn test_failed_delivery_stays_queued() {
        let outbox = MemoryOutbox::new();
        let notifier = FakeNotifier::failing();
        outbox.enqueue(&events(2)).await.unwrap();

        let report = drain_once(&outbox, &notifier, 10).await.unwrap();
        assert_eq!(report, DrainReport { delivered: 0, failed: 2 });
        assert_eq!(outbox.stats().await.unwrap().pending, 2);

        // Backend recovers; next pass delivers the same entries
        notifier.set_failing(false);
        let report = drain_once(&outbox, &notifier, 10).await.unwrap();
        assert_eq!(report, DrainReport { delivered: 2, failed: 0 });
        assert_eq!(outbox.stats().await.unwrap().pending, 0);
    }

    #[tokio::test]
    async fn test_pending_respects_batch_limit() {
        let outbox = MemoryOutbox::new();
        outbox.enqueue(&events(5)).await.unwrap();

        let batch = outbox.pending(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, 1);
        assert_eq!(batch[1].id, 2);
    }
}
