//! Complaint store abstraction.
//!
//! Production code uses the SQLite-backed store; tests use
//! `MemoryStore`, which keeps records in a map, counts calls, and can
//! be switched into a failing mode to exercise store-outage paths.
//!
//! Updates are last-write-wins on the record: a transition writes the
//! full delta it computed against the state it read. Concurrent
//! transitions on the same record are not serialized beyond that.

use crate::complaint::{Complaint, ComplaintDelta};
use crate::error::DeskError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Record filter for listings. Set fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    pub complainant_id: Option<String>,
    pub assigned_to_id: Option<String>,
    pub assigned_division_head_id: Option<String>,
    /// Only complaints eligible for the complainant's rating
    pub awaiting_feedback: bool,
}

impl ComplaintFilter {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        if let Some(id) = &self.complainant_id {
            if &complaint.complainant_id != id {
                return false;
            }
        }
        if let Some(id) = &self.assigned_to_id {
            if complaint.assigned_to_id.as_ref() != Some(id) {
                return false;
            }
        }
        if let Some(id) = &self.assigned_division_head_id {
            if complaint.assigned_division_head_id.as_ref() != Some(id) {
                return false;
            }
        }
        if self.awaiting_feedback && !complaint.awaiting_feedback() {
            return false;
        }
        true
    }
}

/// Persistence seam for complaint records
#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Persist a freshly filed complaint
    async fn create(&self, complaint: &Complaint) -> Result<(), DeskError>;

    /// Fetch one record by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, DeskError>;

    /// Fetch matching records, newest filing first
    async fn find_many(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, DeskError>;

    /// Apply a transition's delta as one atomic record update and
    /// return the updated record. `NotFound` if the id is gone.
    async fn update_by_id(&self, id: Uuid, delta: &ComplaintDelta)
        -> Result<Complaint, DeskError>;
}

// ============================================================================
// Memory Store (Testing)
// ============================================================================

/// In-memory store for deterministic tests
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<Uuid, Complaint>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(Mutex::new(false)),
        }
    }

    /// Switch every operation to fail with `Unavailable`
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// How many times `op` was called (create/find_by_id/find_many/update_by_id)
    pub fn call_count(&self, op: &str) -> usize {
        *self.call_counts.lock().unwrap().get(op).unwrap_or(&0)
    }

    fn record_call(&self, op: &str) -> Result<(), DeskError> {
        *self
            .call_counts
            .lock()
            .unwrap()
            .entry(op.to_string())
            .or_insert(0) += 1;
        if *self.failing.lock().unwrap() {
            Err(DeskError::Unavailable("memory store failing".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComplaintStore for MemoryStore {
    async fn create(&self, complaint: &Complaint) -> Result<(), DeskError> {
        self.record_call("create")?;
        self.records
            .lock()
            .unwrap()
            .insert(complaint.id, complaint.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, DeskError> {
        self.record_call("find_by_id")?;
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_many(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, DeskError> {
        self.record_call("find_many")?;
        let mut matches: Vec<Complaint> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.filed_at.cmp(&a.filed_at));
        Ok(matches)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        delta: &ComplaintDelta,
    ) -> Result<Complaint, DeskError> {
        self.record_call("update_by_id")?;
        let mut records = self.records.lock().unwrap();
        let complaint = records
            .get_mut(&id)
            .ok_or_else(|| DeskError::NotFound(format!("complaint {}", id)))?;
        complaint.apply(delta);
        Ok(complaint.clone())
    }
}
