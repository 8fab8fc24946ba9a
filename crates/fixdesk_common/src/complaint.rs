//! Complaint record: the central entity of the workflow.
//!
//! A complaint is created once by its complainant and afterwards mutated
//! only through workflow transitions. Transitions never write individual
//! fields; they compute a `ComplaintDelta` (a full snapshot of the
//! mutable fields) and the store applies it as one atomic update.

use crate::actor::Actor;
use crate::division::Division;
use crate::status::{FeedbackStatus, WorkStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Complainant's rating of the outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub status: FeedbackStatus,
    pub comment: String,
    /// When the rating was submitted
    pub date: Option<DateTime<Utc>>,
}

impl Feedback {
    /// Feedback in its unrated state
    pub fn pending() -> Self {
        Self {
            status: FeedbackStatus::Pending,
            comment: String::new(),
            date: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FeedbackStatus::Pending
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::pending()
    }
}

/// Payload supplied by the complainant when filing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComplaint {
    pub department: String,
    pub description: String,
    pub room_location: String,
    pub dispatch_no: String,
    pub requested_by: String,
    pub is_urgent: bool,
}

/// A facility-maintenance complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    /// Unique id, assigned at creation
    pub id: Uuid,
    /// Owning actor, immutable after creation
    pub complainant_id: String,

    pub department: String,
    pub description: String,
    pub room_location: String,
    pub dispatch_no: String,
    pub requested_by: String,
    /// Complainant's name as resolved at filing time
    pub reported_by_name: String,
    pub filed_at: DateTime<Utc>,
    pub is_urgent: bool,

    /// Division the coordinator routed this to
    pub assigned_division: Option<Division>,
    /// Division head the coordinator routed this to
    pub assigned_division_head_id: Option<String>,
    /// Assignee the division head handed this to
    pub assigned_to_id: Option<String>,

    /// Primary state field
    pub work_status: WorkStatus,
    /// Assignee's free-text note, reset whenever assignment changes
    pub remarks: String,
    /// Set exactly while work_status is DONE or PARTIALLY_DONE
    pub completion_date: Option<DateTime<Utc>>,

    pub feedback: Feedback,
    /// Free text set by coordinator close/reopen
    pub coordinator_remarks: String,
    /// Set on coordinator close, cleared on reopen
    pub is_closed: bool,
    /// Increments on every reopen, never decreases
    pub reopened_count: u32,
}

impl Complaint {
    /// Create a freshly filed complaint for the given complainant
    pub fn file(complainant: &Actor, payload: NewComplaint) -> Self {
        Self {
            id: Uuid::new_v4(),
            complainant_id: complainant.id.clone(),
            department: payload.department,
            description: payload.description,
            room_location: payload.room_location,
            dispatch_no: payload.dispatch_no,
            requested_by: payload.requested_by,
            reported_by_name: complainant.name.clone(),
            filed_at: Utc::now(),
            is_urgent: payload.is_urgent,
            assigned_division: None,
            assigned_division_head_id: None,
            assigned_to_id: None,
            work_status: WorkStatus::Pending,
            remarks: String::new(),
            completion_date: None,
            feedback: Feedback::pending(),
            coordinator_remarks: String::new(),
            is_closed: false,
            reopened_count: 0,
        }
    }

    /// Eligible for the complainant's rating right now
    pub fn awaiting_feedback(&self) -> bool {
        self.work_status.can_accept_feedback() && self.feedback.is_pending()
    }

    /// Cross-field rules that must hold between transitions.
    ///
    /// Returns a description of each violated rule; empty means the
    /// record is consistent.
    pub fn consistency_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.completion_date.is_some() != self.work_status.carries_completion_date() {
            errors.push(format!(
                "completion_date {} but work_status is {}",
                if self.completion_date.is_some() { "set" } else { "unset" },
                self.work_status
            ));
        }
        if self.assigned_to_id.is_some() && self.assigned_division_head_id.is_none() {
            errors.push("assignee set without a division head".to_string());
        }
        let rated_status_ok = matches!(
            self.work_status,
            WorkStatus::ClosedByUser | WorkStatus::ClosedByCoordinator
        );
        if self.feedback.status.is_rated() && !rated_status_ok {
            errors.push(format!(
                "feedback rated {} but work_status is {}",
                self.feedback.status, self.work_status
            ));
        }
        if self.is_closed && self.work_status != WorkStatus::ClosedByCoordinator {
            errors.push(format!(
                "is_closed set but work_status is {}",
                self.work_status
            ));
        }

        errors
    }

    /// Apply a transition's field delta
    pub fn apply(&mut self, delta: &ComplaintDelta) {
        self.assigned_division = delta.assigned_division;
        self.assigned_division_head_id = delta.assigned_division_head_id.clone();
        self.assigned_to_id = delta.assigned_to_id.clone();
        self.work_status = delta.work_status;
        self.remarks = delta.remarks.clone();
        self.completion_date = delta.completion_date;
        self.feedback = delta.feedback.clone();
        self.coordinator_remarks = delta.coordinator_remarks.clone();
        self.is_closed = delta.is_closed;
        self.reopened_count = delta.reopened_count;
    }
}

/// Full snapshot of a complaint's mutable fields.
///
/// Every transition produces one of these; applying it replaces all
/// mutable fields at once, so a half-applied transition is never
/// visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintDelta {
    pub assigned_division: Option<Division>,
    pub assigned_division_head_id: Option<String>,
    pub assigned_to_id: Option<String>,
    pub work_status: WorkStatus,
    pub remarks: String,
    pub completion_date: Option<DateTime<Utc>>,
    pub feedback: Feedback,
    pub coordinator_remarks: String,
    pub is_closed: bool,
    pub reopened_count: u32,
}

impl ComplaintDelta {
    /// Snapshot the current mutable fields of a complaint
    pub fn of(complaint: &Complaint) -> Self {
        Self {
            assigned_division: complaint.assigned_division,
            assigned_division_head_id: complaint.assigned_division_head_id.clone(),
            assigned_to_id: complaint.assigned_to_id.clone(),
            work_status: complaint.work_status,
            remarks: complaint.remarks.clone(),
            completion_date: complaint.completion_date,
            feedback: complaint.feedback.clone(),
            coordinator_remarks: complaint.coordinator_remarks.clone(),
            is_closed: complaint.is_closed,
            reopened_count: complaint.reopened_count,
        }
    }
}
