//! Notification rendering and the delivery seam.
//!
//! Transitions render `NotifyEvent`s for everyone affected and queue
//! them to the outbox; a `Notifier` backend later performs the actual
//! delivery. Delivery is best-effort and never influences a
//! transition's outcome.

use crate::actor::Actor;
use crate::complaint::Complaint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// A rendered notification awaiting dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyEvent {
    pub complaint_id: Uuid,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
}

// ============================================================================
// Event Rendering
// ============================================================================

fn event(complaint: &Complaint, recipient: &Actor, subject: String, body: String) -> NotifyEvent {
    NotifyEvent {
        complaint_id: complaint.id,
        recipient_email: recipient.email.clone(),
        subject,
        body,
    }
}

fn spaced(status: impl std::fmt::Display) -> String {
    status.to_string().replace('_', " ")
}

/// To a coordinator when a complaint is filed
pub fn filed(complaint: &Complaint, coordinator: &Actor) -> NotifyEvent {
    event(
        complaint,
        coordinator,
        format!("New Complaint Filed: #{}", complaint.id),
        format!(
            "Dear {},\n\nA new complaint has been filed by {}.\nDepartment: {}\nDescription: {}\nRoom/Location: {}\nUrgent: {}\n\nPlease review and assign it to a division head.",
            coordinator.name,
            complaint.reported_by_name,
            complaint.department,
            complaint.description,
            complaint.room_location,
            if complaint.is_urgent { "Yes" } else { "No" },
        ),
    )
}

/// To the division head a coordinator routed the complaint to
pub fn routed_to_head(complaint: &Complaint, head: &Actor, coordinator: &Actor) -> NotifyEvent {
    event(
        complaint,
        head,
        format!("New Complaint Assigned: #{}", complaint.id),
        format!(
            "Dear {},\n\nComplaint #{} has been assigned to your division by Coordinator {}.\nDepartment: {}\nDescription: {}\nRoom/Location: {}\n\nPlease assign it to an assignee.",
            head.name,
            complaint.id,
            coordinator.name,
            complaint.department,
            complaint.description,
            complaint.room_location,
        ),
    )
}

/// To the assignee a division head handed the complaint to
pub fn assigned_for_work(complaint: &Complaint, assignee: &Actor, head: &Actor) -> NotifyEvent {
    event(
        complaint,
        assignee,
        format!("Complaint Assigned for Work: #{}", complaint.id),
        format!(
            "Dear {},\n\nComplaint #{} has been assigned to you by Division Head {}.\nDepartment: {}\nDescription: {}\nRoom/Location: {}\n\nPlease update the work status as you make progress.",
            assignee.name,
            complaint.id,
            head.name,
            complaint.department,
            complaint.description,
            complaint.room_location,
        ),
    )
}

/// To the division head when the assignee's reported status changed
pub fn status_update_for_head(complaint: &Complaint, head: &Actor) -> NotifyEvent {
    event(
        complaint,
        head,
        format!(
            "Complaint Status Update: #{} - {}",
            complaint.id,
            spaced(complaint.work_status)
        ),
        format!(
            "Dear {},\n\nComplaint #{} is now {}.\nAssignee remarks: {}",
            head.name,
            complaint.id,
            spaced(complaint.work_status),
            complaint.remarks,
        ),
    )
}

/// To the complainant when the assignee's reported status changed
pub fn status_update_for_complainant(complaint: &Complaint, complainant: &Actor) -> NotifyEvent {
    event(
        complaint,
        complainant,
        format!(
            "Your Complaint Work Status: #{} - {}",
            complaint.id,
            spaced(complaint.work_status)
        ),
        format!(
            "Dear {},\n\nThe work on your complaint #{} regarding \"{}\" is now {}.",
            complainant.name,
            complaint.id,
            complaint.description,
            spaced(complaint.work_status),
        ),
    )
}

/// To a coordinator when the complainant rates the outcome
pub fn feedback_received(complaint: &Complaint, coordinator: &Actor) -> NotifyEvent {
    event(
        complaint,
        coordinator,
        format!("User Feedback Received: #{}", complaint.id),
        format!(
            "Dear {},\n\nFeedback has been received for complaint #{} (reported by {}).\nFeedback: {}\nComment: {}\n\nPlease review and decide on final closure or reopening.",
            coordinator.name,
            complaint.id,
            complaint.reported_by_name,
            spaced(complaint.feedback.status),
            if complaint.feedback.comment.is_empty() {
                "No comment."
            } else {
                &complaint.feedback.comment
            },
        ),
    )
}

/// To the complainant when a coordinator reopens their complaint
pub fn reopened_for_complainant(
    complaint: &Complaint,
    complainant: &Actor,
    coordinator: &Actor,
) -> NotifyEvent {
    event(
        complaint,
        complainant,
        format!("Complaint Reopened: #{}", complaint.id),
        format!(
            "Dear {},\n\nYour complaint #{} regarding \"{}\" has been REOPENED by Coordinator {}.\nCoordinator remarks: {}\n\nIt will be reassigned for further action.",
            complainant.name,
            complaint.id,
            complaint.description,
            coordinator.name,
            if complaint.coordinator_remarks.is_empty() {
                "No remarks provided."
            } else {
                &complaint.coordinator_remarks
            },
        ),
    )
}

/// To the prior division head or assignee when their complaint reopens
pub fn reopened_info(complaint: &Complaint, recipient: &Actor, coordinator: &Actor) -> NotifyEvent {
    event(
        complaint,
        recipient,
        format!("Complaint Reopened (Info): #{}", complaint.id),
        format!(
            "Dear {},\n\nComplaint #{} ({}) that you previously worked on has been reopened by Coordinator {}. It will be reassigned.",
            recipient.name, complaint.id, complaint.description, coordinator.name,
        ),
    )
}

/// To the complainant when a coordinator closes their complaint
pub fn closed_for_complainant(
    complaint: &Complaint,
    complainant: &Actor,
    coordinator: &Actor,
) -> NotifyEvent {
    event(
        complaint,
        complainant,
        format!("Complaint Closed: #{}", complaint.id),
        format!(
            "Dear {},\n\nYour complaint #{} regarding \"{}\" has been CLOSED by Coordinator {}.\nCoordinator remarks: {}\n\nIf anything further comes up, please file a new complaint.",
            complainant.name,
            complaint.id,
            complaint.description,
            coordinator.name,
            if complaint.coordinator_remarks.is_empty() {
                "No remarks provided."
            } else {
                &complaint.coordinator_remarks
            },
        ),
    )
}

/// To the division head or assignee when their complaint closes
pub fn closed_info(complaint: &Complaint, recipient: &Actor, coordinator: &Actor) -> NotifyEvent {
    event(
        complaint,
        recipient,
        format!("Complaint Closed (Info): #{}", complaint.id),
        format!(
            "Dear {},\n\nComplaint #{} ({}) that you worked on has been closed by Coordinator {}.",
            recipient.name, complaint.id, complaint.description, coordinator.name,
        ),
    )
}

// ============================================================================
// Notifier Trait
// ============================================================================

/// Delivery backend for rendered notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. Failures are the caller's to log; they must
    /// never affect workflow state.
    async fn notify(&self, recipient_email: &str, subject: &str, body: &str)
        -> anyhow::Result<()>;
}

/// Default backend: records deliveries in the daemon log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient_email: &str,
        subject: &str,
        body: &str,
    ) -> anyhow::Result<()> {
        info!("Notification for {}: {}", recipient_email, subject);
        debug!("Notification body: {}", body);
        Ok(())
    }
}

// ============================================================================
// Fake Notifier (Testing)
// ============================================================================

/// Records deliveries for assertions; can be switched to fail
pub struct FakeNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<Mutex<bool>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// A notifier whose every delivery fails
    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// (recipient, subject) pairs delivered so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for FakeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(
        &self,
        recipient_email: &str,
        subject: &str,
        _body: &str,
    ) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("notifier backend down");
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient_email.to_string(), subject.to_string()));
        Ok(())
    }
}
