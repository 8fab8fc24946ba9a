//! Complaint lifecycle state machine.
//!
//! Transition flow through a complaint's life:
//! 1. File - complainant creates it (PENDING)
//! 2. AssignDivisionHead - coordinator routes it (PENDING)
//! 3. AssignAssignee - division head hands it out (IN_PROGRESS)
//! 4. UpdateWork - assignee reports progress (IN_PROGRESS/PARTIALLY_DONE/DONE)
//! 5. SubmitFeedback - complainant rates the outcome (CLOSED_BY_USER)
//! 6. Reopen/Close - coordinator finalizes (REOPENED/CLOSED_BY_COORDINATOR)
//!
//! Authorization is a table lookup on (transition, role) plus an
//! ownership rule, never ad-hoc conditionals. Effects are computed as a
//! full `ComplaintDelta` so the store applies them in one write.

use crate::actor::{Actor, Role};
use crate::complaint::{Complaint, ComplaintDelta, Feedback};
use crate::division::Division;
use crate::error::DeskError;
use crate::status::{FeedbackStatus, WorkStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// Transition Kinds
// ============================================================================

/// A guarded state change on a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    File,
    AssignDivisionHead,
    AssignAssignee,
    UpdateWork,
    SubmitFeedback,
    Reopen,
    Close,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::AssignDivisionHead => "assign_division_head",
            Self::AssignAssignee => "assign_assignee",
            Self::UpdateWork => "update_work",
            Self::SubmitFeedback => "submit_feedback",
            Self::Reopen => "reopen",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coordinator's finalizing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorAction {
    Reopen,
    Close,
}

impl CoordinatorAction {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reopen" => Some(Self::Reopen),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    pub fn transition(&self) -> TransitionKind {
        match self {
            Self::Reopen => TransitionKind::Reopen,
            Self::Close => TransitionKind::Close,
        }
    }
}

// ============================================================================
// Guard Table
// ============================================================================

/// How the acting identity is matched against the complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OwnershipRule {
    /// The role alone is sufficient
    RoleOnly,
    /// Actor must be the filing complainant
    FilingComplainant,
    /// Actor must be the assigned division head
    AssignedDivisionHead,
    /// Actor must be the current assignee
    CurrentAssignee,
}

/// Who may perform each transition, and against which record field
/// their identity is checked. A (transition, role) pair absent from
/// this table is rejected outright.
const GUARDS: &[(TransitionKind, Role, OwnershipRule)] = &[
    (TransitionKind::File, Role::Complainant, OwnershipRule::RoleOnly),
    (
        TransitionKind::AssignDivisionHead,
        Role::Coordinator,
        OwnershipRule::RoleOnly,
    ),
    (
        TransitionKind::AssignAssignee,
        Role::DivisionHead,
        OwnershipRule::AssignedDivisionHead,
    ),
    (
        TransitionKind::UpdateWork,
        Role::Assignee,
        OwnershipRule::CurrentAssignee,
    ),
    (
        TransitionKind::SubmitFeedback,
        Role::Complainant,
        OwnershipRule::FilingComplainant,
    ),
    (TransitionKind::Reopen, Role::Coordinator, OwnershipRule::RoleOnly),
    (TransitionKind::Close, Role::Coordinator, OwnershipRule::RoleOnly),
];

/// Check that `actor` may perform `kind` on `complaint`.
///
/// `complaint` is `None` only for `File`, which guards on role alone.
pub fn authorize(
    kind: TransitionKind,
    actor: &Actor,
    complaint: Option<&Complaint>,
) -> Result<(), DeskError> {
    let rule = GUARDS
        .iter()
        .find(|(k, role, _)| *k == kind && *role == actor.role)
        .map(|(_, _, rule)| *rule)
        .ok_or_else(|| {
            DeskError::Forbidden(format!("role {} may not {}", actor.role, kind))
        })?;

    let owner_matches = match (rule, complaint) {
        (OwnershipRule::RoleOnly, _) => true,
        (OwnershipRule::FilingComplainant, Some(c)) => c.complainant_id == actor.id,
        (OwnershipRule::AssignedDivisionHead, Some(c)) => {
            c.assigned_division_head_id.as_deref() == Some(actor.id.as_str())
        }
        (OwnershipRule::CurrentAssignee, Some(c)) => {
            c.assigned_to_id.as_deref() == Some(actor.id.as_str())
        }
        // Ownership rules need a record to check against
        (_, None) => false,
    };

    if owner_matches {
        Ok(())
    } else {
        Err(DeskError::Forbidden(match rule {
            OwnershipRule::FilingComplainant => {
                format!("{} did not file this complaint", actor.id)
            }
            OwnershipRule::AssignedDivisionHead => {
                format!("complaint is not routed to division head {}", actor.id)
            }
            OwnershipRule::CurrentAssignee => {
                format!("complaint is not assigned to {}", actor.id)
            }
            OwnershipRule::RoleOnly => format!("role {} may not {}", actor.role, kind),
        }))
    }
}

// ============================================================================
// State Guards
// ============================================================================

/// An assignee may only report IN_PROGRESS, PARTIALLY_DONE, or DONE
pub fn check_work_report(new_status: WorkStatus) -> Result<(), DeskError> {
    if new_status.is_work_report() {
        Ok(())
    } else {
        Err(DeskError::InvalidArgument(format!(
            "{} is not a reportable work status",
            new_status
        )))
    }
}

/// A feedback submission must carry an actual rating
pub fn check_feedback_rating(status: FeedbackStatus) -> Result<(), DeskError> {
    if status.is_rated() {
        Ok(())
    } else {
        Err(DeskError::InvalidArgument(
            "feedback status must be a rating, not PENDING".to_string(),
        ))
    }
}

/// Feedback goes in once, and only after work is reported done
pub fn check_feedback_state(complaint: &Complaint) -> Result<(), DeskError> {
    if !complaint.feedback.is_pending() {
        return Err(DeskError::Conflict(
            "feedback already submitted for this complaint".to_string(),
        ));
    }
    if !complaint.work_status.can_accept_feedback() {
        return Err(DeskError::PreconditionFailed(format!(
            "work is {}, not yet DONE or PARTIALLY_DONE",
            complaint.work_status
        )));
    }
    Ok(())
}

// ============================================================================
// Transition Effects
// ============================================================================

/// Route to a division head. Wipes downstream progress from any earlier
/// assignment cycle; the new chain starts clean at PENDING.
pub fn assign_division_head_delta(
    complaint: &Complaint,
    head_id: &str,
    division: Division,
) -> ComplaintDelta {
    let mut delta = ComplaintDelta::of(complaint);
    delta.assigned_division_head_id = Some(head_id.to_string());
    delta.assigned_division = Some(division);
    delta.work_status = WorkStatus::Pending;
    delta.assigned_to_id = None;
    delta.remarks = String::new();
    delta.completion_date = None;
    delta
}

/// Hand to an assignee; work formally starts
pub fn assign_assignee_delta(complaint: &Complaint, assignee_id: &str) -> ComplaintDelta {
    let mut delta = ComplaintDelta::of(complaint);
    delta.assigned_to_id = Some(assignee_id.to_string());
    delta.work_status = WorkStatus::InProgress;
    delta.remarks = String::new();
    delta.completion_date = None;
    delta
}

/// Report work progress.
///
/// The completion date is stamped only when DONE/PARTIALLY_DONE is
/// newly entered (or the date was missing), so a re-save at the same
/// status keeps the original timestamp. Any other status clears it.
pub fn update_work_delta(
    complaint: &Complaint,
    new_status: WorkStatus,
    remarks: &str,
) -> ComplaintDelta {
    let mut delta = ComplaintDelta::of(complaint);
    delta.work_status = new_status;
    delta.remarks = remarks.to_string();
    delta.completion_date = if new_status.carries_completion_date() {
        if complaint.work_status != new_status || complaint.completion_date.is_none() {
            Some(Utc::now())
        } else {
            complaint.completion_date
        }
    } else {
        None
    };
    delta
}

/// Record the complainant's rating and close on their behalf
pub fn submit_feedback_delta(
    complaint: &Complaint,
    status: FeedbackStatus,
    comment: &str,
) -> ComplaintDelta {
    let mut delta = ComplaintDelta::of(complaint);
    delta.feedback = Feedback {
        status,
        comment: comment.to_string(),
        date: Some(Utc::now()),
    };
    delta.work_status = WorkStatus::ClosedByUser;
    delta.completion_date = None;
    delta
}

/// Send the complaint back for another assignment cycle. The prior
/// chain, work progress, and rating are all cleared; only the division
/// routing and the audit counter survive.
pub fn reopen_delta(complaint: &Complaint, coordinator_remarks: &str) -> ComplaintDelta {
    let mut delta = ComplaintDelta::of(complaint);
    delta.work_status = WorkStatus::Reopened;
    delta.is_closed = false;
    delta.reopened_count = complaint.reopened_count.saturating_add(1);
    delta.assigned_to_id = None;
    delta.assigned_division_head_id = None;
    delta.completion_date = None;
    delta.remarks = String::new();
    delta.feedback = Feedback::pending();
    delta.coordinator_remarks = coordinator_remarks.to_string();
    delta
}

/// Finalize the complaint
pub fn close_delta(complaint: &Complaint, coordinator_remarks: &str) -> ComplaintDelta {
    let mut delta = ComplaintDelta::of(complaint);
    delta.work_status = WorkStatus::ClosedByCoordinator;
    delta.is_closed = true;
    delta.completion_date = None;
    delta.coordinator_remarks = coordinator_remarks.to_string();
    delta
}
