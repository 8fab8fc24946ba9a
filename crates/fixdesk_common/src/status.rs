//! Work status and feedback status for the complaint lifecycle.
//!
//! `WorkStatus` is the primary state field of a complaint. It moves
//! through assignment, work reporting, user feedback, and coordinator
//! closure. `CLOSED_BY_COORDINATOR` is terminal only until the
//! coordinator reopens, so the machine is cyclic rather than strictly
//! terminal.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Filed, or routed to a division head, awaiting an assignee
    #[default]
    Pending,
    /// An assignee is working on it
    InProgress,
    /// Work reported partially complete
    PartiallyDone,
    /// Work reported complete
    Done,
    /// Complainant rated the outcome
    ClosedByUser,
    /// Coordinator sent it back for another cycle
    Reopened,
    /// Coordinator finalized it
    ClosedByCoordinator,
}

impl WorkStatus {
    /// Canonical storage/display form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::PartiallyDone => "PARTIALLY_DONE",
            Self::Done => "DONE",
            Self::ClosedByUser => "CLOSED_BY_USER",
            Self::Reopened => "REOPENED",
            Self::ClosedByCoordinator => "CLOSED_BY_COORDINATOR",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "PARTIALLY_DONE" => Some(Self::PartiallyDone),
            "DONE" => Some(Self::Done),
            "CLOSED_BY_USER" => Some(Self::ClosedByUser),
            "REOPENED" => Some(Self::Reopened),
            "CLOSED_BY_COORDINATOR" => Some(Self::ClosedByCoordinator),
            _ => None,
        }
    }

    /// Statuses an assignee may report through a work update
    pub fn is_work_report(&self) -> bool {
        matches!(self, Self::InProgress | Self::PartiallyDone | Self::Done)
    }

    /// Whether a completion date must be present at this status
    pub fn carries_completion_date(&self) -> bool {
        matches!(self, Self::Done | Self::PartiallyDone)
    }

    /// Whether the complainant may rate the outcome at this status
    pub fn can_accept_feedback(&self) -> bool {
        matches!(self, Self::Done | Self::PartiallyDone)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Complainant's rating of the resolved work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// No rating given yet
    #[default]
    Pending,
    Satisfied,
    PartiallySatisfied,
    NotSatisfied,
}

impl FeedbackStatus {
    /// Canonical storage/display form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Satisfied => "SATISFIED",
            Self::PartiallySatisfied => "PARTIALLY_SATISFIED",
            Self::NotSatisfied => "NOT_SATISFIED",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "PENDING" => Some(Self::Pending),
            "SATISFIED" => Some(Self::Satisfied),
            "PARTIALLY_SATISFIED" => Some(Self::PartiallySatisfied),
            "NOT_SATISFIED" => Some(Self::NotSatisfied),
            _ => None,
        }
    }

    /// A rating has been given
    pub fn is_rated(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
