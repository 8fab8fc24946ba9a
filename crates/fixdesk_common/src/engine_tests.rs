//! End-to-end workflow scenarios against the engine with in-memory
//! collaborators.

use crate::actor::{Actor, Role};
use crate::complaint::{Complaint, NewComplaint};
use crate::directory::{ActorDirectory, MemoryDirectory};
use crate::division::Division;
use crate::engine::WorkflowEngine;
use crate::error::DeskError;
use crate::lifecycle::CoordinatorAction;
use crate::notify::NotifyEvent;
use crate::outbox::{MemoryOutbox, Outbox, OutboxEntry, OutboxStats};
use crate::status::{FeedbackStatus, WorkStatus};
use crate::store::MemoryStore;
use async_trait::async_trait;
use std::sync::Arc;

const COMPLAINANT: &str = "USR1001";
const OTHER_COMPLAINANT: &str = "USR1002";
const COORDINATOR: &str = "CMC2001";
const HEAD: &str = "DVH3001";
const OTHER_HEAD: &str = "DVH3002";
const ASSIGNEE: &str = "ASG4001";
const OTHER_ASSIGNEE: &str = "ASG4002";

struct Harness {
    engine: WorkflowEngine,
    store: Arc<MemoryStore>,
    outbox: Arc<MemoryOutbox>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(MemoryDirectory::with_actors([
        Actor::new(COMPLAINANT, "Asha Rao", "asha@example.edu", Role::Complainant, None),
        Actor::new(
            OTHER_COMPLAINANT,
            "Vikram Shah",
            "vikram@example.edu",
            Role::Complainant,
            None,
        ),
        Actor::new(COORDINATOR, "Dev Nair", "dev@example.edu", Role::Coordinator, None),
        Actor::new(
            HEAD,
            "Meera Iyer",
            "meera@example.edu",
            Role::DivisionHead,
            Some(Division::Electrical),
        ),
        Actor::new(
            OTHER_HEAD,
            "Rohit Sen",
            "rohit@example.edu",
            Role::DivisionHead,
            Some(Division::Civil),
        ),
        Actor::new(
            ASSIGNEE,
            "Ravi Kumar",
            "ravi@example.edu",
            Role::Assignee,
            Some(Division::Electrical),
        ),
        Actor::new(
            OTHER_ASSIGNEE,
            "Sunil Das",
            "sunil@example.edu",
            Role::Assignee,
            Some(Division::Electrical),
        ),
    ]));
    let outbox = Arc::new(MemoryOutbox::new());
    let engine = WorkflowEngine::new(store.clone(), directory, outbox.clone());
    Harness {
        engine,
        store,
        outbox,
    }
}

fn electrical_payload() -> NewComplaint {
    NewComplaint {
        department: "Electrical".into(),
        description: "Corridor lights flickering".into(),
        room_location: "Block B, 2nd floor".into(),
        dispatch_no: "D-042".into(),
        requested_by: "Warden".into(),
        is_urgent: false,
    }
}

async fn filed(h: &Harness) -> Complaint {
    h.engine
        .file_complaint(COMPLAINANT, electrical_payload())
        .await
        .unwrap()
}

async fn in_progress(h: &Harness) -> Complaint {
    let complaint = filed(h).await;
    h.engine
        .assign_division_head(COORDINATOR, complaint.id, HEAD, Division::Electrical)
        .await
        .unwrap();
    h.engine
        .assign_assignee(HEAD, complaint.id, ASSIGNEE)
        .await
        .unwrap()
}

async fn done(h: &Harness) -> Complaint {
    let complaint = in_progress(h).await;
    h.engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::Done, "fixed")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_scenario_a_full_happy_path() {
    let h = harness();

    let complaint = filed(&h).await;
    assert_eq!(complaint.work_status, WorkStatus::Pending);
    assert!(complaint.completion_date.is_none());
    assert_eq!(complaint.reported_by_name, "Asha Rao");

    let routed = h
        .engine
        .assign_division_head(COORDINATOR, complaint.id, HEAD, Division::Electrical)
        .await
        .unwrap();
    assert_eq!(routed.assigned_division_head_id.as_deref(), Some(HEAD));
    assert_eq!(routed.assigned_division, Some(Division::Electrical));
    assert_eq!(routed.work_status, WorkStatus::Pending);

    let assigned = h
        .engine
        .assign_assignee(HEAD, complaint.id, ASSIGNEE)
        .await
        .unwrap();
    assert_eq!(assigned.assigned_to_id.as_deref(), Some(ASSIGNEE));
    assert_eq!(assigned.work_status, WorkStatus::InProgress);

    let worked = h
        .engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::Done, "fixed")
        .await
        .unwrap();
    assert_eq!(worked.work_status, WorkStatus::Done);
    assert!(worked.completion_date.is_some());
    assert_eq!(worked.remarks, "fixed");

    let rated = h
        .engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::Satisfied, "great")
        .await
        .unwrap();
    assert_eq!(rated.work_status, WorkStatus::ClosedByUser);
    assert_eq!(rated.feedback.status, FeedbackStatus::Satisfied);
    assert_eq!(rated.feedback.comment, "great");
    assert!(rated.feedback.date.is_some());
    assert!(rated.consistency_errors().is_empty());

    let subjects = h.outbox.subjects();
    assert!(subjects[0].starts_with("New Complaint Filed"));
    assert!(subjects.iter().any(|s| s.starts_with("New Complaint Assigned")));
    assert!(subjects.iter().any(|s| s.starts_with("Complaint Assigned for Work")));
    assert!(subjects.iter().any(|s| s.starts_with("User Feedback Received")));
}

#[tokio::test]
async fn test_scenario_b_reopen_clears_everything() {
    let h = harness();
    let complaint = done(&h).await;
    h.engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::NotSatisfied, "still broken")
        .await
        .unwrap();

    let reopened = h
        .engine
        .coordinator_action(COORDINATOR, complaint.id, CoordinatorAction::Reopen, "try again")
        .await
        .unwrap();

    assert_eq!(reopened.work_status, WorkStatus::Reopened);
    assert!(reopened.assigned_to_id.is_none());
    assert!(reopened.assigned_division_head_id.is_none());
    assert!(reopened.completion_date.is_none());
    assert_eq!(reopened.feedback.status, FeedbackStatus::Pending);
    assert_eq!(reopened.reopened_count, 1);
    assert!(!reopened.is_closed);
    assert!(reopened.consistency_errors().is_empty());
}

#[tokio::test]
async fn test_scenario_c_double_feedback_conflicts() {
    let h = harness();
    let complaint = done(&h).await;

    h.engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::Satisfied, "good")
        .await
        .unwrap();

    let second = h
        .engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::NotSatisfied, "changed my mind")
        .await;
    assert!(matches!(second, Err(DeskError::Conflict(_))));
}

#[tokio::test]
async fn test_scenario_d_foreign_assignee_cannot_update() {
    let h = harness();
    let complaint = in_progress(&h).await;

    let result = h
        .engine
        .update_work(OTHER_ASSIGNEE, complaint.id, WorkStatus::Done, "not mine")
        .await;
    assert!(matches!(result, Err(DeskError::Forbidden(_))));

    // Record untouched
    let unchanged = h.engine.get(complaint.id).await.unwrap();
    assert_eq!(unchanged, complaint);
}

#[tokio::test]
async fn test_assign_assignee_by_wrong_head_forbidden() {
    let h = harness();
    let complaint = filed(&h).await;
    h.engine
        .assign_division_head(COORDINATOR, complaint.id, HEAD, Division::Electrical)
        .await
        .unwrap();

    let result = h
        .engine
        .assign_assignee(OTHER_HEAD, complaint.id, ASSIGNEE)
        .await;
    assert!(matches!(result, Err(DeskError::Forbidden(_))));
}

#[tokio::test]
async fn test_completion_date_tracks_status_across_transitions() {
    let h = harness();
    let complaint = in_progress(&h).await;

    for (status, expect_date) in [
        (WorkStatus::PartiallyDone, true),
        (WorkStatus::InProgress, false),
        (WorkStatus::Done, true),
    ] {
        let updated = h
            .engine
            .update_work(ASSIGNEE, complaint.id, status, "progress")
            .await
            .unwrap();
        assert_eq!(updated.completion_date.is_some(), expect_date, "at {}", status);
        assert!(updated.consistency_errors().is_empty());
    }
}

#[tokio::test]
async fn test_update_work_same_status_keeps_completion_date() {
    let h = harness();
    let complaint = done(&h).await;
    let first_stamp = complaint.completion_date;

    let again = h
        .engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::Done, "checked once more")
        .await
        .unwrap();
    assert_eq!(again.completion_date, first_stamp);
}

#[tokio::test]
async fn test_update_work_notifies_only_on_status_change() {
    let h = harness();
    let complaint = in_progress(&h).await;
    let before = h.outbox.subjects().len();

    // Same status: no news
    h.engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::InProgress, "still at it")
        .await
        .unwrap();
    assert_eq!(h.outbox.subjects().len(), before);

    // Changed status: division head + complainant
    h.engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::Done, "fixed")
        .await
        .unwrap();
    let subjects = h.outbox.subjects();
    assert_eq!(subjects.len(), before + 2);
    assert!(subjects[before].starts_with("Complaint Status Update"));
    assert!(subjects[before + 1].starts_with("Your Complaint Work Status"));
}

#[tokio::test]
async fn test_reopen_notifies_prior_chain() {
    let h = harness();
    let complaint = done(&h).await;
    let before = h.outbox.entries().len();

    h.engine
        .coordinator_action(COORDINATOR, complaint.id, CoordinatorAction::Reopen, "redo")
        .await
        .unwrap();

    let mut all = h.outbox.entries();
    let entries: Vec<OutboxEntry> = all.split_off(before);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].recipient_email, "asha@example.edu");
    assert!(entries[0].subject.starts_with("Complaint Reopened:"));
    assert_eq!(entries[1].recipient_email, "meera@example.edu");
    assert!(entries[1].subject.starts_with("Complaint Reopened (Info)"));
    assert_eq!(entries[2].recipient_email, "ravi@example.edu");
}

#[tokio::test]
async fn test_close_sets_flag_and_notifies_chain() {
    let h = harness();
    let complaint = done(&h).await;
    let before = h.outbox.entries().len();

    let closed = h
        .engine
        .coordinator_action(COORDINATOR, complaint.id, CoordinatorAction::Close, "verified")
        .await
        .unwrap();
    assert_eq!(closed.work_status, WorkStatus::ClosedByCoordinator);
    assert!(closed.is_closed);
    assert_eq!(closed.coordinator_remarks, "verified");
    assert!(closed.consistency_errors().is_empty());

    // Complainant + division head + assignee
    assert_eq!(h.outbox.entries().len(), before + 3);
}

#[tokio::test]
async fn test_reopened_count_never_decreases() {
    let h = harness();
    let complaint = filed(&h).await;
    let mut last = 0;

    for _ in 0..3 {
        let reopened = h
            .engine
            .coordinator_action(COORDINATOR, complaint.id, CoordinatorAction::Reopen, "")
            .await
            .unwrap();
        assert!(reopened.reopened_count > last);
        last = reopened.reopened_count;

        h.engine
            .coordinator_action(COORDINATOR, complaint.id, CoordinatorAction::Close, "")
            .await
            .unwrap();
    }
    assert_eq!(last, 3);
}

#[tokio::test]
async fn test_feedback_preconditions() {
    let h = harness();
    let complaint = in_progress(&h).await;

    // Work not reported done yet
    let early = h
        .engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::Satisfied, "")
        .await;
    assert!(matches!(early, Err(DeskError::PreconditionFailed(_))));

    h.engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::Done, "fixed")
        .await
        .unwrap();

    // PENDING is not a rating
    let unrated = h
        .engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::Pending, "")
        .await;
    assert!(matches!(unrated, Err(DeskError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_assignment_target_validation() {
    let h = harness();
    let complaint = filed(&h).await;

    // Target resolves but carries the wrong role
    let wrong_role = h
        .engine
        .assign_division_head(COORDINATOR, complaint.id, ASSIGNEE, Division::Electrical)
        .await;
    assert!(matches!(wrong_role, Err(DeskError::InvalidArgument(_))));

    // Target does not resolve at all
    let missing = h
        .engine
        .assign_division_head(COORDINATOR, complaint.id, "DVH9999", Division::Electrical)
        .await;
    assert!(matches!(missing, Err(DeskError::NotFound(_))));

    h.engine
        .assign_division_head(COORDINATOR, complaint.id, HEAD, Division::Electrical)
        .await
        .unwrap();
    let wrong_assignee = h.engine.assign_assignee(HEAD, complaint.id, HEAD).await;
    assert!(matches!(wrong_assignee, Err(DeskError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_missing_complaint_is_not_found() {
    let h = harness();
    let result = h
        .engine
        .assign_division_head(COORDINATOR, uuid::Uuid::new_v4(), HEAD, Division::Civil)
        .await;
    assert!(matches!(result, Err(DeskError::NotFound(_))));
}

#[tokio::test]
async fn test_query_scopes() {
    let h = harness();
    let mine = done(&h).await;
    let theirs = h
        .engine
        .file_complaint(OTHER_COMPLAINANT, electrical_payload())
        .await
        .unwrap();

    let by_complainant = h.engine.list_by_complainant(COMPLAINANT).await.unwrap();
    assert_eq!(by_complainant.len(), 1);
    assert_eq!(by_complainant[0].id, mine.id);

    let by_assignee = h.engine.list_by_assignee(ASSIGNEE).await.unwrap();
    assert_eq!(by_assignee.len(), 1);

    let by_head = h.engine.list_by_division_head(HEAD).await.unwrap();
    assert_eq!(by_head.len(), 1);

    let awaiting = h.engine.list_feedback_pending(COMPLAINANT).await.unwrap();
    assert_eq!(awaiting.len(), 1);
    assert_eq!(awaiting[0].id, mine.id);

    let all = h.engine.list_all(COORDINATOR).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|c| c.id == theirs.id));

    let denied = h.engine.list_all(COMPLAINANT).await;
    assert!(matches!(denied, Err(DeskError::Forbidden(_))));
}

#[tokio::test]
async fn test_store_outage_surfaces_unavailable() {
    let h = harness();
    h.store.set_failing(true);

    let result = h.engine.file_complaint(COMPLAINANT, electrical_payload()).await;
    assert!(matches!(result, Err(DeskError::Unavailable(_))));
}

/// Directory whose role lookups fail while id resolution still works,
/// for the best-effort fan-out path
struct RoleLookupDownDirectory {
    inner: MemoryDirectory,
}

#[async_trait]
impl ActorDirectory for RoleLookupDownDirectory {
    async fn resolve(&self, id: &str) -> Result<Actor, DeskError> {
        self.inner.resolve(id).await
    }

    async fn find_by_role(&self, _role: Role) -> Result<Vec<Actor>, DeskError> {
        Err(DeskError::Unavailable("directory down".into()))
    }

    async fn find_by_role_and_division(
        &self,
        _role: Role,
        _division: Division,
    ) -> Result<Vec<Actor>, DeskError> {
        Err(DeskError::Unavailable("directory down".into()))
    }

    async fn add(&self, actor: &Actor) -> Result<(), DeskError> {
        self.inner.add(actor).await
    }

    async fn list(&self) -> Result<Vec<Actor>, DeskError> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn test_role_lookup_outage_never_fails_a_committed_transition() {
    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(RoleLookupDownDirectory {
        inner: MemoryDirectory::with_actors([
            Actor::new(COMPLAINANT, "Asha Rao", "asha@example.edu", Role::Complainant, None),
            Actor::new(COORDINATOR, "Dev Nair", "dev@example.edu", Role::Coordinator, None),
            Actor::new(
                HEAD,
                "Meera Iyer",
                "meera@example.edu",
                Role::DivisionHead,
                Some(Division::Electrical),
            ),
            Actor::new(
                ASSIGNEE,
                "Ravi Kumar",
                "ravi@example.edu",
                Role::Assignee,
                Some(Division::Electrical),
            ),
        ]),
    });
    let outbox = Arc::new(MemoryOutbox::new());
    let store_handle = store.clone();
    let engine = WorkflowEngine::new(store, directory, outbox.clone());

    // Filing commits and succeeds even though the coordinator fan-out
    // lookup is down; no notifications are queued.
    let complaint = engine
        .file_complaint(COMPLAINANT, electrical_payload())
        .await
        .unwrap();
    assert_eq!(store_handle.call_count("create"), 1);
    assert!(outbox.subjects().is_empty());

    // Same for the feedback fan-out at the end of the cycle
    engine
        .assign_division_head(COORDINATOR, complaint.id, HEAD, Division::Electrical)
        .await
        .unwrap();
    engine
        .assign_assignee(HEAD, complaint.id, ASSIGNEE)
        .await
        .unwrap();
    engine
        .update_work(ASSIGNEE, complaint.id, WorkStatus::Done, "fixed")
        .await
        .unwrap();
    let rated = engine
        .submit_feedback(COMPLAINANT, complaint.id, FeedbackStatus::Satisfied, "good")
        .await
        .unwrap();
    assert_eq!(rated.work_status, WorkStatus::ClosedByUser);
}

/// Outbox whose every call fails, for the best-effort queueing path
struct BrokenOutbox;

#[async_trait]
impl Outbox for BrokenOutbox {
    async fn enqueue(&self, _events: &[NotifyEvent]) -> Result<(), DeskError> {
        Err(DeskError::Unavailable("outbox down".into()))
    }

    async fn pending(&self, _limit: usize) -> Result<Vec<OutboxEntry>, DeskError> {
        Err(DeskError::Unavailable("outbox down".into()))
    }

    async fn mark_dispatched(&self, _id: i64) -> Result<(), DeskError> {
        Err(DeskError::Unavailable("outbox down".into()))
    }

    async fn stats(&self) -> Result<OutboxStats, DeskError> {
        Err(DeskError::Unavailable("outbox down".into()))
    }
}

#[tokio::test]
async fn test_broken_outbox_never_fails_a_transition() {
    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(MemoryDirectory::with_actors([
        Actor::new(COMPLAINANT, "Asha Rao", "asha@example.edu", Role::Complainant, None),
        Actor::new(COORDINATOR, "Dev Nair", "dev@example.edu", Role::Coordinator, None),
    ]));
    let engine = WorkflowEngine::new(store, directory, Arc::new(BrokenOutbox));

    let complaint = engine
        .file_complaint(COMPLAINANT, electrical_payload())
        .await
        .unwrap();
    assert_eq!(complaint.work_status, WorkStatus::Pending);
}
