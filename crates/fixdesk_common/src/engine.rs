//! Workflow engine: the one path through which complaints change.
//!
//! Every operation follows the same shape: resolve the acting id from
//! the directory, load the record, run the guard table and any state
//! guards, compute the transition's delta, persist it as one write,
//! then queue notifications. Queueing is best-effort; a full outbox or
//! a down notifier never fails a transition that already committed.

use crate::actor::{Actor, Role};
use crate::complaint::{Complaint, NewComplaint};
use crate::directory::ActorDirectory;
use crate::division::Division;
use crate::error::DeskError;
use crate::lifecycle::{self, CoordinatorAction, TransitionKind};
use crate::notify::{self, NotifyEvent};
use crate::outbox::Outbox;
use crate::status::{FeedbackStatus, WorkStatus};
use crate::store::{ComplaintFilter, ComplaintStore};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Complaint lifecycle engine. Collaborators are injected once at
/// construction; there is no other way to mutate a complaint.
pub struct WorkflowEngine {
    store: Arc<dyn ComplaintStore>,
    directory: Arc<dyn ActorDirectory>,
    outbox: Arc<dyn Outbox>,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn ComplaintStore>,
        directory: Arc<dyn ActorDirectory>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        Self {
            store,
            directory,
            outbox,
        }
    }

    async fn load(&self, complaint_id: Uuid) -> Result<Complaint, DeskError> {
        self.store
            .find_by_id(complaint_id)
            .await?
            .ok_or_else(|| DeskError::NotFound(format!("complaint {}", complaint_id)))
    }

    /// Resolve a notification recipient; a missing entry skips the
    /// notification rather than failing the transition.
    async fn recipient(&self, id: &str) -> Option<Actor> {
        match self.directory.resolve(id).await {
            Ok(actor) => Some(actor),
            Err(e) => {
                debug!("Skipping notification, recipient {} unresolvable: {}", id, e);
                None
            }
        }
    }

    /// Coordinator fan-out list; a directory outage here skips the
    /// notifications rather than failing the committed transition.
    async fn coordinators(&self) -> Vec<Actor> {
        match self.directory.find_by_role(Role::Coordinator).await {
            Ok(actors) => actors,
            Err(e) => {
                warn!("Skipping coordinator notifications, directory lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn queue_events(&self, events: Vec<NotifyEvent>) {
        if events.is_empty() {
            return;
        }
        if let Err(e) = self.outbox.enqueue(&events).await {
            warn!("Failed to queue {} notification(s): {}", events.len(), e);
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Complainant files a new complaint
    pub async fn file_complaint(
        &self,
        actor_id: &str,
        payload: NewComplaint,
    ) -> Result<Complaint, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        lifecycle::authorize(TransitionKind::File, &actor, None)?;

        let complaint = Complaint::file(&actor, payload);
        self.store.create(&complaint).await?;
        info!(
            "Complaint {} filed by {} ({})",
            complaint.id, actor.id, complaint.department
        );

        let mut events = Vec::new();
        for coordinator in self.coordinators().await {
            events.push(notify::filed(&complaint, &coordinator));
        }
        self.queue_events(events).await;

        Ok(complaint)
    }

    /// Coordinator routes a complaint to a division head
    pub async fn assign_division_head(
        &self,
        actor_id: &str,
        complaint_id: Uuid,
        division_head_id: &str,
        division: Division,
    ) -> Result<Complaint, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        let complaint = self.load(complaint_id).await?;
        lifecycle::authorize(TransitionKind::AssignDivisionHead, &actor, Some(&complaint))?;

        let head = self.directory.resolve(division_head_id).await?;
        if head.role != Role::DivisionHead {
            return Err(DeskError::InvalidArgument(format!(
                "{} is a {}, not a division head",
                head.id, head.role
            )));
        }

        let delta = lifecycle::assign_division_head_delta(&complaint, &head.id, division);
        let updated = self.store.update_by_id(complaint_id, &delta).await?;
        info!(
            "Complaint {} routed to {} ({})",
            complaint_id, head.id, division
        );

        self.queue_events(vec![notify::routed_to_head(&updated, &head, &actor)])
            .await;

        Ok(updated)
    }

    /// Division head hands a complaint to an assignee
    pub async fn assign_assignee(
        &self,
        actor_id: &str,
        complaint_id: Uuid,
        assignee_id: &str,
    ) -> Result<Complaint, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        let complaint = self.load(complaint_id).await?;
        lifecycle::authorize(TransitionKind::AssignAssignee, &actor, Some(&complaint))?;

        let assignee = self.directory.resolve(assignee_id).await?;
        if assignee.role != Role::Assignee {
            return Err(DeskError::InvalidArgument(format!(
                "{} is a {}, not an assignee",
                assignee.id, assignee.role
            )));
        }

        let delta = lifecycle::assign_assignee_delta(&complaint, &assignee.id);
        let updated = self.store.update_by_id(complaint_id, &delta).await?;
        info!("Complaint {} assigned to {}", complaint_id, assignee.id);

        self.queue_events(vec![notify::assigned_for_work(&updated, &assignee, &actor)])
            .await;

        Ok(updated)
    }

    /// Assignee reports work progress
    pub async fn update_work(
        &self,
        actor_id: &str,
        complaint_id: Uuid,
        new_status: WorkStatus,
        remarks: &str,
    ) -> Result<Complaint, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        let complaint = self.load(complaint_id).await?;
        lifecycle::authorize(TransitionKind::UpdateWork, &actor, Some(&complaint))?;
        lifecycle::check_work_report(new_status)?;

        let status_changed = complaint.work_status != new_status;
        let delta = lifecycle::update_work_delta(&complaint, new_status, remarks);
        let updated = self.store.update_by_id(complaint_id, &delta).await?;
        info!(
            "Complaint {} work status reported {} by {}",
            complaint_id, new_status, actor.id
        );

        // A re-save at the same status is not news to anyone
        if status_changed {
            let mut events = Vec::new();
            if let Some(head_id) = &updated.assigned_division_head_id {
                if let Some(head) = self.recipient(head_id).await {
                    events.push(notify::status_update_for_head(&updated, &head));
                }
            }
            if let Some(complainant) = self.recipient(&updated.complainant_id).await {
                events.push(notify::status_update_for_complainant(&updated, &complainant));
            }
            self.queue_events(events).await;
        }

        Ok(updated)
    }

    /// Complainant rates the outcome of the work
    pub async fn submit_feedback(
        &self,
        actor_id: &str,
        complaint_id: Uuid,
        feedback_status: FeedbackStatus,
        comment: &str,
    ) -> Result<Complaint, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        let complaint = self.load(complaint_id).await?;
        lifecycle::authorize(TransitionKind::SubmitFeedback, &actor, Some(&complaint))?;
        lifecycle::check_feedback_rating(feedback_status)?;
        lifecycle::check_feedback_state(&complaint)?;

        let delta = lifecycle::submit_feedback_delta(&complaint, feedback_status, comment);
        let updated = self.store.update_by_id(complaint_id, &delta).await?;
        info!(
            "Complaint {} rated {} by {}",
            complaint_id, feedback_status, actor.id
        );

        let mut events = Vec::new();
        for coordinator in self.coordinators().await {
            events.push(notify::feedback_received(&updated, &coordinator));
        }
        self.queue_events(events).await;

        Ok(updated)
    }

    /// Coordinator finalizes: close, or reopen for another cycle
    pub async fn coordinator_action(
        &self,
        actor_id: &str,
        complaint_id: Uuid,
        action: CoordinatorAction,
        remarks: &str,
    ) -> Result<Complaint, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        let complaint = self.load(complaint_id).await?;
        lifecycle::authorize(action.transition(), &actor, Some(&complaint))?;

        // The reopen delta clears the assignment chain; remember who to
        // tell before it does.
        let prior_head_id = complaint.assigned_division_head_id.clone();
        let prior_assignee_id = complaint.assigned_to_id.clone();

        let delta = match action {
            CoordinatorAction::Reopen => lifecycle::reopen_delta(&complaint, remarks),
            CoordinatorAction::Close => lifecycle::close_delta(&complaint, remarks),
        };
        let updated = self.store.update_by_id(complaint_id, &delta).await?;
        info!(
            "Complaint {} {} by coordinator {}",
            complaint_id,
            match action {
                CoordinatorAction::Reopen => "reopened",
                CoordinatorAction::Close => "closed",
            },
            actor.id
        );

        let mut events = Vec::new();
        if let Some(complainant) = self.recipient(&updated.complainant_id).await {
            events.push(match action {
                CoordinatorAction::Reopen => {
                    notify::reopened_for_complainant(&updated, &complainant, &actor)
                }
                CoordinatorAction::Close => {
                    notify::closed_for_complainant(&updated, &complainant, &actor)
                }
            });
        }
        for id in [&prior_head_id, &prior_assignee_id].into_iter().flatten() {
            if let Some(recipient) = self.recipient(id).await {
                events.push(match action {
                    CoordinatorAction::Reopen => {
                        notify::reopened_info(&updated, &recipient, &actor)
                    }
                    CoordinatorAction::Close => notify::closed_info(&updated, &recipient, &actor),
                });
            }
        }
        self.queue_events(events).await;

        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Single record fetch
    pub async fn get(&self, complaint_id: Uuid) -> Result<Complaint, DeskError> {
        self.load(complaint_id).await
    }

    /// Complaints filed by this actor
    pub async fn list_by_complainant(&self, actor_id: &str) -> Result<Vec<Complaint>, DeskError> {
        self.store
            .find_many(&ComplaintFilter {
                complainant_id: Some(actor_id.to_string()),
                ..ComplaintFilter::default()
            })
            .await
    }

    /// Work queue for an assignee
    pub async fn list_by_assignee(&self, actor_id: &str) -> Result<Vec<Complaint>, DeskError> {
        self.store
            .find_many(&ComplaintFilter {
                assigned_to_id: Some(actor_id.to_string()),
                ..ComplaintFilter::default()
            })
            .await
    }

    /// Complaints routed to a division head
    pub async fn list_by_division_head(
        &self,
        actor_id: &str,
    ) -> Result<Vec<Complaint>, DeskError> {
        self.store
            .find_many(&ComplaintFilter {
                assigned_division_head_id: Some(actor_id.to_string()),
                ..ComplaintFilter::default()
            })
            .await
    }

    /// Every complaint. Coordinators only.
    pub async fn list_all(&self, actor_id: &str) -> Result<Vec<Complaint>, DeskError> {
        let actor = self.directory.resolve(actor_id).await?;
        if actor.role != Role::Coordinator {
            return Err(DeskError::Forbidden(format!(
                "role {} may not list all complaints",
                actor.role
            )));
        }
        self.store.find_many(&ComplaintFilter::default()).await
    }

    /// This complainant's complaints that still need a rating
    pub async fn list_feedback_pending(
        &self,
        actor_id: &str,
    ) -> Result<Vec<Complaint>, DeskError> {
        self.store
            .find_many(&ComplaintFilter {
                complainant_id: Some(actor_id.to_string()),
                awaiting_feedback: true,
                ..ComplaintFilter::default()
            })
            .await
    }
}
