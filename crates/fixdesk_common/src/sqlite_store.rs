//! SQLite-backed store, directory, and outbox.
//!
//! Each collaborator holds a handle to the shared database and maps I/O
//! failures to `Unavailable`; domain outcomes (`NotFound`, `Conflict`)
//! are decided here from what the queries return.

use crate::actor::{Actor, Role};
use crate::complaint::{Complaint, ComplaintDelta, Feedback};
use crate::db::DeskDb;
use crate::directory::ActorDirectory;
use crate::division::Division;
use crate::error::DeskError;
use crate::notify::NotifyEvent;
use crate::outbox::{Outbox, OutboxEntry, OutboxStats};
use crate::status::{FeedbackStatus, WorkStatus};
use crate::store::{ComplaintFilter, ComplaintStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

fn unavailable(e: anyhow::Error) -> DeskError {
    DeskError::Unavailable(e.to_string())
}

fn conversion_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

// ============================================================================
// Complaint Store
// ============================================================================

const COMPLAINT_COLUMNS: &str = "id, complainant_id, department, description, room_location, \
     dispatch_no, requested_by, reported_by_name, filed_at, is_urgent, \
     assigned_division, assigned_division_head_id, assigned_to_id, \
     work_status, remarks, completion_date, \
     feedback_status, feedback_comment, feedback_date, \
     coordinator_remarks, is_closed, reopened_count";

fn row_to_complaint(row: &Row<'_>) -> rusqlite::Result<Complaint> {
    let id_text: String = row.get(0)?;
    let id = Uuid::parse_str(&id_text).map_err(|e| conversion_err(0, e.to_string()))?;

    let division_text: Option<String> = row.get(10)?;
    let assigned_division = division_text
        .map(|s| Division::parse(&s).ok_or_else(|| conversion_err(10, format!("unknown division '{}'", s))))
        .transpose()?;

    let status_text: String = row.get(13)?;
    let work_status = WorkStatus::parse(&status_text)
        .ok_or_else(|| conversion_err(13, format!("unknown work status '{}'", status_text)))?;

    let feedback_text: String = row.get(16)?;
    let feedback_status = FeedbackStatus::parse(&feedback_text)
        .ok_or_else(|| conversion_err(16, format!("unknown feedback status '{}'", feedback_text)))?;

    Ok(Complaint {
        id,
        complainant_id: row.get(1)?,
        department: row.get(2)?,
        description: row.get(3)?,
        room_location: row.get(4)?,
        dispatch_no: row.get(5)?,
        requested_by: row.get(6)?,
        reported_by_name: row.get(7)?,
        filed_at: row.get::<_, DateTime<Utc>>(8)?,
        is_urgent: row.get(9)?,
        assigned_division,
        assigned_division_head_id: row.get(11)?,
        assigned_to_id: row.get(12)?,
        work_status,
        remarks: row.get(14)?,
        completion_date: row.get::<_, Option<DateTime<Utc>>>(15)?,
        feedback: Feedback {
            status: feedback_status,
            comment: row.get(17)?,
            date: row.get::<_, Option<DateTime<Utc>>>(18)?,
        },
        coordinator_remarks: row.get(19)?,
        is_closed: row.get(20)?,
        reopened_count: row.get(21)?,
    })
}

/// Complaint records in SQLite
pub struct SqliteStore {
    db: DeskDb,
}

impl SqliteStore {
    pub fn new(db: DeskDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ComplaintStore for SqliteStore {
    async fn create(&self, complaint: &Complaint) -> Result<(), DeskError> {
        let c = complaint.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO complaints (id, complainant_id, department, description, \
                     room_location, dispatch_no, requested_by, reported_by_name, filed_at, \
                     is_urgent, assigned_division, assigned_division_head_id, assigned_to_id, \
                     work_status, remarks, completion_date, feedback_status, feedback_comment, \
                     feedback_date, coordinator_remarks, is_closed, reopened_count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                     ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
                    params![
                        c.id.to_string(),
                        c.complainant_id,
                        c.department,
                        c.description,
                        c.room_location,
                        c.dispatch_no,
                        c.requested_by,
                        c.reported_by_name,
                        c.filed_at,
                        c.is_urgent,
                        c.assigned_division.map(|d| d.as_str()),
                        c.assigned_division_head_id,
                        c.assigned_to_id,
                        c.work_status.as_str(),
                        c.remarks,
                        c.completion_date,
                        c.feedback.status.as_str(),
                        c.feedback.comment,
                        c.feedback.date,
                        c.coordinator_remarks,
                        c.is_closed,
                        c.reopened_count,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(unavailable)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, DeskError> {
        let id_text = id.to_string();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM complaints WHERE id = ?1",
                    COMPLAINT_COLUMNS
                ))?;
                let mut rows = stmt.query_map(params![id_text], row_to_complaint)?;
                match rows.next() {
                    Some(row) => Ok(Some(row?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(unavailable)
    }

    async fn find_many(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, DeskError> {
        let filter = filter.clone();
        self.db
            .execute(move |conn| {
                let mut conditions: Vec<String> = Vec::new();
                let mut values: Vec<String> = Vec::new();

                if let Some(id) = &filter.complainant_id {
                    values.push(id.clone());
                    conditions.push(format!("complainant_id = ?{}", values.len()));
                }
                if let Some(id) = &filter.assigned_to_id {
                    values.push(id.clone());
                    conditions.push(format!("assigned_to_id = ?{}", values.len()));
                }
                if let Some(id) = &filter.assigned_division_head_id {
                    values.push(id.clone());
                    conditions.push(format!("assigned_division_head_id = ?{}", values.len()));
                }
                if filter.awaiting_feedback {
                    conditions.push(
                        "work_status IN ('DONE', 'PARTIALLY_DONE') \
                         AND feedback_status = 'PENDING'"
                            .to_string(),
                    );
                }

                let where_clause = if conditions.is_empty() {
                    String::new()
                } else {
                    format!(" WHERE {}", conditions.join(" AND "))
                };

                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM complaints{} ORDER BY filed_at DESC",
                    COMPLAINT_COLUMNS, where_clause
                ))?;
                let rows = stmt.query_map(params_from_iter(values.iter()), row_to_complaint)?;
                let mut complaints = Vec::new();
                for row in rows {
                    complaints.push(row?);
                }
                Ok(complaints)
            })
            .await
            .map_err(unavailable)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        delta: &ComplaintDelta,
    ) -> Result<Complaint, DeskError> {
        let id_text = id.to_string();
        let d = delta.clone();
        let updated = self
            .db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE complaints SET \
                     assigned_division = ?1, assigned_division_head_id = ?2, \
                     assigned_to_id = ?3, work_status = ?4, remarks = ?5, \
                     completion_date = ?6, feedback_status = ?7, feedback_comment = ?8, \
                     feedback_date = ?9, coordinator_remarks = ?10, is_closed = ?11, \
                     reopened_count = ?12 \
                     WHERE id = ?13",
                    params![
                        d.assigned_division.map(|div| div.as_str()),
                        d.assigned_division_head_id,
                        d.assigned_to_id,
                        d.work_status.as_str(),
                        d.remarks,
                        d.completion_date,
                        d.feedback.status.as_str(),
                        d.feedback.comment,
                        d.feedback.date,
                        d.coordinator_remarks,
                        d.is_closed,
                        d.reopened_count,
                        id_text,
                    ],
                )?;
                if changed == 0 {
                    return Ok(None);
                }
                let complaint = conn.query_row(
                    &format!("SELECT {} FROM complaints WHERE id = ?1", COMPLAINT_COLUMNS),
                    params![id_text],
                    row_to_complaint,
                )?;
                Ok(Some(complaint))
            })
            .await
            .map_err(unavailable)?;

        updated.ok_or_else(|| DeskError::NotFound(format!("complaint {}", id)))
    }
}

// ============================================================================
// Actor Directory
// ============================================================================

fn row_to_actor(row: &Row<'_>) -> rusqlite::Result<Actor> {
    let role_text: String = row.get(3)?;
    let role = Role::parse(&role_text)
        .ok_or_else(|| conversion_err(3, format!("unknown role '{}'", role_text)))?;

    let division_text: Option<String> = row.get(4)?;
    let division = division_text
        .map(|s| Division::parse(&s).ok_or_else(|| conversion_err(4, format!("unknown division '{}'", s))))
        .transpose()?;

    Ok(Actor {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role,
        division,
    })
}

fn query_actors(
    conn: &Connection,
    where_clause: &str,
    values: &[String],
) -> anyhow::Result<Vec<Actor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, email, role, division FROM actors{} ORDER BY id",
        where_clause
    ))?;
    let rows = stmt.query_map(params_from_iter(values.iter()), row_to_actor)?;
    let mut actors = Vec::new();
    for row in rows {
        actors.push(row?);
    }
    Ok(actors)
}

/// Actor registry in SQLite
pub struct SqliteDirectory {
    db: DeskDb,
}

impl SqliteDirectory {
    pub fn new(db: DeskDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActorDirectory for SqliteDirectory {
    async fn resolve(&self, id: &str) -> Result<Actor, DeskError> {
        let id = id.to_string();
        let found = self
            .db
            .execute({
                let id = id.clone();
                move |conn| {
                    let mut actors = query_actors(conn, " WHERE id = ?1", &[id])?;
                    Ok(actors.pop())
                }
            })
            .await
            .map_err(unavailable)?;

        found.ok_or_else(|| DeskError::NotFound(format!("actor {}", id)))
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<Actor>, DeskError> {
        self.db
            .execute(move |conn| {
                query_actors(conn, " WHERE role = ?1", &[role.as_str().to_string()])
            })
            .await
            .map_err(unavailable)
    }

    async fn find_by_role_and_division(
        &self,
        role: Role,
        division: Division,
    ) -> Result<Vec<Actor>, DeskError> {
        self.db
            .execute(move |conn| {
                query_actors(
                    conn,
                    " WHERE role = ?1 AND division = ?2",
                    &[role.as_str().to_string(), division.as_str().to_string()],
                )
            })
            .await
            .map_err(unavailable)
    }

    async fn add(&self, actor: &Actor) -> Result<(), DeskError> {
        let a = actor.clone();
        let inserted = self
            .db
            .execute(move |conn| {
                let exists: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM actors WHERE id = ?1",
                    params![a.id],
                    |row| row.get(0),
                )?;
                if exists > 0 {
                    return Ok(false);
                }
                conn.execute(
                    "INSERT INTO actors (id, name, email, role, division)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        a.id,
                        a.name,
                        a.email,
                        a.role.as_str(),
                        a.division.map(|d| d.as_str()),
                    ],
                )?;
                Ok(true)
            })
            .await
            .map_err(unavailable)?;

        if inserted {
            Ok(())
        } else {
            Err(DeskError::Conflict(format!(
                "actor {} already exists",
                actor.id
            )))
        }
    }

    async fn list(&self) -> Result<Vec<Actor>, DeskError> {
        self.db
            .execute(|conn| query_actors(conn, "", &[]))
            .await
            .map_err(unavailable)
    }
}

// ============================================================================
// Outbox
// ============================================================================

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<OutboxEntry> {
    let complaint_text: String = row.get(1)?;
    let complaint_id =
        Uuid::parse_str(&complaint_text).map_err(|e| conversion_err(1, e.to_string()))?;

    Ok(OutboxEntry {
        id: row.get(0)?,
        complaint_id,
        recipient_email: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        queued_at: row.get::<_, DateTime<Utc>>(5)?,
        dispatched: row.get(6)?,
    })
}

/// Notification queue in SQLite
pub struct SqliteOutbox {
    db: DeskDb,
}

impl SqliteOutbox {
    pub fn new(db: DeskDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Outbox for SqliteOutbox {
    async fn enqueue(&self, events: &[NotifyEvent]) -> Result<(), DeskError> {
        let events = events.to_vec();
        self.db
            .execute(move |conn| {
                let now = Utc::now();
                for event in &events {
                    conn.execute(
                        "INSERT INTO outbox (complaint_id, recipient_email, subject, body, \
                         queued_at, dispatched)
                         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                        params![
                            event.complaint_id.to_string(),
                            event.recipient_email,
                            event.subject,
                            event.body,
                            now,
                        ],
                    )?;
                }
                Ok(())
            })
            .await
            .map_err(unavailable)
    }

    async fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, DeskError> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, complaint_id, recipient_email, subject, body, queued_at, \
                     dispatched FROM outbox WHERE dispatched = 0 ORDER BY id LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], row_to_entry)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                Ok(entries)
            })
            .await
            .map_err(unavailable)
    }

    async fn mark_dispatched(&self, id: i64) -> Result<(), DeskError> {
        let changed = self
            .db
            .execute(move |conn| {
                let changed =
                    conn.execute("UPDATE outbox SET dispatched = 1 WHERE id = ?1", params![id])?;
                Ok(changed)
            })
            .await
            .map_err(unavailable)?;

        if changed == 0 {
            Err(DeskError::NotFound(format!("outbox entry {}", id)))
        } else {
            Ok(())
        }
    }

    async fn stats(&self) -> Result<OutboxStats, DeskError> {
        self.db
            .execute(|conn| {
                let pending: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM outbox WHERE dispatched = 0",
                    [],
                    |row| row.get(0),
                )?;
                let dispatched: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM outbox WHERE dispatched = 1",
                    [],
                    |row| row.get(0),
                )?;
                Ok(OutboxStats {
                    pending: pending as usize,
                    dispatched: dispatched as usize,
                })
            })
            .await
            .map_err(unavailable)
    }
}
