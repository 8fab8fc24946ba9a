//! SQLite connection management for the complaint database.
//!
//! Single connection behind a mutex; callers run their queries through
//! `execute`, which hops to a blocking task. WAL mode keeps the daemon
//! and the CLI from tripping over each other.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Handle to the complaint database
#[derive(Clone)]
pub struct DeskDb {
    conn: Arc<Mutex<Connection>>,
}

impl DeskDb {
    /// Open or create the database at `path`
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        info!("Opening complaint database at: {}", path.display());

        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&path).context("Failed to open SQLite database")?;

            // WAL for concurrent daemon + CLI access
            conn.pragma_update(None, "journal_mode", "WAL")
                .context("Failed to enable WAL mode")?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .context("Failed to set synchronous mode")?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .context("Failed to enable foreign keys")?;

            Ok(conn)
        })
        .await??;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema().await?;

        Ok(db)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.blocking_lock();

            conn.execute(
                "CREATE TABLE IF NOT EXISTS complaints (
                    id TEXT PRIMARY KEY,
                    complainant_id TEXT NOT NULL,
                    department TEXT NOT NULL,
                    description TEXT NOT NULL,
                    room_location TEXT NOT NULL,
                    dispatch_no TEXT NOT NULL,
                    requested_by TEXT NOT NULL,
                    reported_by_name TEXT NOT NULL,
                    filed_at TEXT NOT NULL,
                    is_urgent INTEGER NOT NULL,
                    assigned_division TEXT,
                    assigned_division_head_id TEXT,
                    assigned_to_id TEXT,
                    work_status TEXT NOT NULL,
                    remarks TEXT NOT NULL,
                    completion_date TEXT,
                    feedback_status TEXT NOT NULL,
                    feedback_comment TEXT NOT NULL,
                    feedback_date TEXT,
                    coordinator_remarks TEXT NOT NULL,
                    is_closed INTEGER NOT NULL,
                    reopened_count INTEGER NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_complaints_complainant
                 ON complaints(complainant_id)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_complaints_assignee
                 ON complaints(assigned_to_id)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_complaints_head
                 ON complaints(assigned_division_head_id)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_complaints_filed
                 ON complaints(filed_at DESC)",
                [],
            )?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS actors (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    role TEXT NOT NULL,
                    division TEXT
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_actors_role
                 ON actors(role)",
                [],
            )?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS outbox (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    complaint_id TEXT NOT NULL,
                    recipient_email TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    body TEXT NOT NULL,
                    queued_at TEXT NOT NULL,
                    dispatched INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_outbox_pending
                 ON outbox(dispatched, id)",
                [],
            )?;

            debug!("Database schema initialized successfully");
            Ok(())
        })
        .await??;

        info!("Complaint database schema ready");
        Ok(())
    }

    /// Run a query on the connection in a blocking context
    pub async fn execute<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_schema() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = DeskDb::open(db_path.clone()).await.unwrap();
        assert!(db_path.exists());

        let tables = db
            .execute(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type='table' AND name IN ('complaints', 'actors', 'outbox')",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .unwrap();

        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        DeskDb::open(db_path.clone()).await.unwrap();
        DeskDb::open(db_path).await.unwrap();
    }
}
