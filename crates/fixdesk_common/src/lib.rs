//! Fixdesk Common - complaint workflow core.
//!
//! The complaint lifecycle state machine, its guard table, and the
//! collaborator seams (store, actor directory, notification outbox)
//! with SQLite-backed and in-memory implementations. Both binaries
//! (`fixdeskd`, `fixdeskctl`) drive everything through
//! [`engine::WorkflowEngine`].

pub mod actor;
pub mod complaint;
pub mod config;
pub mod db;
pub mod directory;
pub mod division;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod outbox;
pub mod sqlite_store;
pub mod status;
pub mod store;

#[cfg(test)]
mod engine_tests;
