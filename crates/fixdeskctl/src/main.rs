//! Fixdesk Control - CLI front end for the complaint workflow
//!
//! Every workflow transition and query is exposed as a subcommand; the
//! caller passes the acting id with --actor and the engine re-resolves
//! the role on every call.

mod cli;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use cli::{ActorCommands, Cli, Commands, ListScope, OutboxCommands};
use fixdesk_common::actor::{generate_actor_id, Actor, Role};
use fixdesk_common::complaint::{Complaint, NewComplaint};
use fixdesk_common::config::FixdeskConfig;
use fixdesk_common::db::DeskDb;
use fixdesk_common::directory::ActorDirectory;
use fixdesk_common::division::Division;
use fixdesk_common::engine::WorkflowEngine;
use fixdesk_common::error::DeskError;
use fixdesk_common::lifecycle::CoordinatorAction;
use fixdesk_common::notify::LogNotifier;
use fixdesk_common::outbox::{drain_once, Outbox};
use fixdesk_common::sqlite_store::{SqliteDirectory, SqliteOutbox, SqliteStore};
use fixdesk_common::status::{FeedbackStatus, WorkStatus};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

struct App {
    engine: WorkflowEngine,
    directory: Arc<SqliteDirectory>,
    outbox: Arc<SqliteOutbox>,
    config: FixdeskConfig,
}

async fn open_app(config: FixdeskConfig) -> Result<App> {
    let db = DeskDb::open(config.database.path.clone()).await?;
    let store = Arc::new(SqliteStore::new(db.clone()));
    let directory = Arc::new(SqliteDirectory::new(db.clone()));
    let outbox = Arc::new(SqliteOutbox::new(db));
    let engine = WorkflowEngine::new(store, directory.clone(), outbox.clone());
    Ok(App {
        engine,
        directory,
        outbox,
        config,
    })
}

fn parse_complaint_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("'{}' is not a valid complaint id", s))
}

fn parse_division(s: &str) -> Result<Division> {
    Division::parse(s).ok_or_else(|| {
        anyhow!(
            "unknown division '{}' (expected one of: {})",
            s,
            Division::ALL.map(|d| d.as_str()).join(", ")
        )
    })
}

fn parse_work_status(s: &str) -> Result<WorkStatus> {
    WorkStatus::parse(s)
        .ok_or_else(|| anyhow!("unknown work status '{}' (expected in-progress, partially-done, or done)", s))
}

fn parse_feedback_status(s: &str) -> Result<FeedbackStatus> {
    FeedbackStatus::parse(s).ok_or_else(|| {
        anyhow!(
            "unknown feedback status '{}' (expected satisfied, partially-satisfied, or not-satisfied)",
            s
        )
    })
}

fn print_transition(verb: &str, complaint: &Complaint) {
    println!(
        "{} complaint {} (status: {})",
        verb,
        complaint.id,
        complaint.work_status
    );
}

fn print_listing(complaints: &[Complaint]) {
    if complaints.is_empty() {
        println!("No complaints found.");
        return;
    }
    for complaint in complaints {
        println!("{}", render::summary_line(complaint));
    }
    println!("{} complaint(s)", complaints.len());
}

async fn register_actor(
    app: &App,
    role_str: &str,
    name: &str,
    email: &str,
    division_str: Option<&str>,
) -> Result<()> {
    let role = Role::parse(role_str).ok_or_else(|| {
        anyhow!("unknown role '{}' (expected complainant, coordinator, division-head, or assignee)", role_str)
    })?;
    let division = division_str.map(parse_division).transpose()?;
    if role.requires_division() && division.is_none() {
        bail!("--division is required for a {}", role);
    }

    let mut actor = Actor::new(generate_actor_id(role), name, email, role, division);
    loop {
        match app.directory.add(&actor).await {
            Ok(()) => break,
            // Id collision: roll a new suffix
            Err(DeskError::Conflict(_)) => actor.id = generate_actor_id(role),
            Err(e) => return Err(e.into()),
        }
    }

    println!("Registered {} {} ({} <{}>)", role, actor.id, actor.name, actor.email);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = FixdeskConfig::load(cli.config.as_deref())?;
    let app = open_app(config).await?;

    match cli.command {
        Commands::Actor { action } => match action {
            ActorCommands::Add {
                role,
                name,
                email,
                division,
            } => {
                register_actor(&app, &role, &name, &email, division.as_deref()).await?;
            }
            ActorCommands::List => {
                let actors = app.directory.list().await?;
                if actors.is_empty() {
                    println!("No actors registered.");
                }
                for actor in &actors {
                    println!("{}", render::actor_line(actor));
                }
            }
        },

        Commands::File {
            actor,
            department,
            description,
            room,
            dispatch_no,
            requested_by,
            urgent,
        } => {
            let complaint = app
                .engine
                .file_complaint(
                    &actor,
                    NewComplaint {
                        department,
                        description,
                        room_location: room,
                        dispatch_no,
                        requested_by,
                        is_urgent: urgent,
                    },
                )
                .await?;
            print_transition("Filed", &complaint);
        }

        Commands::Route {
            actor,
            complaint,
            head,
            division,
        } => {
            let id = parse_complaint_id(&complaint)?;
            let division = parse_division(&division)?;
            let updated = app
                .engine
                .assign_division_head(&actor, id, &head, division)
                .await?;
            print_transition("Routed", &updated);
        }

        Commands::Assign {
            actor,
            complaint,
            assignee,
        } => {
            let id = parse_complaint_id(&complaint)?;
            let updated = app.engine.assign_assignee(&actor, id, &assignee).await?;
            print_transition("Assigned", &updated);
        }

        Commands::Update {
            actor,
            complaint,
            status,
            remarks,
        } => {
            let id = parse_complaint_id(&complaint)?;
            let status = parse_work_status(&status)?;
            let updated = app.engine.update_work(&actor, id, status, &remarks).await?;
            print_transition("Updated", &updated);
        }

        Commands::Feedback {
            actor,
            complaint,
            status,
            comment,
        } => {
            let id = parse_complaint_id(&complaint)?;
            let status = parse_feedback_status(&status)?;
            let updated = app
                .engine
                .submit_feedback(&actor, id, status, &comment)
                .await?;
            print_transition("Rated", &updated);
        }

        Commands::Close {
            actor,
            complaint,
            remarks,
        } => {
            let id = parse_complaint_id(&complaint)?;
            let updated = app
                .engine
                .coordinator_action(&actor, id, CoordinatorAction::Close, &remarks)
                .await?;
            print_transition("Closed", &updated);
        }

        Commands::Reopen {
            actor,
            complaint,
            remarks,
        } => {
            let id = parse_complaint_id(&complaint)?;
            let updated = app
                .engine
                .coordinator_action(&actor, id, CoordinatorAction::Reopen, &remarks)
                .await?;
            print_transition("Reopened", &updated);
        }

        Commands::List { actor, scope } => {
            let complaints = match scope {
                ListScope::Mine => app.engine.list_by_complainant(&actor).await?,
                ListScope::Assigned => app.engine.list_by_assignee(&actor).await?,
                ListScope::Routed => app.engine.list_by_division_head(&actor).await?,
                ListScope::All => app.engine.list_all(&actor).await?,
                ListScope::FeedbackPending => app.engine.list_feedback_pending(&actor).await?,
            };
            print_listing(&complaints);
        }

        Commands::Show { complaint, json } => {
            let id = parse_complaint_id(&complaint)?;
            let complaint = app.engine.get(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&complaint)?);
            } else {
                print!("{}", render::detail(&complaint));
            }
        }

        Commands::Outbox { action } => match action {
            OutboxCommands::Drain => {
                let report = drain_once(
                    app.outbox.as_ref(),
                    &LogNotifier,
                    app.config.dispatch.batch_size,
                )
                .await?;
                let stats = app.outbox.stats().await?;
                println!(
                    "Delivered {}, failed {}, {} still queued",
                    report.delivered, report.failed, stats.pending
                );
            }
            OutboxCommands::Status => {
                let stats = app.outbox.stats().await?;
                println!("{} pending, {} dispatched", stats.pending, stats.dispatched);
            }
        },
    }

    Ok(())
}
