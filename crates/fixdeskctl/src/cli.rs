//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fixdesk CLI
#[derive(Parser)]
#[command(name = "fixdeskctl")]
#[command(about = "Fixdesk - facility-maintenance complaint workflow", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to config file (overrides the default lookup chain)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the actor registry
    Actor {
        #[command(subcommand)]
        action: ActorCommands,
    },

    /// File a new complaint
    File {
        /// Acting complainant id
        #[arg(long)]
        actor: String,

        /// Department the complaint concerns
        #[arg(long)]
        department: String,

        /// What is broken
        #[arg(long)]
        description: String,

        /// Room or location
        #[arg(long, default_value = "")]
        room: String,

        /// Dispatch number
        #[arg(long, default_value = "")]
        dispatch_no: String,

        /// Who requested the work
        #[arg(long, default_value = "")]
        requested_by: String,

        /// Mark as urgent
        #[arg(long)]
        urgent: bool,
    },

    /// Route a complaint to a division head (coordinator)
    Route {
        /// Acting coordinator id
        #[arg(long)]
        actor: String,

        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// Division head id
        #[arg(long)]
        head: String,

        /// Division, e.g. "Electrical" or "Plumbing and Water"
        #[arg(long)]
        division: String,
    },

    /// Hand a complaint to an assignee (division head)
    Assign {
        /// Acting division head id
        #[arg(long)]
        actor: String,

        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// Assignee id
        #[arg(long)]
        assignee: String,
    },

    /// Report work progress (assignee)
    Update {
        /// Acting assignee id
        #[arg(long)]
        actor: String,

        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// New status: in-progress, partially-done, or done
        #[arg(long)]
        status: String,

        /// Work remarks
        #[arg(long, default_value = "")]
        remarks: String,
    },

    /// Rate the outcome of resolved work (complainant)
    Feedback {
        /// Acting complainant id
        #[arg(long)]
        actor: String,

        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// Rating: satisfied, partially-satisfied, or not-satisfied
        #[arg(long)]
        status: String,

        /// Optional comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Close a complaint (coordinator)
    Close {
        /// Acting coordinator id
        #[arg(long)]
        actor: String,

        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// Closing remarks
        #[arg(long, default_value = "")]
        remarks: String,
    },

    /// Reopen a complaint for another cycle (coordinator)
    Reopen {
        /// Acting coordinator id
        #[arg(long)]
        actor: String,

        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// Reopening remarks
        #[arg(long, default_value = "")]
        remarks: String,
    },

    /// List complaints visible to an actor
    List {
        /// Acting actor id
        #[arg(long)]
        actor: String,

        /// Which complaints to list
        #[arg(long, value_enum, default_value_t = ListScope::Mine)]
        scope: ListScope,
    },

    /// Show one complaint in full
    Show {
        /// Complaint id
        #[arg(long)]
        complaint: String,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Inspect or drain the notification outbox
    Outbox {
        #[command(subcommand)]
        action: OutboxCommands,
    },
}

/// Actor registry subcommands
#[derive(Subcommand)]
pub enum ActorCommands {
    /// Register a new actor (id is generated)
    Add {
        /// Role: complainant, coordinator, division-head, or assignee
        #[arg(long)]
        role: String,

        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Division (required for division heads and assignees)
        #[arg(long)]
        division: Option<String>,
    },

    /// List every registered actor
    List,
}

/// Outbox subcommands
#[derive(Subcommand)]
pub enum OutboxCommands {
    /// Deliver queued notifications now (one pass)
    Drain,

    /// Show queue depth
    Status,
}

/// Listing scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListScope {
    /// Complaints I filed
    Mine,
    /// Complaints assigned to me for work
    Assigned,
    /// Complaints routed to me as division head
    Routed,
    /// Every complaint (coordinators only)
    All,
    /// My complaints still waiting on a rating
    FeedbackPending,
}
