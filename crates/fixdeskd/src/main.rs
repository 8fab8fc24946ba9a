//! Fixdesk Dispatcher - notification delivery daemon
//!
//! Drains the notification outbox on a fixed interval and hands each
//! queued entry to the configured notifier backend. Failed deliveries
//! stay queued for the next pass.

use anyhow::Result;
use clap::Parser;
use fixdesk_common::config::{FixdeskConfig, NotifierBackend};
use fixdesk_common::db::DeskDb;
use fixdesk_common::notify::{LogNotifier, Notifier};
use fixdesk_common::outbox::{drain_once, Outbox};
use fixdesk_common::sqlite_store::SqliteOutbox;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};

/// Fixdesk notification dispatch daemon
#[derive(Parser)]
#[command(name = "fixdeskd")]
#[command(about = "Fixdesk - complaint notification dispatcher", long_about = None)]
#[command(version)]
struct Args {
    /// Path to config file (overrides the default lookup chain)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between dispatch passes (overrides config)
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();

    info!("Fixdesk dispatcher v{} starting", env!("CARGO_PKG_VERSION"));

    let config = FixdeskConfig::load(args.config.as_deref())?;
    let interval_secs = args
        .interval
        .unwrap_or(config.dispatch.poll_interval_secs)
        .max(1);

    let db = DeskDb::open(config.database.path.clone()).await?;
    let outbox = SqliteOutbox::new(db);
    let notifier: Box<dyn Notifier> = match config.notifier.backend {
        NotifierBackend::Log => Box::new(LogNotifier),
    };

    info!(
        "Dispatching every {}s, batch size {}",
        interval_secs, config.dispatch.batch_size
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match drain_once(&outbox, notifier.as_ref(), config.dispatch.batch_size).await {
                    Ok(report) if report.delivered + report.failed > 0 => {
                        info!(
                            "Dispatch pass: {} delivered, {} failed",
                            report.delivered, report.failed
                        );
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Dispatch pass failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    let stats = outbox.stats().await?;
    info!(
        "Shutting down gracefully ({} notification(s) still queued)",
        stats.pending
    );

    Ok(())
}
