//! # JK Notifications
//!
//! Scrapes recruitment notifications from the J&K Public Service Commission,
//! the J&K Services Selection Board and the J&K Board of Professional Entrance
//! Examinations once a day, stores them per source in SQLite, and serves
//! them to a front-end as JSON.
//!
//! ## Usage
//!
//! ```sh
//! jk_notifications --data-dir ./data --bind 0.0.0.0:5000
//! ```
//!
//! ## Architecture
//!
//! 1. **Scheduling**: one background task per source fires daily (00:00 by default)
//! 2. **Extraction**: fetch the source's listing page and apply its extraction rule
//! 3. **Persistence**: append new records to the source's own SQLite partition
//! 4. **Serving**: the API reads the last persisted state; it never scrapes

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod errors;
mod models;
mod pipeline;
mod scheduler;
mod scrapers;
mod sources;
mod store;
mod utils;

use api::AppState;
use cli::Cli;
use config::load_config;
use scheduler::SchedulerService;
use sources::Source;
use store::Store;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "jk_notifications starting up");

    // ---- Configuration ----
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let mut config = load_config(args.config.as_deref())?;
    config.apply_cli(&args);
    config.validate()?;
    let cadence = config.schedule.cadence()?;

    // ---- Storage: every partition exists before the first read or write ----
    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        error!(
            path = %config.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }
    let store = Arc::new(Store::open(&config.data_dir)?);

    // ---- Scheduler: one independent job per source ----
    let client = scrapers::build_client(config.fetch_timeout(), &config.user_agent)?;
    let mut scheduler = SchedulerService::new().fire_on_start(config.scrape_on_start);
    for source in Source::ALL {
        let target = config.target(source)?;
        info!(%source, listing_url = %target.listing_url, ?cadence, "Registering scrape job");
        scheduler.register(pipeline::scheduled_job(
            client.clone(),
            Arc::clone(&store),
            target,
            cadence,
        ));
    }
    scheduler.start();

    // ---- API server ----
    let listener = TcpListener::bind(&config.bind).await?;
    let state = AppState::new(Arc::clone(&store), config.index_page.clone());
    let served = api::serve(listener, state, shutdown_signal()).await;

    scheduler.stop().await;
    for source in Source::ALL {
        if let Some(status) = scheduler.status(source) {
            info!(
                %source,
                runs = status.runs,
                last_run = ?status.last_run,
                last_finished = ?status.last_finished,
                next_fire = ?status.next_fire,
                "Final job status"
            );
        }
    }
    served?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C; shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
