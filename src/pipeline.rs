//! One scrape cycle for one source: fetch → parse → persist.
//!
//! Persistence only happens once extraction has fully succeeded, so a failed
//! cycle never touches the partition and the API keeps serving the last
//! successful state.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use tracing::{info, instrument};

use crate::errors::{PipelineError, StorageError};
use crate::models::RunReport;
use crate::scheduler::{Cadence, Job};
use crate::scrapers;
use crate::sources::SourceTarget;
use crate::store::Store;

/// Run a single cycle for `target` and report what was stored.
#[instrument(level = "info", skip_all, fields(source = %target.source))]
pub async fn run_cycle(
    client: &Client,
    store: Arc<Store>,
    target: &SourceTarget,
) -> Result<RunReport, PipelineError> {
    let started_at = Instant::now();
    let source = target.source;

    let records = scrapers::extract(client, target).await?;
    let extracted = records.len();

    let (outcome, stored) = tokio::task::spawn_blocking(move || {
        let outcome = store.append(source, &records)?;
        Ok::<_, StorageError>((outcome, store.count(source)?))
    })
    .await
    .map_err(|e| StorageError::Task(e.to_string()))??;

    let report = RunReport {
        source,
        extracted,
        inserted: outcome.inserted,
        duplicates: outcome.duplicates,
    };
    info!(
        extracted = report.extracted,
        inserted = report.inserted,
        duplicates = report.duplicates,
        stored,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "Cycle complete"
    );
    Ok(report)
}

/// Wrap [`run_cycle`] for `target` as a scheduler job.
pub fn scheduled_job(
    client: Client,
    store: Arc<Store>,
    target: SourceTarget,
    cadence: Cadence,
) -> Job {
    let source = target.source;
    let target = Arc::new(target);
    Job::new(source, cadence, move || {
        let client = client.clone();
        let store = Arc::clone(&store);
        let target = Arc::clone(&target);
        async move { run_cycle(&client, store, &target).await }
    })
}
