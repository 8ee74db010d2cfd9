//! Daily scrape scheduling, one independent tokio task per source.
//!
//! [`SchedulerService`] owns a registry of [`Job`]s, each a
//! `(Source, Cadence, pipeline fn)` triple. `start` spawns one task per job;
//! `stop` signals them over a watch channel and waits for them to exit.
//!
//! # Job lifecycle
//!
//! ```text
//! Idle ──trigger──▶ Running ──ok──▶ Idle (last_run = Succeeded)
//!                          └─err/panic─▶ Idle (last_run = Failed, logged)
//! ```
//!
//! # Overlapping triggers
//!
//! Skip-if-running: a job computes its next fire time only after the current
//! run has finished, so any trigger that elapses during a run is skipped
//! rather than queued. Runs are never cancelled; `stop` only interrupts the
//! wait between runs.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeDelta};
use futures::future::{BoxFuture, FutureExt, join_all};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::errors::PipelineError;
use crate::models::RunReport;
use crate::sources::Source;

type PipelineFn =
    Arc<dyn Fn() -> BoxFuture<'static, Result<RunReport, PipelineError>> + Send + Sync>;

/// Source of "now" for fire-time computation.
type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// When a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Once a day at a fixed local wall-clock time.
    DailyAt(NaiveTime),
}

impl Cadence {
    pub fn midnight() -> Self {
        Cadence::DailyAt(NaiveTime::MIN)
    }

    /// Next fire time strictly after `now`, in local wall-clock time.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Cadence::DailyAt(at) => {
                let today = now.date().and_time(*at);
                if today > now {
                    today
                } else {
                    today + TimeDelta::days(1)
                }
            }
        }
    }
}

/// A registered pipeline for one source.
#[derive(Clone)]
pub struct Job {
    source: Source,
    cadence: Cadence,
    pipeline: PipelineFn,
}

impl Job {
    pub fn new<F, Fut>(source: Source, cadence: Cadence, pipeline: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RunReport, PipelineError>> + Send + 'static,
    {
        Self {
            source,
            cadence,
            pipeline: Arc::new(move || pipeline().boxed()),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Run the pipeline once on the current task.
    pub fn run(&self) -> BoxFuture<'static, Result<RunReport, PipelineError>> {
        (self.pipeline)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastRun {
    Succeeded(RunReport),
    Failed(String),
}

/// Observable state of one job.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub state: JobState,
    pub runs: u64,
    pub last_run: Option<LastRun>,
    pub last_finished: Option<DateTime<Local>>,
    pub next_fire: Option<NaiveDateTime>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: JobState::Idle,
            runs: 0,
            last_run: None,
            last_finished: None,
            next_fire: None,
        }
    }
}

type SharedStatus = Arc<Mutex<JobStatus>>;

struct Running {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

/// Registry and lifecycle owner for all scheduled jobs.
pub struct SchedulerService {
    jobs: Vec<Job>,
    statuses: HashMap<Source, SharedStatus>,
    fire_on_start: bool,
    clock: Clock,
    running: Option<Running>,
}

impl Default for SchedulerService {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerService {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            statuses: HashMap::new(),
            fire_on_start: false,
            clock: Arc::new(local_now),
            running: None,
        }
    }

    /// Also run every job once immediately after [`start`](Self::start).
    pub fn fire_on_start(mut self, enabled: bool) -> Self {
        self.fire_on_start = enabled;
        self
    }

    /// Compute fire times from `clock` instead of the local wall clock.
    #[cfg(test)]
    pub(crate) fn with_clock(
        mut self,
        clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Add a job. A job already registered for the same source is replaced.
    pub fn register(&mut self, job: Job) {
        let source = job.source();
        if let Some(existing) = self.jobs.iter_mut().find(|j| j.source == source) {
            warn!(%source, "Replacing previously registered job");
            *existing = job;
        } else {
            self.statuses.insert(source, SharedStatus::default());
            self.jobs.push(job);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Snapshot of a job's state, if a job is registered for `source`.
    pub fn status(&self, source: Source) -> Option<JobStatus> {
        self.statuses
            .get(&source)
            .map(|status| status.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Spawn one background task per registered job.
    #[instrument(level = "info", skip_all, fields(jobs = self.jobs.len()))]
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Scheduler already running; ignoring start");
            return;
        }
        let (shutdown, _) = watch::channel(false);
        let handles = self
            .jobs
            .iter()
            .map(|job| {
                let status = Arc::clone(&self.statuses[&job.source]);
                tokio::spawn(job_loop(
                    job.clone(),
                    status,
                    shutdown.subscribe(),
                    Arc::clone(&self.clock),
                    self.fire_on_start,
                ))
            })
            .collect();
        self.running = Some(Running { shutdown, handles });
        info!(fire_on_start = self.fire_on_start, "Scheduler started");
    }

    /// Signal every job to stop and wait for them. A run in progress finishes first.
    #[instrument(level = "info", skip_all)]
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.shutdown.send(true);
        for result in join_all(running.handles).await {
            if let Err(e) = result {
                error!(error = %e, "Scheduler task ended abnormally");
            }
        }
        info!("Scheduler stopped");
    }
}

async fn job_loop(
    job: Job,
    status: SharedStatus,
    mut shutdown: watch::Receiver<bool>,
    clock: Clock,
    fire_on_start: bool,
) {
    if fire_on_start {
        run_once(&job, &status).await;
    }
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        let now = clock();
        let next = job.cadence.next_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        update(&status, |s| s.next_fire = Some(next));
        info!(source = %job.source, cadence = ?job.cadence(), next_fire = %next, "Next run scheduled");

        tokio::select! {
            _ = sleep(wait) => run_once(&job, &status).await,
            _ = shutdown.changed() => break,
        }
    }
    info!(source = %job.source, "Job loop exited");
}

#[instrument(level = "info", skip_all, fields(source = %job.source))]
async fn run_once(job: &Job, status: &SharedStatus) {
    update(status, |s| s.state = JobState::Running);
    let started_at = Instant::now();

    // Spawned so that a panicking pipeline fails only this cycle.
    let last_run = match tokio::spawn(job.run()).await {
        Ok(Ok(report)) => {
            info!(
                extracted = report.extracted,
                inserted = report.inserted,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Scheduled run succeeded"
            );
            LastRun::Succeeded(report)
        }
        Ok(Err(e)) => {
            error!(
                error = %e,
                kind = e.kind(),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Scheduled run failed; stored notifications left as they were"
            );
            LastRun::Failed(e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Scheduled run panicked");
            LastRun::Failed(e.to_string())
        }
    };

    update(status, |s| {
        s.state = JobState::Idle;
        s.runs += 1;
        s.last_run = Some(last_run);
        s.last_finished = Some(Local::now());
    });
}

fn update(status: &SharedStatus, f: impl FnOnce(&mut JobStatus)) {
    let mut guard = status.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}
