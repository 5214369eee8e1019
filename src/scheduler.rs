use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::traits::{Monitor, StateStore};

/// Runtime snapshot of one monitor job, served by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub name: String,
    pub interval_secs: u64,
    pub last_run_at: Option<String>,
    pub last_success_at: Option<String>,
    pub last_error_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub is_running: bool,
}

impl MonitorSnapshot {
    fn new(name: &str, interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            interval_secs: interval.as_secs(),
            last_run_at: None,
            last_success_at: None,
            last_error_at: None,
            last_error: None,
            consecutive_failures: 0,
            is_running: false,
        }
    }
}

/// Shared telemetry for monitor jobs.
#[derive(Default)]
pub struct MonitorTelemetry {
    jobs: Mutex<HashMap<String, MonitorSnapshot>>,
}

impl MonitorTelemetry {
    pub fn new() -> Self {
        Self { jobs: Mutex::new(HashMap::new()) }
    }

    fn register(&self, name: &str, interval: Duration) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.entry(name.to_string())
            .or_insert_with(|| MonitorSnapshot::new(name, interval));
    }

    fn mark_started(&self, name: &str) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job) = jobs.get_mut(name) {
            job.last_run_at = Some(Utc::now().to_rfc3339());
            job.is_running = true;
        }
    }

    fn mark_success(&self, name: &str) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job) = jobs.get_mut(name) {
            job.last_success_at = Some(Utc::now().to_rfc3339());
            job.last_error = None;
            job.last_error_at = None;
            job.consecutive_failures = 0;
            job.is_running = false;
        }
    }

    fn mark_failure(&self, name: &str, consecutive_failures: u32, message: String) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(job) = jobs.get_mut(name) {
            job.last_error_at = Some(Utc::now().to_rfc3339());
            job.last_error = Some(message);
            job.consecutive_failures = consecutive_failures;
            job.is_running = false;
        }
    }

    pub fn snapshots(&self) -> Vec<MonitorSnapshot> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<MonitorSnapshot> = jobs.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}

struct MonitorJob {
    monitor: Arc<dyn Monitor>,
    interval: Duration,
    /// Guards against overlapping invocations of the same monitor.
    is_running: AtomicBool,
    consecutive_failures: AtomicU32,
}

/// Drives each monitor on its own fixed interval.
///
/// One loop per monitor, all tracked for graceful drain on stop. A
/// monitor that fails keeps its interval unchanged (no backoff); a
/// cycle that overruns its interval just makes the next tick skip.
pub struct Scheduler {
    jobs: Vec<Arc<MonitorJob>>,
    store: Arc<dyn StateStore>,
    telemetry: Arc<MonitorTelemetry>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Scheduler {
    pub fn new(store: Arc<dyn StateStore>, telemetry: Arc<MonitorTelemetry>) -> Self {
        Self {
            jobs: Vec::new(),
            store,
            telemetry,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn register(&mut self, monitor: Arc<dyn Monitor>, interval: Duration) {
        self.telemetry.register(monitor.name(), interval);
        self.jobs.push(Arc::new(MonitorJob {
            monitor,
            interval,
            is_running: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
        }));
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Run every monitor once, concurrently, and wait for all of them.
    /// Used at startup so the first cycle doesn't wait out an interval.
    pub async fn run_all_once(&self) {
        let runs = self
            .jobs
            .iter()
            .map(|job| Self::run_job(job.clone(), self.store.clone(), self.telemetry.clone()));
        join_all(runs).await;
    }

    /// Spawn the per-monitor loops. Returns immediately.
    pub fn start(&self) {
        for job in &self.jobs {
            let job = job.clone();
            let store = self.store.clone();
            let telemetry = self.telemetry.clone();
            let cancel = self.cancel.clone();
            self.tracker.spawn(async move {
                info!(
                    monitor = job.monitor.name(),
                    interval_secs = job.interval.as_secs(),
                    "Monitor loop started"
                );
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(monitor = job.monitor.name(), "Monitor loop stopping");
                            break;
                        }
                        _ = tokio::time::sleep(job.interval) => {
                            Self::run_job(job.clone(), store.clone(), telemetry.clone()).await;
                        }
                    }
                }
            });
        }
        self.tracker.close();
    }

    /// Signal all loops to stop and wait for in-flight cycles to drain.
    pub async fn stop(&self) {
        self.cancel.cancel();
        self.tracker.wait().await;
        info!("All monitor loops stopped");
    }

    async fn run_job(
        job: Arc<MonitorJob>,
        store: Arc<dyn StateStore>,
        telemetry: Arc<MonitorTelemetry>,
    ) {
        let name = job.monitor.name();

        // Skip if the previous cycle is still in flight.
        if job.is_running.swap(true, Ordering::SeqCst) {
            debug!(monitor = name, "Skipping cycle, previous one still running");
            return;
        }

        telemetry.mark_started(name);
        debug!(monitor = name, "Monitor cycle starting");

        let result = job.monitor.check().await;
        job.is_running.store(false, Ordering::SeqCst);

        match result {
            Ok(summary) => {
                let prev = job.consecutive_failures.swap(0, Ordering::SeqCst);
                if prev > 0 {
                    info!(monitor = name, prev_failures = prev, "Monitor recovered");
                }
                telemetry.mark_success(name);
                if let Err(e) = store.set_last_sync(name).await {
                    error!(monitor = name, "Failed to record last sync: {}", e);
                }
                debug!(monitor = name, %summary, "Monitor cycle completed");
            }
            Err(e) => {
                let count = job.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                error!(
                    monitor = name,
                    consecutive_failures = count,
                    "Monitor cycle failed: {:#}",
                    e
                );
                telemetry.mark_failure(name, count, e.to_string());
            }
        }
    }
}
