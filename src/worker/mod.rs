//! Batch-polling scraper worker.
//!
//! Each cycle pulls a bounded batch of pending tasks, runs
//! fetch → extract → store update for every task, then waits for the
//! configured interval before the next cycle:
//!
//! ```text
//! Store::select_pending ─▶ Fetcher ─▶ MetadataExtractor ─▶ Store::update_result
//! ```
//!
//! Failures never stop the loop. A failed batch read skips the cycle, a
//! failed fetch becomes a `failed` task, and a failed result write leaves the
//! task pending for a later cycle.
//!
//! # Usage
//!
//! ```rust,ignore
//! let worker = Worker::new(store, fetcher, WorkerConfig::default());
//! let handle = worker.spawn();
//! handle.poll_now().await;
//! handle.shutdown().await;
//! ```

mod config;

pub use config::{Schedule, WorkerConfig, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::app::Result;
use crate::domain::{Task, TaskOutcome, TaskStatus};
use crate::extractor::MetadataExtractor;
use crate::fetcher::{normalize_url, Fetcher};
use crate::store::Store;

/// Counts for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub selected: usize,
    pub completed: usize,
    pub failed: usize,
    pub write_errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Processed {
    Recorded(TaskStatus),
    WriteError,
}

/// Control messages for a spawned worker
#[derive(Debug)]
pub enum WorkerMessage {
    /// Start a cycle now instead of waiting out the interval
    PollNow,
    /// Stop after the in-flight cycle
    Shutdown,
}

/// Handle to a worker running on the tokio runtime
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Trigger an immediate cycle
    pub async fn poll_now(&self) {
        if let Err(e) = self.tx.send(WorkerMessage::PollNow).await {
            warn!("Failed to wake worker: {}", e);
        }
    }

    /// Stop the worker and wait for its task to finish
    pub async fn shutdown(self) {
        let _ = self.tx.send(WorkerMessage::Shutdown).await;
        if let Err(e) = self.join.await {
            error!("Worker task join error: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

pub struct Worker<S: Store + Send + Sync + 'static> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    extractor: MetadataExtractor,
    config: WorkerConfig,
    worker_id: String,
}

impl<S: Store + Send + Sync + 'static> Worker<S> {
    pub fn new(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>, config: WorkerConfig) -> Self {
        let worker_id = config.worker_id();
        Self {
            store,
            fetcher,
            extractor: MetadataExtractor::new(),
            config,
            worker_id,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run exactly one poll cycle.
    ///
    /// Returns an error only when the batch could not be read; per-task
    /// problems are counted in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let tasks = self.next_batch()?;
        let mut report = CycleReport {
            selected: tasks.len(),
            ..Default::default()
        };

        if tasks.is_empty() {
            return Ok(report);
        }

        debug!("Processing {} pending tasks", tasks.len());

        let processed = if self.config.concurrency <= 1 {
            let mut processed = Vec::with_capacity(tasks.len());
            for task in &tasks {
                processed.push(self.process_task(task).await);
            }
            processed
        } else {
            self.process_by_host(tasks).await
        };

        for result in processed {
            match result {
                Processed::Recorded(TaskStatus::Completed) => report.completed += 1,
                Processed::Recorded(TaskStatus::Failed) => report.failed += 1,
                Processed::Recorded(TaskStatus::Pending) => {}
                Processed::WriteError => report.write_errors += 1,
            }
        }

        Ok(report)
    }

    /// Fetch a URL and turn the response into a terminal outcome.
    pub async fn scrape(&self, url: &str) -> TaskOutcome {
        match self.fetcher.fetch(url).await {
            Ok(page) => TaskOutcome::Completed(
                self.extractor
                    .extract(&page.body, page.content_type.as_deref()),
            ),
            Err(e) => TaskOutcome::failed(e.to_string()),
        }
    }

    fn next_batch(&self) -> Result<Vec<Task>> {
        if self.config.claim {
            self.store.claim_pending(
                self.config.batch_size,
                &self.worker_id,
                self.config.claim_lease(),
            )
        } else {
            // Expired claims hide their tasks from `select_pending`.
            match self.store.release_stale_claims(self.config.claim_lease()) {
                Ok(0) => {}
                Ok(n) => info!("Released {} stale claims", n),
                Err(e) => warn!("Failed to release stale claims: {}", e),
            }
            self.store.select_pending(self.config.batch_size)
        }
    }

    async fn process_task(&self, task: &Task) -> Processed {
        let outcome = self.scrape(&task.url).await;

        match &outcome {
            TaskOutcome::Completed(meta) => {
                info!("Task {} completed: {}", task.id, meta.title.as_deref().unwrap_or(&task.url))
            }
            TaskOutcome::Failed { error_message } => {
                warn!("Task {} failed ({}): {}", task.id, task.url, error_message)
            }
        }

        match self.store.update_result(task.id, &outcome) {
            Ok(()) => Processed::Recorded(outcome.status()),
            Err(e) => {
                error!("Failed to record result for task {}: {}", task.id, e);
                Processed::WriteError
            }
        }
    }

    /// Hosts run concurrently, tasks for one host stay sequential.
    async fn process_by_host(&self, tasks: Vec<Task>) -> Vec<Processed> {
        let mut groups: Vec<Vec<Task>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for task in tasks {
            let host = normalize_url(&task.url)
                .ok()
                .and_then(|url| url.host_str().map(String::from))
                .unwrap_or_else(|| task.url.clone());

            match index.get(&host) {
                Some(&i) => groups[i].push(task),
                None => {
                    index.insert(host, groups.len());
                    groups.push(vec![task]);
                }
            }
        }

        let worker = self;
        stream::iter(groups)
            .map(|group| async move {
                let mut processed = Vec::with_capacity(group.len());
                for task in &group {
                    processed.push(worker.process_task(task).await);
                }
                processed
            })
            .buffer_unordered(self.config.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Run a cycle and log its outcome; never fails.
    async fn tick(&self) {
        let start = Instant::now();

        match self.run_cycle().await {
            Ok(report) if report.selected == 0 => debug!("No pending tasks"),
            Ok(report) => info!(
                "Cycle complete: {} completed, {} failed, {} write errors ({:.1}s)",
                report.completed,
                report.failed,
                report.write_errors,
                start.elapsed().as_secs_f64()
            ),
            Err(e) => error!("Failed to fetch pending tasks, skipping cycle: {}", e),
        }
    }

    /// Run the poll loop until a shutdown message arrives or every sender is
    /// dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<WorkerMessage>) {
        info!(
            "Worker {} started (batch size: {}, interval: {}, {:?})",
            self.worker_id,
            self.config.batch_size,
            WorkerConfig::format_interval(self.config.interval_secs),
            self.config.schedule
        );

        loop {
            let started = Instant::now();
            self.tick().await;
            let next = next_start(
                self.config.schedule,
                started,
                Instant::now(),
                self.config.interval(),
            );

            tokio::select! {
                _ = sleep_until(next) => {}
                msg = rx.recv() => match msg {
                    Some(WorkerMessage::PollNow) => debug!("Immediate poll requested"),
                    Some(WorkerMessage::Shutdown) | None => break,
                },
            }
        }

        info!("Worker {} shutting down", self.worker_id);
    }

    /// Spawn the poll loop as a tokio task
    pub fn spawn(self) -> WorkerHandle {
        let (tx, rx) = mpsc::channel(16);
        let join = tokio::spawn(async move {
            self.run(rx).await;
        });
        WorkerHandle { tx, join }
    }

    /// Run until SIGINT/SIGTERM (ctrl-c on Windows)
    pub async fn run_until_signal(self) -> Result<()> {
        #[cfg(unix)]
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        let handle = self.spawn();

        #[cfg(unix)]
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = tokio::signal::ctrl_c() => {},
        }

        #[cfg(not(unix))]
        tokio::signal::ctrl_c().await?;

        info!("Shutdown signal received");
        handle.shutdown().await;
        Ok(())
    }
}

/// When the next cycle may start.
fn next_start(schedule: Schedule, started: Instant, finished: Instant, interval: Duration) -> Instant {
    let base = match schedule {
        Schedule::FixedDelay => finished,
        Schedule::FixedRate => started,
    };
    base.checked_add(interval)
        .unwrap_or_else(|| base + Duration::from_secs(MAX_INTERVAL_SECS))
}
