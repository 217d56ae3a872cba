// WHY: Fixed set of tokio workers draining one shared job channel
// The channel is closed once every job is enqueued, so workers exit on closed-and-drained
// instead of counting sentinels, and the pool returns only after every worker has exited

use anyhow::{Context, Result};
use futures::future::{self, BoxFuture};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::discovery::Job;

/// Outcome of one job as observed by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// The job ran (or tried to) but did not succeed; never retried
    Failed { reason: String },
}

/// Executes one job to completion
pub trait JobRunner: Send + Sync + 'static {
    fn run<'a>(&'a self, job: &'a Job) -> BoxFuture<'a, JobOutcome>;
}

/// Runs the external compressor as `<exe> -acl=<input> -stats=<output>`
#[derive(Debug, Clone)]
pub struct CompressorRunner {
    executable: PathBuf,
}

impl CompressorRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Build the command for a job without spawning it
    pub fn command(&self, job: &Job) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(format!("-acl={}", job.input_path.display()))
            .arg(format!("-stats={}", job.output_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl JobRunner for CompressorRunner {
    fn run<'a>(&'a self, job: &'a Job) -> BoxFuture<'a, JobOutcome> {
        Box::pin(async move {
            // No timeout: a hung compressor blocks this worker indefinitely
            match self.command(job).status().await {
                Ok(status) if status.success() => JobOutcome::Completed,
                Ok(status) => JobOutcome::Failed {
                    reason: format!("compressor exited with {status}"),
                },
                Err(e) => JobOutcome::Failed {
                    reason: format!("failed to spawn {}: {e}", self.executable.display()),
                },
            }
        })
    }
}

/// Counters returned once the pool has drained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSummary {
    /// Jobs pulled from the queue and run
    pub dispatched: usize,
    /// Jobs whose runner reported a failure
    pub failed: usize,
    /// Jobs handled by each worker, indexed by worker id
    pub per_worker: Vec<usize>,
}

/// How a pool run ended
#[derive(Debug)]
pub enum PoolExit {
    /// Every worker observed the closed queue and exited
    Drained(PoolSummary),
    /// The shutdown signal fired first; workers and their children are abandoned
    Interrupted,
}

#[derive(Debug, Default)]
struct WorkerTally {
    handled: usize,
    failed: usize,
}

/// Bounded pool of workers sharing one FIFO job queue
pub struct WorkerPool<R: JobRunner> {
    workers: usize,
    runner: Arc<R>,
    progress: bool,
}

impl<R: JobRunner> WorkerPool<R> {
    /// Create a pool with `workers` concurrent workers
    ///
    /// # Panics
    /// Panics when `workers` is zero; callers validate the count first.
    pub fn new(workers: usize, runner: R) -> Self {
        assert!(workers >= 1, "worker pool needs at least one worker");
        Self {
            workers,
            runner: Arc::new(runner),
            progress: false,
        }
    }

    /// Show a progress bar over dispatched jobs
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run every job and wait for all workers to exit
    pub async fn run(&self, jobs: Vec<Job>) -> Result<PoolSummary> {
        match self.run_until(jobs, future::pending::<()>()).await? {
            PoolExit::Drained(summary) => Ok(summary),
            PoolExit::Interrupted => unreachable!("pending shutdown never resolves"),
        }
    }

    /// Run every job unless `shutdown` resolves first
    ///
    /// On shutdown the wait is abandoned immediately; spawned workers are detached and any
    /// in-flight compressor keeps running on its own.
    pub async fn run_until<F>(&self, jobs: Vec<Job>, shutdown: F) -> Result<PoolExit>
    where
        F: Future,
    {
        let total = jobs.len();
        let progress_bar = self.progress_bar(total as u64);

        // WHY: bounded queue; the producer task blocks once workers fall behind
        let (tx, rx) = mpsc::channel::<Job>(self.workers * 2);
        let rx = Arc::new(Mutex::new(rx));

        let producer = tokio::spawn(async move {
            for job in jobs {
                if tx.send(job).await.is_err() {
                    debug!("Job queue closed early, stopping producer");
                    break;
                }
            }
            // Dropping the sender closes the queue
        });

        let handles: Vec<_> = (0..self.workers)
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let runner = Arc::clone(&self.runner);
                let progress_bar = progress_bar.clone();
                tokio::spawn(worker_loop(worker_id, rx, runner, progress_bar))
            })
            .collect();

        info!(workers = self.workers, jobs = total, "Worker pool started");

        let drained = async {
            producer.await.context("Job producer task failed")?;
            let tallies = future::try_join_all(handles)
                .await
                .context("Worker task failed")?;
            Ok::<_, anyhow::Error>(tallies)
        };

        let tallies = tokio::select! {
            result = drained => result?,
            _ = shutdown => {
                warn!("Shutdown requested, abandoning worker pool");
                progress_bar.abandon();
                return Ok(PoolExit::Interrupted);
            }
        };

        progress_bar.finish_and_clear();

        let summary = PoolSummary {
            dispatched: tallies.iter().map(|t| t.handled).sum(),
            failed: tallies.iter().map(|t| t.failed).sum(),
            per_worker: tallies.iter().map(|t| t.handled).collect(),
        };
        info!(
            dispatched = summary.dispatched,
            failed = summary.failed,
            "Worker pool drained"
        );
        Ok(PoolExit::Drained(summary))
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar
    }
}

async fn worker_loop<R: JobRunner>(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    runner: Arc<R>,
    progress_bar: ProgressBar,
) -> WorkerTally {
    let mut tally = WorkerTally::default();

    loop {
        // Lock only for the pop; the guard is released before the job runs
        let next = { rx.lock().await.recv().await };
        let Some(job) = next else {
            break;
        };

        info!(worker = worker_id, "Compressing {}...", job.input_path.display());
        progress_bar.set_message(job.input_path.display().to_string());

        if let JobOutcome::Failed { reason } = runner.run(&job).await {
            warn!(worker = worker_id, input = %job.input_path.display(), "Job failed: {}", reason);
            tally.failed += 1;
        }

        tally.handled += 1;
        progress_bar.inc(1);
    }

    debug!(worker = worker_id, handled = tally.handled, "Worker exiting on closed queue");
    tally
}
