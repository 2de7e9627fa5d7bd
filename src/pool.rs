//! Worker pool: bounded job queue drained by a fixed set of fetch workers
//!
//! Submissions enqueue a [`FetchJob`]; workers dequeue in FIFO order, run the
//! fetch, and persist a terminal task record. Completion order across jobs is
//! not guaranteed with more than one worker, and a dequeued job cannot be
//! cancelled.

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::store::TaskStore;
use crate::types::{FetchRequest, TaskKey, TaskRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;

/// One unit of background work: a task key plus the request to perform
#[derive(Debug, Clone)]
pub struct FetchJob {
    /// Key of the pending record the worker will replace
    pub key: TaskKey,
    /// The outbound request to perform
    pub request: FetchRequest,
}

/// Fixed-size pool of fetch workers sharing one bounded FIFO queue
pub struct WorkerPool {
    tx: mpsc::Sender<FetchJob>,
    enqueue_timeout: Option<Duration>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the workers and return the pool handle
    ///
    /// `retention` is the expiry applied to terminal records (None = none),
    /// matching what the service applies to pending records.
    pub fn new(
        store: Arc<dyn TaskStore>,
        fetcher: Arc<dyn Fetcher>,
        config: &PoolConfig,
        retention: Option<Duration>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = config.workers.max(1);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let rx = rx.clone();
            let store = store.clone();
            let fetcher = fetcher.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker, rx, store, fetcher, retention).await;
            }));
        }

        tracing::debug!(
            workers,
            queue_capacity = config.queue_capacity,
            "worker pool started"
        );

        Self {
            tx,
            enqueue_timeout: config.enqueue_timeout(),
            handles,
        }
    }

    /// Enqueue a job, waiting for queue space up to the enqueue timeout
    ///
    /// Returns [`Error::QueueFull`] if the queue stays at capacity past the
    /// timeout, and [`Error::ShuttingDown`] once the pool has shut down. With
    /// no timeout configured the call blocks until space frees up.
    pub async fn submit(&self, job: FetchJob) -> Result<()> {
        match self.enqueue_timeout {
            Some(timeout) => self.tx.send_timeout(job, timeout).await.map_err(|e| match e {
                SendTimeoutError::Timeout(_) => Error::QueueFull,
                SendTimeoutError::Closed(_) => Error::ShuttingDown,
            }),
            None => self.tx.send(job).await.map_err(|_| Error::ShuttingDown),
        }
    }

    /// Close the queue, let workers drain it, and wait for them to exit
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "worker task did not shut down cleanly");
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

async fn worker_loop(
    worker: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<FetchJob>>>,
    store: Arc<dyn TaskStore>,
    fetcher: Arc<dyn Fetcher>,
    retention: Option<Duration>,
) {
    loop {
        // Hold the receiver lock only while dequeuing so siblings can race
        // for the next job
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            tracing::debug!(worker, "queue closed, worker exiting");
            break;
        };

        tracing::debug!(worker, key = %job.key, "executing fetch job");

        // Every path ends in a terminal write: a failed fetch becomes a
        // visible failed record, never an eternally pending one
        let record = match fetcher.execute(&job.request).await {
            Ok(outcome) => {
                tracing::info!(worker, key = %job.key, status = %outcome.http_status, "fetch completed");
                TaskRecord::completed(job.key.clone(), outcome)
            }
            Err(e) => {
                tracing::warn!(worker, key = %job.key, error = %e, "fetch failed");
                TaskRecord::failed(job.key.clone(), e.to_string())
            }
        };

        persist_terminal(&*store, &job.key, &record, retention).await;
    }
}

/// Write the terminal record, unconditionally replacing whatever is stored
///
/// Storage failures here cannot be surfaced to any caller; they are logged
/// with full context and the record is left as-is.
async fn persist_terminal(
    store: &dyn TaskStore,
    key: &TaskKey,
    record: &TaskRecord,
    retention: Option<Duration>,
) {
    let bytes = match serde_json::to_vec(record) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "failed to serialize terminal task record");
            return;
        }
    };

    if let Err(e) = store.set(key.as_str(), &bytes, retention).await {
        tracing::error!(key = %key, error = %e, "failed to persist terminal task record");
    }
}
