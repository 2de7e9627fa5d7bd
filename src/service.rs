//! Task service: the façade used by the inbound API
//!
//! Owns the submit → allocate → persist-pending → enqueue flow and answers
//! get/list/page/delete queries against the task store. Reads are independent
//! of dispatch: a record can be polled at any time, pending or terminal.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::pool::{FetchJob, WorkerPool};
use crate::store::{SqliteStore, TaskStore};
use crate::types::{
    DeleteOutcome, FetchRequest, TASK_COUNTER, TASK_KEY_PREFIX, TaskId, TaskKey, TaskRecord,
};
use std::sync::Arc;
use std::time::Duration;

/// Façade over the task store and the worker pool
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    pool: WorkerPool,
    retention: Option<Duration>,
}

impl TaskService {
    /// Build a service over explicit store and fetcher implementations
    pub fn new(store: Arc<dyn TaskStore>, fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        let retention = config.store.retention();
        let pool = WorkerPool::new(store.clone(), fetcher, &config.pool, retention);
        Self {
            store,
            pool,
            retention,
        }
    }

    /// Build a service with the default SQLite store and HTTP fetcher
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(&config.store.database_path).await?);
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::new(store, fetcher, config))
    }

    /// Submit an outbound request as a new asynchronous task
    ///
    /// Validates the request, allocates an identifier, writes the pending
    /// record, enqueues the job, and returns the pending record immediately —
    /// before the fetch runs. If the job queue rejects the submission the
    /// pending record is removed again and the rejection is returned.
    pub async fn submit(&self, request: FetchRequest) -> Result<TaskRecord> {
        request.validate()?;

        let id = self.store.next_id(TASK_COUNTER).await?;
        let key = TaskKey::from_id(TaskId(id));

        let record = TaskRecord::pending(key.clone());
        let bytes = serde_json::to_vec(&record)?;
        self.store.set(key.as_str(), &bytes, self.retention).await?;

        tracing::info!(key = %key, method = %request.method, address = %request.address, "task accepted");

        if let Err(e) = self.pool.submit(FetchJob { key: key.clone(), request }).await {
            // The job never entered the queue; remove the pending record so a
            // never-runnable task does not linger
            if let Err(del) = self.store.delete(key.as_str()).await {
                tracing::error!(key = %key, error = %del, "failed to remove orphaned pending record");
            }
            return Err(e);
        }

        Ok(record)
    }

    /// The stored record under the key, pending or terminal
    pub async fn get_task(&self, key: &TaskKey) -> Result<Option<TaskRecord>> {
        match self.store.get(key.as_str()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete the record under the key
    ///
    /// Absence is the distinct [`DeleteOutcome::NotFound`], never an error.
    /// A delete racing an in-flight job does not cancel the job; the worker's
    /// terminal write will re-create the key.
    pub async fn delete_task(&self, key: &TaskKey) -> Result<DeleteOutcome> {
        if !self.store.exists(key.as_str()).await? {
            return Ok(DeleteOutcome::NotFound);
        }
        self.store.delete(key.as_str()).await?;
        tracing::info!(key = %key, "task deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// All currently stored task records, in unspecified order
    ///
    /// Entries that vanished mid-scan or fail to parse are skipped, not
    /// treated as errors.
    pub async fn list_all(&self) -> Result<Vec<TaskRecord>> {
        let values = self.store.get_by_prefix(TASK_KEY_PREFIX).await?;
        Ok(values
            .iter()
            .filter_map(|bytes| parse_record(bytes))
            .collect())
    }

    /// Up to `page_size` records for the 1-based page number
    ///
    /// Computes the inclusive identifier range
    /// `[(page-1)*page_size + 1, page*page_size]` and multi-gets those keys;
    /// identifiers with no record (never allocated, deleted, expired) are
    /// omitted.
    pub async fn list_page(&self, page: u64, page_size: u64) -> Result<Vec<TaskRecord>> {
        if page < 1 {
            return Err(Error::validation("pages start at 1", &["pageNumber"]));
        }

        // The page number comes straight from the caller; a range that does
        // not fit in u64 cannot name any allocated identifier
        let out_of_range = || Error::validation("page number out of range", &["pageNumber"]);
        let first = (page - 1)
            .checked_mul(page_size)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(out_of_range)?;
        let end = first.checked_add(page_size).ok_or_else(out_of_range)?;

        let keys: Vec<String> = (first..end)
            .map(|id| TaskKey::from_id(TaskId(id)).as_str().to_string())
            .collect();

        let values = self.store.get_many(&keys).await?;
        Ok(values
            .iter()
            .flatten()
            .filter_map(|bytes| parse_record(bytes))
            .collect())
    }

    /// Stop accepting jobs, let workers drain the queue, and wait for them
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}

fn parse_record(bytes: &[u8]) -> Option<TaskRecord> {
    match serde_json::from_slice(bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unparseable task record");
            None
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::store::MemoryStore;
    use crate::types::{FetchOutcome, TaskState};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubFetcher {
        delay: Option<Duration>,
        fail: bool,
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn execute(
            &self,
            _request: &FetchRequest,
        ) -> std::result::Result<FetchOutcome, FetchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(FetchError::InvalidAddress {
                    address: "stub".to_string(),
                    reason: "stub failure".to_string(),
                });
            }
            Ok(FetchOutcome {
                http_status: "200 OK".to_string(),
                headers: HashMap::new(),
                content_length: Some(42),
            })
        }
    }

    fn service(fail: bool) -> TaskService {
        TaskService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubFetcher { delay: None, fail }),
            &Config::default(),
        )
    }

    fn get_request() -> FetchRequest {
        FetchRequest {
            method: "GET".to_string(),
            address: "http://example.test/ok".to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }

    async fn wait_for_terminal(service: &TaskService, key: &TaskKey) -> TaskRecord {
        for _ in 0..200 {
            if let Some(record) = service.get_task(key).await.unwrap()
                && record.done
            {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no terminal record for {key}");
    }

    #[tokio::test]
    async fn test_sequential_submissions_allocate_increasing_ids() {
        let service = service(false);

        for expected in 1..=5u64 {
            let record = service.submit(get_request()).await.unwrap();
            assert_eq!(record.key, TaskKey::from_id(TaskId(expected)));
        }
    }

    #[tokio::test]
    async fn test_submit_returns_pending_record_immediately() {
        let service = TaskService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubFetcher {
                delay: Some(Duration::from_millis(200)),
                fail: false,
            }),
            &Config::default(),
        );

        let record = service.submit(get_request()).await.unwrap();
        assert_eq!(record.state(), TaskState::Pending);
        assert!(record.http_status.is_none());
        assert!(record.content_length.is_none());

        // The stored record is pending too while the worker is busy
        let stored = service.get_task(&record.key).await.unwrap().unwrap();
        assert!(!stored.done);
    }

    #[tokio::test]
    async fn test_completed_task_carries_executor_outcome() {
        let service = service(false);

        let record = service.submit(get_request()).await.unwrap();
        let terminal = wait_for_terminal(&service, &record.key).await;

        assert_eq!(terminal.state(), TaskState::Done);
        assert_eq!(terminal.http_status.as_deref(), Some("200 OK"));
        assert_eq!(terminal.content_length, Some(42));
    }

    #[tokio::test]
    async fn test_failed_fetch_becomes_visible_failed_record() {
        let service = service(true);

        let record = service.submit(get_request()).await.unwrap();
        let terminal = wait_for_terminal(&service, &record.key).await;

        assert_eq!(terminal.state(), TaskState::Failed);
        assert!(terminal.error.unwrap().contains("stub failure"));
    }

    #[tokio::test]
    async fn test_invalid_submission_allocates_nothing() {
        let service = service(false);

        let invalid = FetchRequest {
            method: "GET".to_string(),
            address: String::new(),
            headers: HashMap::new(),
            body: None,
        };
        assert!(matches!(
            service.submit(invalid).await.unwrap_err(),
            Error::Validation { .. }
        ));

        // The next valid submission still gets id 1: nothing was allocated
        // and no job was enqueued for the invalid one
        let record = service.submit(get_request()).await.unwrap();
        assert_eq!(record.key, TaskKey::from_id(TaskId(1)));
    }

    #[tokio::test]
    async fn test_get_unknown_key_is_absent() {
        let service = service(false);
        let found = service.get_task(&TaskKey::new("task:999")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let service = service(false);

        let record = service.submit(get_request()).await.unwrap();
        assert_eq!(
            service.delete_task(&record.key).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            service.delete_task(&record.key).await.unwrap(),
            DeleteOutcome::NotFound
        );
        assert!(service.get_task(&record.key).await.unwrap().is_none());

        // Never-allocated key behaves the same
        assert_eq!(
            service.delete_task(&TaskKey::new("task:999")).await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_all_returns_every_record() {
        let service = service(false);

        for _ in 0..3 {
            service.submit(get_request()).await.unwrap();
        }

        let records = service.list_all().await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_list_all_skips_unparseable_entries() {
        let store = Arc::new(MemoryStore::new());
        let service = TaskService::new(
            store.clone(),
            Arc::new(StubFetcher {
                delay: None,
                fail: false,
            }),
            &Config::default(),
        );

        service.submit(get_request()).await.unwrap();
        store.set("task:junk", b"not json", None).await.unwrap();

        let records = service.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_list_page_ranges_and_holes() {
        let service = service(false);

        for _ in 0..5 {
            service.submit(get_request()).await.unwrap();
        }
        // Punch a hole at id 2
        service
            .delete_task(&TaskKey::from_id(TaskId(2)))
            .await
            .unwrap();

        let page1 = service.list_page(1, 3).await.unwrap();
        let keys: Vec<&str> = page1.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["task:1", "task:3"]);

        let page2 = service.list_page(2, 3).await.unwrap();
        let keys: Vec<&str> = page2.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["task:4", "task:5"]);

        // Past the end: empty, not an error
        assert!(service.list_page(9, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_page_rejects_page_zero() {
        let service = service(false);
        assert!(matches!(
            service.list_page(0, 10).await.unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_page_rejects_page_beyond_id_space() {
        let service = service(false);

        // Ranges that overflow u64 must come back as validation errors, not
        // panic or wrap around to valid identifiers
        assert!(matches!(
            service.list_page(u64::MAX, 10).await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            service.list_page(u64::MAX / 10 + 2, 10).await.unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_submissions_never_collide() {
        let service = Arc::new(TaskService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubFetcher {
                delay: None,
                fail: false,
            }),
            &Config {
                pool: crate::config::PoolConfig {
                    workers: 4,
                    queue_capacity: 64,
                    enqueue_timeout_ms: None,
                },
                ..Config::default()
            },
        ));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.submit(get_request()).await.unwrap().key
            }));
        }

        let mut keys = Vec::new();
        for handle in handles {
            keys.push(handle.await.unwrap());
        }

        keys.sort_by_key(|k| k.id());
        keys.dedup();
        assert_eq!(keys.len(), 32, "allocator must never hand out duplicates");
    }

    #[tokio::test]
    async fn test_queue_rejection_removes_pending_record() {
        let service = TaskService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubFetcher {
                delay: Some(Duration::from_secs(30)),
                fail: false,
            }),
            &Config {
                pool: crate::config::PoolConfig {
                    workers: 1,
                    queue_capacity: 1,
                    enqueue_timeout_ms: Some(100),
                },
                ..Config::default()
            },
        );

        // Occupy the worker and fill the queue
        service.submit(get_request()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        service.submit(get_request()).await.unwrap();

        let err = service.submit(get_request()).await.unwrap_err();
        assert!(matches!(err, Error::QueueFull));

        // The rejected task's pending record was cleaned up
        assert!(
            service
                .get_task(&TaskKey::from_id(TaskId(3)))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_retention_expires_records() {
        let config = Config {
            store: crate::config::StoreConfig {
                database_path: "unused".into(),
                retention_secs: Some(0),
            },
            ..Config::default()
        };
        let service = TaskService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubFetcher {
                delay: Some(Duration::from_secs(30)),
                fail: false,
            }),
            &config,
        );

        let record = service.submit(get_request()).await.unwrap();
        // Zero retention: the pending record is already expired
        assert!(service.get_task(&record.key).await.unwrap().is_none());
    }
}
