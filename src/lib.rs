//! # fetchq
//!
//! Backend library for running outbound HTTP requests as asynchronous tasks.
//!
//! Submitting a request returns an opaque task key immediately; a bounded
//! worker pool performs the fetch in the background and persists a summary
//! of the result (status line, headers, content length) under that key.
//! Callers poll the key whenever they like, list or page through stored
//! records, and delete records they no longer need.
//!
//! ## Design Philosophy
//!
//! fetchq is designed to be:
//! - **Fire-and-poll** - Submission never waits on the upstream server
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Pluggable** - Store and fetch executor sit behind traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetchq::{Config, FetchRequest, TaskService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let service = TaskService::from_config(&config).await?;
//!
//!     let record = service
//!         .submit(FetchRequest {
//!             method: "GET".to_string(),
//!             address: "https://example.com/".to_string(),
//!             headers: Default::default(),
//!             body: None,
//!         })
//!         .await?;
//!
//!     // The fetch runs in the background; poll the key for the result
//!     println!("submitted: {}", record.key);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Fetch executor performing the outbound requests
pub mod fetch;
/// Worker pool draining the job queue
pub mod pool;
/// Task service façade
pub mod service;
/// Task store abstraction and backends
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, FetchConfig, PoolConfig, StoreConfig};
pub use error::{
    ApiError, Error, ErrorDetail, FetchError, Result, StoreError, ToHttpStatus,
};
pub use fetch::{Fetcher, HttpFetcher};
pub use pool::{FetchJob, WorkerPool};
pub use service::TaskService;
pub use store::{MemoryStore, SqliteStore, TaskStore};
pub use types::{
    DeleteOutcome, FetchOutcome, FetchRequest, TASK_COUNTER, TASK_KEY_PREFIX, TaskId, TaskKey,
    TaskRecord, TaskState,
};
