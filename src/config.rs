//! Configuration types for fetchq

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Task store configuration (database location, retention)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreConfig {
    /// Path to the SQLite database file (default: "./fetchq.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Retention window for task records in seconds (None = records live
    /// until explicitly deleted)
    #[serde(default)]
    pub retention_secs: Option<u64>,
}

impl StoreConfig {
    /// Retention window as a [`Duration`], if configured
    pub fn retention(&self) -> Option<Duration> {
        self.retention_secs.map(Duration::from_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            retention_secs: None,
        }
    }
}

/// Fetch executor configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Outbound request timeout in seconds (default: 20)
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl FetchConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Worker pool configuration (concurrency, queue bounds, backpressure)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolConfig {
    /// Number of concurrent fetch workers (default: 2)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the shared job queue (default: 5)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long a submission waits for queue space before being rejected,
    /// in milliseconds (default: 5000)
    ///
    /// `None` makes submissions block indefinitely until space frees up.
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: Option<u64>,
}

impl PoolConfig {
    /// Enqueue timeout as a [`Duration`], if bounded
    pub fn enqueue_timeout(&self) -> Option<Duration> {
        self.enqueue_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
        }
    }
}

/// REST API configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Number of task records per page for `/tasks/page/{page}` (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Serve interactive Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Enable permissive CORS (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            page_size: default_page_size(),
            swagger_ui: true,
            cors_enabled: true,
        }
    }
}

/// Main configuration for the fetch task service
///
/// Fields are organized into logical sub-configs:
/// - [`store`](StoreConfig) — task store location and retention
/// - [`fetch`](FetchConfig) — outbound request timeout
/// - [`pool`](PoolConfig) — worker count, queue capacity, backpressure
/// - [`api`](ApiConfig) — bind address, page size, Swagger UI, CORS
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Task store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Fetch executor settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Worker pool settings
    #[serde(default)]
    pub pool: PoolConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./fetchq.db")
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

fn default_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    5
}

fn default_enqueue_timeout_ms() -> Option<u64> {
    Some(5000)
}

fn default_bind_address() -> SocketAddr {
    // Panic-free: the literal always parses
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_page_size() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
