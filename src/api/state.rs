//! Application state for the API server

use crate::{Config, TaskService};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the task service and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The task service handling submissions and queries
    pub service: Arc<TaskService>,

    /// Configuration (read access only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<TaskService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
