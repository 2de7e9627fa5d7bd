//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] — Task submission, polling, deletion, and listing
//! - [`system`] — Health and OpenAPI

mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use system::*;
pub use tasks::*;
