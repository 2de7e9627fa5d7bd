//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the fetchq REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the fetchq REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that
/// describes all available endpoints, request/response types, and API
/// behavior.
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "fetchq REST API",
        version = "0.1.0",
        description = "REST API for submitting outbound HTTP requests as asynchronous tasks and polling their results",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::submit_task,
        crate::api::routes::get_task,
        crate::api::routes::delete_task,
        crate::api::routes::list_tasks,
        crate::api::routes::list_tasks_page,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskKey,
        crate::types::TaskRecord,
        crate::types::FetchRequest,

        // Error response types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Asynchronous fetch task management"),
        (name = "system", description = "Health and API metadata")
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json().unwrap();

        assert!(json.contains("/task/fetch"));
        assert!(json.contains("/tasks/page/{page}"));
        assert!(json.contains("TaskRecord"));
    }

    #[test]
    fn test_openapi_spec_covers_every_route() {
        let spec = ApiDoc::openapi();

        for path in [
            "/task/fetch",
            "/task/{key}",
            "/tasks",
            "/tasks/page/{page}",
            "/health",
            "/openapi.json",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "missing path {path} in OpenAPI spec"
            );
        }
    }
}
