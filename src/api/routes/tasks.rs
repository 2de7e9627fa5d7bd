//! Task management handlers.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{DeleteOutcome, FetchRequest, TaskKey, TaskRecord};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// POST /task/fetch - Submit an outbound request as a new task
///
/// Responds with the pending record as soon as the job is queued; the fetch
/// itself runs in the background. Poll `GET /task/{key}` for the result.
#[utoipa::path(
    post,
    path = "/task/fetch",
    tag = "tasks",
    request_body = FetchRequest,
    responses(
        (status = 200, description = "Task accepted, pending record returned", body = TaskRecord),
        (status = 400, description = "Missing or invalid request fields", body = crate::error::ApiError),
        (status = 503, description = "Job queue full or shutting down", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn submit_task(
    State(state): State<AppState>,
    Json(request): Json<FetchRequest>,
) -> Result<Json<TaskRecord>> {
    let record = state.service.submit(request).await?;
    Ok(Json(record))
}

/// GET /task/{key} - Get a single task record
#[utoipa::path(
    get,
    path = "/task/{key}",
    tag = "tasks",
    params(
        ("key" = String, Path, description = "Opaque task key returned at submission")
    ),
    responses(
        (status = 200, description = "Task record, pending or terminal", body = TaskRecord),
        (status = 404, description = "No record under this key", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TaskRecord>> {
    let key = TaskKey::new(key);
    match state.service.get_task(&key).await? {
        Some(record) => Ok(Json(record)),
        None => Err(Error::NotFound(key.to_string())),
    }
}

/// DELETE /task/{key} - Delete a task record
///
/// Removing an existing record answers 200 with `{"deleted": true}`; a key
/// with no record answers an empty 204. Neither case is an error.
#[utoipa::path(
    delete,
    path = "/task/{key}",
    tag = "tasks",
    params(
        ("key" = String, Path, description = "Opaque task key returned at submission")
    ),
    responses(
        (status = 200, description = "Record removed"),
        (status = 204, description = "No record under this key, nothing removed"),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let key = TaskKey::new(key);
    match state.service.delete_task(&key).await? {
        DeleteOutcome::Deleted => Ok((StatusCode::OK, Json(json!({"deleted": true}))).into_response()),
        DeleteOutcome::NotFound => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// GET /tasks - List all task records
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "All stored task records, unordered", body = Vec<TaskRecord>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskRecord>>> {
    let records = state.service.list_all().await?;
    Ok(Json(records))
}

/// GET /tasks/page/{page} - List one page of task records
#[utoipa::path(
    get,
    path = "/tasks/page/{page}",
    tag = "tasks",
    params(
        ("page" = u64, Path, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Records on the page, holes omitted", body = Vec<TaskRecord>),
        (status = 400, description = "Page number out of range", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_tasks_page(
    State(state): State<AppState>,
    Path(page): Path<u64>,
) -> Result<Json<Vec<TaskRecord>>> {
    let page_size = state.config.api.page_size;
    let records = state.service.list_page(page, page_size).await?;
    Ok(Json(records))
}
