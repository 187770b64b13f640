//! Clone job handlers.

use super::{JobAccepted, ResumeRequest, StartCloneRequest, StopAccepted};
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::UserId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /users/:user_id/clone - Start a clone job
#[utoipa::path(
    post,
    path = "/users/{user_id}/clone",
    tag = "jobs",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    request_body = StartCloneRequest,
    responses(
        (status = 202, description = "Job started", body = JobAccepted),
        (status = 400, description = "Invalid range", body = crate::error::ApiError),
        (status = 409, description = "A job is already running for this user", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_clone(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<StartCloneRequest>,
) -> Response {
    let range = match request.range() {
        Ok(range) => range,
        Err(message) => return ApiError::validation(message).into_response(),
    };

    let user_id = UserId(user_id);
    match state
        .cloner
        .start_clone(user_id, request.chat_id, range)
        .await
    {
        Ok(_handle) => (StatusCode::ACCEPTED, Json(JobAccepted { user_id, range })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /users/:user_id/resume - Resume after the last sent message
#[utoipa::path(
    post,
    path = "/users/{user_id}/resume",
    tag = "jobs",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    request_body = ResumeRequest,
    responses(
        (status = 202, description = "Job started", body = JobAccepted),
        (status = 404, description = "Nothing to resume", body = crate::error::ApiError),
        (status = 409, description = "A job is already running for this user", body = crate::error::ApiError),
        (status = 500, description = "Sent log is unreadable", body = crate::error::ApiError)
    )
)]
pub async fn resume_clone(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<ResumeRequest>,
) -> Response {
    let user_id = UserId(user_id);
    match state.cloner.resume(user_id, request.chat_id).await {
        Ok(handle) => (
            StatusCode::ACCEPTED,
            Json(JobAccepted {
                user_id,
                range: handle.range(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /users/:user_id/stop - Request the running job to stop
#[utoipa::path(
    post,
    path = "/users/{user_id}/stop",
    tag = "jobs",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 202, description = "Stop requested", body = StopAccepted),
        (status = 500, description = "Stop marker could not be written", body = crate::error::ApiError)
    )
)]
pub async fn stop_clone(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    let user_id = UserId(user_id);
    match state.cloner.stop(user_id).await {
        Ok(signalled) => (
            StatusCode::ACCEPTED,
            Json(StopAccepted { user_id, signalled }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /users/:user_id/job - Live job state
#[utoipa::path(
    get,
    path = "/users/{user_id}/job",
    tag = "jobs",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Live job information (idle when no job runs)", body = crate::types::JobInfo)
    )
)]
pub async fn get_job(State(state): State<AppState>, Path(user_id): Path<i64>) -> impl IntoResponse {
    Json(state.cloner.job_status(UserId(user_id)).await)
}

/// GET /users/:user_id/status - Last persisted status
#[utoipa::path(
    get,
    path = "/users/{user_id}/status",
    tag = "jobs",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Last status snapshot", body = crate::types::StatusSnapshot),
        (status = 404, description = "No job has run for this user", body = crate::error::ApiError),
        (status = 500, description = "Status file is unreadable", body = crate::error::ApiError)
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match state.cloner.persisted_status(UserId(user_id)).await {
        Ok(Some(snapshot)) => (StatusCode::OK, Json(snapshot)).into_response(),
        Ok(None) => ApiError::not_found(format!("status for user {user_id}")).into_response(),
        Err(e) => e.into_response(),
    }
}
