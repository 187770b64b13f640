//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the channel-clone REST API
///
/// Served as JSON at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "channel-clone REST API",
        version = "0.1.0",
        description = "Start, stop, resume and monitor per-user channel clone jobs",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::start_clone,
        crate::api::routes::resume_clone,
        crate::api::routes::stop_clone,
        crate::api::routes::get_job,
        crate::api::routes::get_status,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::UserId,
        crate::types::CloneRange,
        crate::types::JobState,
        crate::types::Progress,
        crate::types::JobInfo,
        crate::types::StatusSnapshot,
        crate::types::Event,

        crate::api::routes::StartCloneRequest,
        crate::api::routes::ResumeRequest,
        crate::api::routes::JobAccepted,
        crate::api::routes::StopAccepted,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "jobs", description = "Clone job control and status"),
        (name = "system", description = "Health, events and API documentation")
    )
)]
pub struct ApiDoc;
