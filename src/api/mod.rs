//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for starting, stopping and
//! monitoring per-user clone jobs.

use crate::{ChannelCloner, Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Jobs
/// - `POST /users/:user_id/clone` - Start a full or ranged clone
/// - `POST /users/:user_id/resume` - Continue after the last sent message
/// - `POST /users/:user_id/stop` - Request the running job to stop
/// - `GET /users/:user_id/job` - Live job state
/// - `GET /users/:user_id/status` - Last persisted status snapshot
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events stream
pub fn create_router(cloner: Arc<ChannelCloner>, config: Arc<Config>) -> Router {
    let state = AppState::new(cloner, config.clone());

    let router = Router::new()
        // Jobs
        .route("/users/:user_id/clone", post(routes::start_clone))
        .route("/users/:user_id/resume", post(routes::resume_clone))
        .route("/users/:user_id/stop", post(routes::stop_clone))
        .route("/users/:user_id/job", get(routes::get_job))
        .route("/users/:user_id/status", get(routes::get_status))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. All methods and headers are permitted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops or fails to bind.
///
/// # Example
///
/// ```no_run
/// use channel_clone::{ChannelCloner, Config, InMemoryPlatform};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let cloner = ChannelCloner::new((*config).clone(), Arc::new(InMemoryPlatform::new())).await?;
///
/// channel_clone::api::start_api_server(Arc::new(cloner), config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(cloner: Arc<ChannelCloner>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(cloner, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
