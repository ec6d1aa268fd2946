//! API route handlers for the stems server.

pub mod health;
pub mod info;
pub mod jobs;
pub mod separate;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router.
///
/// Routes:
/// - GET /health - Liveness plus model-loaded flag
/// - GET /info - Service name, version, model, device, stems, formats
/// - POST /separate - Upload audio, start a separation job
/// - GET /job/{id} - Job record (status, progress, error, stems)
/// - GET /job/{id}/stem/{name} - Download one stem of a completed job
/// - DELETE /job/{id} - Remove a job and its output files
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(info::router())
        .merge(separate::router())
        .merge(jobs::router())
        .with_state(state)
}
