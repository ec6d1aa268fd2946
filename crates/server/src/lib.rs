// crates/server/src/lib.rs
//! Stems server library.
//!
//! This crate provides the Axum-based HTTP server for the stem separation
//! service: a thin API surface over the job orchestration layer in
//! [`jobs`] and the separation backend behind
//! [`stems_separator::Separator`].

pub mod config;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upload size cap. Lossless stereo masters run large; a full-length 24-bit
/// WAV still fits comfortably under this.
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, info, separate, job lifecycle)
/// - an upload body limit sized for full-length audio files
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
