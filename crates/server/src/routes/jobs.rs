// crates/server/src/routes/jobs.rs
//! Job lifecycle routes: status polling, stem download, deletion.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::jobs::{Job, JobStatus};
use crate::state::AppState;

/// GET /job/{id} - Current job record.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    state
        .jobs
        .get(job_id)
        .map(Json)
        .ok_or(ApiError::JobNotFound(job_id))
}

/// GET /job/{id}/stem/{name} - Download one stem of a completed job.
pub async fn download_stem(
    State(state): State<Arc<AppState>>,
    Path((job_id, stem)): Path<(Uuid, String)>,
) -> ApiResult<Response> {
    let job = state.jobs.get(job_id).ok_or(ApiError::JobNotFound(job_id))?;

    if job.status != JobStatus::Completed {
        return Err(ApiError::NotReady {
            status: job.status.to_string(),
        });
    }

    let stem_path = job
        .stems
        .as_ref()
        .and_then(|stems| stems.get(&stem))
        .cloned()
        .ok_or_else(|| ApiError::StemNotFound {
            job_id,
            stem: stem.clone(),
        })?;

    // The record can outlive the file (external cleanup, moved volume);
    // surface that drift as NotFound rather than a 500.
    let bytes = tokio::fs::read(&stem_path)
        .await
        .map_err(|_| ApiError::StemFileMissing {
            path: stem_path.display().to_string(),
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{stem}.wav\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct DeleteResponse {
    pub status: String,
    pub job_id: Uuid,
}

/// DELETE /job/{id} - Remove a job and its output files.
///
/// Cancellation is signaled first so an in-flight worker stops at its next
/// step boundary; file removal is attempted before the store entry goes,
/// with entry removal authoritative for "job exists".
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    if state.jobs.get(job_id).is_none() {
        return Err(ApiError::JobNotFound(job_id));
    }

    if state.dispatcher.cancel(job_id) {
        tracing::info!(job_id = %job_id, "cancellation signaled to worker");
    }
    state.stager.remove_output_tree(job_id).await;

    if !state.jobs.remove(job_id) {
        // Lost a race against a concurrent delete.
        return Err(ApiError::JobNotFound(job_id));
    }

    tracing::info!(job_id = %job_id, "job deleted");
    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
        job_id,
    }))
}

/// Create the job routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/job/{id}", get(get_job).delete(delete_job))
        .route("/job/{id}/stem/{name}", get(download_stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_response_serialization() {
        let response = DeleteResponse {
            status: "deleted".to_string(),
            job_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"deleted\""));
    }

    #[test]
    fn test_router_creation() {
        // Smoke test: router should be constructable
        let _router = router();
    }
}
