// crates/server/src/routes/separate.rs
//! Submission endpoint: upload an audio file, get back a job id.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::jobs::JobStatus;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct SeparateResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}

/// POST /separate - Upload an audio file and start stem separation.
///
/// Returns as soon as the job is staged and registered; separation runs on
/// the worker pool and is tracked via `GET /job/{id}`.
pub async fn separate_audio(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<SeparateResponse>> {
    // Checked before any file I/O: a submission with no model never stages.
    if !state.model_loaded() {
        return Err(ApiError::ServiceUnavailable);
    }

    // Find the "file" field; anything else in the form is ignored.
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.wav").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("missing 'file' field".to_string()));
    };

    let job_id = Uuid::new_v4();
    let input_path = state
        .stager
        .stage_input(job_id, &filename, &bytes)
        .await
        .map_err(ApiError::Staging)?;

    let job = state.jobs.create(job_id, &filename);
    state.dispatcher.enqueue(job_id, input_path);

    tracing::info!(job_id = %job_id, filename = %filename, size = bytes.len(), "created separation job");

    Ok(Json(SeparateResponse {
        job_id,
        status: job.status,
    }))
}

/// Create the separate routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/separate", post(separate_audio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separate_response_serialization() {
        let response = SeparateResponse {
            job_id: Uuid::nil(),
            status: JobStatus::Pending,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"job_id\""));
    }
}
