// crates/server/src/jobs/types.rs
//! Types for the separation job system.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

/// Unique identifier for a separation job.
pub type JobId = Uuid;

/// Status of a separation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed are terminal; no further transitions occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position in the pending < processing < terminal order, for asserting
    /// that observed status sequences never regress.
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One separation job, as stored in the job store and returned by
/// `GET /job/{id}`.
///
/// Field presence is correlated with status: `error` is set only when failed,
/// `stems` only when completed, never both.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stems: Option<BTreeMap<String, PathBuf>>,
    /// Original upload filename, kept for diagnostics.
    pub filename: String,
    pub created_at: String,
}

impl Job {
    pub fn new(job_id: JobId, filename: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            progress: Some(0.0),
            error: None,
            stems: None,
            filename: filename.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Transition to processing at progress zero.
    pub fn set_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.progress = Some(0.0);
    }

    /// Raise progress, clamped to [0, 1]. Progress never regresses: a value
    /// below the current one is ignored.
    pub fn set_progress(&mut self, progress: f32) {
        let clamped = progress.clamp(0.0, 1.0);
        let current = self.progress.unwrap_or(0.0);
        if clamped > current {
            self.progress = Some(clamped);
        }
    }

    /// Terminal success: record the stem map, progress 1.0, clear any error.
    pub fn complete(&mut self, stems: BTreeMap<String, PathBuf>) {
        self.status = JobStatus::Completed;
        self.progress = Some(1.0);
        self.error = None;
        self.stems = Some(stems);
    }

    /// Terminal failure: record the error message, clear any stems.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.stems = None;
    }
}
