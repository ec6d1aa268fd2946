// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use stems_separator::Separator;

use crate::config::Config;
use crate::jobs::{ArtifactStager, JobDispatcher, JobStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Startup configuration (data dir, model, device, port, workers).
    pub config: Config,
    /// The loaded separation backend. `None` when model loading failed at
    /// startup — the server keeps running and rejects submissions with 503.
    pub separator: Option<Arc<dyn Separator>>,
    /// Job registry shared between handlers and pool workers.
    pub jobs: Arc<JobStore>,
    /// On-disk artifact lifecycle (staged inputs, per-job output dirs).
    pub stager: ArtifactStager,
    /// Worker pool handle: enqueue + cancellation.
    pub dispatcher: Arc<JobDispatcher>,
}

impl AppState {
    /// Build the application state: create the staging area and spawn the
    /// worker pool. Fails only if the data directory cannot be set up.
    pub fn new(
        config: Config,
        separator: Option<Arc<dyn Separator>>,
    ) -> std::io::Result<Arc<Self>> {
        let stager = ArtifactStager::new(&config.data_dir)?;
        let jobs = Arc::new(JobStore::new());
        let dispatcher = JobDispatcher::spawn(
            config.workers,
            Arc::clone(&jobs),
            stager.clone(),
            separator.clone(),
        );
        Ok(Arc::new(Self {
            start_time: Instant::now(),
            config,
            separator,
            jobs,
            stager,
            dispatcher,
        }))
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Whether the separation backend is loaded.
    pub fn model_loaded(&self) -> bool {
        self.separator.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stems_separator::PassthroughSeparator;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_state_new() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::new(config, Some(Arc::new(PassthroughSeparator::new()))).unwrap();

        assert!(state.uptime_secs() < 1);
        assert!(state.model_loaded());
        assert!(state.jobs.is_empty());
        assert!(dir.path().join("input").is_dir());
    }

    #[tokio::test]
    async fn test_app_state_without_model() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::new(config, None).unwrap();
        assert!(!state.model_loaded());
    }
}
