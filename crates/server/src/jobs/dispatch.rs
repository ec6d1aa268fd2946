// crates/server/src/jobs/dispatch.rs
//! Bounded worker pool fed by an unbounded queue.
//!
//! Submission never blocks on separation: `enqueue` pushes onto the queue and
//! returns, and a fixed number of pool workers drain it. When every slot is
//! busy, queued jobs simply keep reporting `pending` until one frees up.
//!
//! The dispatcher also owns the per-job cancellation tokens. `cancel` signals
//! a queued or in-flight worker to stop at its next step boundary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use stems_separator::Separator;

use super::stager::ArtifactStager;
use super::store::JobStore;
use super::types::JobId;
use super::worker::{run_job, WorkerContext};

struct QueuedJob {
    job_id: JobId,
    input_path: PathBuf,
    cancel: CancellationToken,
}

type CancelMap = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

pub struct JobDispatcher {
    queue_tx: mpsc::UnboundedSender<QueuedJob>,
    cancellations: CancelMap,
}

impl JobDispatcher {
    /// Spawn `workers` pool tasks and return the dispatch handle.
    pub fn spawn(
        workers: usize,
        store: Arc<JobStore>,
        stager: ArtifactStager,
        separator: Option<Arc<dyn Separator>>,
    ) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<QueuedJob>();
        let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));
        let cancellations: CancelMap = Arc::new(Mutex::new(HashMap::new()));

        let ctx = Arc::new(WorkerContext {
            store,
            stager,
            separator,
        });

        for worker_id in 0..workers.max(1) {
            let queue_rx = Arc::clone(&queue_rx);
            let ctx = Arc::clone(&ctx);
            let cancellations = Arc::clone(&cancellations);
            tokio::spawn(async move {
                loop {
                    // Receiver is shared; idle workers take turns waiting on it.
                    let next = { queue_rx.lock().await.recv().await };
                    let Some(queued) = next else { break };
                    tracing::debug!(worker_id, job_id = %queued.job_id, "worker picked up job");
                    run_job(&ctx, queued.job_id, queued.input_path, queued.cancel).await;
                    forget(&cancellations, queued.job_id);
                }
                tracing::debug!(worker_id, "worker pool task exiting");
            });
        }

        Arc::new(Self {
            queue_tx,
            cancellations,
        })
    }

    /// Queue a staged job for processing. Fire-and-forget: the submitting
    /// request does not wait for a worker slot.
    pub fn enqueue(&self, job_id: JobId, input_path: PathBuf) {
        let cancel = CancellationToken::new();
        match self.cancellations.lock() {
            Ok(mut map) => {
                map.insert(job_id, cancel.clone());
            }
            Err(e) => tracing::error!("Mutex poisoned registering cancellation: {e}"),
        }
        if self
            .queue_tx
            .send(QueuedJob {
                job_id,
                input_path,
                cancel,
            })
            .is_err()
        {
            tracing::error!(job_id = %job_id, "worker pool is gone; job will stay pending");
        }
    }

    /// Signal cancellation for a queued or in-flight job. Returns false when
    /// no worker is tracking the id (already finished, or never enqueued).
    pub fn cancel(&self, job_id: JobId) -> bool {
        match self.cancellations.lock() {
            Ok(mut map) => match map.remove(&job_id) {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(e) => {
                tracing::error!("Mutex poisoned cancelling job: {e}");
                false
            }
        }
    }
}

fn forget(cancellations: &CancelMap, job_id: JobId) {
    match cancellations.lock() {
        Ok(mut map) => {
            map.remove(&job_id);
        }
        Err(e) => tracing::error!("Mutex poisoned releasing cancellation: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::JobStatus;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn wait_for_terminal(store: &JobStore, id: JobId) -> JobStatus {
        for _ in 0..500 {
            if let Some(job) = store.get(id) {
                if job.status.is_terminal() {
                    return job.status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never reached a terminal state");
    }

    #[tokio::test]
    async fn test_unloaded_model_fails_the_job() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new());
        let stager = ArtifactStager::new(dir.path()).unwrap();
        let dispatcher = JobDispatcher::spawn(1, Arc::clone(&store), stager.clone(), None);

        let id = Uuid::new_v4();
        store.create(id, "tone.wav");
        let input = stager.stage_input(id, "tone.wav", b"bytes").await.unwrap();
        dispatcher.enqueue(id, input);

        assert_eq!(wait_for_terminal(&store, id).await, JobStatus::Failed);
        assert_eq!(
            store.get(id).unwrap().error.as_deref(),
            Some("model not loaded")
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_job_returns_false() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new());
        let stager = ArtifactStager::new(dir.path()).unwrap();
        let dispatcher = JobDispatcher::spawn(1, store, stager, None);

        assert!(!dispatcher.cancel(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_cancellation_token_is_released_after_completion() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new());
        let stager = ArtifactStager::new(dir.path()).unwrap();
        let dispatcher = JobDispatcher::spawn(1, Arc::clone(&store), stager.clone(), None);

        let id = Uuid::new_v4();
        store.create(id, "tone.wav");
        let input = stager.stage_input(id, "tone.wav", b"bytes").await.unwrap();
        dispatcher.enqueue(id, input);
        wait_for_terminal(&store, id).await;

        // Give the pool task a beat to release the token after run_job.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!dispatcher.cancel(id));
    }
}
