// crates/server/src/jobs/store.rs
//! In-memory job registry — the single source of truth for job state.
//!
//! The store is deliberately dumb: it guarantees data integrity under
//! concurrent access and nothing else. Workers mutate records through
//! [`JobStore::update`], so a status/progress/error/stems change is always one
//! visible unit to readers. The narrow API is also the substitution seam for a
//! durable backing store.

use std::collections::HashMap;
use std::sync::RwLock;

use super::types::{Job, JobId};

pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new pending job and return a snapshot of it.
    pub fn create(&self, id: JobId, filename: &str) -> Job {
        let job = Job::new(id, filename);
        match self.jobs.write() {
            Ok(mut jobs) => {
                jobs.insert(id, job.clone());
            }
            Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
        }
        job
    }

    /// Snapshot of a job record.
    pub fn get(&self, id: JobId) -> Option<Job> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(&id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                None
            }
        }
    }

    /// Apply a mutation to a job record under the write lock, so readers see
    /// the change as a single unit. Returns false if the job no longer exists.
    pub fn update<F>(&self, id: JobId, mutate: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        match self.jobs.write() {
            Ok(mut jobs) => match jobs.get_mut(&id) {
                Some(job) => {
                    mutate(job);
                    true
                }
                None => false,
            },
            Err(e) => {
                tracing::error!("RwLock poisoned updating jobs map: {e}");
                false
            }
        }
    }

    /// Remove a job record. Returns false if the id is unknown — the caller
    /// treats that as NotFound.
    pub fn remove(&self, id: JobId) -> bool {
        match self.jobs.write() {
            Ok(mut jobs) => jobs.remove(&id).is_some(),
            Err(e) => {
                tracing::error!("RwLock poisoned removing from jobs map: {e}");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.jobs.read() {
            Ok(jobs) => jobs.len(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
