// crates/server/src/jobs/worker.rs
//! Separation worker: drives one job from `pending` to a terminal state.
//!
//! Everything from audio loading onward runs inside a single failure boundary
//! per job. A failure anywhere in the pipeline marks the job `failed` with the
//! captured error message and terminates the worker — it never retries and
//! never takes the host process down with it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use stems_separator::{audio, normalize, Separator};

use super::stager::ArtifactStager;
use super::store::JobStore;
use super::types::JobId;

/// Progress checkpoint after decode + normalization.
const PROGRESS_PREPROCESSED: f32 = 0.2;
/// Progress checkpoint after inference, before stem writes.
const PROGRESS_SEPARATED: f32 = 0.8;

/// Everything a pool worker needs to process jobs.
pub(crate) struct WorkerContext {
    pub store: Arc<JobStore>,
    pub stager: ArtifactStager,
    pub separator: Option<Arc<dyn Separator>>,
}

/// Pipeline result: either the stem map, or an early stop because the job was
/// cancelled between steps.
enum Outcome {
    Completed(BTreeMap<String, PathBuf>),
    Cancelled,
}

/// Process one job to a terminal state.
pub(crate) async fn run_job(
    ctx: &WorkerContext,
    job_id: JobId,
    input_path: PathBuf,
    cancel: CancellationToken,
) {
    if cancel.is_cancelled() {
        // Deleted while still queued; the record is already gone.
        tracing::debug!(job_id = %job_id, "job cancelled before start");
        return;
    }

    ctx.store.update(job_id, |job| job.set_processing());
    tracing::info!(job_id = %job_id, input = %input_path.display(), "separation started");

    let Some(separator) = ctx.separator.clone() else {
        ctx.store.update(job_id, |job| job.fail("model not loaded"));
        tracing::error!(job_id = %job_id, "separation failed: model not loaded");
        return;
    };

    // Decode, resampling, and inference are CPU-bound; keep them off the
    // async runtime threads.
    let outcome = {
        let store = Arc::clone(&ctx.store);
        let stager = ctx.stager.clone();
        let input = input_path.clone();
        let token = cancel.clone();
        tokio::task::spawn_blocking(move || {
            separate_input(&store, &stager, &*separator, job_id, &input, &token)
        })
        .await
    };

    match outcome {
        Ok(Ok(Outcome::Completed(stems))) => {
            ctx.stager.remove_input(&input_path).await;
            if ctx.store.update(job_id, |job| job.complete(stems)) {
                tracing::info!(job_id = %job_id, "separation completed");
            } else {
                tracing::debug!(job_id = %job_id, "job removed before completion was recorded");
            }
        }
        Ok(Ok(Outcome::Cancelled)) => {
            tracing::info!(job_id = %job_id, "separation cancelled");
        }
        Ok(Err(e)) => {
            // Input artifact is retained on failure for diagnosis.
            let message = format!("{e:#}");
            tracing::error!(job_id = %job_id, error = %message, "separation failed");
            ctx.store.update(job_id, |job| job.fail(message));
        }
        Err(join_err) => {
            tracing::error!(job_id = %job_id, error = %join_err, "separation worker panicked");
            ctx.store
                .update(job_id, |job| job.fail("separation worker panicked"));
        }
    }
}

/// The per-job pipeline: decode → normalize → separate → write stems.
///
/// The cancellation token is checked between steps; cancellation is not an
/// error, it just stops the pipeline (the canceller owns cleanup).
fn separate_input(
    store: &JobStore,
    stager: &ArtifactStager,
    separator: &dyn Separator,
    job_id: JobId,
    input_path: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<Outcome> {
    let decoded = audio::decode(input_path).context("failed to load audio")?;
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    let target_rate = separator.sample_rate();
    if decoded.sample_rate != target_rate {
        tracing::info!(
            job_id = %job_id,
            from = decoded.sample_rate,
            to = target_rate,
            "resampling input"
        );
    }
    let mix = normalize::normalize(decoded, target_rate).context("failed to normalize audio")?;
    store.update(job_id, |job| job.set_progress(PROGRESS_PREPROCESSED));
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    tracing::info!(job_id = %job_id, "running separation");
    let buffers = separator.separate(&mix).context("separation failed")?;
    anyhow::ensure!(
        buffers.len() == separator.stems().len(),
        "backend returned {} buffers for {} stems",
        buffers.len(),
        separator.stems().len()
    );
    store.update(job_id, |job| job.set_progress(PROGRESS_SEPARATED));
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    let out_dir = stager.output_dir(job_id);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut stems = BTreeMap::new();
    for (name, buffer) in separator.stems().iter().zip(&buffers) {
        let path = out_dir.join(format!("{name}.wav"));
        audio::write_wav(&path, buffer)
            .with_context(|| format!("failed to write stem '{name}'"))?;
        stems.insert(name.clone(), path);
    }

    Ok(Outcome::Completed(stems))
}
