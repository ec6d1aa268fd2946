// crates/server/src/jobs/stager.rs
//! On-disk artifact lifecycle for separation jobs.
//!
//! Layout under the data root:
//! - `input/<job_id>_<filename>` — the staged upload, one file per job
//! - `output/<job_id>/<stem>.wav` — stem files, one directory per job
//!
//! The output directory is created lazily by the worker on first write, so a
//! failed job never leaves an empty directory behind.

use std::path::{Path, PathBuf};

use super::types::JobId;

#[derive(Debug, Clone)]
pub struct ArtifactStager {
    input_dir: PathBuf,
    output_root: PathBuf,
}

impl ArtifactStager {
    /// Set up the staging area under `data_dir`, creating `input/` and
    /// `output/` if they do not exist yet.
    pub fn new(data_dir: &Path) -> std::io::Result<Self> {
        let input_dir = data_dir.join("input");
        let output_root = data_dir.join("output");
        std::fs::create_dir_all(&input_dir)?;
        std::fs::create_dir_all(&output_root)?;
        Ok(Self {
            input_dir,
            output_root,
        })
    }

    /// Persist uploaded bytes as the job's input artifact.
    ///
    /// The job id is embedded in the name to avoid collisions between uploads
    /// with identical filenames. A failure here must abort job creation — the
    /// caller registers no job for a file that failed to stage.
    pub async fn stage_input(
        &self,
        job_id: JobId,
        filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<PathBuf> {
        // Strip any directory components a client smuggles into the filename.
        let safe_name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let path = self.input_dir.join(format!("{job_id}_{safe_name}"));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Path of the job's output directory. Not created here; the worker makes
    /// it on first write.
    pub fn output_dir(&self, job_id: JobId) -> PathBuf {
        self.output_root.join(job_id.to_string())
    }

    /// Best-effort delete of an input artifact. Absence is not an error.
    pub async fn remove_input(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove input artifact");
            }
        }
    }

    /// Best-effort delete of a job's entire output directory. Absence is not
    /// an error.
    pub async fn remove_output_tree(&self, job_id: JobId) {
        let dir = self.output_dir(job_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %dir.display(), error = %e, "failed to remove output directory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn stager() -> (TempDir, ArtifactStager) {
        let dir = TempDir::new().unwrap();
        let stager = ArtifactStager::new(dir.path()).unwrap();
        (dir, stager)
    }

    #[tokio::test]
    async fn test_new_creates_layout() {
        let (dir, _stager) = stager();
        assert!(dir.path().join("input").is_dir());
        assert!(dir.path().join("output").is_dir());
    }

    #[tokio::test]
    async fn test_stage_input_embeds_job_id() {
        let (_dir, stager) = stager();
        let id = Uuid::new_v4();

        let path = stager.stage_input(id, "track.wav", b"RIFF").await.unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(&id.to_string()));
        assert!(name.ends_with("track.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn test_stage_input_strips_path_components() {
        let (dir, stager) = stager();
        let id = Uuid::new_v4();

        let path = stager
            .stage_input(id, "../../etc/passwd", b"x")
            .await
            .unwrap();
        assert!(path.starts_with(dir.path().join("input")));
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("passwd"));
    }

    #[tokio::test]
    async fn test_output_dir_is_not_created_at_staging_time() {
        let (_dir, stager) = stager();
        let id = Uuid::new_v4();
        let out = stager.output_dir(id);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_remove_input_is_idempotent() {
        let (_dir, stager) = stager();
        let id = Uuid::new_v4();
        let path = stager.stage_input(id, "a.wav", b"x").await.unwrap();

        stager.remove_input(&path).await;
        assert!(!path.exists());
        // Second delete of an absent file is fine.
        stager.remove_input(&path).await;
    }

    #[tokio::test]
    async fn test_remove_output_tree_is_idempotent() {
        let (_dir, stager) = stager();
        let id = Uuid::new_v4();

        let out = stager.output_dir(id);
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("vocals.wav"), b"x").unwrap();

        stager.remove_output_tree(id).await;
        assert!(!out.exists());
        stager.remove_output_tree(id).await;
    }
}
