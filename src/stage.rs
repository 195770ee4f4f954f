use std::fmt;
use std::future::Future;
use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Download,
    ExtractAudio,
    RecognizeTranslate,
    WriteNativeCaptions,
    WritePrimaryCaptions,
    WriteTranslatedCaptions(String),
    CleanupAudio,
}

impl Stage {
    /// Error raised when a stage claims success but its artifact is missing.
    pub fn missing_artifact(&self, artifact: &Path) -> PipelineError {
        let message = format!("{} did not produce {}", self, artifact.display());
        match self {
            Stage::Download => PipelineError::Download(message),
            Stage::ExtractAudio => PipelineError::Extraction(message),
            Stage::RecognizeTranslate => PipelineError::Recognition(message),
            Stage::WriteTranslatedCaptions(_) => PipelineError::Translation(message),
            Stage::WriteNativeCaptions | Stage::WritePrimaryCaptions | Stage::CleanupAudio => {
                PipelineError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, message))
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::ExtractAudio => write!(f, "audio extraction"),
            Stage::RecognizeTranslate => write!(f, "recognition"),
            Stage::WriteNativeCaptions => write!(f, "native captions"),
            Stage::WritePrimaryCaptions => write!(f, "primary captions"),
            Stage::WriteTranslatedCaptions(lang) => write!(f, "{} captions", lang.to_uppercase()),
            Stage::CleanupAudio => write!(f, "audio cleanup"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The stage's artifact was already on disk
    ArtifactExists,
    /// Turned off in the configuration
    Disabled,
    /// Enabled, but there was nothing to act on
    NothingToDo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Skipped(SkipReason),
}

impl StageOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped(_))
    }
}

/// Existence-based idempotency guard for stages that produce a file.
///
/// No content validation or staleness detection: a truncated file left by an
/// interrupted run counts as present.
pub struct StageGate;

impl StageGate {
    /// Whether the artifact is already on disk.
    pub async fn is_satisfied(artifact: &Path) -> Result<bool> {
        Ok(fs::try_exists(artifact).await?)
    }

    /// Run `work` unless `artifact` exists; afterwards the artifact must exist.
    pub async fn run<F, Fut>(stage: &Stage, artifact: &Path, work: F) -> Result<StageOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if Self::is_satisfied(artifact).await? {
            info!("Skipping {}: {} already exists", stage, artifact.display());
            return Ok(StageOutcome::Skipped(SkipReason::ArtifactExists));
        }

        info!("Starting {} -> {}", stage, artifact.display());
        work().await?;

        if !Self::is_satisfied(artifact).await? {
            return Err(stage.missing_artifact(artifact));
        }

        info!("Completed {} -> {}", stage, artifact.display());
        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_gate_runs_missing_artifact_once() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("clip.mp4");
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            StageGate::run(&Stage::Download, &artifact, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::fs::write(&artifact, b"video").await?;
                Ok::<(), PipelineError>(())
            })
            .await
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gate_skips_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("clip_audio.wav");
        std::fs::write(&artifact, b"RIFF").unwrap();
        let calls = AtomicUsize::new(0);

        let outcome = StageGate::run(&Stage::ExtractAudio, &artifact, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<(), PipelineError>(())
        })
        .await
        .unwrap();

        assert_eq!(outcome, StageOutcome::Skipped(SkipReason::ArtifactExists));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gate_rejects_stage_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("clip.mp4");

        let err = StageGate::run(&Stage::Download, &artifact, || async { Ok::<(), PipelineError>(()) })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Download(_)));
    }

    #[tokio::test]
    async fn test_gate_propagates_stage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("clip_audio.wav");

        let err = StageGate::run(&Stage::ExtractAudio, &artifact, || async {
            Err::<(), _>(PipelineError::Extraction("ffmpeg exited with 1".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Extraction(_)));
        assert!(!artifact.exists());
    }
}
