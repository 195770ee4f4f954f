use std::path::PathBuf;

use thiserror::Error;

use crate::stage::Stage;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Audio extraction error: {0}")]
    Extraction(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} failed for {}: {source}", path.display())]
    Stage {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Attach the failing stage and the artifact it was working on.
    pub fn at_stage(self, stage: Stage, path: impl Into<PathBuf>) -> Self {
        PipelineError::Stage {
            stage,
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any stage context peeled off.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The outermost stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<&Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_context_keeps_root_cause() {
        let err = PipelineError::Recognition("model exploded".to_string())
            .at_stage(Stage::RecognizeTranslate, "clip_audio.wav");

        assert_eq!(err.stage(), Some(&Stage::RecognizeTranslate));
        assert!(matches!(err.root(), PipelineError::Recognition(_)));

        let message = err.to_string();
        assert!(message.contains("clip_audio.wav"));
        assert!(message.contains("model exploded"));
    }
}
