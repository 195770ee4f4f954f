// Speech recognition
//
// The recognizer is an opaque collaborator: audio in, ordered timed segments
// out. In translate mode the segment text is already in the target language,
// which is where the primary captions come from.
//
// To add a recognition backend, implement `Recognizer` and return it from
// `RecognizerFactory`.

pub mod openai;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{RecognizerConfig, TaskMode, WhisperModel};
use crate::error::Result;
use crate::segment::Segment;

/// Parameters for one recognition call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub model: WhisperModel,
    pub source_language: String,
    pub task: TaskMode,
}

impl From<&RecognizerConfig> for RecognitionRequest {
    fn from(config: &RecognizerConfig) -> Self {
        Self {
            model: config.model,
            source_language: config.source_language.clone(),
            task: config.task,
        }
    }
}

/// Main trait for recognition operations
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize speech in `audio_path`, returning segments in chronological order
    async fn recognize(&self, audio_path: &Path, request: &RecognitionRequest) -> Result<Vec<Segment>>;

    /// Check that the underlying tool is installed
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating recognizer instances
pub struct RecognizerFactory;

impl RecognizerFactory {
    pub fn create_recognizer(config: RecognizerConfig) -> Box<dyn Recognizer> {
        Box::new(openai::WhisperCliRecognizer::new(config))
    }
}
