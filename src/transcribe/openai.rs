// OpenAI Whisper command-line implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use super::{RecognitionRequest, Recognizer};
use crate::command::ToolCommand;
use crate::config::RecognizerConfig;
use crate::error::{PipelineError, Result};
use crate::segment::Segment;

/// Whisper JSON output (`--output_format json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOutput {
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
}

/// Whisper segment; fields the pipeline does not use are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Present when the recognizer reports source text alongside a translation
    #[serde(default)]
    pub original_text: Option<String>,
}

impl WhisperOutput {
    /// Convert to pipeline segments, dropping zero-length ones.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
            .into_iter()
            .filter_map(|seg| {
                if seg.end <= seg.start {
                    warn!("Dropping zero-length segment at {:.3}s: {}", seg.start, seg.text.trim());
                    return None;
                }
                Some(Segment {
                    start: seg.start,
                    end: seg.end,
                    text: seg.text.trim().to_string(),
                    original_text: seg.original_text.map(|t| t.trim().to_string()),
                })
            })
            .collect()
    }
}

/// Runs the `whisper` command-line tool and parses its JSON output
pub struct WhisperCliRecognizer {
    config: RecognizerConfig,
}

impl WhisperCliRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    pub fn recognition_command(&self, audio_path: &Path, output_dir: &Path, request: &RecognitionRequest) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Speech recognition", PipelineError::Recognition)
            .path(audio_path)
            .opt("--model", request.model.as_str())
            .opt("--language", request.source_language.as_str())
            .opt("--task", request.task.as_str())
            .opt("--output_dir", output_dir.to_string_lossy())
            .opt("--output_format", "json")
            .opt("--verbose", "False")
    }
}

#[async_trait]
impl Recognizer for WhisperCliRecognizer {
    async fn recognize(&self, audio_path: &Path, request: &RecognitionRequest) -> Result<Vec<Segment>> {
        info!(
            "Whisper {} ({}) on {} with model {}",
            request.task.as_str(),
            request.source_language,
            audio_path.display(),
            request.model
        );

        let temp_dir = tempfile::tempdir()
            .map_err(|e| PipelineError::Recognition(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        self.recognition_command(audio_path, output_dir, request)
            .execute()
            .await?;

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| PipelineError::Recognition("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        let json_content = tokio::fs::read_to_string(&json_file)
            .await
            .map_err(|e| PipelineError::Recognition(format!("Failed to read whisper output: {}", e)))?;
        let output: WhisperOutput = serde_json::from_str(&json_content)
            .map_err(|e| PipelineError::Recognition(format!("Failed to parse whisper JSON: {}", e)))?;

        debug!("Whisper detected language: {:?}", output.language);
        let segments = output.into_segments();
        info!("Recognized {} segments", segments.len());
        Ok(segments)
    }

    async fn check_availability(&self) -> Result<()> {
        ToolCommand::probe(&self.config.binary_path, "--help", PipelineError::Recognition).await?;
        info!("Whisper command-line tool is available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, TaskMode, WhisperModel};

    #[test]
    fn test_parse_whisper_json() {
        let json = r#"{
            "text": " Hello world. Next line.",
            "language": "zh",
            "segments": [
                {"id": 0, "seek": 0, "start": 1.25, "end": 3.4, "text": " Hello world.", "tokens": [1, 2], "avg_logprob": -0.2},
                {"id": 1, "seek": 0, "start": 3.4, "end": 3.4, "text": " ..."},
                {"id": 2, "seek": 0, "start": 3.4, "end": 5.0, "text": " Next line.", "original_text": " 下一行 "}
            ]
        }"#;

        let output: WhisperOutput = serde_json::from_str(json).unwrap();
        let segments = output.into_segments();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::new(1.25, 3.4, "Hello world."));
        assert_eq!(segments[1].original_text.as_deref(), Some("下一行"));
    }

    #[test]
    fn test_recognition_command_args() {
        let recognizer = WhisperCliRecognizer::new(Config::default().recognizer);
        let request = RecognitionRequest {
            model: WhisperModel::LargeV3,
            source_language: "zh".to_string(),
            task: TaskMode::Translate,
        };

        let command = recognizer.recognition_command(Path::new("clip_audio.wav"), Path::new("tmp"), &request);

        assert_eq!(
            command.args,
            vec![
                "clip_audio.wav", "--model", "large-v3", "--language", "zh", "--task", "translate",
                "--output_dir", "tmp", "--output_format", "json", "--verbose", "False"
            ]
        );
    }
}
