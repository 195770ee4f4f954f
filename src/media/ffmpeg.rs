use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::{AudioExtractor, AudioFormat};
use crate::command::ToolCommand;
use crate::config::MediaConfig;
use crate::error::{PipelineError, Result};

/// FFmpeg-based audio extractor
pub struct FfmpegExtractor {
    config: MediaConfig,
}

impl FfmpegExtractor {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Build the extraction command: drop video, 16-bit PCM, resample, downmix
    pub fn extraction_command(&self, video_path: &Path, audio_path: &Path, format: AudioFormat) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Audio extraction", PipelineError::Extraction)
            .opt("-i", video_path.to_string_lossy())
            .arg("-vn")
            .opt("-acodec", "pcm_s16le")
            .opt("-ar", format.sample_rate.to_string())
            .opt("-ac", format.channels.to_string())
            .arg("-y")
            .path(audio_path)
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path, format: AudioFormat) -> Result<()> {
        info!(
            "Extracting {} Hz / {} channel audio from {} to {}",
            format.sample_rate,
            format.channels,
            video_path.display(),
            audio_path.display()
        );

        self.extraction_command(video_path, audio_path, format)
            .execute()
            .await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        let version = ToolCommand::probe(&self.config.binary_path, "-version", PipelineError::Extraction).await?;
        info!("FFmpeg is available: {}", version);
        Ok(())
    }
}
