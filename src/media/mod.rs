// Audio extraction
//
// The pipeline only needs one media operation: turning the downloaded video
// into a mono PCM WAV file the recognizer can read.

pub mod ffmpeg;

use async_trait::async_trait;
use std::path::Path;

pub use ffmpeg::FfmpegExtractor;

use crate::config::MediaConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u32,
}

impl From<&MediaConfig> for AudioFormat {
    fn from(config: &MediaConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }
}

/// Main trait for audio extraction
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Write the audio track of `video_path` to `audio_path` as PCM WAV
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path, format: AudioFormat) -> Result<()>;

    /// Check that the underlying tool is installed
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating audio extractor instances
pub struct AudioExtractorFactory;

impl AudioExtractorFactory {
    pub fn create_extractor(config: MediaConfig) -> Box<dyn AudioExtractor> {
        Box::new(FfmpegExtractor::new(config))
    }
}
