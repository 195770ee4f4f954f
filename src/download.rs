use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::command::ToolCommand;
use crate::config::DownloaderConfig;
use crate::error::{PipelineError, Result};

/// Fetches the source video to a local file
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, source_url: &str, output_path: &Path) -> Result<()>;

    async fn check_availability(&self) -> Result<()>;
}

/// yt-dlp backed downloader; handles m3u8 playlists as well as page URLs
pub struct YtDlpDownloader {
    config: DownloaderConfig,
}

impl YtDlpDownloader {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    pub fn download_command(&self, source_url: &str, output_path: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Video download", PipelineError::Download)
            .arg(source_url)
            .arg("-o")
            .path(output_path)
            .args(self.config.extra_args.iter().cloned())
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, source_url: &str, output_path: &Path) -> Result<()> {
        info!("Downloading {} -> {}", source_url, output_path.display());
        self.download_command(source_url, output_path).execute().await?;
        info!("Download completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        let version = ToolCommand::probe(&self.config.binary_path, "--version", PipelineError::Download).await?;
        info!("yt-dlp is available: {}", version);
        Ok(())
    }
}

/// Factory for creating downloader instances
pub struct DownloaderFactory;

impl DownloaderFactory {
    pub fn create_downloader(config: DownloaderConfig) -> Box<dyn Downloader> {
        Box::new(YtDlpDownloader::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_download_command_args() {
        let downloader = YtDlpDownloader::new(Config::default().downloader);

        let command = downloader.download_command("https://example.com/a.m3u8", Path::new("out/clip.mp4"));

        assert_eq!(command.binary_path, "yt-dlp");
        assert_eq!(
            command.args,
            vec!["https://example.com/a.m3u8", "-o", "out/clip.mp4", "--no-check-certificate"]
        );
    }
}
