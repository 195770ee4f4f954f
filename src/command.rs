use std::ffi::OsStr;
use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// External tool invocation, built up argument by argument.
///
/// Failures (spawn errors and non-zero exits) are reported through the
/// error constructor the command was created with, so a failed ffmpeg run
/// surfaces as an extraction error and a failed yt-dlp run as a download error.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    error: fn(String) -> PipelineError,
}

impl ToolCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        binary_path: S1,
        description: S2,
        error: fn(String) -> PipelineError,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            error,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// `flag value` pair
    pub fn opt<S1: Into<String>, S2: Into<String>>(self, flag: S1, value: S2) -> Self {
        self.arg(flag).arg(value)
    }

    /// Run to completion and return stdout.
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing {}: {} {:?}", self.description, self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(self.args.iter().map(OsStr::new))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                (self.error)(format!("Failed to execute {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err((self.error)(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run with a version-style flag to check the tool is installed.
    pub async fn probe(binary_path: &str, flag: &str, error: fn(String) -> PipelineError) -> Result<String> {
        let stdout = ToolCommand::new(binary_path, format!("{} availability check", binary_path), error)
            .arg(flag)
            .execute()
            .await?;
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_args() {
        let command = ToolCommand::new("ffmpeg", "Audio extraction", PipelineError::Extraction)
            .path("in.mp4")
            .opt("-ar", "16000")
            .args(["-vn", "-y"]);

        assert_eq!(command.args, vec!["in.mp4", "-ar", "16000", "-vn", "-y"]);
    }

    #[tokio::test]
    async fn test_missing_binary_uses_error_kind() {
        let err = ToolCommand::new(
            "subpipe-definitely-not-installed",
            "Video download",
            PipelineError::Download,
        )
        .execute()
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Download(_)));
    }
}
