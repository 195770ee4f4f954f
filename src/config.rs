use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PipelineError, Result};

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub downloader: DownloaderConfig,
    pub media: MediaConfig,
    pub recognizer: RecognizerConfig,
    pub translate: TranslateConfig,
    pub outputs: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Base name for every artifact (no extension)
    pub name: String,
    /// Video source, typically an m3u8 playlist URL
    pub source_url: String,
    /// Directory all artifacts are written to
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Path to the downloader binary (yt-dlp)
    pub binary_path: String,
    /// Extra arguments appended to every download
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u32,
    /// Extract audio from the video; when off, an audio file must already exist
    #[serde(default = "default_true")]
    pub extract_audio: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Path to the whisper command-line tool
    pub binary_path: String,
    pub model: WhisperModel,
    /// Spoken language of the video
    pub source_language: String,
    pub task: TaskMode,
    /// Language the recognizer translates into (whisper only supports English)
    pub target_language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
    LargeV2,
    LargeV3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Text stays in the spoken language
    Transcribe,
    /// Text is translated by the recognizer itself
    Translate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    pub backend: TranslationBackend,
    /// Path to the argos-translate command-line tool
    pub binary_path: String,
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use with the ollama backend
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// What to do when a single segment fails to translate
    #[serde(default)]
    pub on_error: FailurePolicy,
    /// Translate identical source lines only once per language
    #[serde(default)]
    pub reuse_repeated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    Argos,
    Ollama,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole language on the first failed segment
    #[default]
    Abort,
    /// Emit the untranslated text for the failed segment and carry on
    KeepSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Keep the extracted audio after the run
    pub retain_audio: bool,
    /// Captions in the spoken language
    pub native_captions: bool,
    /// Captions in the recognizer's output language
    pub primary_captions: bool,
    /// Secondary caption languages, translated from the primary captions
    #[serde(default)]
    pub languages: BTreeMap<String, bool>,
}

impl WhisperModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
            WhisperModel::LargeV2 => "large-v2",
            WhisperModel::LargeV3 => "large-v3",
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhisperModel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(WhisperModel::Tiny),
            "base" => Ok(WhisperModel::Base),
            "small" => Ok(WhisperModel::Small),
            "medium" => Ok(WhisperModel::Medium),
            "large" => Ok(WhisperModel::Large),
            "large-v2" => Ok(WhisperModel::LargeV2),
            "large-v3" => Ok(WhisperModel::LargeV3),
            _ => Err(PipelineError::Config(format!(
                "Invalid whisper model '{}'. Valid models: tiny, base, small, medium, large, large-v2, large-v3",
                s
            ))),
        }
    }
}

impl TaskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskMode::Transcribe => "transcribe",
            TaskMode::Translate => "translate",
        }
    }
}

impl RecognizerConfig {
    /// Language of `Segment::text` after recognition.
    pub fn primary_language(&self) -> &str {
        match self.task {
            TaskMode::Translate => &self.target_language,
            TaskMode::Transcribe => &self.source_language,
        }
    }
}

impl OutputConfig {
    /// Secondary languages with captions turned on, in code order.
    pub fn enabled_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(code, _)| code.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        let languages = [("ru", true), ("fr", false), ("es", false), ("de", false)]
            .into_iter()
            .map(|(code, enabled)| (code.to_string(), enabled))
            .collect();

        Self {
            project: ProjectConfig {
                name: "my_video".to_string(),
                source_url: "https://example.com/path/to/video/playlist.m3u8".to_string(),
                output_dir: PathBuf::from("."),
            },
            downloader: DownloaderConfig {
                binary_path: "yt-dlp".to_string(),
                extra_args: vec!["--no-check-certificate".to_string()],
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                sample_rate: 16_000,
                channels: 1,
                extract_audio: true,
            },
            recognizer: RecognizerConfig {
                binary_path: "whisper".to_string(),
                model: WhisperModel::LargeV3,
                source_language: "zh".to_string(),
                task: TaskMode::Translate,
                target_language: "en".to_string(),
            },
            translate: TranslateConfig {
                backend: TranslationBackend::Argos,
                binary_path: "argos-translate".to_string(),
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                timeout_secs: default_timeout_secs(),
                on_error: FailurePolicy::Abort,
                reuse_repeated: false,
            },
            outputs: OutputConfig {
                retain_audio: true,
                native_captions: true,
                primary_captions: true,
                languages,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject configurations the pipeline cannot run safely.
    pub fn validate(&self) -> Result<()> {
        let name = self.project.name.trim();
        if name.is_empty() {
            return Err(invalid("project name must not be empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(invalid(format!(
                "project name '{}' must be a plain file name",
                self.project.name
            )));
        }
        if self.project.source_url.trim().is_empty() {
            return Err(invalid("source URL must not be empty"));
        }
        if self.media.sample_rate == 0 || self.media.channels == 0 {
            return Err(invalid("audio sample rate and channel count must be positive"));
        }

        check_language_code(&self.recognizer.source_language)?;
        check_language_code(&self.recognizer.target_language)?;
        if self.recognizer.task == TaskMode::Translate && self.recognizer.target_language != "en" {
            return Err(invalid(format!(
                "whisper's translate task only produces English, not '{}'",
                self.recognizer.target_language
            )));
        }

        let native = self.recognizer.source_language.as_str();
        let primary = self.recognizer.primary_language();
        if native == primary && self.outputs.native_captions && self.outputs.primary_captions {
            return Err(invalid(format!(
                "native and primary captions would both be written to the '{}' caption file",
                native
            )));
        }

        for (code, enabled) in &self.outputs.languages {
            check_language_code(code)?;
            if !enabled {
                continue;
            }
            if code == primary {
                return Err(invalid(format!(
                    "'{}' is the primary caption language and cannot also be a translation target",
                    code
                )));
            }
            if code == native && self.outputs.native_captions {
                return Err(invalid(format!(
                    "'{}' captions are already produced as native captions",
                    code
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidInput(message.into())
}

/// Two or three lowercase letters, optionally followed by `-region`.
pub fn check_language_code(code: &str) -> Result<()> {
    let (base, region) = match code.split_once('-') {
        Some((base, region)) => (base, Some(region)),
        None => (code, None),
    };

    let base_ok = (2..=3).contains(&base.len()) && base.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = region.is_none_or(|r| {
        !r.is_empty() && r.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    });

    if base_ok && region_ok {
        Ok(())
    } else {
        Err(invalid(format!("invalid language code '{}'", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.recognizer.primary_language(), "en");
        assert_eq!(config.outputs.enabled_languages().collect::<Vec<_>>(), vec!["ru"]);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subpipe.toml");

        let mut config = Config::default();
        config.recognizer.model = WhisperModel::LargeV2;
        config.translate.on_error = FailurePolicy::KeepSource;
        config.save_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("model = \"large-v2\""));
        assert!(text.contains("on_error = \"keep-source\""));

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.recognizer.model, WhisperModel::LargeV2);
        assert_eq!(loaded.translate.on_error, FailurePolicy::KeepSource);
        assert_eq!(loaded.outputs.languages.len(), 4);
    }

    #[test]
    fn test_unknown_model_is_rejected_at_load() {
        let mut value = toml::Value::try_from(Config::default()).unwrap();
        value["recognizer"]["model"] = toml::Value::String("huge".to_string());
        let text = toml::to_string(&value).unwrap();

        let file = assert_fs::NamedTempFile::new("subpipe.toml").unwrap();
        file.write_str(&text).unwrap();

        assert!(matches!(Config::from_file(file.path()), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!("large-v3".parse::<WhisperModel>().unwrap(), WhisperModel::LargeV3);
        assert_eq!("Tiny".parse::<WhisperModel>().unwrap(), WhisperModel::Tiny);
        assert!("xl".parse::<WhisperModel>().is_err());
    }

    #[test]
    fn test_language_codes() {
        assert!(check_language_code("ru").is_ok());
        assert!(check_language_code("yue").is_ok());
        assert!(check_language_code("pt-br").is_ok());
        assert!(check_language_code("RU").is_err());
        assert!(check_language_code("russian").is_err());
        assert!(check_language_code("pt-").is_err());
        assert!(check_language_code("").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_projects() {
        let mut config = Config::default();
        config.project.name = "../escape".to_string();
        assert!(matches!(config.validate(), Err(PipelineError::InvalidInput(_))));

        let mut config = Config::default();
        config.project.name = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.project.source_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_caption_collisions() {
        let mut config = Config::default();
        config.outputs.languages.insert("en".to_string(), true);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.outputs.languages.insert("zh".to_string(), true);
        assert!(config.validate().is_err());
        config.outputs.native_captions = false;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.recognizer.task = TaskMode::Transcribe;
        assert!(config.validate().is_err());
        config.outputs.primary_captions = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_translate_task_requires_english_target() {
        let mut config = Config::default();
        config.recognizer.target_language = "fr".to_string();
        assert!(matches!(config.validate(), Err(PipelineError::InvalidInput(_))));

        config.recognizer.task = TaskMode::Transcribe;
        config.outputs.primary_captions = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_disabled_language_may_collide() {
        let mut config = Config::default();
        config.outputs.languages.insert("en".to_string(), false);
        assert!(config.validate().is_ok());
    }
}
