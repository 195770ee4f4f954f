use async_trait::async_trait;
use tracing::info;

use super::TranslationEngine;
use crate::command::ToolCommand;
use crate::config::TranslateConfig;
use crate::error::{PipelineError, Result};

/// Offline translation through the argos-translate command-line tool.
///
/// The matching language package (e.g. en→ru) must be installed.
pub struct ArgosTranslator {
    config: TranslateConfig,
}

impl ArgosTranslator {
    pub fn new(config: TranslateConfig) -> Self {
        Self { config }
    }

    pub fn translation_command(&self, text: &str, source_language: &str, target_language: &str) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Translation", PipelineError::Translation)
            .opt("--from-lang", source_language)
            .opt("--to-lang", target_language)
            // Keeps text that starts with '-' from being read as a flag
            .arg("--")
            .arg(text)
    }
}

#[async_trait]
impl TranslationEngine for ArgosTranslator {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let stdout = self
            .translation_command(text, source_language, target_language)
            .execute()
            .await?;
        Ok(stdout.trim().to_string())
    }

    async fn check_availability(&self) -> Result<()> {
        ToolCommand::probe(&self.config.binary_path, "--help", PipelineError::Translation).await?;
        info!("argos-translate is available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_translation_command_args() {
        let translator = ArgosTranslator::new(Config::default().translate);

        let command = translator.translation_command("-- hello", "en", "ru");

        assert_eq!(command.binary_path, "argos-translate");
        assert_eq!(command.args, vec!["--from-lang", "en", "--to-lang", "ru", "--", "-- hello"]);
    }
}
