// Machine translation
//
// Secondary caption languages are produced by translating the primary
// captions segment by segment:
// - Argos: offline argos-translate command-line tool
// - Ollama: local LLM over the Ollama HTTP API
//
// `fanout` drives an engine over a whole segment sequence.

pub mod argos;
pub mod fanout;
pub mod ollama;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use fanout::TranslationFanout;

use crate::config::{TranslateConfig, TranslationBackend};
use crate::error::Result;

/// Main trait for translation operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate one piece of text between two language codes
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String>;

    /// Check that the engine is reachable
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating translation engine instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn TranslationEngine>> {
        match config.backend {
            TranslationBackend::Argos => Ok(Box::new(argos::ArgosTranslator::new(config))),
            TranslationBackend::Ollama => Ok(Box::new(ollama::OllamaTranslator::new(config)?)),
        }
    }
}
