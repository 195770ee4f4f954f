use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::TranslationEngine;
use crate::config::TranslateConfig;
use crate::error::{PipelineError, Result};
use crate::language::language_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translation through a local LLM served by Ollama
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.endpoint.trim_end_matches('/')
    }

    fn build_prompt(&self, text: &str, source_language: &str, target_language: &str) -> String {
        let source_name = language_name(source_language);
        let target_name = language_name(target_language);

        format!(
            "You are a professional subtitle translator.\n\
             \n\
             Translate the subtitle line below from {} to {} (language code: {}).\n\
             Keep it short enough to read on screen and do not add explanations.\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             \n\
             Text to translate: \"{}\"\n",
            source_name, target_name, target_language, target_name, text
        )
    }
}

/// Pull the translation out of a free-form reply when the model ignored the JSON format.
fn clean_translation_response(response: &str) -> String {
    let lines: Vec<&str> = response.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let candidate = lines.iter().find(|line| {
        !(line.starts_with("Here is")
            || line.starts_with("Here are")
            || line.starts_with("Translation:")
            || line.starts_with("- ")
            || line.starts_with("* ")
            || (line.starts_with("**") && line.ends_with("**")))
    });

    candidate
        .or_else(|| lines.first())
        .map(|line| line.trim_matches('"').to_string())
        .unwrap_or_else(|| response.trim().to_string())
}

#[async_trait]
impl TranslationEngine for OllamaTranslator {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: self.build_prompt(text, source_language, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.base_url());
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = generated.response.trim();
        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(PipelineError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw_response) {
            return Ok(result.text.trim().to_string());
        }

        Ok(clean_translation_response(raw_response))
    }

    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.base_url());

        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": self.config.model }))
            .send()
            .await
            .map_err(|e| PipelineError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.config.model);
            Ok(())
        } else {
            Err(PipelineError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.config.model, self.config.model
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_prompt_names_both_languages() {
        let translator = OllamaTranslator::new(Config::default().translate).unwrap();

        let prompt = translator.build_prompt("Hello", "en", "ru");

        assert!(prompt.contains("from English to Russian"));
        assert!(prompt.contains("\"Hello\""));
    }

    #[test]
    fn test_base_url_drops_trailing_slash() {
        let mut config = Config::default().translate;
        config.endpoint = "http://localhost:11434/".to_string();
        let translator = OllamaTranslator::new(config).unwrap();

        assert_eq!(format!("{}/api/generate", translator.base_url()), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_clean_translation_response() {
        assert_eq!(clean_translation_response("Here is the translation:\n\"Привет\"\n"), "Привет");
        assert_eq!(clean_translation_response("**Russian**\nПривет мир"), "Привет мир");
        assert_eq!(clean_translation_response("  Bonjour  "), "Bonjour");
    }
}
