use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::TranslationEngine;
use crate::config::FailurePolicy;
use crate::error::Result;
use crate::language::language_name;
use crate::progress::ProgressReporter;
use crate::segment::Segment;

/// Translates a segment sequence into one target language.
///
/// One engine call per segment, in order. The output keeps each input
/// segment's start and end.
pub struct TranslationFanout<'a> {
    engine: &'a dyn TranslationEngine,
    progress: &'a dyn ProgressReporter,
    on_error: FailurePolicy,
    reuse_repeated: bool,
}

impl<'a> TranslationFanout<'a> {
    pub fn new(engine: &'a dyn TranslationEngine, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            engine,
            progress,
            on_error: FailurePolicy::Abort,
            reuse_repeated: false,
        }
    }

    pub fn on_error(mut self, policy: FailurePolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn reuse_repeated(mut self, enabled: bool) -> Self {
        self.reuse_repeated = enabled;
        self
    }

    pub async fn translate_segments(
        &self,
        segments: &[Segment],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<Segment>> {
        info!(
            "Translating {} segments {} -> {} ({})",
            segments.len(),
            source_language.to_uppercase(),
            target_language.to_uppercase(),
            language_name(target_language)
        );

        self.progress.begin(
            &format!("Translating to {}", language_name(target_language)),
            segments.len() as u64,
        );

        let result = self.translate_all(segments, source_language, target_language).await;
        self.progress.finish();
        result
    }

    async fn translate_all(
        &self,
        segments: &[Segment],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<Segment>> {
        let mut translated = Vec::with_capacity(segments.len());
        let mut seen: HashMap<&str, String> = HashMap::new();

        for (idx, segment) in segments.iter().enumerate() {
            let source_text = segment.text.trim();

            let text = match seen.get(source_text) {
                Some(cached) => {
                    debug!("Reusing translation for repeated segment {}", idx + 1);
                    cached.clone()
                }
                None => match self.engine.translate(source_text, source_language, target_language).await {
                    Ok(text) => {
                        if self.reuse_repeated {
                            seen.insert(source_text, text.clone());
                        }
                        text
                    }
                    Err(e) => match self.on_error {
                        FailurePolicy::Abort => {
                            warn!("Translation of segment {}/{} failed: {}", idx + 1, segments.len(), e);
                            return Err(e);
                        }
                        FailurePolicy::KeepSource => {
                            warn!(
                                "Translation of segment {}/{} failed, keeping source text: {}",
                                idx + 1,
                                segments.len(),
                                e
                            );
                            source_text.to_string()
                        }
                    },
                },
            };

            translated.push(Segment::new(segment.start, segment.end, text));
            self.progress.advance(idx as u64 + 1);
        }

        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::progress::SilentProgress;
    use crate::translate::MockTranslationEngine;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn english() -> Vec<Segment> {
        vec![
            Segment::new(0.0, 1.5, " Hello "),
            Segment::new(1.5, 3.0, "World"),
            Segment::new(3.0, 4.25, "Hello"),
        ]
    }

    #[derive(Default)]
    struct RecordingProgress {
        positions: Mutex<Vec<u64>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn begin(&self, _label: &str, _total: u64) {}
        fn advance(&self, completed: u64) {
            self.positions.lock().unwrap().push(completed);
        }
        fn finish(&self) {}
    }

    #[tokio::test]
    async fn test_translates_in_order_with_original_timing() {
        let mut engine = MockTranslationEngine::new();
        engine
            .expect_translate()
            .times(3)
            .returning(|text, _, target| Ok(format!("[{}] {}", target, text)));

        let progress = RecordingProgress::default();
        let fanout = TranslationFanout::new(&engine, &progress);
        let out = fanout.translate_segments(&english(), "en", "ru").await.unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Segment::new(0.0, 1.5, "[ru] Hello"));
        assert_eq!(out[1], Segment::new(1.5, 3.0, "[ru] World"));
        assert_eq!(out[2].start, 3.0);
        assert_eq!(out[2].end, 4.25);
        assert_eq!(*progress.positions.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_passes_trimmed_text_and_language_codes() {
        let mut engine = MockTranslationEngine::new();
        engine
            .expect_translate()
            .with(eq("Hello"), eq("en"), eq("fr"))
            .times(2)
            .returning(|_, _, _| Ok("Bonjour".to_string()));
        engine
            .expect_translate()
            .with(eq("World"), eq("en"), eq("fr"))
            .times(1)
            .returning(|_, _, _| Ok("Monde".to_string()));

        let fanout = TranslationFanout::new(&engine, &SilentProgress);
        let out = fanout.translate_segments(&english(), "en", "fr").await.unwrap();

        let texts: Vec<&str> = out.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Bonjour", "Monde", "Bonjour"]);
    }

    #[tokio::test]
    async fn test_engine_failure_aborts_by_default() {
        let mut engine = MockTranslationEngine::new();
        let mut calls = 0;
        engine.expect_translate().returning(move |_, _, _| {
            calls += 1;
            if calls == 2 {
                Err(PipelineError::Translation("package not installed".to_string()))
            } else {
                Ok("ok".to_string())
            }
        });

        let fanout = TranslationFanout::new(&engine, &SilentProgress);
        let err = fanout.translate_segments(&english(), "en", "de").await.unwrap_err();

        assert!(matches!(err, PipelineError::Translation(_)));
    }

    #[tokio::test]
    async fn test_keep_source_policy_emits_untranslated_text() {
        let mut engine = MockTranslationEngine::new();
        engine.expect_translate().returning(|text, _, _| {
            if text == "World" {
                Err(PipelineError::Translation("timeout".to_string()))
            } else {
                Ok("Hola".to_string())
            }
        });

        let fanout = TranslationFanout::new(&engine, &SilentProgress).on_error(FailurePolicy::KeepSource);
        let out = fanout.translate_segments(&english(), "en", "es").await.unwrap();

        let texts: Vec<&str> = out.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hola", "World", "Hola"]);
    }

    #[tokio::test]
    async fn test_reuse_repeated_calls_engine_once_per_distinct_text() {
        let mut engine = MockTranslationEngine::new();
        engine
            .expect_translate()
            .times(2)
            .returning(|text, _, _| Ok(text.to_uppercase()));

        let fanout = TranslationFanout::new(&engine, &SilentProgress).reuse_repeated(true);
        let out = fanout.translate_segments(&english(), "en", "de").await.unwrap();

        assert_eq!(out[2].text, "HELLO");
    }

    #[tokio::test]
    async fn test_empty_sequence_makes_no_calls() {
        let mut engine = MockTranslationEngine::new();
        engine.expect_translate().never();

        let fanout = TranslationFanout::new(&engine, &SilentProgress);
        let out = fanout.translate_segments(&[], "en", "ru").await.unwrap();

        assert!(out.is_empty());
    }
}
