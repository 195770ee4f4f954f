use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::artifacts::ArtifactPaths;
use crate::config::Config;
use crate::download::{Downloader, DownloaderFactory};
use crate::error::{PipelineError, Result};
use crate::language::language_name;
use crate::media::{AudioExtractor, AudioExtractorFactory, AudioFormat};
use crate::progress::{BarProgress, ProgressReporter};
use crate::segment::{Segment, TextField};
use crate::stage::{SkipReason, Stage, StageGate, StageOutcome};
use crate::subtitle::{read_srt, write_srt};
use crate::transcribe::{RecognitionRequest, Recognizer, RecognizerFactory};
use crate::translate::{TranslationEngine, TranslationFanout, TranslatorFactory};

/// The external collaborators a workflow drives.
pub struct Components {
    pub downloader: Box<dyn Downloader>,
    pub extractor: Box<dyn AudioExtractor>,
    pub recognizer: Box<dyn Recognizer>,
    pub translator: Box<dyn TranslationEngine>,
    pub progress: Box<dyn ProgressReporter>,
}

impl Components {
    /// Collaborators built from configuration, with a terminal progress bar.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            downloader: DownloaderFactory::create_downloader(config.downloader.clone()),
            extractor: AudioExtractorFactory::create_extractor(config.media.clone()),
            recognizer: RecognizerFactory::create_recognizer(config.recognizer.clone()),
            translator: TranslatorFactory::create_translator(config.translate.clone())?,
            progress: Box::new(BarProgress::new()),
        })
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub segment_count: usize,
    /// Every stage in execution order with what happened to it
    pub stages: Vec<(Stage, StageOutcome)>,
    /// Caption files written during the run
    pub captions: Vec<PathBuf>,
}

impl RunReport {
    pub fn outcome(&self, stage: &Stage) -> Option<StageOutcome> {
        self.stages.iter().find(|(s, _)| s == stage).map(|(_, outcome)| *outcome)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Linear subtitle pipeline:
/// download → extract audio → recognize → native/primary captions →
/// translated captions → audio cleanup.
pub struct Workflow {
    config: Config,
    paths: ArtifactPaths,
    components: Components,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let components = Components::from_config(&config)?;
        Self::with_components(config, components)
    }

    pub fn with_components(config: Config, components: Components) -> Result<Self> {
        config.validate()?;
        let paths = ArtifactPaths::from_project(&config.project);

        Ok(Self {
            config,
            paths,
            components,
        })
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Check the tools this run will actually invoke.
    pub async fn preflight(&self) -> Result<()> {
        if !StageGate::is_satisfied(&self.paths.video()).await? {
            self.components.downloader.check_availability().await?;
        }
        if self.config.media.extract_audio && !StageGate::is_satisfied(&self.paths.audio()).await? {
            self.components.extractor.check_availability().await?;
        }
        self.components.recognizer.check_availability().await?;
        if self.config.outputs.enabled_languages().next().is_some() {
            self.components.translator.check_availability().await?;
        }
        Ok(())
    }

    /// Run every stage in order. Any failure aborts the run; caption files
    /// already written stay on disk.
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run = %run_id, project = %self.config.project.name);
        self.run_stages(run_id).instrument(span).await
    }

    async fn run_stages(&self, run_id: Uuid) -> Result<RunReport> {
        let started_at = Utc::now();
        info!("Starting subtitle pipeline for: {}", self.config.project.name);

        fs::create_dir_all(self.paths.output_dir()).await?;

        let mut stages = Vec::new();
        let mut captions = Vec::new();

        stages.push((Stage::Download, self.download().await?));
        stages.push((Stage::ExtractAudio, self.extract_audio().await?));

        let segments = self.recognize().await?;
        stages.push((Stage::RecognizeTranslate, StageOutcome::Completed));

        let native = self.write_native_captions(&segments).await?;
        record(&mut stages, &mut captions, Stage::WriteNativeCaptions, native);

        let primary = self.write_primary_captions(&segments).await?;
        record(&mut stages, &mut captions, Stage::WritePrimaryCaptions, primary);

        for (code, enabled) in &self.config.outputs.languages {
            let stage = Stage::WriteTranslatedCaptions(code.clone());
            if !enabled {
                info!("Skipping translation to {}: disabled", code.to_uppercase());
                stages.push((stage, StageOutcome::Skipped(SkipReason::Disabled)));
                continue;
            }
            let written = self.write_translated_captions(&segments, code).await?;
            record(&mut stages, &mut captions, stage, Some(written));
        }

        stages.push((Stage::CleanupAudio, self.cleanup_audio().await?));

        info!(
            "Done: {} caption files for '{}' created successfully",
            captions.len(),
            self.config.project.name
        );

        Ok(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            segment_count: segments.len(),
            stages,
            captions,
        })
    }

    async fn download(&self) -> Result<StageOutcome> {
        let video = self.paths.video();
        let url = self.config.project.source_url.as_str();

        StageGate::run(&Stage::Download, &video, || {
            self.components.downloader.download(url, &video)
        })
        .await
        .map_err(|e| e.at_stage(Stage::Download, &video))
    }

    async fn extract_audio(&self) -> Result<StageOutcome> {
        let audio = self.paths.audio();

        if !self.config.media.extract_audio {
            info!("Skipping audio extraction: disabled, expecting {}", audio.display());
            return Ok(StageOutcome::Skipped(SkipReason::Disabled));
        }

        let video = self.paths.video();
        let format = AudioFormat::from(&self.config.media);

        StageGate::run(&Stage::ExtractAudio, &audio, || {
            self.components.extractor.extract_audio(&video, &audio, format)
        })
        .await
        .map_err(|e| e.at_stage(Stage::ExtractAudio, &audio))
    }

    async fn recognize(&self) -> Result<Vec<Segment>> {
        let audio = self.paths.audio();
        let request = RecognitionRequest::from(&self.config.recognizer);
        let stage = Stage::RecognizeTranslate;

        info!(
            "Starting {}: {} -> {} ({})",
            stage,
            request.source_language.to_uppercase(),
            self.config.recognizer.primary_language().to_uppercase(),
            request.task.as_str()
        );

        if !StageGate::is_satisfied(&audio).await? {
            let missing = PipelineError::Recognition(format!("audio file {} not found", audio.display()));
            return Err(missing.at_stage(stage, &audio));
        }

        let segments = self
            .components
            .recognizer
            .recognize(&audio, &request)
            .await
            .map_err(|e| e.at_stage(stage.clone(), &audio))?;

        for (idx, segment) in segments.iter().enumerate() {
            segment.validate().map_err(|e| {
                PipelineError::InvalidInput(format!("segment {}: {}", idx + 1, e))
                    .at_stage(stage.clone(), &audio)
            })?;
        }

        if segments.is_empty() {
            warn!("Recognizer returned no segments; caption files will be empty");
        }
        info!("Completed {}: {} segments", stage, segments.len());
        Ok(segments)
    }

    async fn write_native_captions(&self, segments: &[Segment]) -> Result<Option<PathBuf>> {
        if !self.config.outputs.native_captions {
            info!("Skipping native captions: disabled");
            return Ok(None);
        }
        let language = &self.config.recognizer.source_language;
        self.write_captions(Stage::WriteNativeCaptions, segments, TextField::Original, language)
            .await
            .map(Some)
    }

    async fn write_primary_captions(&self, segments: &[Segment]) -> Result<Option<PathBuf>> {
        if !self.config.outputs.primary_captions {
            info!("Skipping primary captions: disabled");
            return Ok(None);
        }
        let language = self.config.recognizer.primary_language();
        self.write_captions(Stage::WritePrimaryCaptions, segments, TextField::Primary, language)
            .await
            .map(Some)
    }

    async fn write_captions(
        &self,
        stage: Stage,
        segments: &[Segment],
        field: TextField,
        language: &str,
    ) -> Result<PathBuf> {
        let path = self.paths.captions(language);
        info!("Saving {} subtitles", language_name(language));

        write_srt(segments, field, &path)
            .await
            .map_err(|e| e.at_stage(stage, &path))?;

        info!("{} subtitles saved -> {}", language_name(language), path.display());
        Ok(path)
    }

    async fn write_translated_captions(&self, segments: &[Segment], language: &str) -> Result<PathBuf> {
        let stage = Stage::WriteTranslatedCaptions(language.to_string());
        let path = self.paths.captions(language);
        let source = self.config.recognizer.primary_language();

        let translated = self
            .fanout()
            .translate_segments(segments, source, language)
            .await
            .map_err(|e| e.at_stage(stage.clone(), &path))?;

        write_srt(&translated, TextField::Primary, &path)
            .await
            .map_err(|e| e.at_stage(stage, &path))?;

        info!("{} subtitles saved -> {}", language_name(language), path.display());
        Ok(path)
    }

    async fn cleanup_audio(&self) -> Result<StageOutcome> {
        if self.config.outputs.retain_audio {
            info!("Skipping audio cleanup: retain_audio = true");
            return Ok(StageOutcome::Skipped(SkipReason::Disabled));
        }

        let audio = self.paths.audio();
        if !StageGate::is_satisfied(&audio).await? {
            info!("Skipping audio cleanup: {} not found", audio.display());
            return Ok(StageOutcome::Skipped(SkipReason::NothingToDo));
        }

        fs::remove_file(&audio)
            .await
            .map_err(|e| PipelineError::from(e).at_stage(Stage::CleanupAudio, &audio))?;
        info!("Audio file removed (retain_audio = false): {}", audio.display());
        Ok(StageOutcome::Completed)
    }

    fn fanout(&self) -> TranslationFanout<'_> {
        TranslationFanout::new(self.components.translator.as_ref(), self.components.progress.as_ref())
            .on_error(self.config.translate.on_error)
            .reuse_repeated(self.config.translate.reuse_repeated)
    }

    /// Translate an existing SRT file into each target language.
    ///
    /// Output files are named `<input stem>_<lang>.srt` and placed in
    /// `output_dir`, or next to the input when no directory is given.
    pub async fn translate_caption_file(
        &self,
        input: &Path,
        source_language: &str,
        target_languages: &[String],
        output_dir: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        crate::config::check_language_code(source_language)?;
        for language in target_languages {
            crate::config::check_language_code(language)?;
        }

        let stem = input
            .file_stem()
            .ok_or_else(|| PipelineError::InvalidInput(format!("'{}' has no file name", input.display())))?
            .to_string_lossy()
            .into_owned();
        let output_dir = match output_dir {
            Some(dir) => {
                fs::create_dir_all(dir).await?;
                dir.to_path_buf()
            }
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let segments: Vec<Segment> = read_srt(input).await?.into_iter().map(Segment::from).collect();
        info!("Loaded {} caption blocks from {}", segments.len(), input.display());

        let mut written = Vec::new();
        for language in target_languages {
            let stage = Stage::WriteTranslatedCaptions(language.clone());
            let path = output_dir.join(format!("{}_{}.srt", stem, language));
            let translated = self
                .fanout()
                .translate_segments(&segments, source_language, language)
                .await
                .map_err(|e| e.at_stage(stage.clone(), &path))?;
            write_srt(&translated, TextField::Primary, &path)
                .await
                .map_err(|e| e.at_stage(stage, &path))?;

            info!("{} subtitles saved -> {}", language_name(language), path.display());
            written.push(path);
        }

        Ok(written)
    }
}

fn record(
    stages: &mut Vec<(Stage, StageOutcome)>,
    captions: &mut Vec<PathBuf>,
    stage: Stage,
    written: Option<PathBuf>,
) {
    match written {
        Some(path) => {
            stages.push((stage, StageOutcome::Completed));
            captions.push(path);
        }
        None => stages.push((stage, StageOutcome::Skipped(SkipReason::Disabled))),
    }
}
