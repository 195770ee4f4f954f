use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;

/// File locations derived from the project name.
///
/// Video is `<name>.mp4`, audio `<name>_audio.wav`, captions `<name>_<lang>.srt`,
/// all inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    output_dir: PathBuf,
    project: String,
}

impl ArtifactPaths {
    pub fn new(output_dir: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            project: project.into(),
        }
    }

    pub fn from_project(project: &ProjectConfig) -> Self {
        Self::new(&project.output_dir, project.name.trim())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn video(&self) -> PathBuf {
        self.file(None, "mp4")
    }

    pub fn audio(&self) -> PathBuf {
        self.file(Some("audio"), "wav")
    }

    pub fn captions(&self, language: &str) -> PathBuf {
        self.file(Some(language), "srt")
    }

    fn file(&self, kind: Option<&str>, extension: &str) -> PathBuf {
        let name = match kind {
            Some(kind) => format!("{}_{}.{}", self.project, kind, extension),
            None => format!("{}.{}", self.project, extension),
        };
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let paths = ArtifactPaths::new("/data/out", "lecture");

        assert_eq!(paths.video(), PathBuf::from("/data/out/lecture.mp4"));
        assert_eq!(paths.audio(), PathBuf::from("/data/out/lecture_audio.wav"));
        assert_eq!(paths.captions("zh"), PathBuf::from("/data/out/lecture_zh.srt"));
        assert_eq!(paths.captions("pt-br"), PathBuf::from("/data/out/lecture_pt-br.srt"));
    }
}
