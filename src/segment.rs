use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One timed unit of recognized speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Offset from the start of the audio, in seconds
    pub start: f64,
    /// End offset in seconds, strictly after `start`
    pub end: f64,
    /// Primary-language text (English when the recognizer translates)
    pub text: String,
    /// Source-language text, when the recognizer surfaces it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
}

/// Which text of a segment a caption file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Primary,
    /// Source-language text, falling back to the primary text
    Original,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            original_text: None,
        }
    }

    pub fn with_original(mut self, original_text: impl Into<String>) -> Self {
        self.original_text = Some(original_text.into());
        self
    }

    pub fn text_for(&self, field: TextField) -> &str {
        match field {
            TextField::Primary => &self.text,
            TextField::Original => self.original_text.as_deref().unwrap_or(&self.text),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(PipelineError::InvalidInput(format!(
                "segment bounds must be finite (start={}, end={})",
                self.start, self.end
            )));
        }
        if self.start < 0.0 {
            return Err(PipelineError::InvalidInput(format!(
                "segment starts before zero: {}",
                self.start
            )));
        }
        if self.end <= self.start {
            return Err(PipelineError::InvalidInput(format!(
                "segment ends at {} but starts at {}",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_field_falls_back_to_text() {
        let plain = Segment::new(0.0, 1.5, "Hello");
        let dual = Segment::new(0.0, 1.5, "Hello").with_original("你好");

        assert_eq!(plain.text_for(TextField::Original), "Hello");
        assert_eq!(dual.text_for(TextField::Original), "你好");
        assert_eq!(dual.text_for(TextField::Primary), "Hello");
    }

    #[test]
    fn test_validate_bounds() {
        assert!(Segment::new(0.0, 0.5, "ok").validate().is_ok());
        assert!(Segment::new(-0.1, 0.5, "early").validate().is_err());
        assert!(Segment::new(2.0, 2.0, "empty").validate().is_err());
        assert!(Segment::new(0.0, f64::NAN, "nan").validate().is_err());
    }

    #[test]
    fn test_deserialize_without_original_text() {
        let segment: Segment =
            serde_json::from_str(r#"{"start": 1.0, "end": 2.5, "text": " hi "}"#).unwrap();
        assert_eq!(segment.original_text, None);
        assert_eq!(segment.end - segment.start, 1.5);
    }
}
