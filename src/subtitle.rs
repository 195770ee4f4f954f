use std::fmt::Write as _;
use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::segment::{Segment, TextField};

/// A caption block read back from an SRT file.
#[derive(Debug, Clone, PartialEq)]
pub struct SrtEntry {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<SrtEntry> for Segment {
    fn from(entry: SrtEntry) -> Self {
        Segment::new(entry.start, entry.end, entry.text)
    }
}

/// Render segments as SRT text, one block per segment.
pub fn render_srt(segments: &[Segment], field: TextField) -> Result<String> {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        let start_time = format_srt_time(segment.start)?;
        let end_time = format_srt_time(segment.end)?;

        // Writing into a String cannot fail
        let _ = write!(
            srt_content,
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            start_time,
            end_time,
            segment.text_for(field).trim()
        );
    }

    Ok(srt_content)
}

/// Write an SRT file, replacing anything already at `output_path`.
pub async fn write_srt<P: AsRef<Path>>(
    segments: &[Segment],
    field: TextField,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let srt_content = render_srt(segments, field)?;
    fs::write(output_path, srt_content).await?;

    info!("SRT file written with {} blocks", segments.len());
    Ok(())
}

pub async fn read_srt<P: AsRef<Path>>(input_path: P) -> Result<Vec<SrtEntry>> {
    let content = fs::read_to_string(input_path.as_ref()).await?;
    parse_srt(&content)
}

/// Parse SRT text. Tolerates a BOM, CRLF line endings and extra blank lines.
pub fn parse_srt(content: &str) -> Result<Vec<SrtEntry>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().map(|line| line.trim_end_matches('\r')).peekable();
    let mut entries = Vec::new();

    loop {
        while lines.peek().is_some_and(|line| line.trim().is_empty()) {
            lines.next();
        }
        let Some(index_line) = lines.next() else {
            break;
        };

        let index: usize = index_line.trim().parse().map_err(|_| {
            PipelineError::InvalidInput(format!("expected caption index, found '{}'", index_line))
        })?;

        let timing_line = lines.next().ok_or_else(|| {
            PipelineError::InvalidInput(format!("caption {} has no timing line", index))
        })?;
        let (start, end) = timing_line.split_once("-->").ok_or_else(|| {
            PipelineError::InvalidInput(format!("malformed timing line '{}'", timing_line))
        })?;
        let start = parse_srt_time(start.trim())?;
        let end = parse_srt_time(end.trim())?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(line);
        }

        entries.push(SrtEntry {
            index,
            start,
            end,
            text: text_lines.join("\n").trim().to_string(),
        });
    }

    Ok(entries)
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Rounds to the nearest millisecond. Hours are at least two digits and
/// grow as needed past 99.
pub fn format_srt_time(seconds: f64) -> Result<String> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(PipelineError::InvalidInput(format!(
            "timestamp must be a non-negative number of seconds, got {}",
            seconds
        )));
    }

    let total_milliseconds = (seconds * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    Ok(format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis))
}

/// Parse an SRT timestamp back into seconds. Accepts `.` as well as `,`.
pub fn parse_srt_time(timestamp: &str) -> Result<f64> {
    let invalid = || PipelineError::InvalidInput(format!("invalid SRT timestamp '{}'", timestamp));

    let (clock, millis) = timestamp
        .split_once(',')
        .or_else(|| timestamp.split_once('.'))
        .ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(hours), Some(minutes), Some(secs), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let hours: u64 = hours.parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let secs: u64 = secs.parse().map_err(|_| invalid())?;
    let millis: u64 = millis.parse().map_err(|_| invalid())?;
    if minutes >= 60 || secs >= 60 || millis >= 1000 {
        return Err(invalid());
    }

    let total_milliseconds = hours * 3_600_000 + minutes * 60_000 + secs * 1_000 + millis;
    Ok(total_milliseconds as f64 / 1000.0)
}
