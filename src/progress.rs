use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Observer for long-running stages. Purely cosmetic: nothing in the
/// pipeline reads progress back.
pub trait ProgressReporter: Send + Sync {
    fn begin(&self, label: &str, total: u64);
    fn advance(&self, completed: u64);
    fn finish(&self);
}

/// Reports nothing; used for tests and `--no-progress`
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn begin(&self, _label: &str, _total: u64) {}
    fn advance(&self, _completed: u64) {}
    fn finish(&self) {}
}

/// Terminal progress bar
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for BarProgress {
    fn begin(&self, label: &str, total: u64) {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(label.to_string());

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, completed: u64) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(pb) = slot.as_ref() {
                pb.set_position(completed);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}
