//! Progress reporting module

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for one document's paragraphs or a batch of documents
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(quiet: bool) -> Self {
        Self {
            progress_bar: None,
            quiet,
        }
    }

    /// Start a bar for `document`, replacing any previous one
    pub fn init_paragraphs(&mut self, document: &str, total_paragraphs: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total_paragraphs);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} paragraphs {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.set_message(document.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        self.progress_bar = Some(pb);
    }

    /// Start a bar counting whole documents
    pub fn init_files(&mut self, total_files: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total_files);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} documents {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.enable_steady_tick(Duration::from_millis(100));

        self.progress_bar = Some(pb);
    }

    /// Update progress for a completed document
    pub fn file_completed(&self, filename: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(format!("Annotated: {}", filename));
            pb.inc(1);
        }
    }

    /// Record `done` of `total` paragraphs visited
    pub fn update(&self, done: usize, total: usize) {
        if let Some(pb) = &self.progress_bar {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }
    }

    /// Finish progress reporting with the run's summary line
    pub fn finish(&mut self, summary: &str) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_with_message(summary.to_string());
        }
    }

    /// Whether a bar is currently shown
    pub fn is_active(&self) -> bool {
        self.progress_bar.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_reporter_shows_nothing() {
        let mut reporter = ProgressReporter::new(true);
        reporter.init_paragraphs("paper.txt", 10);
        assert!(!reporter.is_active());
        reporter.update(5, 10);
        reporter.finish("done");
    }

    #[test]
    fn test_file_bar_counts_documents() {
        let mut reporter = ProgressReporter::new(false);
        reporter.init_files(2);
        reporter.file_completed("a.txt");
        reporter.file_completed("b.txt");
        reporter.finish("Complete");
        assert!(!reporter.is_active());
    }

    #[test]
    fn test_bar_lifecycle() {
        let mut reporter = ProgressReporter::new(false);
        reporter.init_paragraphs("paper.txt", 4);
        assert!(reporter.is_active());
        reporter.update(2, 4);
        reporter.finish("2 of 2 review items applied");
        assert!(!reporter.is_active());
    }
}
