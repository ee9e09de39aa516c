//! Run report rendering

use anyhow::{bail, Result};
use revmark_core::RunReport;
use std::io::Write;
use std::path::Path;

pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

/// Characters of a match string shown in reports
pub const DISPLAY_CHARS: usize = 80;

/// One annotated document and its report
#[derive(Debug, Clone, Copy)]
pub struct DocumentRun<'a> {
    /// Manuscript that was read
    pub input: &'a Path,
    /// Annotated document that was written
    pub output: &'a Path,
    /// Outcome of the pass
    pub report: &'a RunReport,
}

/// Trait for report formatters
pub trait ReportFormatter: Send + Sync {
    /// Format the report of one document
    fn format_run(&mut self, run: &DocumentRun<'_>) -> Result<()>;

    /// Finalize output (e.g., close JSON array)
    fn finish(&mut self) -> Result<()>;
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Summary line and unmatched list
    Text,
    /// Full report as JSON
    Json,
    /// Markdown tables
    Markdown,
}

impl ReportFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => bail!("Unknown report format '{other}'"),
        }
    }

    /// Build a formatter writing to `writer`
    pub fn formatter<W>(self, writer: W, pretty_json: bool) -> Box<dyn ReportFormatter>
    where
        W: Write + Send + Sync + 'static,
    {
        match self {
            ReportFormat::Text => Box::new(TextFormatter::new(writer)),
            ReportFormat::Json => Box::new(JsonFormatter::new(writer, pretty_json)),
            ReportFormat::Markdown => Box::new(MarkdownFormatter::new(writer)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use revmark_core::{MatchKind, MatchSpan, ReviewItem, RunReport, RunReportBuilder, UnmatchedReason};

    /// Two applied items (one exact, one fuzzy) and one unmatched
    pub fn sample_report() -> RunReport {
        let exact = ReviewItem::revision("The pelvis was constrained", "Clarify", "The pelvis was fixed");
        let fuzzy = ReviewItem::comment("growth was modelled", "Explain | method");
        let missing = ReviewItem::comment("Thermal expansion coefficients", "Where?");

        let mut builder = RunReportBuilder::new(3);
        builder.applied(
            0,
            &exact,
            1,
            MatchSpan {
                start: 0,
                end: 26,
                confidence: 1.0,
                kind: MatchKind::Exact,
            },
        );
        builder.applied(
            1,
            &fuzzy,
            2,
            MatchSpan {
                start: 7,
                end: 25,
                confidence: 0.93,
                kind: MatchKind::Fuzzy,
            },
        );
        builder.unmatched(2, &missing, UnmatchedReason::NoCandidateFound);
        builder.finish()
    }
}
