//! Markdown report formatter

use super::{DocumentRun, ReportFormatter, DISPLAY_CHARS};
use anyhow::Result;
use revmark_core::{truncate_for_display, MatchKind};
use std::io::Write;

/// Markdown formatter - a section of tables per document
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    document_count: usize,
    applied_total: usize,
    item_total: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            document_count: 0,
            applied_total: 0,
            item_total: 0,
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Make `text` safe inside a table cell
fn cell(text: &str) -> String {
    truncate_for_display(text, DISPLAY_CHARS)
        .replace('|', "\\|")
        .replace('\n', " ")
}

impl<W: Write + Send + Sync> ReportFormatter for MarkdownFormatter<W> {
    fn format_run(&mut self, run: &DocumentRun<'_>) -> Result<()> {
        let report = run.report;
        self.document_count += 1;
        self.applied_total += report.matched_count();
        self.item_total += report.total_items();

        writeln!(self.writer, "## {}", run.input.display())?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Written to `{}`.", run.output.display())?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", report.summary_line())?;
        writeln!(self.writer)?;

        if !report.applied().is_empty() {
            writeln!(self.writer, "### Applied")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Item | Paragraph | Match | Kind | Confidence |")?;
            writeln!(self.writer, "|---:|---:|---|---|---:|")?;
            for applied in report.applied() {
                let kind = match applied.span.kind {
                    MatchKind::Exact => "exact",
                    MatchKind::Fuzzy => "fuzzy",
                };
                writeln!(
                    self.writer,
                    "| {} | {} | {} | {} | {:.0}% |",
                    applied.item_index + 1,
                    applied.paragraph_index + 1,
                    cell(&applied.item.match_string),
                    kind,
                    applied.span.confidence * 100.0
                )?;
            }
            writeln!(self.writer)?;
        }

        if !report.unmatched().is_empty() {
            writeln!(self.writer, "### Unmatched")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Item | Reason | Match |")?;
            writeln!(self.writer, "|---:|---|---|")?;
            for unmatched in report.unmatched() {
                writeln!(
                    self.writer,
                    "| {} | {} | {} |",
                    unmatched.item_index + 1,
                    unmatched.reason,
                    cell(&unmatched.item.match_string)
                )?;
            }
            writeln!(self.writer)?;
        }

        if report.histogram().total() > 0 {
            writeln!(self.writer, "### Confidence")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Range | Items |")?;
            writeln!(self.writer, "|---|---:|")?;
            for (low, high, count) in report.histogram().rows().filter(|(_, _, c)| *c > 0) {
                writeln!(self.writer, "| {low}-{high}% | {count} |")?;
            }
            writeln!(self.writer)?;
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "---")?;
        writeln!(
            self.writer,
            "*{} of {} review items applied across {} document(s)*",
            self.applied_total, self.item_total, self.document_count
        )?;
        self.writer.flush()?;
        Ok(())
    }
}
