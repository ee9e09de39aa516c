//! Plain text report formatter

use super::{DocumentRun, ReportFormatter, DISPLAY_CHARS};
use anyhow::Result;
use std::io::Write;

/// Plain text formatter - a summary line per document, then its unmatched items
pub struct TextFormatter<W: Write> {
    writer: W,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + Sync> ReportFormatter for TextFormatter<W> {
    fn format_run(&mut self, run: &DocumentRun<'_>) -> Result<()> {
        let report = run.report;
        writeln!(
            self.writer,
            "{} -> {}",
            run.input.display(),
            run.output.display()
        )?;
        writeln!(self.writer, "  {}", report.summary_line())?;
        if !report.rejected_overlap().is_empty() {
            writeln!(
                self.writer,
                "  {} overlap conflict(s) resolved",
                report.rejected_overlap().len()
            )?;
        }
        for line in report.unmatched_lines(DISPLAY_CHARS) {
            writeln!(self.writer, "  {line}")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;
    use std::path::Path;

    #[test]
    fn test_text_report() {
        let report = sample_report();
        let mut formatter = TextFormatter::new(Vec::new());
        formatter
            .format_run(&DocumentRun {
                input: Path::new("paper.txt"),
                output: Path::new("paper.reviewed.md"),
                report: &report,
            })
            .unwrap();
        formatter.finish().unwrap();

        let out = String::from_utf8(formatter.into_inner()).unwrap();
        assert_eq!(
            out,
            "paper.txt -> paper.reviewed.md\n\
             \x20 2 of 3 review items applied (1 exact, 1 fuzzy), 1 unmatched\n\
             \x20 NO_CANDIDATE_FOUND: 'Thermal expansion coefficients'\n"
        );
    }
}
