//! JSON report formatter

use super::{DocumentRun, ReportFormatter};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// JSON formatter - collects every document run and writes one array on finish
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    runs: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct JsonRun<'a> {
    input: String,
    output: String,
    summary: String,
    complete: bool,
    report: &'a revmark_core::RunReport,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer,
            pretty,
            runs: Vec::new(),
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + Sync> ReportFormatter for JsonFormatter<W> {
    fn format_run(&mut self, run: &DocumentRun<'_>) -> Result<()> {
        let value = serde_json::to_value(JsonRun {
            input: run.input.display().to_string(),
            output: run.output.display().to_string(),
            summary: run.report.summary_line(),
            complete: run.report.is_complete(),
            report: run.report,
        })?;
        self.runs.push(value);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &self.runs)?;
        } else {
            serde_json::to_writer(&mut self.writer, &self.runs)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
