//! Annotate command implementation

use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::{resolve_patterns, FileReader};
use crate::output::{DocumentRun, ReportFormat, ReportFormatter};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use revmark_core::RunReport;
use revmark_engine::{Annotator, AnnotatorConfig, DocumentFormat, ReviewBundle, ReviewItemParser};
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Arguments for the annotate command
#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Manuscripts to annotate (supports glob)
    #[arg(short, long, value_name = "FILE/PATTERN", required = true)]
    pub input: Vec<String>,

    /// Review feedback: JSON, fenced JSON, or MATCH:/COMMENT:/REVISION: blocks
    #[arg(short, long, value_name = "FILE")]
    pub review: PathBuf,

    /// Annotated document path (single input only; default: <stem>.<suffix>.<ext> beside the input)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Annotated document format
    #[arg(short, long, value_enum)]
    pub format: Option<DocumentFormatArg>,

    /// Report format
    #[arg(long, value_enum)]
    pub report_format: Option<ReportFormat>,

    /// Write the run report here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minimum fuzzy similarity, 0-100
    #[arg(short, long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Author recorded on tracked changes and comments
    #[arg(long, value_name = "NAME", env = "REVMARK_AUTHOR")]
    pub author: Option<String>,

    /// Fixed RFC 3339 timestamp for every annotation
    #[arg(long, value_name = "TIMESTAMP")]
    pub date: Option<String>,

    /// Keep review items aimed at the references section
    #[arg(long)]
    pub include_references: bool,

    /// Exit with an error when any review item is left unmatched
    #[arg(long)]
    pub fail_on_unmatched: bool,

    /// Worker threads for multi-document runs (default: one per CPU)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Writable document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentFormatArg {
    /// Markdown with CriticMarkup annotations
    Critic,
    /// Serialized document model
    Json,
}

impl From<DocumentFormatArg> for DocumentFormat {
    fn from(arg: DocumentFormatArg) -> Self {
        match arg {
            DocumentFormatArg::Critic => DocumentFormat::CriticMarkup,
            DocumentFormatArg::Json => DocumentFormat::Json,
        }
    }
}

/// `<stem>.<suffix>.<ext>` next to `input`
pub fn derive_output_path(input: &Path, suffix: &str, format: DocumentFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let extension = match format {
        DocumentFormat::Json => "json",
        DocumentFormat::PlainText => "txt",
        DocumentFormat::CriticMarkup => "md",
    };
    input.with_file_name(format!("{stem}.{suffix}.{extension}"))
}

impl AnnotateArgs {
    /// Execute the annotate command
    pub fn execute(&self) -> Result<()> {
        self.init_logging()?;

        log::info!("Starting annotation");
        log::debug!("Arguments: {:?}", self);

        let config = CliConfig::load(self.config.as_deref())?;
        let annotator_config = self.annotator_config(&config)?;
        let document_format = self.document_format(&config)?;
        let report_format = match self.report_format {
            Some(format) => format,
            None => ReportFormat::from_name(&config.output.report_format)
                .map_err(|e| CliError::ConfigError(e.to_string()))?,
        };

        let inputs = resolve_patterns(&self.input)?;
        if self.output.is_some() && inputs.len() > 1 {
            return Err(CliError::ConfigError(format!(
                "--output names one file but {} inputs matched",
                inputs.len()
            ))
            .into());
        }

        let bundle = self.load_bundle(&annotator_config)?;
        let annotator =
            Annotator::new(annotator_config).map_err(|e| CliError::ConfigError(e.to_string()))?;

        let outputs = self.output_paths(&inputs, &config, document_format)?;

        let mut progress = ProgressReporter::new(self.quiet);
        let mut failed = 0;
        let runs = if let [input] = inputs.as_slice() {
            let output = &outputs[0];
            log::info!("Annotating {} -> {}", input.display(), output.display());

            progress.init_paragraphs(&input.display().to_string(), 0);
            let report = annotator
                .annotate_file_with_progress(input, output, &bundle, document_format, |done, total| {
                    progress.update(done, total)
                })
                .with_context(|| format!("Failed to annotate {}", input.display()))?;
            progress.finish(&report.summary_line());
            vec![(input, output, report)]
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs.unwrap_or(0))
                .build()
                .context("Failed to start worker threads")?;
            log::info!(
                "Annotating {} documents on {} threads",
                inputs.len(),
                pool.current_num_threads()
            );

            progress.init_files(inputs.len() as u64);
            let results: Vec<Result<RunReport>> = pool.install(|| {
                inputs
                    .par_iter()
                    .zip(outputs.par_iter())
                    .map(|(input, output)| -> Result<RunReport> {
                        let report = annotator
                            .annotate_file(input, output, &bundle, document_format)
                            .with_context(|| format!("Failed to annotate {}", input.display()));
                        progress.file_completed(&input.display().to_string());
                        report
                    })
                    .collect()
            });
            progress.finish("Complete");

            let mut runs = Vec::with_capacity(results.len());
            for ((input, output), result) in inputs.iter().zip(&outputs).zip(results) {
                match result {
                    Ok(report) => runs.push((input, output, report)),
                    Err(e) => {
                        failed += 1;
                        eprintln!("Error: {e:#}");
                    }
                }
            }
            runs
        };

        let mut formatter = self.report_formatter(report_format, config.output.pretty_json)?;
        let mut unmatched = 0;
        for (input, output, report) in &runs {
            unmatched += report.unmatched().len();
            formatter.format_run(&DocumentRun {
                input: input.as_path(),
                output: output.as_path(),
                report,
            })?;
        }
        formatter.finish()?;

        if failed > 0 {
            return Err(CliError::DocumentsFailed {
                failed,
                total: inputs.len(),
            }
            .into());
        }
        if self.fail_on_unmatched && unmatched > 0 {
            return Err(CliError::UnmatchedItems(unmatched).into());
        }
        Ok(())
    }

    /// Output path per input; two inputs may not write the same file
    fn output_paths(
        &self,
        inputs: &[PathBuf],
        config: &CliConfig,
        format: DocumentFormat,
    ) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::with_capacity(inputs.len());
        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let output = self.output_path(input, config, format);
            if !seen.insert(output.clone()) {
                return Err(CliError::ConfigError(format!(
                    "more than one input would be written to {}",
                    output.display()
                ))
                .into());
            }
            outputs.push(output);
        }
        Ok(outputs)
    }

    fn output_path(&self, input: &Path, config: &CliConfig, format: DocumentFormat) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => derive_output_path(input, &config.output.suffix, format),
        }
    }

    /// Layer command-line overrides over the config file
    fn annotator_config(&self, config: &CliConfig) -> Result<AnnotatorConfig> {
        let mut builder = AnnotatorConfig::builder();
        if let Some(threshold) = self.threshold {
            builder = builder.match_threshold(threshold);
        }
        if let Some(author) = &self.author {
            builder = builder.annotation_author(author.clone());
        }
        if let Some(date) = &self.date {
            builder = builder.annotation_date(date.clone());
        }
        if self.include_references {
            builder = builder.skip_reference_sections(false);
        }
        if self.verbose > 0 {
            builder = builder.verbose(true);
        }

        builder
            .build_on(config.annotator.clone())
            .map_err(|e| CliError::ConfigError(e.to_string()).into())
    }

    fn document_format(&self, config: &CliConfig) -> Result<DocumentFormat> {
        let format = match self.format {
            Some(format) => format.into(),
            None => config
                .output
                .document_format
                .parse::<DocumentFormat>()
                .map_err(|e| CliError::ConfigError(e.to_string()))?,
        };
        if format == DocumentFormat::PlainText {
            return Err(CliError::ConfigError(
                "annotated documents cannot be written as plain text".to_string(),
            )
            .into());
        }
        Ok(format)
    }

    fn load_bundle(&self, config: &AnnotatorConfig) -> Result<ReviewBundle> {
        let raw = FileReader::read_text(&self.review)?;
        let bundle = ReviewItemParser::new()
            .skip_reference_sections(config.skip_reference_sections)
            .parse_bundle(&raw)
            .with_context(|| format!("Failed to parse review file: {}", self.review.display()))?;

        for note in &bundle.skipped {
            log::warn!("Skipped review entry: {note}");
        }
        log::info!(
            "Loaded {} review items from {}",
            bundle.items.len(),
            self.review.display()
        );
        Ok(bundle)
    }

    fn report_formatter(
        &self,
        format: ReportFormat,
        pretty_json: bool,
    ) -> Result<Box<dyn ReportFormatter>> {
        match &self.report {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create report file: {}", path.display()))?;
                Ok(format.formatter(file, pretty_json))
            }
            None => Ok(format.formatter(io::stdout(), pretty_json)),
        }
    }

    /// Initialize logging based on verbosity level
    fn init_logging(&self) -> Result<()> {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            // A logger may already be installed when commands run in-process
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(log_level),
            )
            .try_init();
        }

        Ok(())
    }
}
