//! Generate config command implementation

use crate::config::OutputConfig;
use anyhow::{Context, Result};
use clap::Args;
use revmark_engine::AnnotatorConfig;
use std::path::PathBuf;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = "revmark.toml")]
    pub output: PathBuf,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        use std::fs;

        println!("Generating configuration template...");
        println!("  Output file: {}", self.output.display());

        let template = generate_template();

        fs::write(&self.output, template)
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("✓ Configuration template generated successfully!");
        println!();
        println!("Next steps:");
        println!("1. Edit the thresholds and author to taste");
        println!("2. Validate your configuration:");
        println!("   revmark validate --config {}", self.output.display());
        println!("3. Use it for annotation:");
        println!(
            "   revmark annotate -i paper.txt -r review.json --config {}",
            self.output.display()
        );

        Ok(())
    }
}

/// Template content, filled with the current defaults
fn generate_template() -> String {
    let annotator = AnnotatorConfig::default();
    let output = OutputConfig::default();

    format!(
        r#"# revmark configuration

[annotator]
# Minimum fuzzy similarity (0-100) for a paraphrased match to be accepted
match_threshold = {threshold}

# Match strings shorter than this (in characters) must match exactly
min_fuzzy_length = {min_fuzzy_length}

# Characters added to the match string length when sizing fuzzy windows
window_padding = {window_padding}

# Share (0-1) of match string words a fuzzy window must contain to be scored
min_needle_coverage = {min_needle_coverage}

# Recorded on every tracked change and comment
annotation_author = "{author}"
author_initials = "{initials}"

# Pin every annotation to one RFC 3339 timestamp (default: time of the run)
# annotation_date = "2024-05-01T12:00:00Z"

# Log every placed match with its context at info level
verbose = {verbose}

# Drop review items aimed at the references or bibliography section
skip_reference_sections = {skip_references}

[output]
# Annotated document format: "critic" (Markdown with CriticMarkup) or "json"
document_format = "{document_format}"

# Run report format: "text", "json" or "markdown"
report_format = "{report_format}"

# Derived output names look like paper.{suffix}.md
suffix = "{suffix}"

# Pretty print JSON reports
pretty_json = {pretty_json}
"#,
        threshold = annotator.match_threshold,
        min_fuzzy_length = annotator.min_fuzzy_length,
        window_padding = annotator.window_padding,
        min_needle_coverage = annotator.min_needle_coverage,
        author = annotator.annotation_author,
        initials = annotator.author_initials,
        verbose = annotator.verbose,
        skip_references = annotator.skip_reference_sections,
        document_format = output.document_format,
        report_format = output.report_format,
        suffix = output.suffix,
        pretty_json = output.pretty_json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use tempfile::TempDir;

    #[test]
    fn test_template_round_trips_to_defaults() {
        let config = CliConfig::from_toml_str(&generate_template()).unwrap();
        assert_eq!(config.annotator, AnnotatorConfig::default());
        assert_eq!(config.output.suffix, "reviewed");
    }

    #[test]
    fn test_execute_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("revmark.toml");

        let args = GenerateConfigArgs {
            output: output.clone(),
        };
        args.execute().unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("[annotator]"));
        assert!(content.contains("match_threshold = 90"));
        assert!(content.contains("min_needle_coverage = 0.5"));
        assert!(content.contains("[output]"));
    }

    #[test]
    fn test_execute_unwritable_path() {
        let args = GenerateConfigArgs {
            output: PathBuf::from("/nonexistent/dir/revmark.toml"),
        };
        let err = args.execute().unwrap_err();
        assert!(err.to_string().contains("Failed to write to"));
    }
}
