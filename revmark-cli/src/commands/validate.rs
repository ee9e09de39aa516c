//! Validate command implementation

use crate::config::CliConfig;
use crate::input::FileReader;
use anyhow::Result;
use clap::{ArgGroup, Args};
use revmark_core::truncate_for_display;
use revmark_engine::ReviewItemParser;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .multiple(true)
        .args(["review", "config"])
))]
pub struct ValidateArgs {
    /// Review file to check
    #[arg(short, long, value_name = "FILE")]
    pub review: Option<PathBuf>,

    /// Configuration file to check
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> Result<()> {
        let config = match &self.config {
            Some(path) => {
                println!("Validating configuration: {}", path.display());
                match CliConfig::from_file(path) {
                    Ok(config) => {
                        println!("✓ Configuration is valid!");
                        println!("  Match threshold: {}", config.annotator.match_threshold);
                        println!("  Author: {}", config.annotator.annotation_author);
                        println!("  Document format: {}", config.output.document_format);
                        config
                    }
                    Err(e) => {
                        println!("✗ Configuration is invalid!");
                        println!("  Error: {e:#}");
                        return Err(anyhow::anyhow!("Validation failed: {e}"));
                    }
                }
            }
            None => CliConfig::default(),
        };

        if let Some(path) = &self.review {
            println!("Validating review file: {}", path.display());
            let raw = FileReader::read_text(path)?;
            let parsed = ReviewItemParser::new()
                .skip_reference_sections(config.annotator.skip_reference_sections)
                .parse_bundle(&raw);

            match parsed {
                Ok(bundle) => {
                    let invalid: Vec<_> = bundle
                        .items
                        .iter()
                        .filter_map(|item| item.validate().err().map(|e| (item, e)))
                        .collect();

                    println!("✓ Review file is readable!");
                    println!("  Review items: {}", bundle.items.len());
                    println!("  Skipped entries: {}", bundle.skipped.len());
                    for note in &bundle.skipped {
                        println!("    - {note}");
                    }
                    println!(
                        "  Summary preface: {}",
                        if bundle.summary.is_some() { "yes" } else { "no" }
                    );
                    let reported = invalid.len() + bundle.invalid.len();
                    if reported > 0 {
                        println!("  Items that will be reported INVALID_INPUT: {reported}");
                        for (item, e) in invalid {
                            println!("    - '{}': {e}", truncate_for_display(&item.match_string, 60));
                        }
                    }
                }
                Err(e) => {
                    println!("✗ Review file could not be parsed!");
                    println!("  Error: {e}");
                    return Err(anyhow::anyhow!("Validation failed: {e}"));
                }
            }
        }

        Ok(())
    }
}
