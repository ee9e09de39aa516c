//! CLI command implementations

use anyhow::Result;
use clap::Subcommand;
use revmark_core::UnmatchedReason;

pub mod annotate;
pub mod generate_config;
pub mod validate;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Place review feedback into manuscripts as tracked changes and comments
    Annotate(annotate::AnnotateArgs),

    /// Check a review file or configuration without annotating anything
    Validate(validate::ValidateArgs),

    /// Write a configuration template
    GenerateConfig(generate_config::GenerateConfigArgs),

    /// List available components
    List {
        #[command(subcommand)]
        subcommand: ListCommands,
    },
}

/// List subcommands
#[derive(Debug, Subcommand)]
pub enum ListCommands {
    /// List document and report formats
    Formats,

    /// List the reasons an item can end up unmatched
    Reasons,
}

impl Commands {
    /// Run the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Annotate(args) => args.execute(),
            Commands::Validate(args) => args.execute(),
            Commands::GenerateConfig(args) => args.execute(),
            Commands::List { subcommand } => {
                print!("{}", subcommand.render());
                Ok(())
            }
        }
    }
}

impl ListCommands {
    fn render(&self) -> String {
        match self {
            ListCommands::Formats => [
                "Input documents:",
                "  json    serialized document model (*.json)",
                "  text    plain text, paragraphs separated by blank lines (any other extension)",
                "Annotated documents (--format):",
                "  critic  Markdown with CriticMarkup annotations",
                "  json    serialized document model",
                "Reports (--report-format):",
                "  text      summary line and unmatched items",
                "  json      full report",
                "  markdown  tables",
                "",
            ]
            .join("\n"),
            ListCommands::Reasons => {
                let reasons = [
                    (UnmatchedReason::NoCandidateFound, "no paragraph contained the match string"),
                    (
                        UnmatchedReason::LostToConflictEverywhere,
                        "every location overlapped a stronger match",
                    ),
                    (UnmatchedReason::ApplyFailed, "the paragraph could not be rewritten"),
                    (UnmatchedReason::InvalidInput, "empty match string or no feedback"),
                ];
                reasons
                    .iter()
                    .map(|(reason, meaning)| format!("{:<28}{meaning}\n", reason.code()))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_commands_variants() {
        let formats = ListCommands::Formats;
        let debug_str = format!("{:?}", formats);
        assert!(debug_str.contains("Formats"));

        let reasons = ListCommands::Reasons;
        let debug_str = format!("{:?}", reasons);
        assert!(debug_str.contains("Reasons"));
    }

    #[test]
    fn test_formats_listing() {
        let listing = ListCommands::Formats.render();
        assert!(listing.contains("critic"));
        assert!(listing.contains("markdown"));
    }

    #[test]
    fn test_reasons_listing() {
        let listing = ListCommands::Reasons.render();
        assert_eq!(listing.lines().count(), 4);
        assert!(listing.starts_with("NO_CANDIDATE_FOUND"));
        assert!(listing.contains("LOST_TO_CONFLICT_EVERYWHERE"));
    }
}
