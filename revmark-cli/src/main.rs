//! `revmark` binary

use anyhow::Result;
use clap::Parser;
use revmark_cli::commands::Commands;

/// Place LLM review feedback into a manuscript as tracked changes and comments
#[derive(Debug, Parser)]
#[command(name = "revmark", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.command.execute()
}
