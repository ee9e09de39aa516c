//! Configuration module
//!
//! `revmark.toml` carries an `[annotator]` table (the engine's
//! [`AnnotatorConfig`]) and an `[output]` table for CLI defaults.

use crate::error::CliError;
use anyhow::{Context, Result};
use revmark_engine::AnnotatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// CLI configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CliConfig {
    /// Matching and authorship settings
    #[serde(default)]
    pub annotator: AnnotatorConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format of the annotated document ("critic" or "json")
    pub document_format: String,

    /// Format of the run report ("text", "json" or "markdown")
    pub report_format: String,

    /// Inserted before the extension of derived output names
    pub suffix: String,

    /// Pretty print JSON output
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            document_format: "critic".to_string(),
            report_format: "text".to_string(),
            suffix: "reviewed".to_string(),
            pretty_json: true,
        }
    }
}

impl CliConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CliConfig = toml::from_str(text).context("Failed to parse configuration")?;
        config
            .annotator
            .validate()
            .map_err(|e| CliError::ConfigError(e.to_string()))?;
        if config.output.suffix.trim().is_empty() {
            return Err(CliError::ConfigError("output.suffix must not be empty".into()).into());
        }
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
