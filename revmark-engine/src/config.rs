//! Configuration for an annotation pass

use crate::error::{EngineError, Result};
use revmark_core::locator::defaults as locator_defaults;
use revmark_core::LocatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration constants
pub mod defaults {
    /// Author recorded on every tracked change and comment
    pub const ANNOTATION_AUTHOR: &str = "AIPI";

    /// Initials recorded on every comment
    pub const AUTHOR_INITIALS: &str = "AI";

    /// Threshold used by [`super::AnnotatorConfig::strict`]
    pub const STRICT_THRESHOLD: f64 = 95.0;

    /// Threshold used by [`super::AnnotatorConfig::lenient`]
    pub const LENIENT_THRESHOLD: f64 = 80.0;
}

/// Annotator configuration
///
/// Passed to the annotator at construction; there is no process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Fuzzy similarity floor, 0–100
    pub match_threshold: f64,
    /// Shortest normalized match string (chars) eligible for fuzzy matching
    pub min_fuzzy_length: usize,
    /// Chars added to the needle length when sizing fuzzy windows
    pub window_padding: usize,
    /// Share of match-string tokens a fuzzy window must contain, 0–1
    pub min_needle_coverage: f64,
    /// Author tag on tracked changes and comments
    pub annotation_author: String,
    /// Initials on comments
    pub author_initials: String,
    /// Fixed RFC 3339 timestamp for every annotation (None = run start time)
    pub annotation_date: Option<String>,
    /// Log every match with its confidence and context at info level
    pub verbose: bool,
    /// Drop items that target references/bibliography sections
    pub skip_reference_sections: bool,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            match_threshold: locator_defaults::MATCH_THRESHOLD,
            min_fuzzy_length: locator_defaults::MIN_FUZZY_LENGTH,
            window_padding: locator_defaults::WINDOW_PADDING,
            min_needle_coverage: locator_defaults::MIN_NEEDLE_COVERAGE,
            annotation_author: defaults::ANNOTATION_AUTHOR.to_string(),
            author_initials: defaults::AUTHOR_INITIALS.to_string(),
            annotation_date: None,
            verbose: false,
            skip_reference_sections: true,
        }
    }
}

impl AnnotatorConfig {
    /// Create a configuration builder
    pub fn builder() -> AnnotatorConfigBuilder {
        AnnotatorConfigBuilder::default()
    }

    /// Only near-verbatim paraphrases are accepted
    pub fn strict() -> Self {
        Self {
            match_threshold: defaults::STRICT_THRESHOLD,
            ..Self::default()
        }
    }

    /// Looser paraphrases are accepted
    pub fn lenient() -> Self {
        Self {
            match_threshold: defaults::LENIENT_THRESHOLD,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Locator tuning derived from this configuration
    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            match_threshold: self.match_threshold,
            min_fuzzy_length: self.min_fuzzy_length,
            window_padding: self.window_padding,
            min_needle_coverage: self.min_needle_coverage,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.match_threshold) {
            return Err(EngineError::Config(format!(
                "match_threshold must be within 0..=100, got {}",
                self.match_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.min_needle_coverage) {
            return Err(EngineError::Config(format!(
                "min_needle_coverage must be within 0..=1, got {}",
                self.min_needle_coverage
            )));
        }

        if self.min_fuzzy_length == 0 {
            return Err(EngineError::Config(
                "min_fuzzy_length must be greater than 0".into(),
            ));
        }

        if self.annotation_author.trim().is_empty() {
            return Err(EngineError::Config(
                "annotation_author must not be empty".into(),
            ));
        }

        if let Some(date) = &self.annotation_date {
            chrono::DateTime::parse_from_rfc3339(date).map_err(|e| {
                EngineError::Config(format!("annotation_date '{date}' is not RFC 3339: {e}"))
            })?;
        }

        Ok(())
    }
}

/// Fluent builder for [`AnnotatorConfig`]
#[derive(Debug, Default)]
pub struct AnnotatorConfigBuilder {
    match_threshold: Option<f64>,
    min_fuzzy_length: Option<usize>,
    window_padding: Option<usize>,
    min_needle_coverage: Option<f64>,
    annotation_author: Option<String>,
    author_initials: Option<String>,
    annotation_date: Option<String>,
    verbose: Option<bool>,
    skip_reference_sections: Option<bool>,
}

impl AnnotatorConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fuzzy similarity floor (0–100)
    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = Some(threshold);
        self
    }

    /// Set the shortest needle eligible for fuzzy matching
    pub fn min_fuzzy_length(mut self, chars: usize) -> Self {
        self.min_fuzzy_length = Some(chars);
        self
    }

    /// Set the fuzzy window padding
    pub fn window_padding(mut self, chars: usize) -> Self {
        self.window_padding = Some(chars);
        self
    }

    /// Set the share of match-string tokens a fuzzy window must contain
    pub fn min_needle_coverage(mut self, share: f64) -> Self {
        self.min_needle_coverage = Some(share);
        self
    }

    /// Set the annotation author
    pub fn annotation_author(mut self, author: impl Into<String>) -> Self {
        self.annotation_author = Some(author.into());
        self
    }

    /// Set the comment initials
    pub fn author_initials(mut self, initials: impl Into<String>) -> Self {
        self.author_initials = Some(initials.into());
        self
    }

    /// Pin every annotation to one RFC 3339 timestamp
    pub fn annotation_date(mut self, date: impl Into<String>) -> Self {
        self.annotation_date = Some(date.into());
        self
    }

    /// Enable per-match tracing
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Toggle dropping of references-section items
    pub fn skip_reference_sections(mut self, skip: bool) -> Self {
        self.skip_reference_sections = Some(skip);
        self
    }

    /// Start from an existing configuration instead of the defaults
    pub fn build_on(self, mut config: AnnotatorConfig) -> Result<AnnotatorConfig> {
        if let Some(threshold) = self.match_threshold {
            config.match_threshold = threshold;
        }
        if let Some(chars) = self.min_fuzzy_length {
            config.min_fuzzy_length = chars;
        }
        if let Some(chars) = self.window_padding {
            config.window_padding = chars;
        }
        if let Some(share) = self.min_needle_coverage {
            config.min_needle_coverage = share;
        }
        if let Some(author) = self.annotation_author {
            config.annotation_author = author;
        }
        if let Some(initials) = self.author_initials {
            config.author_initials = initials;
        }
        if self.annotation_date.is_some() {
            config.annotation_date = self.annotation_date;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(skip) = self.skip_reference_sections {
            config.skip_reference_sections = skip;
        }

        config.validate()?;
        Ok(config)
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnnotatorConfig> {
        self.build_on(AnnotatorConfig::default())
    }
}
