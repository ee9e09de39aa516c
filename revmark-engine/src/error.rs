//! Layered error types
//!
//! Document load/save failures are fatal and propagate to the caller.
//! Apply failures are caught per paragraph by the annotator and never abort a
//! run. Parse failures only surface for input that is not review data at all.

use revmark_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to rewrite one paragraph's runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Run text contains a character documents cannot store
    #[error("paragraph {paragraph}: run text contains illegal character {character:?}")]
    InvalidRunText {
        /// Paragraph index
        paragraph: usize,
        /// Offending character
        character: char,
    },

    /// A deleted, inserted or commented run would be empty
    #[error("paragraph {paragraph}: annotated run is empty")]
    EmptyAnnotatedRun {
        /// Paragraph index
        paragraph: usize,
    },

    /// Paragraph already carries tracked changes or comment anchors
    #[error("paragraph {paragraph} is already annotated")]
    AlreadyAnnotated {
        /// Paragraph index
        paragraph: usize,
    },

    /// Paragraph index past the end of the document
    #[error("paragraph {paragraph} out of range (document has {len})")]
    ParagraphOutOfRange {
        /// Requested paragraph
        paragraph: usize,
        /// Paragraph count
        len: usize,
    },
}

/// Failure to turn raw producer output into review items
#[derive(Error, Debug)]
pub enum ParseError {
    /// Neither JSON nor the block text format
    #[error("malformed review output: {0}")]
    Malformed(String),

    /// JSON that could not be decoded into the expected shape
    #[error("invalid review JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Document could not be read or decoded
    #[error("failed to load document {}: {reason}", .path.display())]
    DocumentLoad {
        /// Input path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Document could not be written
    #[error("failed to save document {}: {reason}", .path.display())]
    DocumentSave {
        /// Output path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Output path would overwrite the input
    #[error("refusing to overwrite input document {}", .path.display())]
    OutputIsInput {
        /// The shared path
        path: PathBuf,
    },

    /// Paragraph rewrite failed
    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    /// Review items could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Core algorithm error
    #[error("core algorithm error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
