//! Core error types (deterministic only)

use thiserror::Error;

/// Core matching errors (no I/O, no external failures)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A review item whose match string is empty or whitespace-only
    #[error("match string is empty")]
    EmptyNeedle,

    /// A review item with neither a comment nor a revision
    #[error("review item for '{match_string}' has neither comment nor revision")]
    EmptyFeedback {
        /// The offending match string
        match_string: String,
    },

    /// A span that does not fit inside the normalized paragraph
    #[error("span {start}..{end} is out of bounds for text of length {len}")]
    SpanOutOfBounds {
        /// Span start (chars)
        start: usize,
        /// Span end (chars, exclusive)
        end: usize,
        /// Normalized text length (chars)
        len: usize,
    },

    /// Two plan entries overlap or are out of order
    #[error("plan entries overlap: previous span ends at {previous_end}, next starts at {next_start}")]
    OverlappingSpans {
        /// End of the earlier entry
        previous_end: usize,
        /// Start of the following entry
        next_start: usize,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
