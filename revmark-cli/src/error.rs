//! Error handling for the CLI application

use std::fmt;

/// Custom error type for CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// File not found or inaccessible
    FileNotFound(String),
    /// Invalid file pattern
    InvalidPattern(String),
    /// Configuration error
    ConfigError(String),
    /// Review items left unmatched while `--fail-on-unmatched` is set
    UnmatchedItems(usize),
    /// Some documents of a batch could not be annotated
    DocumentsFailed {
        /// Documents that failed
        failed: usize,
        /// Documents in the batch
        total: usize,
    },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::FileNotFound(path) => write!(f, "File not found: {path}"),
            CliError::InvalidPattern(pattern) => write!(f, "Invalid file pattern: {pattern}"),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            CliError::UnmatchedItems(count) => {
                write!(f, "{count} review item(s) could not be placed")
            }
            CliError::DocumentsFailed { failed, total } => {
                write!(f, "{failed} of {total} document(s) could not be annotated")
            }
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error_display() {
        let error = CliError::FileNotFound("review.json".to_string());
        assert_eq!(error.to_string(), "File not found: review.json");
    }

    #[test]
    fn test_invalid_pattern_error_display() {
        let error = CliError::InvalidPattern("[invalid".to_string());
        assert_eq!(error.to_string(), "Invalid file pattern: [invalid");
    }

    #[test]
    fn test_config_error_display() {
        let error = CliError::ConfigError("match_threshold out of range".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: match_threshold out of range"
        );
    }

    #[test]
    fn test_unmatched_items_display() {
        let error = CliError::UnmatchedItems(3);
        assert_eq!(error.to_string(), "3 review item(s) could not be placed");
    }

    #[test]
    fn test_documents_failed_display() {
        let error = CliError::DocumentsFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(error.to_string(), "1 of 3 document(s) could not be annotated");
    }

    #[test]
    fn test_error_converts_into_anyhow() {
        fn fails() -> CliResult<()> {
            Err(CliError::UnmatchedItems(1).into())
        }

        let err = fails().unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }
}
