//! File pattern resolution using glob

use crate::error::CliError;
use anyhow::{Context, Result};
use glob::glob;
use std::path::PathBuf;

/// Resolve file patterns to actual file paths
pub fn resolve_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let paths = glob(pattern).map_err(|_| CliError::InvalidPattern(pattern.clone()))?;

        for path_result in paths {
            let path =
                path_result.with_context(|| format!("Error resolving pattern: {}", pattern))?;

            if path.is_file() {
                files.push(path);
            }
        }
    }

    if files.is_empty() {
        return Err(CliError::FileNotFound(patterns.join(", ")).into());
    }

    // Remove duplicates and sort
    files.sort();
    files.dedup();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_glob_sorted_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.txt", "notes.md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let pattern = dir.path().join("*.txt").display().to_string();

        let files = resolve_patterns(&[pattern.clone(), pattern]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let pattern = dir.path().join("*").display().to_string();

        let err = resolve_patterns(&[pattern]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = resolve_patterns(&["[invalid".to_string()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidPattern(_))
        ));
    }
}
