//! Loading and saving documents
//!
//! Saves go through a temporary file in the destination directory that is
//! persisted over the target only once fully written, so a failed run never
//! leaves a partial output behind.

use crate::document::Document;
use crate::error::{EngineError, Result};
use crate::render::render_critic_markup;
use log::{debug, info};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;

/// On-disk document encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Serialized document model
    Json,
    /// Plain text, paragraphs separated by blank lines (load only)
    PlainText,
    /// Markdown with CriticMarkup annotations (save only)
    CriticMarkup,
}

impl DocumentFormat {
    /// Format used to read `path`, chosen by extension
    pub fn for_input(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::PlainText,
        }
    }

    /// Format used to write `path`, chosen by extension
    pub fn for_output(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::CriticMarkup,
        }
    }

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::PlainText => "text",
            DocumentFormat::CriticMarkup => "critic",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "text" | "txt" | "plain" => Ok(DocumentFormat::PlainText),
            "critic" | "criticmarkup" | "markdown" | "md" => Ok(DocumentFormat::CriticMarkup),
            other => Err(EngineError::Config(format!("unknown document format '{other}'"))),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Read a document, choosing the decoder by file extension
pub fn load_document(path: &Path) -> Result<Document> {
    let load_error = |reason: String| EngineError::DocumentLoad {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let format = DocumentFormat::for_input(path);
    debug!("Loading {} as {}", path.display(), format);

    let document = match format {
        DocumentFormat::Json => {
            serde_json::from_str(&text).map_err(|e| load_error(e.to_string()))?
        }
        _ => Document::from_plain_text(&text),
    };

    info!(
        "Loaded {} paragraphs from {}",
        document.len(),
        path.display()
    );
    Ok(document)
}

/// Encode a document in the given format
pub fn encode_document(document: &Document, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|e| EngineError::Config(format!("cannot encode document: {e}"))),
        DocumentFormat::CriticMarkup => Ok(render_critic_markup(document)),
        DocumentFormat::PlainText => Err(EngineError::Config(
            "plain text is an input-only format".into(),
        )),
    }
}

/// Write a document atomically
pub fn save_document(document: &Document, path: &Path, format: DocumentFormat) -> Result<()> {
    let save_error = |reason: String| EngineError::DocumentSave {
        path: path.to_path_buf(),
        reason,
    };

    let encoded = encode_document(document, format).map_err(|e| save_error(e.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| save_error(e.to_string()))?;
    temp.write_all(encoded.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|e| save_error(e.to_string()))?;
    temp.persist(path).map_err(|e| save_error(e.error.to_string()))?;

    info!("Saved {} as {}", path.display(), format);
    Ok(())
}

/// Fail when `output` names the same file as `input`
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    if resolve(input) == resolve(output) {
        return Err(EngineError::OutputIsInput {
            path: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Best-effort absolute path, also for files that do not exist yet
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
