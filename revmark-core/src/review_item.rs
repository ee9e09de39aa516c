//! Review items: one unit of feedback tied to a claimed location

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// One piece of reviewer feedback
///
/// Created by an upstream producer and consumed at most once by the
/// annotation pass. `section_type` is provenance only and never used for
/// matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Text the producer claims exists in the source
    #[serde(alias = "match_text")]
    pub match_string: String,
    /// Human-readable note
    #[serde(default)]
    pub comment: String,
    /// Proposed replacement text; `None` or blank means comment-only
    #[serde(default)]
    pub revision: Option<String>,
    /// Section the item came from (e.g. "Methods")
    #[serde(default)]
    pub section_type: String,
}

impl ReviewItem {
    /// Create a comment-only review item
    pub fn comment(match_string: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            match_string: match_string.into(),
            comment: comment.into(),
            revision: None,
            section_type: String::new(),
        }
    }

    /// Create a review item carrying a suggested revision
    pub fn revision(
        match_string: impl Into<String>,
        comment: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            match_string: match_string.into(),
            comment: comment.into(),
            revision: Some(revision.into()),
            section_type: String::new(),
        }
    }

    /// Tag the item with the section it came from
    pub fn with_section(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = section_type.into();
        self
    }

    /// The revision text, if it has any content
    pub fn revision_text(&self) -> Option<&str> {
        self.revision
            .as_deref()
            .filter(|revision| !revision.trim().is_empty())
    }

    /// Whether the item proposes replacement text
    pub fn has_revision(&self) -> bool {
        self.revision_text().is_some()
    }

    /// Check the item can be matched at all
    pub fn validate(&self) -> Result<()> {
        if self.match_string.trim().is_empty() {
            return Err(CoreError::EmptyNeedle);
        }
        if self.comment.trim().is_empty() && !self.has_revision() {
            return Err(CoreError::EmptyFeedback {
                match_string: self.match_string.clone(),
            });
        }
        Ok(())
    }
}

/// Shorten `text` to at most `max_chars` characters for log output
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
