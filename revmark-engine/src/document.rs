//! In-memory document model with tracked changes and comments
//!
//! A document is a list of paragraphs, each a list of runs. A run is plain
//! text, a tracked insertion or deletion, and may point at a comment. The
//! model mirrors what word processors store, without any layout.

use crate::error::ApplyError;
use revmark_core::{Segment, SegmentKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a comment within one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u32);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracked change type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Proposed new text
    Insertion,
    /// Original text proposed for removal
    Deletion,
}

/// Authorship of a tracked change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedChange {
    /// Insertion or deletion
    pub kind: ChangeKind,
    /// Author tag
    pub author: String,
    /// RFC 3339 timestamp
    pub date: String,
}

/// A contiguous piece of paragraph text with uniform annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run text
    pub text: String,
    /// Tracked change, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<TrackedChange>,
    /// Comment anchored on this run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentId>,
}

impl Run {
    /// Plain, unannotated text
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            change: None,
            comment: None,
        }
    }

    /// Whether this run is a tracked deletion
    pub fn is_deletion(&self) -> bool {
        matches!(&self.change, Some(change) if change.kind == ChangeKind::Deletion)
    }

    /// Whether this run is a tracked insertion
    pub fn is_insertion(&self) -> bool {
        matches!(&self.change, Some(change) if change.kind == ChangeKind::Insertion)
    }
}

/// A paragraph: an optional style name and its runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph style (e.g. "Heading1", "ListBullet")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Runs in reading order
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Unstyled paragraph holding one plain run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            style: None,
            runs: vec![Run::plain(text)],
        }
    }

    /// Styled paragraph holding one plain run
    pub fn styled(style: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            style: Some(style.into()),
            runs: vec![Run::plain(text)],
        }
    }

    /// Original text: every run that is not a tracked change
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .filter(|run| run.change.is_none())
            .map(|run| run.text.as_str())
            .collect()
    }

    /// Whether any run already carries a tracked change or a comment anchor
    ///
    /// Annotated paragraphs are never rewritten, so earlier comments keep
    /// their anchors.
    pub fn is_annotated(&self) -> bool {
        self.runs
            .iter()
            .any(|run| run.change.is_some() || run.comment.is_some())
    }
}

/// A comment attached to one or more runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier referenced by runs
    pub id: CommentId,
    /// Author tag
    pub author: String,
    /// Author initials
    pub initials: String,
    /// RFC 3339 timestamp
    pub date: String,
    /// Comment body
    pub text: String,
}

/// Document-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Whether edits are recorded as tracked changes
    #[serde(default)]
    pub track_revisions: bool,
}

/// Author, initials and date applied to every annotation in one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationStamp {
    /// Author tag
    pub author: String,
    /// Comment initials
    pub initials: String,
    /// RFC 3339 timestamp
    pub date: String,
}

impl AnnotationStamp {
    /// Create a stamp
    pub fn new(
        author: impl Into<String>,
        initials: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            initials: initials.into(),
            date: date.into(),
        }
    }

    fn change(&self, kind: ChangeKind) -> TrackedChange {
        TrackedChange {
            kind,
            author: self.author.clone(),
            date: self.date.clone(),
        }
    }
}

/// A complete document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document settings
    #[serde(default)]
    pub settings: DocumentSettings,
    /// Paragraphs in reading order
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    /// Comments referenced by runs
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Document {
    /// Document made of the given paragraphs
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            ..Self::default()
        }
    }

    /// Split plain text into paragraphs on blank lines
    ///
    /// Single newlines inside a paragraph are kept verbatim.
    pub fn from_plain_text(text: &str) -> Self {
        let mut paragraphs = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(Paragraph::new(current.join("\n")));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            paragraphs.push(Paragraph::new(current.join("\n")));
        }

        Self::from_paragraphs(paragraphs)
    }

    /// Turn on revision tracking; returns whether anything changed
    pub fn enable_track_changes(&mut self) -> bool {
        let changed = !self.settings.track_revisions;
        self.settings.track_revisions = true;
        changed
    }

    /// Number of paragraphs
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether the document has no paragraphs
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Look up a comment by id
    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    /// Insert paragraphs before the first existing one
    pub fn prepend_paragraphs(&mut self, paragraphs: Vec<Paragraph>) {
        self.paragraphs.splice(0..0, paragraphs);
    }

    fn next_comment_id(&self) -> u32 {
        self.comments
            .iter()
            .map(|comment| comment.id.0 + 1)
            .max()
            .unwrap_or(0)
    }

    /// Replace one paragraph's runs with the given segments
    ///
    /// Everything is validated before the document is touched; on error the
    /// paragraph and the comment list are left exactly as they were. A
    /// paragraph that is already annotated is refused.
    pub fn apply_segments(
        &mut self,
        paragraph: usize,
        segments: &[Segment],
        stamp: &AnnotationStamp,
    ) -> Result<(), ApplyError> {
        if paragraph >= self.paragraphs.len() {
            return Err(ApplyError::ParagraphOutOfRange {
                paragraph,
                len: self.paragraphs.len(),
            });
        }
        if self.paragraphs[paragraph].is_annotated() {
            return Err(ApplyError::AlreadyAnnotated { paragraph });
        }

        for segment in segments {
            if segment.kind != SegmentKind::Unchanged && segment.text.is_empty() {
                return Err(ApplyError::EmptyAnnotatedRun { paragraph });
            }
            let texts = std::iter::once(segment.text.as_str()).chain(segment.comment.as_deref());
            for text in texts {
                if let Some(character) = text.chars().find(|&ch| !is_storable(ch)) {
                    return Err(ApplyError::InvalidRunText {
                        paragraph,
                        character,
                    });
                }
            }
        }

        let mut next_id = self.next_comment_id();
        let mut runs = Vec::with_capacity(segments.len());
        let mut comments = Vec::new();

        for segment in segments.iter().filter(|segment| !segment.text.is_empty()) {
            let comment = segment.comment.as_ref().map(|text| {
                let id = CommentId(next_id);
                next_id += 1;
                comments.push(Comment {
                    id,
                    author: stamp.author.clone(),
                    initials: stamp.initials.clone(),
                    date: stamp.date.clone(),
                    text: text.clone(),
                });
                id
            });

            let change = match segment.kind {
                SegmentKind::Unchanged | SegmentKind::Commented => None,
                SegmentKind::Deleted => Some(stamp.change(ChangeKind::Deletion)),
                SegmentKind::Inserted => Some(stamp.change(ChangeKind::Insertion)),
            };

            runs.push(Run {
                text: segment.text.clone(),
                change,
                comment,
            });
        }

        self.paragraphs[paragraph].runs = runs;
        self.comments.extend(comments);
        Ok(())
    }
}

/// Characters allowed in XML 1.0 document text
fn is_storable(ch: char) -> bool {
    !matches!(
        ch,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> AnnotationStamp {
        AnnotationStamp::new("AIPI", "AI", "2024-05-01T12:00:00Z")
    }

    fn deleted(text: &str, comment: &str, item: usize) -> Segment {
        Segment {
            kind: SegmentKind::Deleted,
            text: text.to_string(),
            comment: Some(comment.to_string()),
            item_index: Some(item),
        }
    }

    fn inserted(text: &str, item: usize) -> Segment {
        Segment {
            kind: SegmentKind::Inserted,
            text: text.to_string(),
            comment: None,
            item_index: Some(item),
        }
    }

    #[test]
    fn test_enable_track_changes_is_idempotent() {
        let mut doc = Document::default();
        assert!(doc.enable_track_changes());
        assert!(!doc.enable_track_changes());
        assert!(doc.settings.track_revisions);
    }

    #[test]
    fn test_from_plain_text() {
        let doc = Document::from_plain_text("Title\n\nFirst line\nsecond line\n\n\n  \nLast.\n");
        let texts: Vec<String> = doc.paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["Title", "First line\nsecond line", "Last."]);
    }

    #[test]
    fn test_apply_segments_builds_runs_and_comments() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("A B C")]);
        let segments = vec![
            Segment::unchanged("A "),
            deleted("B", "Use X", 0),
            inserted("X", 0),
            Segment::unchanged(" C"),
        ];

        doc.apply_segments(0, &segments, &stamp()).unwrap();

        let runs = &doc.paragraphs[0].runs;
        assert_eq!(runs.len(), 4);
        assert!(runs[1].is_deletion());
        assert!(runs[2].is_insertion());
        assert_eq!(runs[1].comment, Some(CommentId(0)));
        assert_eq!(runs[2].change.as_ref().unwrap().author, "AIPI");
        assert_eq!(doc.comments.len(), 1);
        assert_eq!(doc.comment(CommentId(0)).unwrap().text, "Use X");
        assert_eq!(doc.comment(CommentId(0)).unwrap().initials, "AI");

        // Tracked runs are not part of the original text
        assert_eq!(doc.paragraphs[0].text(), "A  C");
        assert!(doc.paragraphs[0].is_annotated());
    }

    #[test]
    fn test_comment_only_paragraph_counts_as_annotated() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("A B C")]);
        let commented = Segment {
            kind: SegmentKind::Commented,
            text: "B".to_string(),
            comment: Some("Why B?".to_string()),
            item_index: Some(0),
        };
        doc.apply_segments(
            0,
            &[Segment::unchanged("A "), commented, Segment::unchanged(" C")],
            &stamp(),
        )
        .unwrap();
        assert!(doc.paragraphs[0].is_annotated());

        let before = doc.clone();
        let err = doc
            .apply_segments(0, &[deleted("A", "again", 1), inserted("Z", 1)], &stamp())
            .unwrap_err();
        assert_eq!(err, ApplyError::AlreadyAnnotated { paragraph: 0 });
        assert_eq!(doc, before);
    }

    #[test]
    fn test_comment_ids_continue_after_existing() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("one"), Paragraph::new("two")]);
        doc.apply_segments(0, &[deleted("one", "first", 0), inserted("1", 0)], &stamp())
            .unwrap();
        doc.apply_segments(1, &[deleted("two", "second", 1), inserted("2", 1)], &stamp())
            .unwrap();

        assert_eq!(doc.paragraphs[1].runs[0].comment, Some(CommentId(1)));
        assert_eq!(doc.comments.len(), 2);
    }

    #[test]
    fn test_invalid_text_leaves_document_untouched() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("A B C")]);
        let before = doc.clone();
        let segments = vec![
            Segment::unchanged("A "),
            deleted("B", "note", 0),
            inserted("X\u{0}", 0),
            Segment::unchanged(" C"),
        ];

        let err = doc.apply_segments(0, &segments, &stamp()).unwrap_err();
        assert_eq!(
            err,
            ApplyError::InvalidRunText {
                paragraph: 0,
                character: '\u{0}'
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_empty_annotated_run_rejected() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("A")]);
        let err = doc
            .apply_segments(0, &[deleted("A", "note", 0), inserted("", 0)], &stamp())
            .unwrap_err();
        assert_eq!(err, ApplyError::EmptyAnnotatedRun { paragraph: 0 });
    }

    #[test]
    fn test_paragraph_out_of_range() {
        let mut doc = Document::default();
        assert_eq!(
            doc.apply_segments(2, &[], &stamp()).unwrap_err(),
            ApplyError::ParagraphOutOfRange { paragraph: 2, len: 0 }
        );
    }

    #[test]
    fn test_prepend_paragraphs() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("body")]);
        doc.prepend_paragraphs(vec![
            Paragraph::styled("Heading1", "Summary"),
            Paragraph::new("text"),
        ]);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.paragraphs[0].style.as_deref(), Some("Heading1"));
        assert_eq!(doc.paragraphs[2].text(), "body");
    }

    #[test]
    fn test_storable_characters() {
        assert!(is_storable('\t'));
        assert!(is_storable('\n'));
        assert!(is_storable('σ'));
        assert!(!is_storable('\u{1}'));
        assert!(!is_storable('\u{FFFF}'));
    }
}
