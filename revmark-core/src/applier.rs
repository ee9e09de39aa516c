//! Turning a paragraph plan into an ordered segment sequence
//!
//! Segment text is always cut from the raw paragraph, so unchanged text keeps
//! its original whitespace. Concatenating every segment except insertions
//! reproduces the raw paragraph exactly.

use crate::error::{CoreError, Result};
use crate::locator::{MatchCandidate, MatchKind};
use crate::normalize::NormalizedText;
use crate::resolver::ParagraphAnnotationPlan;
use serde::{Deserialize, Serialize};

/// What a segment represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentKind {
    /// Original text, untouched
    Unchanged,
    /// Original text proposed for removal, carrying the comment
    Deleted,
    /// Proposed replacement text
    Inserted,
    /// Original text kept, with a comment attached
    Commented,
}

/// A piece of rewritten paragraph content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment role
    pub kind: SegmentKind,
    /// Segment text
    pub text: String,
    /// Attached comment, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Review item that produced this segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
}

impl Segment {
    /// Untouched original text
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Unchanged,
            text: text.into(),
            comment: None,
            item_index: None,
        }
    }

    fn annotated(kind: SegmentKind, text: &str, comment: Option<String>, item_index: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            comment,
            item_index: Some(item_index),
        }
    }

    /// Whether this segment belongs to the original text
    pub fn is_original(&self) -> bool {
        self.kind != SegmentKind::Inserted
    }
}

/// Render the comment attached to a matched span
///
/// Revisions always carry the confidence suffix; comment-only spans carry it
/// for fuzzy matches only.
pub fn format_comment(candidate: &MatchCandidate<'_>) -> String {
    let comment = candidate.item.comment.trim();
    let with_suffix = candidate.item.has_revision() || candidate.kind() == MatchKind::Fuzzy;
    if !with_suffix {
        return comment.to_string();
    }

    let suffix = format!("(Match confidence: {}%)", candidate.span.confidence_percent());
    if comment.is_empty() {
        format!("Suggested revision {suffix}")
    } else {
        format!("{comment} {suffix}")
    }
}

/// Rewrites paragraph text according to a plan
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationApplier;

impl AnnotationApplier {
    /// Create an applier
    pub fn new() -> Self {
        Self
    }

    /// Produce the segment sequence for `text` under `plan`
    pub fn apply(
        &self,
        text: &NormalizedText<'_>,
        plan: &ParagraphAnnotationPlan<'_>,
    ) -> Result<Vec<Segment>> {
        let len = text.char_len();
        let mut segments = Vec::with_capacity(plan.len() * 3 + 1);
        let mut cursor = 0usize;

        for entry in plan.entries() {
            let (start, end) = (entry.start(), entry.end());
            if start >= end || end > len {
                return Err(CoreError::SpanOutOfBounds { start, end, len });
            }
            if start < cursor {
                return Err(CoreError::OverlappingSpans {
                    previous_end: cursor,
                    next_start: start,
                });
            }

            // Raw text between spans, including any whitespace around them
            let gap_end = text.raw_start(start);
            let gap_start = if cursor == 0 { 0 } else { text.raw_end(cursor) };
            if gap_end > gap_start {
                segments.push(Segment::unchanged(&text.raw()[gap_start..gap_end]));
            }

            let matched = text.raw_slice(start, end);
            let comment = format_comment(entry);

            match entry.item.revision_text() {
                Some(revision) => {
                    segments.push(Segment::annotated(
                        SegmentKind::Deleted,
                        matched,
                        Some(comment),
                        entry.item_index,
                    ));
                    segments.push(Segment::annotated(
                        SegmentKind::Inserted,
                        revision,
                        None,
                        entry.item_index,
                    ));
                }
                None => segments.push(Segment::annotated(
                    SegmentKind::Commented,
                    matched,
                    Some(comment),
                    entry.item_index,
                )),
            }

            cursor = end;
        }

        let tail_start = if cursor == 0 { 0 } else { text.raw_end(cursor) };
        if tail_start < text.raw().len() {
            segments.push(Segment::unchanged(&text.raw()[tail_start..]));
        }

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::MatchSpan;
    use crate::review_item::ReviewItem;

    fn exact(start: usize, end: usize) -> MatchSpan {
        MatchSpan {
            start,
            end,
            confidence: 1.0,
            kind: MatchKind::Exact,
        }
    }

    #[test]
    fn test_revision_round_trip() {
        let item = ReviewItem::revision("B", "Use X", "X");
        let text = NormalizedText::new("A B C");
        let plan =
            ParagraphAnnotationPlan::new(vec![MatchCandidate::new(0, &item, 0, exact(2, 3))]).unwrap();

        let segments = AnnotationApplier::new().apply(&text, &plan).unwrap();
        let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(
            kinds,
            vec![
                SegmentKind::Unchanged,
                SegmentKind::Deleted,
                SegmentKind::Inserted,
                SegmentKind::Unchanged
            ]
        );
        assert_eq!(texts, vec!["A ", "B", "X", " C"]);
        assert_eq!(
            segments[1].comment.as_deref(),
            Some("Use X (Match confidence: 100%)")
        );
        assert_eq!(segments[2].comment, None);
    }

    #[test]
    fn test_comment_only_exact_has_no_suffix() {
        let item = ReviewItem::comment("pelvis", "Which side?");
        let text = NormalizedText::new("The pelvis was fixed.");
        let plan =
            ParagraphAnnotationPlan::new(vec![MatchCandidate::new(3, &item, 0, exact(4, 10))]).unwrap();

        let segments = AnnotationApplier::new().apply(&text, &plan).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].kind, SegmentKind::Commented);
        assert_eq!(segments[1].text, "pelvis");
        assert_eq!(segments[1].comment.as_deref(), Some("Which side?"));
        assert_eq!(segments[1].item_index, Some(3));
    }

    #[test]
    fn test_comment_only_fuzzy_has_suffix() {
        let item = ReviewItem::comment("pelvis fixed", "Which side?");
        let text = NormalizedText::new("The pelvis was fixed.");
        let span = MatchSpan {
            start: 4,
            end: 20,
            confidence: 0.934,
            kind: MatchKind::Fuzzy,
        };
        let plan = ParagraphAnnotationPlan::new(vec![MatchCandidate::new(0, &item, 0, span)]).unwrap();

        let segments = AnnotationApplier::new().apply(&text, &plan).unwrap();
        assert_eq!(
            segments[1].comment.as_deref(),
            Some("Which side? (Match confidence: 93%)")
        );
    }

    #[test]
    fn test_raw_whitespace_is_preserved() {
        let raw = "  Growth  was\nmodeled   here.  ";
        let item = ReviewItem::revision("was modeled", "", "is modelled");
        let text = NormalizedText::new(raw);
        // "Growth was modeled here." -> "was modeled" at 7..18
        let plan =
            ParagraphAnnotationPlan::new(vec![MatchCandidate::new(0, &item, 0, exact(7, 18))]).unwrap();

        let segments = AnnotationApplier::new().apply(&text, &plan).unwrap();
        assert_eq!(segments[0].text, "  Growth  ");
        assert_eq!(segments[1].text, "was\nmodeled");
        assert_eq!(
            segments[1].comment.as_deref(),
            Some("Suggested revision (Match confidence: 100%)")
        );
        assert_eq!(segments[2].text, "is modelled");
        assert_eq!(segments[3].text, "   here.  ");

        let original: String = segments
            .iter()
            .filter(|s| s.is_original())
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(original, raw);
    }

    #[test]
    fn test_multiple_spans_keep_order() {
        let first = ReviewItem::comment("alpha", "a");
        let second = ReviewItem::revision("gamma", "g", "GAMMA");
        let text = NormalizedText::new("alpha beta gamma delta");
        let plan = ParagraphAnnotationPlan::new(vec![
            MatchCandidate::new(1, &second, 0, exact(11, 16)),
            MatchCandidate::new(0, &first, 0, exact(0, 5)),
        ])
        .unwrap();

        let segments = AnnotationApplier::new().apply(&text, &plan).unwrap();
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", " beta ", "gamma", "GAMMA", " delta"]);
    }

    #[test]
    fn test_empty_plan_is_single_unchanged_segment() {
        let text = NormalizedText::new("Nothing to see.");
        let segments = AnnotationApplier::new()
            .apply(&text, &ParagraphAnnotationPlan::default())
            .unwrap();
        assert_eq!(segments, vec![Segment::unchanged("Nothing to see.")]);
    }

    #[test]
    fn test_out_of_bounds_span() {
        let item = ReviewItem::comment("x", "c");
        let text = NormalizedText::new("short");
        let plan =
            ParagraphAnnotationPlan::new(vec![MatchCandidate::new(0, &item, 0, exact(2, 40))]).unwrap();

        assert_eq!(
            AnnotationApplier::new().apply(&text, &plan).unwrap_err(),
            CoreError::SpanOutOfBounds {
                start: 2,
                end: 40,
                len: 5
            }
        );
    }
}
