//! Per-run bookkeeping: item lifecycle and the final run report

use crate::locator::{MatchKind, MatchSpan};
use crate::review_item::{truncate_for_display, ReviewItem};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a review item during one annotation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Not yet matched; still offered to later paragraphs
    Pending,
    /// Accepted into a paragraph plan, not yet written
    Matched,
    /// Written into the document
    Applied,
    /// Accepted but the paragraph write failed
    FailedApply,
    /// Never accepted anywhere, or rejected as invalid
    Unmatched,
}

impl ItemStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Applied | ItemStatus::FailedApply | ItemStatus::Unmatched
        )
    }
}

/// Why an item did not make it into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnmatchedReason {
    /// No paragraph produced a candidate
    NoCandidateFound,
    /// Candidates existed but every one lost an overlap conflict
    LostToConflictEverywhere,
    /// Accepted, but writing the paragraph failed
    ApplyFailed,
    /// Empty match string, or neither comment nor revision
    InvalidInput,
}

impl UnmatchedReason {
    /// Stable reason code
    pub fn code(self) -> &'static str {
        match self {
            UnmatchedReason::NoCandidateFound => "NO_CANDIDATE_FOUND",
            UnmatchedReason::LostToConflictEverywhere => "LOST_TO_CONFLICT_EVERYWHERE",
            UnmatchedReason::ApplyFailed => "APPLY_FAILED",
            UnmatchedReason::InvalidInput => "INVALID_INPUT",
        }
    }
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An item written into the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedItem {
    /// Index in the input item list
    pub item_index: usize,
    /// The item
    pub item: ReviewItem,
    /// Paragraph it was written into
    pub paragraph_index: usize,
    /// Where it matched, in normalized paragraph chars
    pub span: MatchSpan,
}

/// An item that did not make it into the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedItem {
    /// Index in the input item list
    pub item_index: usize,
    /// The item
    pub item: ReviewItem,
    /// Why
    pub reason: UnmatchedReason,
}

/// Applied-match confidences in ten 10%-wide buckets
///
/// Bucket `i` holds confidences in `[i/10, (i+1)/10)`; 1.0 lands in the last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceHistogram {
    /// Counts per bucket
    pub buckets: [usize; 10],
}

impl ConfidenceHistogram {
    /// Count one confidence value
    pub fn record(&mut self, confidence: f64) {
        let bucket = ((confidence.clamp(0.0, 1.0) * 10.0) as usize).min(9);
        self.buckets[bucket] += 1;
    }

    /// Total recorded values
    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    /// `(lower_percent, upper_percent, count)` for every bucket
    pub fn rows(&self) -> impl Iterator<Item = (u32, u32, usize)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .map(|(idx, &count)| (idx as u32 * 10, idx as u32 * 10 + 10, count))
    }
}

/// Summary of one annotation pass; immutable once built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    total_items: usize,
    applied: Vec<AppliedItem>,
    unmatched: Vec<UnmatchedItem>,
    rejected_overlap: Vec<ReviewItem>,
    histogram: ConfidenceHistogram,
}

impl RunReport {
    /// Number of input items
    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// Number of items written into the document
    pub fn matched_count(&self) -> usize {
        self.applied.len()
    }

    /// Items written into the document, in input order
    pub fn applied(&self) -> &[AppliedItem] {
        &self.applied
    }

    /// Items not written, in input order
    pub fn unmatched(&self) -> &[UnmatchedItem] {
        &self.unmatched
    }

    /// Items that lost at least one overlap conflict
    pub fn rejected_overlap(&self) -> &[ReviewItem] {
        &self.rejected_overlap
    }

    /// Confidence distribution of applied items
    pub fn histogram(&self) -> &ConfidenceHistogram {
        &self.histogram
    }

    /// Applied items found by exact match
    pub fn exact_count(&self) -> usize {
        self.count_kind(MatchKind::Exact)
    }

    /// Applied items found by fuzzy match
    pub fn fuzzy_count(&self) -> usize {
        self.count_kind(MatchKind::Fuzzy)
    }

    fn count_kind(&self, kind: MatchKind) -> usize {
        self.applied
            .iter()
            .filter(|applied| applied.span.kind == kind)
            .count()
    }

    /// Unmatched items with a given reason
    pub fn unmatched_with(&self, reason: UnmatchedReason) -> impl Iterator<Item = &UnmatchedItem> {
        self.unmatched
            .iter()
            .filter(move |unmatched| unmatched.reason == reason)
    }

    /// Whether every item was applied
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }

    /// One-line summary for logs
    pub fn summary_line(&self) -> String {
        format!(
            "{} of {} review items applied ({} exact, {} fuzzy), {} unmatched",
            self.matched_count(),
            self.total_items,
            self.exact_count(),
            self.fuzzy_count(),
            self.unmatched.len()
        )
    }

    /// `reason: match string` lines for every unmatched item
    pub fn unmatched_lines(&self, max_chars: usize) -> Vec<String> {
        self.unmatched
            .iter()
            .map(|unmatched| {
                format!(
                    "{}: '{}'",
                    unmatched.reason,
                    truncate_for_display(&unmatched.item.match_string, max_chars)
                )
            })
            .collect()
    }
}

/// Accumulates terminal outcomes, then freezes into a [`RunReport`]
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    total_items: usize,
    applied: Vec<AppliedItem>,
    unmatched: Vec<UnmatchedItem>,
    rejected_overlap: Vec<(usize, ReviewItem)>,
}

impl RunReportBuilder {
    /// Start a report for `total_items` inputs
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            ..Self::default()
        }
    }

    /// Record an applied item
    pub fn applied(&mut self, item_index: usize, item: &ReviewItem, paragraph_index: usize, span: MatchSpan) {
        self.applied.push(AppliedItem {
            item_index,
            item: item.clone(),
            paragraph_index,
            span,
        });
    }

    /// Record an item that will not appear in the output
    pub fn unmatched(&mut self, item_index: usize, item: &ReviewItem, reason: UnmatchedReason) {
        self.unmatched.push(UnmatchedItem {
            item_index,
            item: item.clone(),
            reason,
        });
    }

    /// Record that an item lost an overlap conflict at least once
    pub fn rejected_overlap(&mut self, item_index: usize, item: &ReviewItem) {
        if !self
            .rejected_overlap
            .iter()
            .any(|(index, _)| *index == item_index)
        {
            self.rejected_overlap.push((item_index, item.clone()));
        }
    }

    /// Freeze the report
    pub fn finish(mut self) -> RunReport {
        self.applied.sort_by_key(|applied| applied.item_index);
        self.unmatched.sort_by_key(|unmatched| unmatched.item_index);
        self.rejected_overlap.sort_by_key(|(index, _)| *index);

        let mut histogram = ConfidenceHistogram::default();
        for applied in &self.applied {
            histogram.record(applied.span.confidence);
        }

        RunReport {
            total_items: self.total_items,
            applied: self.applied,
            unmatched: self.unmatched,
            rejected_overlap: self
                .rejected_overlap
                .into_iter()
                .map(|(_, item)| item)
                .collect(),
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(confidence: f64, kind: MatchKind) -> MatchSpan {
        MatchSpan {
            start: 0,
            end: 4,
            confidence,
            kind,
        }
    }

    #[test]
    fn test_histogram_buckets() {
        let mut histogram = ConfidenceHistogram::default();
        histogram.record(1.0);
        histogram.record(0.95);
        histogram.record(0.91);
        histogram.record(0.05);

        assert_eq!(histogram.buckets[9], 3);
        assert_eq!(histogram.buckets[0], 1);
        assert_eq!(histogram.total(), 4);
        assert_eq!(histogram.rows().last(), Some((90, 100, 3)));
    }

    #[test]
    fn test_builder_orders_by_item_index() {
        let a = ReviewItem::comment("alpha", "a");
        let b = ReviewItem::comment("beta", "b");
        let c = ReviewItem::comment("gamma", "c");

        let mut builder = RunReportBuilder::new(3);
        builder.applied(2, &c, 4, span(1.0, MatchKind::Exact));
        builder.applied(0, &a, 1, span(0.93, MatchKind::Fuzzy));
        builder.unmatched(1, &b, UnmatchedReason::NoCandidateFound);
        let report = builder.finish();

        assert_eq!(report.total_items(), 3);
        assert_eq!(report.matched_count(), 2);
        assert_eq!(report.applied()[0].item_index, 0);
        assert_eq!(report.exact_count(), 1);
        assert_eq!(report.fuzzy_count(), 1);
        assert!(!report.is_complete());
        assert_eq!(
            report.summary_line(),
            "2 of 3 review items applied (1 exact, 1 fuzzy), 1 unmatched"
        );
        assert_eq!(report.unmatched_lines(80), vec!["NO_CANDIDATE_FOUND: 'beta'"]);
    }

    #[test]
    fn test_rejected_overlap_deduplicated() {
        let a = ReviewItem::comment("alpha", "a");
        let mut builder = RunReportBuilder::new(1);
        builder.rejected_overlap(0, &a);
        builder.rejected_overlap(0, &a);
        let report = builder.finish();
        assert_eq!(report.rejected_overlap().len(), 1);
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(UnmatchedReason::ApplyFailed.to_string(), "APPLY_FAILED");
        assert_eq!(
            serde_json::to_string(&UnmatchedReason::LostToConflictEverywhere).unwrap(),
            "\"LOST_TO_CONFLICT_EVERYWHERE\""
        );
        assert!(ItemStatus::FailedApply.is_terminal());
        assert!(!ItemStatus::Matched.is_terminal());
    }
}
