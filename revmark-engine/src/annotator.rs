//! The annotation pass over a whole document
//!
//! Every item starts PENDING. Paragraphs are visited in order; each pending
//! item is located in the paragraph, the candidates are resolved, and the
//! accepted ones are written. Items that lose a conflict stay PENDING and are
//! offered to later paragraphs. After the last paragraph every item is in
//! exactly one terminal state: APPLIED, FAILED_APPLY or UNMATCHED.

use crate::config::AnnotatorConfig;
use crate::document::{AnnotationStamp, Document};
use crate::error::{EngineError, Result};
use crate::ingest::ReviewBundle;
use crate::store::{ensure_distinct, load_document, save_document, DocumentFormat};
use chrono::{SecondsFormat, Utc};
use log::{debug, info, log, warn, Level};
use revmark_core::{
    truncate_for_display, AnnotationApplier, ConflictResolver, ItemStatus, MatchCandidate,
    MatchLocator, NormalizedText, ParagraphAnnotationPlan, ReviewItem, RunReport,
    RunReportBuilder, UnmatchedReason,
};
use std::path::Path;

/// Characters of surrounding text shown in match traces
const CONTEXT_CHARS: usize = 30;

/// Characters of a match string shown in warnings
const DISPLAY_CHARS: usize = 80;

/// Drives one annotation pass
#[derive(Debug, Clone)]
pub struct Annotator {
    config: AnnotatorConfig,
    locator: MatchLocator,
    resolver: ConflictResolver,
    applier: AnnotationApplier,
}

/// Mutable bookkeeping for one pass
struct PassState {
    statuses: Vec<ItemStatus>,
    ever_lost: Vec<bool>,
    report: RunReportBuilder,
}

impl PassState {
    fn new(total: usize) -> Self {
        Self {
            statuses: vec![ItemStatus::Pending; total],
            ever_lost: vec![false; total],
            report: RunReportBuilder::new(total),
        }
    }

    fn has_pending(&self) -> bool {
        self.statuses.contains(&ItemStatus::Pending)
    }
}

impl Annotator {
    /// Create an annotator, validating the configuration
    pub fn new(config: AnnotatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            locator: MatchLocator::new(config.locator_config()),
            resolver: ConflictResolver::new(),
            applier: AnnotationApplier::new(),
            config,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Author, initials and date for this run
    ///
    /// Without a configured date the current time is used.
    pub fn stamp(&self) -> AnnotationStamp {
        let date = self
            .config
            .annotation_date
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        AnnotationStamp::new(
            self.config.annotation_author.clone(),
            self.config.author_initials.clone(),
            date,
        )
    }

    /// Annotate `document` in memory
    pub fn annotate(&self, document: &mut Document, items: &[ReviewItem]) -> RunReport {
        self.annotate_with_progress(document, items, |_, _| {})
    }

    /// Annotate `document`, reporting `(paragraphs_done, paragraphs_total)`
    pub fn annotate_with_progress<F>(
        &self,
        document: &mut Document,
        items: &[ReviewItem],
        progress: F,
    ) -> RunReport
    where
        F: FnMut(usize, usize),
    {
        self.annotate_items(document, items, items.len(), progress)
    }

    /// Items from `usable` onwards were rejected before the pass and are
    /// reported as invalid without being matched
    fn annotate_items<F>(
        &self,
        document: &mut Document,
        items: &[ReviewItem],
        usable: usize,
        mut progress: F,
    ) -> RunReport
    where
        F: FnMut(usize, usize),
    {
        let stamp = self.stamp();
        if document.enable_track_changes() {
            debug!("Enabled revision tracking");
        }

        let mut state = PassState::new(items.len());
        for (idx, item) in items.iter().enumerate() {
            let rejected = if idx >= usable {
                Err("unusable entry in review payload".to_string())
            } else {
                item.validate().map_err(|e| e.to_string())
            };
            if let Err(e) = rejected {
                warn!("Review item {idx} rejected: {e}");
                state.statuses[idx] = ItemStatus::Unmatched;
                state.report.unmatched(idx, item, UnmatchedReason::InvalidInput);
            }
        }

        let total = document.len();
        for paragraph_index in 0..total {
            if !state.has_pending() {
                break;
            }
            self.annotate_paragraph(document, paragraph_index, items, &stamp, &mut state);
            progress(paragraph_index + 1, total);
        }
        progress(total, total);

        for (idx, item) in items.iter().enumerate() {
            if state.statuses[idx] != ItemStatus::Pending {
                continue;
            }
            let reason = if state.ever_lost[idx] {
                UnmatchedReason::LostToConflictEverywhere
            } else {
                UnmatchedReason::NoCandidateFound
            };
            warn!(
                "Unmatched review item ({reason}): '{}'",
                truncate_for_display(&item.match_string, DISPLAY_CHARS)
            );
            state.statuses[idx] = ItemStatus::Unmatched;
            state.report.unmatched(idx, item, reason);
        }

        let report = state.report.finish();
        info!("{}", report.summary_line());
        report
    }

    fn annotate_paragraph(
        &self,
        document: &mut Document,
        paragraph_index: usize,
        items: &[ReviewItem],
        stamp: &AnnotationStamp,
        state: &mut PassState,
    ) {
        let paragraph = &document.paragraphs[paragraph_index];
        if paragraph.is_annotated() {
            debug!("Paragraph {paragraph_index} is already annotated, skipping");
            return;
        }

        let raw = paragraph.text();
        let text = NormalizedText::new(&raw);
        if text.is_empty() {
            return;
        }

        let candidates: Vec<MatchCandidate<'_>> = items
            .iter()
            .enumerate()
            .filter(|(idx, _)| state.statuses[*idx] == ItemStatus::Pending)
            .filter_map(|(idx, item)| {
                self.locator
                    .locate_in(&text, &item.match_string)
                    .map(|span| MatchCandidate::new(idx, item, paragraph_index, span))
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        let resolution = self.resolver.resolve(candidates);
        for loser in &resolution.rejected {
            debug!(
                "Item {} lost an overlap in paragraph {paragraph_index}, stays pending",
                loser.item_index
            );
            state.ever_lost[loser.item_index] = true;
            state.report.rejected_overlap(loser.item_index, loser.item);
        }

        let plan = resolution.plan;
        for entry in plan.entries() {
            state.statuses[entry.item_index] = ItemStatus::Matched;
            self.trace_match(&text, entry);
        }

        match self.write_plan(document, paragraph_index, &text, &plan, stamp) {
            Ok(()) => {
                for entry in plan.entries() {
                    state.statuses[entry.item_index] = ItemStatus::Applied;
                    state
                        .report
                        .applied(entry.item_index, entry.item, paragraph_index, entry.span);
                }
            }
            Err(e) => {
                warn!("Paragraph {paragraph_index} left unchanged: {e}");
                for entry in plan.entries() {
                    state.statuses[entry.item_index] = ItemStatus::FailedApply;
                    state
                        .report
                        .unmatched(entry.item_index, entry.item, UnmatchedReason::ApplyFailed);
                }
            }
        }
    }

    fn write_plan(
        &self,
        document: &mut Document,
        paragraph_index: usize,
        text: &NormalizedText<'_>,
        plan: &ParagraphAnnotationPlan<'_>,
        stamp: &AnnotationStamp,
    ) -> Result<()> {
        let segments = self.applier.apply(text, plan)?;
        document.apply_segments(paragraph_index, &segments, stamp)?;
        Ok(())
    }

    fn trace_match(&self, text: &NormalizedText<'_>, entry: &MatchCandidate<'_>) {
        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        if !log::log_enabled!(level) {
            return;
        }

        let (start, end) = (entry.start(), entry.end());
        log!(
            level,
            "Item {} -> paragraph {} [{:?}, {}%]: ...{}[{}]{}...",
            entry.item_index,
            entry.paragraph_index,
            entry.kind(),
            entry.span.confidence_percent(),
            text.slice(start.saturating_sub(CONTEXT_CHARS), start),
            text.slice(start, end),
            text.slice(end, end + CONTEXT_CHARS),
        );
    }

    /// Annotate `document` and prefix the bundle's summary, if any
    ///
    /// The summary is inserted after matching so it is never a match target.
    /// Entries the parser could not use are counted as invalid input.
    pub fn annotate_bundle(&self, document: &mut Document, bundle: &ReviewBundle) -> RunReport {
        self.annotate_bundle_with_progress(document, bundle, |_, _| {})
    }

    /// [`Annotator::annotate_bundle`] with paragraph progress
    pub fn annotate_bundle_with_progress<F>(
        &self,
        document: &mut Document,
        bundle: &ReviewBundle,
        progress: F,
    ) -> RunReport
    where
        F: FnMut(usize, usize),
    {
        let report = if bundle.invalid.is_empty() {
            self.annotate_items(document, &bundle.items, bundle.items.len(), progress)
        } else {
            let items: Vec<ReviewItem> =
                bundle.items.iter().chain(&bundle.invalid).cloned().collect();
            self.annotate_items(document, &items, bundle.items.len(), progress)
        };
        if let Some(summary) = &bundle.summary {
            document.prepend_paragraphs(summary.to_paragraphs());
        }
        report
    }

    /// Load `input`, annotate it, and save the result to `output`
    ///
    /// The input file is never modified.
    pub fn annotate_file(
        &self,
        input: &Path,
        output: &Path,
        bundle: &ReviewBundle,
        format: DocumentFormat,
    ) -> Result<RunReport> {
        self.annotate_file_with_progress(input, output, bundle, format, |_, _| {})
    }

    /// [`Annotator::annotate_file`] with paragraph progress
    pub fn annotate_file_with_progress<F>(
        &self,
        input: &Path,
        output: &Path,
        bundle: &ReviewBundle,
        format: DocumentFormat,
        progress: F,
    ) -> Result<RunReport>
    where
        F: FnMut(usize, usize),
    {
        ensure_distinct(input, output)?;
        if format == DocumentFormat::PlainText {
            return Err(EngineError::Config(
                "plain text is an input-only format".into(),
            ));
        }

        let mut document = load_document(input)?;
        let report = self.annotate_bundle_with_progress(&mut document, bundle, progress);
        save_document(&document, output, format)?;
        Ok(report)
    }
}

impl Default for Annotator {
    fn default() -> Self {
        let config = AnnotatorConfig::default();
        Self {
            locator: MatchLocator::new(config.locator_config()),
            resolver: ConflictResolver::new(),
            applier: AnnotationApplier::new(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Paragraph;

    fn annotator() -> Annotator {
        Annotator::new(
            AnnotatorConfig::builder()
                .annotation_date("2024-05-01T12:00:00Z")
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_stamp_uses_configured_date() {
        let stamp = annotator().stamp();
        assert_eq!(stamp.author, "AIPI");
        assert_eq!(stamp.initials, "AI");
        assert_eq!(stamp.date, "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_stamp_defaults_to_now() {
        let stamp = Annotator::default().stamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp.date).is_ok());
    }

    #[test]
    fn test_invalid_items_reported() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("Some text here.")]);
        let items = vec![
            ReviewItem::comment("   ", "note"),
            ReviewItem::revision("Some text", "", ""),
        ];
        let report = annotator().annotate(&mut doc, &items);

        assert_eq!(report.matched_count(), 0);
        assert_eq!(
            report
                .unmatched_with(UnmatchedReason::InvalidInput)
                .count(),
            2
        );
        assert!(!doc.paragraphs[0].is_annotated());
    }

    #[test]
    fn test_bundle_invalid_entries_counted() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("Some text here.")]);
        let bundle = crate::ingest::parse_review_bundle(
            r#"[
                {"match_string": "Some text", "comment": "Fine"},
                {"comment": "no match"},
                {"match_string": "text here", "comment": "c", "revision": 3}
            ]"#,
        )
        .unwrap();

        let report = annotator().annotate_bundle(&mut doc, &bundle);

        assert_eq!(report.total_items(), 3);
        assert_eq!(report.matched_count(), 1);
        let invalid: Vec<usize> = report
            .unmatched_with(UnmatchedReason::InvalidInput)
            .map(|unmatched| unmatched.item_index)
            .collect();
        assert_eq!(invalid, vec![1, 2]);
    }

    #[test]
    fn test_paragraph_with_revisions_is_skipped() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("The pelvis was fixed.")]);
        let first = vec![ReviewItem::revision("pelvis", "Side?", "left pelvis")];
        annotator().annotate(&mut doc, &first);

        let second = vec![ReviewItem::comment("was fixed", "How?")];
        let report = annotator().annotate(&mut doc, &second);
        assert_eq!(
            report.unmatched()[0].reason,
            UnmatchedReason::NoCandidateFound
        );
    }

    #[test]
    fn test_second_pass_keeps_comment_anchors() {
        let mut doc = Document::from_paragraphs(vec![
            Paragraph::new("The pelvis was fixed at the sacrum."),
            Paragraph::new("Loads were applied at L1."),
        ]);
        annotator().annotate(&mut doc, &[ReviewItem::comment("pelvis was fixed", "How?")]);

        let report = annotator().annotate(
            &mut doc,
            &[
                ReviewItem::comment("at the sacrum", "Which side?"),
                ReviewItem::comment("applied at L1", "Magnitude?"),
            ],
        );

        assert_eq!(report.matched_count(), 1);
        assert_eq!(report.applied()[0].paragraph_index, 1);
        assert_eq!(doc.comments.len(), 2);
        for comment in &doc.comments {
            assert!(
                doc.paragraphs
                    .iter()
                    .flat_map(|p| &p.runs)
                    .any(|run| run.comment == Some(comment.id)),
                "comment {} lost its anchor",
                comment.id
            );
        }
    }

    #[test]
    fn test_progress_reaches_total() {
        let mut doc = Document::from_paragraphs(vec![Paragraph::new("a b"), Paragraph::new("c d")]);
        let items = vec![ReviewItem::comment("zzz", "never")];
        let mut seen = Vec::new();
        annotator().annotate_with_progress(&mut doc, &items, |done, total| seen.push((done, total)));
        assert_eq!(seen.last(), Some(&(2, 2)));
    }
}
