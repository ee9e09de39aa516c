//! Match location: exact substring first, token-set fuzzy windows second
//!
//! All offsets are char offsets into the whitespace-normalized haystack.

use crate::normalize::{normalize, NormalizedText};
use crate::review_item::ReviewItem;
use crate::similarity::{needle_coverage, token_set_ratio, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default locator constants
pub mod defaults {
    /// Fuzzy similarity floor on a 0–100 scale
    pub const MATCH_THRESHOLD: f64 = 90.0;

    /// Shortest normalized needle (chars) eligible for fuzzy matching
    pub const MIN_FUZZY_LENGTH: usize = 8;

    /// Extra chars added to the needle length when sizing fuzzy windows
    pub const WINDOW_PADDING: usize = 20;

    /// Highest confidence a fuzzy match may report; 1.0 is reserved for exact
    pub const FUZZY_CONFIDENCE_CEILING: f64 = 0.99;

    /// Share of the needle's tokens a fuzzy window must contain
    pub const MIN_NEEDLE_COVERAGE: f64 = 0.5;
}

/// How a span was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    /// Verbatim substring after normalization
    Exact,
    /// Similarity-scored window
    Fuzzy,
}

/// A located span in a normalized haystack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchSpan {
    /// Start char offset (inclusive)
    pub start: usize,
    /// End char offset (exclusive)
    pub end: usize,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Exact or fuzzy
    pub kind: MatchKind,
}

impl MatchSpan {
    /// Span length in chars
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers nothing
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Half-open interval overlap test
    pub fn overlaps(&self, other: &MatchSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Confidence as a whole percentage
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// A span proposed for one review item inside one paragraph
#[derive(Debug, Clone)]
pub struct MatchCandidate<'a> {
    /// Index of the item in the caller's item list
    pub item_index: usize,
    /// The item itself (borrowed, never owned)
    pub item: &'a ReviewItem,
    /// Paragraph the span lives in
    pub paragraph_index: usize,
    /// Where the item matched
    pub span: MatchSpan,
}

impl<'a> MatchCandidate<'a> {
    /// Create a candidate
    pub fn new(item_index: usize, item: &'a ReviewItem, paragraph_index: usize, span: MatchSpan) -> Self {
        Self {
            item_index,
            item,
            paragraph_index,
            span,
        }
    }

    /// Start char offset
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// End char offset (exclusive)
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Confidence in `[0, 1]`
    pub fn confidence(&self) -> f64 {
        self.span.confidence
    }

    /// Exact or fuzzy
    pub fn kind(&self) -> MatchKind {
        self.span.kind
    }
}

/// Locator tuning
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    /// Fuzzy similarity floor, 0–100
    pub match_threshold: f64,
    /// Shortest needle (chars) eligible for fuzzy matching
    pub min_fuzzy_length: usize,
    /// Chars added to the needle length for window sizing
    pub window_padding: usize,
    /// Share of needle tokens a window must contain before it is scored, 0–1
    pub min_needle_coverage: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            match_threshold: defaults::MATCH_THRESHOLD,
            min_fuzzy_length: defaults::MIN_FUZZY_LENGTH,
            window_padding: defaults::WINDOW_PADDING,
            min_needle_coverage: defaults::MIN_NEEDLE_COVERAGE,
        }
    }
}

/// Finds the single best span for a needle in a haystack
#[derive(Debug, Clone, Default)]
pub struct MatchLocator {
    config: LocatorConfig,
}

impl MatchLocator {
    /// Create a locator with the given tuning
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Current tuning
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locate `needle_raw` in `haystack_raw`
    pub fn locate(&self, haystack_raw: &str, needle_raw: &str) -> Option<MatchSpan> {
        let haystack = NormalizedText::new(haystack_raw);
        self.locate_in(&haystack, needle_raw)
    }

    /// Locate `needle_raw` in an already-normalized haystack
    ///
    /// Returns `None` for empty or whitespace-only needles. The first exact
    /// occurrence wins; fuzzy matching only runs when there is none.
    pub fn locate_in(&self, haystack: &NormalizedText<'_>, needle_raw: &str) -> Option<MatchSpan> {
        let needle = normalize(needle_raw);
        if needle.is_empty() || haystack.is_empty() {
            return None;
        }

        let needle_len = needle.chars().count();

        if let Some(byte) = haystack.as_str().find(&needle) {
            let start = haystack.char_offset_of_byte(byte);
            return Some(MatchSpan {
                start,
                end: start + needle_len,
                confidence: 1.0,
                kind: MatchKind::Exact,
            });
        }

        if needle_len < self.config.min_fuzzy_length {
            return None;
        }

        self.locate_fuzzy(haystack, &needle, needle_len)
    }

    fn locate_fuzzy(
        &self,
        haystack: &NormalizedText<'_>,
        needle: &str,
        needle_len: usize,
    ) -> Option<MatchSpan> {
        let starts = haystack.word_starts();
        let ends = haystack.word_ends();
        let window_len = needle_len + self.config.window_padding;

        let mut best: Option<(f64, usize, usize)> = None;
        for &start in &starts {
            let Some(end) = window_end(&ends, start, (start + window_len).min(haystack.char_len()))
            else {
                continue;
            };
            let window = haystack.slice(start, end);
            if needle_coverage(needle, window) < self.config.min_needle_coverage {
                continue;
            }
            let score = token_set_ratio(needle, window);
            if best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, start, end));
            }
        }

        let (score, start, end) = best?;
        let (score, start, end) = self.trim_window(haystack, needle, score, start, end);

        if score < self.config.match_threshold {
            return None;
        }

        Some(MatchSpan {
            start,
            end,
            confidence: (score / 100.0).min(defaults::FUZZY_CONFIDENCE_CEILING),
            kind: MatchKind::Fuzzy,
        })
    }

    /// Drop leading/trailing window words that share no token with the needle
    fn trim_window(
        &self,
        haystack: &NormalizedText<'_>,
        needle: &str,
        score: f64,
        start: usize,
        end: usize,
    ) -> (f64, usize, usize) {
        let needle_tokens: HashSet<String> = tokenize(needle).into_iter().collect();
        let words: Vec<(usize, usize)> = haystack
            .word_starts()
            .into_iter()
            .zip(haystack.word_ends())
            .filter(|&(word_start, word_end)| word_start >= start && word_end <= end)
            .collect();

        let relevant = |&(word_start, word_end): &(usize, usize)| {
            tokenize(haystack.slice(word_start, word_end))
                .iter()
                .any(|token| needle_tokens.contains(token))
        };

        let (Some(first), Some(last)) = (
            words.iter().find(|word| relevant(word)),
            words.iter().rev().find(|word| relevant(word)),
        ) else {
            return (score, start, end);
        };

        let (trimmed_start, trimmed_end) = (first.0, last.1);
        if (trimmed_start, trimmed_end) == (start, end) {
            return (score, start, end);
        }

        let trimmed_score = token_set_ratio(needle, haystack.slice(trimmed_start, trimmed_end));
        if trimmed_score >= score {
            (trimmed_score, trimmed_start, trimmed_end)
        } else {
            (score, start, end)
        }
    }
}

/// Last word end in `(start, limit]`, or the end of the word at `start` when
/// that word alone exceeds `limit`
fn window_end(ends: &[usize], start: usize, limit: usize) -> Option<usize> {
    let within = ends.partition_point(|&end| end <= limit);
    if within > 0 && ends[within - 1] > start {
        return Some(ends[within - 1]);
    }
    ends.get(ends.partition_point(|&end| end <= start)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator_with_threshold(threshold: f64) -> MatchLocator {
        MatchLocator::new(LocatorConfig {
            match_threshold: threshold,
            ..LocatorConfig::default()
        })
    }

    #[test]
    fn test_exact_match() {
        let locator = MatchLocator::default();
        let span = locator
            .locate("The pelvis was constrained at the sacrum.", "The pelvis was constrained")
            .unwrap();

        assert_eq!(span.kind, MatchKind::Exact);
        assert_eq!(span.confidence, 1.0);
        assert_eq!((span.start, span.end), (0, 26));
    }

    #[test]
    fn test_exact_match_across_whitespace_differences() {
        let locator = MatchLocator::default();
        let span = locator
            .locate("Intro.  The pelvis\nwas   constrained.", " The pelvis was\tconstrained ")
            .unwrap();

        assert_eq!(span.kind, MatchKind::Exact);
        assert_eq!((span.start, span.end), (7, 33));
    }

    #[test]
    fn test_exact_match_picks_first_occurrence() {
        let locator = MatchLocator::default();
        let span = locator.locate("load case A; load case B", "load case").unwrap();
        assert_eq!((span.start, span.end), (0, 9));
    }

    #[test]
    fn test_exact_match_after_multibyte_text() {
        let locator = MatchLocator::default();
        let span = locator.locate("σ ≈ 0.4 MPa and θ = 30°", "θ = 30°").unwrap();
        assert_eq!((span.start, span.end), (16, 23));
    }

    #[test]
    fn test_empty_needle_never_matches() {
        let locator = MatchLocator::default();
        assert_eq!(locator.locate("any text", ""), None);
        assert_eq!(locator.locate("any text", "   "), None);
        assert_eq!(locator.locate("", "text"), None);
    }

    #[test]
    fn test_short_needle_skips_fuzzy() {
        let locator = locator_with_threshold(0.0);
        assert_eq!(locator.locate("The pelvis", "pelvic"), None);
    }

    #[test]
    fn test_no_match() {
        let locator = MatchLocator::default();
        assert_eq!(
            locator.locate(
                "The pelvis was constrained at the sacrum.",
                "Material properties were assigned per element"
            ),
            None
        );
    }

    #[test]
    fn test_fuzzy_paraphrase_both_thresholds() {
        let haystack = "Vertebral growth was modeled using a region specific orthotropic method.";
        let needle = "Vertebral growth was modeled through adaptation of a region-specific orthotropic thermal expansion method";

        let span = locator_with_threshold(80.0).locate(haystack, needle).unwrap();
        assert_eq!(span.kind, MatchKind::Fuzzy);
        assert!(span.confidence < 1.0);
        assert!(span.confidence >= 0.80);

        assert_eq!(locator_with_threshold(99.0).locate(haystack, needle), None);
    }

    #[test]
    fn test_fuzzy_window_is_trimmed() {
        let locator = MatchLocator::default();
        let haystack = "Results. The vertebral growth model was calibrated carefully against data. Other text follows here.";
        let view = NormalizedText::new(haystack);
        let span = locator
            .locate_in(&view, "vertebral growth model calibrated against data")
            .unwrap();

        assert_eq!(span.kind, MatchKind::Fuzzy);
        assert_eq!(span.confidence, defaults::FUZZY_CONFIDENCE_CEILING);
        assert_eq!(
            view.slice(span.start, span.end),
            "vertebral growth model was calibrated carefully against data."
        );
    }

    #[test]
    fn test_single_shared_word_is_not_a_match() {
        let locator = locator_with_threshold(50.0);
        assert_eq!(
            locator.locate(
                "Loads were applied at L1.",
                "Thermal expansion coefficients were tuned per level"
            ),
            None
        );
    }

    #[test]
    fn test_coverage_floor_is_configurable() {
        let paragraph = "The spine model was loaded at the first lumbar vertebra.";
        let needle = "loads applied at the lumbar level";

        let loose = MatchLocator::new(LocatorConfig {
            match_threshold: 50.0,
            min_needle_coverage: 0.0,
            ..LocatorConfig::default()
        });
        let strict = MatchLocator::new(LocatorConfig {
            match_threshold: 50.0,
            min_needle_coverage: 1.0,
            ..LocatorConfig::default()
        });

        assert!(loose.locate(paragraph, needle).is_some());
        assert_eq!(strict.locate(paragraph, needle), None);
    }

    #[test]
    fn test_exact_takes_precedence_over_fuzzy() {
        let locator = locator_with_threshold(0.0);
        let span = locator
            .locate(
                "constrained the pelvis was; the pelvis was constrained",
                "the pelvis was constrained",
            )
            .unwrap();
        assert_eq!(span.kind, MatchKind::Exact);
        assert_eq!(span.confidence, 1.0);
        assert_eq!(span.start, 28);
    }

    #[test]
    fn test_span_overlap() {
        let a = MatchSpan {
            start: 0,
            end: 10,
            confidence: 1.0,
            kind: MatchKind::Exact,
        };
        let b = MatchSpan { start: 5, end: 15, ..a };
        let c = MatchSpan { start: 10, end: 12, ..a };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert_eq!(a.confidence_percent(), 100);
    }

    #[test]
    fn test_window_end() {
        let ends = vec![3, 7, 13];
        assert_eq!(window_end(&ends, 0, 10), Some(7));
        assert_eq!(window_end(&ends, 4, 13), Some(13));
        assert_eq!(window_end(&ends, 8, 9), Some(13));
        assert_eq!(window_end(&ends, 14, 20), None);
    }
}
