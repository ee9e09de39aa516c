//! Spatial conflict resolution within one paragraph
//!
//! Candidates are accepted greedily by priority: confidence, then span
//! length, then earliest start. A candidate is accepted iff it overlaps no
//! previously accepted span. The resolver is stateless; keeping an item from
//! being offered twice is the driver's job.

use crate::error::{CoreError, Result};
use crate::locator::MatchCandidate;
use std::cmp::Ordering;

/// Accepted, non-overlapping spans for one paragraph, ascending by start
#[derive(Debug, Clone, Default)]
pub struct ParagraphAnnotationPlan<'a> {
    entries: Vec<MatchCandidate<'a>>,
}

impl<'a> ParagraphAnnotationPlan<'a> {
    /// Build a plan from entries, checking order and overlap
    pub fn new(mut entries: Vec<MatchCandidate<'a>>) -> Result<Self> {
        entries.sort_by_key(|entry| (entry.start(), entry.end()));
        for pair in entries.windows(2) {
            if pair[0].end() > pair[1].start() {
                return Err(CoreError::OverlappingSpans {
                    previous_end: pair[0].end(),
                    next_start: pair[1].start(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Plan entries in ascending start order
    pub fn entries(&self) -> &[MatchCandidate<'a>] {
        &self.entries
    }

    /// Number of accepted spans
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was accepted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices of the review items in this plan
    pub fn item_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|entry| entry.item_index)
    }
}

/// Outcome of resolving one paragraph's candidates
#[derive(Debug, Clone, Default)]
pub struct Resolution<'a> {
    /// Accepted spans
    pub plan: ParagraphAnnotationPlan<'a>,
    /// Candidates that lost to an overlapping higher-priority span
    pub rejected: Vec<MatchCandidate<'a>>,
}

/// Greedy priority-ordered interval selection
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Reduce candidates to a non-overlapping plan
    pub fn resolve<'a>(&self, mut candidates: Vec<MatchCandidate<'a>>) -> Resolution<'a> {
        candidates.sort_by(priority);

        let mut accepted: Vec<MatchCandidate<'a>> = Vec::with_capacity(candidates.len());
        let mut rejected = Vec::new();

        for candidate in candidates {
            if accepted
                .iter()
                .any(|kept| kept.span.overlaps(&candidate.span))
            {
                rejected.push(candidate);
            } else {
                accepted.push(candidate);
            }
        }

        accepted.sort_by_key(|entry| entry.start());

        Resolution {
            plan: ParagraphAnnotationPlan { entries: accepted },
            rejected,
        }
    }
}

/// Confidence desc, span length desc, start asc, item index asc
fn priority(a: &MatchCandidate<'_>, b: &MatchCandidate<'_>) -> Ordering {
    b.confidence()
        .total_cmp(&a.confidence())
        .then_with(|| b.span.len().cmp(&a.span.len()))
        .then_with(|| a.start().cmp(&b.start()))
        .then_with(|| a.item_index.cmp(&b.item_index))
}
