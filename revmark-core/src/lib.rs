//! Match location and annotation planning for LLM review feedback
//!
//! A language model reads a manuscript and returns review items: a quoted
//! passage, a comment, and sometimes a suggested rewrite. The quotes are
//! rarely verbatim. This crate finds where each quote actually lives in a
//! paragraph, decides which of several competing quotes may claim a stretch
//! of text, and turns the winners into an ordered sequence of segments that a
//! document writer can render as tracked changes and comments.
//!
//! # Pipeline
//!
//! - [`normalize`]: whitespace normalization with a map back to raw offsets
//! - [`MatchLocator`]: exact substring first, token-set fuzzy windows second
//! - [`ConflictResolver`]: greedy, priority-ordered, non-overlapping selection
//! - [`AnnotationApplier`]: plan to segments, cut from the raw paragraph
//! - [`RunReportBuilder`]: terminal outcome of every item in a pass
//!
//! Nothing here touches a document format; that lives in `revmark-engine`.
//!
//! # Example
//!
//! ```rust
//! use revmark_core::{
//!     AnnotationApplier, ConflictResolver, MatchCandidate, MatchLocator, NormalizedText,
//!     ReviewItem, SegmentKind,
//! };
//!
//! let paragraph = "The pelvis was constrained at the sacrum.";
//! let item = ReviewItem::revision(
//!     "The pelvis was constrained",
//!     "Specify the boundary condition",
//!     "The pelvis was fully fixed",
//! );
//!
//! let text = NormalizedText::new(paragraph);
//! let span = MatchLocator::default().locate_in(&text, &item.match_string).unwrap();
//! let resolution = ConflictResolver::new().resolve(vec![MatchCandidate::new(0, &item, 0, span)]);
//! let segments = AnnotationApplier::new().apply(&text, &resolution.plan).unwrap();
//!
//! assert_eq!(segments[0].kind, SegmentKind::Deleted);
//! assert_eq!(segments[1].text, "The pelvis was fully fixed");
//! assert_eq!(segments[2].text, " at the sacrum.");
//! ```

pub mod applier;
pub mod error;
pub mod locator;
pub mod normalize;
pub mod report;
pub mod resolver;
pub mod review_item;
pub mod similarity;

pub use applier::{format_comment, AnnotationApplier, Segment, SegmentKind};
pub use error::{CoreError, Result};
pub use locator::{LocatorConfig, MatchCandidate, MatchKind, MatchLocator, MatchSpan};
pub use normalize::{normalize, NormalizedText};
pub use report::{
    AppliedItem, ConfidenceHistogram, ItemStatus, RunReport, RunReportBuilder, UnmatchedItem,
    UnmatchedReason,
};
pub use resolver::{ConflictResolver, ParagraphAnnotationPlan, Resolution};
pub use review_item::{truncate_for_display, ReviewItem};
