//! Document re-annotation driver for LLM review feedback
//!
//! This crate owns everything around the matching core: turning raw reviewer
//! output into review items, the document model with tracked changes and
//! comments, loading and atomically saving documents, and the annotation pass
//! that ties them together.

#![warn(missing_docs)]

pub mod annotator;
pub mod config;
pub mod document;
pub mod error;
pub mod ingest;
pub mod render;
pub mod store;
pub mod summary;

// Re-export key types
pub use annotator::Annotator;
pub use config::{AnnotatorConfig, AnnotatorConfigBuilder};
pub use document::{
    AnnotationStamp, ChangeKind, Comment, CommentId, Document, DocumentSettings, Paragraph, Run,
    TrackedChange,
};
pub use error::{ApplyError, EngineError, ParseError, Result};
pub use ingest::{
    parse_review_bundle, parse_review_items, ParsedReviewItems, ReviewBundle, ReviewItemParser,
};
pub use render::render_critic_markup;
pub use store::{load_document, save_document, DocumentFormat};
pub use summary::{CommunicationReview, ReviewSummary};

// Re-export from core for convenience
pub use revmark_core::{ReviewItem, RunReport, UnmatchedReason};
