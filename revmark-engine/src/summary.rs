//! High-level review summary prefixed to the annotated document

use crate::document::Paragraph;
use serde::{Deserialize, Serialize};

/// Paragraph style names used by the summary section
pub mod styles {
    /// Top-level heading
    pub const HEADING1: &str = "Heading1";
    /// Section heading
    pub const HEADING2: &str = "Heading2";
    /// Subsection heading
    pub const HEADING3: &str = "Heading3";
    /// Bulleted list entry
    pub const LIST_BULLET: &str = "ListBullet";
    /// Page break between the summary and the manuscript
    pub const PAGE_BREAK: &str = "PageBreak";
}

/// Writing and communication feedback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationReview {
    /// Overall writing assessment
    pub writing_assessment: String,
    /// What the narrative does well
    pub narrative_strengths: Vec<String>,
    /// Where the narrative falls short
    pub narrative_weaknesses: Vec<String>,
    /// Concrete style suggestions
    pub style_recommendations: Vec<String>,
}

/// Whole-manuscript review produced alongside the item list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSummary {
    /// Overall assessment
    pub overall_assessment: String,
    /// Key strengths
    pub key_strengths: Vec<String>,
    /// Key weaknesses
    pub key_weaknesses: Vec<String>,
    /// Recommendations
    pub recommendations: Vec<String>,
    /// Optional writing review
    pub communication_review: Option<CommunicationReview>,
}

impl ReviewSummary {
    /// Paragraphs of the "Scientific Review Summary" section, page break included
    pub fn to_paragraphs(&self) -> Vec<Paragraph> {
        let mut out = vec![Paragraph::styled(styles::HEADING1, "Scientific Review Summary")];

        out.push(Paragraph::styled(styles::HEADING2, "Overall Assessment"));
        out.push(Paragraph::new(or_placeholder(
            &self.overall_assessment,
            "No overall assessment provided.",
        )));

        bullet_section(&mut out, "Key Strengths", &self.key_strengths, "No key strengths specified.");
        bullet_section(&mut out, "Key Weaknesses", &self.key_weaknesses, "No key weaknesses specified.");
        bullet_section(&mut out, "Key Recommendations", &self.recommendations, "No recommendations provided.");

        if let Some(communication) = &self.communication_review {
            out.push(Paragraph::styled(styles::HEADING2, "Writing and Communication Review"));
            out.push(Paragraph::new(or_placeholder(
                &communication.writing_assessment,
                "No writing assessment provided.",
            )));
            bullet_subsection(&mut out, "Narrative Strengths", &communication.narrative_strengths);
            bullet_subsection(&mut out, "Areas for Improvement", &communication.narrative_weaknesses);
            bullet_subsection(&mut out, "Style Recommendations", &communication.style_recommendations);
        }

        out.push(Paragraph::styled(styles::PAGE_BREAK, ""));
        out
    }
}

fn or_placeholder(text: &str, placeholder: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text.to_string()
    }
}

fn bullets<'a>(entries: &'a [String]) -> impl Iterator<Item = &'a str> {
    entries
        .iter()
        .map(|entry| entry.trim().trim_start_matches('•').trim())
        .filter(|entry| !entry.is_empty())
}

fn bullet_section(out: &mut Vec<Paragraph>, heading: &str, entries: &[String], placeholder: &str) {
    out.push(Paragraph::styled(styles::HEADING2, heading));
    let before = out.len();
    out.extend(bullets(entries).map(|entry| Paragraph::styled(styles::LIST_BULLET, entry)));
    if out.len() == before {
        out.push(Paragraph::new(placeholder));
    }
}

fn bullet_subsection(out: &mut Vec<Paragraph>, heading: &str, entries: &[String]) {
    if bullets(entries).next().is_none() {
        return;
    }
    out.push(Paragraph::styled(styles::HEADING3, heading));
    out.extend(bullets(entries).map(|entry| Paragraph::styled(styles::LIST_BULLET, entry)));
}
