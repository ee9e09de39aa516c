//! Turning raw reviewer output into [`ReviewItem`]s
//!
//! Language models return feedback in many shapes: fenced JSON, bare item
//! arrays, objects wrapping a `review_items` list (sometimes itself a JSON
//! string), legacy parallel `match_strings`/`comments`/`revisions` arrays,
//! per-section reviews, and a plain-text `MATCH:`/`COMMENT:`/`REVISION:`
//! block format. Everything is unified here so downstream code sees only
//! `ReviewItem`.
//!
//! Well-formed input in an unexpected shape is not an error: unusable entries
//! are skipped and described in [`ParsedReviewItems::skipped`]. Entries that
//! look like review items but cannot be used are also kept, as far as they
//! can be read, in [`ParsedReviewItems::invalid`] so a run can report them.

use crate::error::ParseError;
use crate::summary::ReviewSummary;
use log::{debug, warn};
use regex::Regex;
use revmark_core::ReviewItem;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```").expect("valid fenced block regex")
});

static BLOCK_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(match|comment|revision|section)\s*:\s*(.*)$")
        .expect("valid block field regex")
});

static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*---+\s*$").expect("valid block separator regex"));

/// Items recovered from one payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReviewItems {
    /// Usable items, in input order
    pub items: Vec<ReviewItem>,
    /// One note per entry that was dropped
    pub skipped: Vec<String>,
    /// Item-shaped entries that were dropped as unusable
    pub invalid: Vec<ReviewItem>,
}

impl ParsedReviewItems {
    fn skip(&mut self, note: impl Into<String>) {
        let note = note.into();
        debug!("Skipping review entry: {note}");
        self.skipped.push(note);
    }

    fn reject(&mut self, item: ReviewItem, note: impl Into<String>) {
        self.skip(note);
        self.invalid.push(item);
    }
}

/// Item list plus optional whole-manuscript summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewBundle {
    /// Review items
    pub items: Vec<ReviewItem>,
    /// Entries that were dropped
    pub skipped: Vec<String>,
    /// Item-shaped entries that were dropped as unusable
    pub invalid: Vec<ReviewItem>,
    /// Whole-manuscript review, when the payload carried one
    pub summary: Option<ReviewSummary>,
}

/// Parser for reviewer output
#[derive(Debug, Clone)]
pub struct ReviewItemParser {
    skip_reference_sections: bool,
}

impl Default for ReviewItemParser {
    fn default() -> Self {
        Self {
            skip_reference_sections: true,
        }
    }
}

impl ReviewItemParser {
    /// Create a parser that drops references-section items
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or drop items that target references/bibliography sections
    pub fn skip_reference_sections(mut self, skip: bool) -> Self {
        self.skip_reference_sections = skip;
        self
    }

    /// Parse a raw payload into items
    pub fn parse(&self, raw: &str) -> Result<ParsedReviewItems, ParseError> {
        let mut parsed = ParsedReviewItems::default();
        match decode(raw)? {
            Payload::Json(value) => self.collect(&value, "", &mut parsed),
            Payload::Blocks(text) => collect_blocks(&text, &mut parsed),
        }
        self.drop_reference_items(&mut parsed);
        Ok(parsed)
    }

    /// Parse a payload that may also carry a whole-manuscript summary
    ///
    /// The summary is read from `final_review` or `high_level_review`.
    pub fn parse_bundle(&self, raw: &str) -> Result<ReviewBundle, ParseError> {
        let mut parsed = ParsedReviewItems::default();
        let mut summary = None;

        match decode(raw)? {
            Payload::Json(value) => {
                if let Some(object) = value.as_object() {
                    summary = summary_from(object, &mut parsed);
                }
                self.collect(&value, "", &mut parsed);
            }
            Payload::Blocks(text) => collect_blocks(&text, &mut parsed),
        }
        self.drop_reference_items(&mut parsed);

        Ok(ReviewBundle {
            items: parsed.items,
            skipped: parsed.skipped,
            invalid: parsed.invalid,
            summary,
        })
    }

    fn collect(&self, value: &Value, section: &str, out: &mut ParsedReviewItems) {
        match value {
            Value::Array(entries) => {
                for (idx, entry) in entries.iter().enumerate() {
                    match entry.as_object() {
                        Some(object) => item_from_object(object, section, idx, out),
                        None => out.reject(
                            ReviewItem {
                                match_string: entry.as_str().unwrap_or_default().to_string(),
                                comment: String::new(),
                                revision: None,
                                section_type: section.to_string(),
                            },
                            format!("entry {idx} is not an object"),
                        ),
                    }
                }
            }
            Value::Object(object) => self.collect_object(object, section, out),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(inner @ (Value::Array(_) | Value::Object(_))) => self.collect(&inner, section, out),
                _ => out.skip("string value does not contain review JSON"),
            },
            _ => out.skip(format!("unexpected JSON value: {value}")),
        }
    }

    fn collect_object(&self, object: &Map<String, Value>, section: &str, out: &mut ParsedReviewItems) {
        let mut recognized = false;

        if let Some(reviews) = object.get("section_reviews") {
            recognized = true;
            match reviews.as_array() {
                Some(reviews) => {
                    for review in reviews {
                        let Some(review) = review.as_object() else {
                            out.skip("section review is not an object");
                            continue;
                        };
                        let section = string_field(review, &["section_type", "section"])
                            .unwrap_or_else(|| section.to_string());
                        match review.get("review") {
                            Some(inner) => self.collect(inner, &section, out),
                            None => self.collect_object(review, &section, out),
                        }
                    }
                }
                None => out.skip("section_reviews is not an array"),
            }
        }

        if let Some(items) = object.get("review_items") {
            recognized = true;
            self.collect(items, section, out);
        }

        if object.contains_key("match_strings") {
            recognized = true;
            collect_parallel(object, section, out);
        }

        if object.contains_key("match_string") || object.contains_key("match_text") {
            recognized = true;
            item_from_object(object, section, 0, out);
        }

        let carries_summary = object.contains_key("final_review") || object.contains_key("high_level_review");
        if !recognized && !carries_summary {
            out.skip("JSON object has no recognizable review items");
        }
    }

    fn drop_reference_items(&self, parsed: &mut ParsedReviewItems) {
        if !self.skip_reference_sections {
            return;
        }
        let (kept, dropped): (Vec<ReviewItem>, Vec<ReviewItem>) = std::mem::take(&mut parsed.items)
            .into_iter()
            .partition(|item| !is_reference_section(&item.section_type));
        for item in dropped {
            parsed.skip(format!("item in '{}' section skipped", item.section_type));
        }
        parsed.items = kept;
        parsed
            .invalid
            .retain(|item| !is_reference_section(&item.section_type));
    }
}

/// Parse raw reviewer output with default settings
pub fn parse_review_items(raw: &str) -> Result<Vec<ReviewItem>, ParseError> {
    ReviewItemParser::new().parse(raw).map(|parsed| parsed.items)
}

/// Parse raw reviewer output, including any whole-manuscript summary
pub fn parse_review_bundle(raw: &str) -> Result<ReviewBundle, ParseError> {
    ReviewItemParser::new().parse_bundle(raw)
}

/// Whether a section name denotes references or a bibliography
pub fn is_reference_section(section: &str) -> bool {
    let section = section.to_lowercase();
    section.contains("reference") || section.contains("bibliograph")
}

enum Payload {
    Json(Value),
    Blocks(String),
}

fn decode(raw: &str) -> Result<Payload, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Malformed("empty review output".into()));
    }

    let body = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
        .unwrap_or(trimmed);

    if body.starts_with('[') || body.starts_with('{') {
        return Ok(Payload::Json(serde_json::from_str(body)?));
    }

    if body.lines().any(|line| BLOCK_FIELD.is_match(line.trim())) {
        return Ok(Payload::Blocks(body.to_string()));
    }

    // Prose around a JSON payload
    if let Some(json) = embedded_json(body) {
        return Ok(Payload::Json(json));
    }

    Err(ParseError::Malformed(format!(
        "expected JSON or MATCH:/COMMENT:/REVISION: blocks, got '{}'",
        revmark_core::truncate_for_display(body, 60)
    )))
}

fn embedded_json(text: &str) -> Option<Value> {
    let start = text.find(['{', '['])?;
    let end = text.rfind(['}', ']'])?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn item_from_object(object: &Map<String, Value>, section: &str, idx: usize, out: &mut ParsedReviewItems) {
    let readable = ReviewItem {
        match_string: string_field(object, &["match_string", "match_text"]).unwrap_or_default(),
        comment: string_field(object, &["comment"]).unwrap_or_default(),
        revision: None,
        section_type: string_field(object, &["section_type"]).unwrap_or_else(|| section.to_string()),
    };

    match object.get("match_string").or_else(|| object.get("match_text")) {
        Some(Value::String(_)) => {}
        None | Some(Value::Null) => {
            out.reject(readable, format!("entry {idx} has no match string"));
            return;
        }
        Some(other) => {
            out.reject(readable, format!("entry {idx} has a non-text match string: {other}"));
            return;
        }
    }

    let revision = match object.get("revision") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            out.reject(readable, format!("entry {idx} has a non-text revision: {other}"));
            return;
        }
    };

    out.items.push(ReviewItem {
        revision,
        ..readable
    });
}

fn collect_parallel(object: &Map<String, Value>, section: &str, out: &mut ParsedReviewItems) {
    let column = |key: &str| -> Vec<Option<String>> {
        object
            .get(key)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .map(|value| value.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };

    let matches = column("match_strings");
    let comments = column("comments");
    let revisions = column("revisions");

    let longest = matches.len().max(comments.len()).max(revisions.len());
    let usable = if object.contains_key("revisions") {
        matches.len().min(comments.len()).min(revisions.len())
    } else {
        matches.len().min(comments.len())
    };

    for idx in 0..usable {
        let (Some(match_string), Some(comment)) = (&matches[idx], &comments[idx]) else {
            out.reject(
                parallel_remnant(&matches, &comments, idx, section),
                format!("parallel entry {idx} is not text"),
            );
            continue;
        };
        let revision = revisions.get(idx).cloned().flatten();
        out.items.push(ReviewItem {
            match_string: match_string.clone(),
            comment: comment.clone(),
            revision,
            section_type: section.to_string(),
        });
    }

    if longest > usable {
        warn!(
            "Parallel review arrays differ in length; {} entries ignored",
            longest - usable
        );
        out.skip(format!("{} unpaired parallel entries", longest - usable));
        out.invalid.extend(
            (usable..longest).map(|idx| parallel_remnant(&matches, &comments, idx, section)),
        );
    }
}

fn parallel_remnant(
    matches: &[Option<String>],
    comments: &[Option<String>],
    idx: usize,
    section: &str,
) -> ReviewItem {
    let text = |column: &[Option<String>]| column.get(idx).cloned().flatten().unwrap_or_default();
    ReviewItem {
        match_string: text(matches),
        comment: text(comments),
        revision: None,
        section_type: section.to_string(),
    }
}

fn collect_blocks(text: &str, out: &mut ParsedReviewItems) {
    for (idx, block) in BLOCK_SEPARATOR.split(text).enumerate() {
        if block.trim().is_empty() {
            continue;
        }

        let mut fields: [Option<String>; 4] = Default::default();
        let mut current: Option<usize> = None;

        for line in block.lines() {
            let line = line.trim();
            if let Some(captures) = BLOCK_FIELD.captures(line) {
                let slot = match captures[1].to_lowercase().as_str() {
                    "match" => 0,
                    "comment" => 1,
                    "revision" => 2,
                    _ => 3,
                };
                fields[slot] = Some(captures[2].trim().to_string());
                current = Some(slot);
            } else if let (Some(slot), false) = (current, line.is_empty()) {
                // Continuation of the previous field
                if let Some(value) = fields[slot].as_mut() {
                    value.push(' ');
                    value.push_str(line);
                }
            }
        }

        let [match_string, comment, revision, section] = fields;
        let Some(match_string) = match_string.filter(|m| !m.is_empty()) else {
            out.reject(
                ReviewItem {
                    match_string: String::new(),
                    comment: comment.unwrap_or_default(),
                    revision: None,
                    section_type: section.unwrap_or_default(),
                },
                format!("block {idx} has no MATCH line"),
            );
            continue;
        };

        out.items.push(ReviewItem {
            match_string,
            comment: comment.unwrap_or_default(),
            revision: revision.filter(|r| !is_empty_revision(r)),
            section_type: section.unwrap_or_default(),
        });
    }
}

fn is_empty_revision(revision: &str) -> bool {
    let revision = revision.trim();
    revision.is_empty()
        || revision.eq_ignore_ascii_case("none")
        || revision.eq_ignore_ascii_case("n/a")
}

fn summary_from(object: &Map<String, Value>, out: &mut ParsedReviewItems) -> Option<ReviewSummary> {
    let value = object
        .get("final_review")
        .or_else(|| object.get("high_level_review"))?;

    // Some producers nest the summary one level deeper
    let value = value.get("high_level_review").unwrap_or(value);

    match serde_json::from_value::<ReviewSummary>(value.clone()) {
        Ok(summary) => Some(summary),
        Err(e) => {
            out.skip(format!("review summary ignored: {e}"));
            None
        }
    }
}
