//! CriticMarkup rendering of an annotated document
//!
//! Deletions render as `{--text--}`, insertions as `{++text++}` and commented
//! text as `{==text==}`. A comment follows the run it is anchored on as
//! `{>>author: text<<}`; a tracked change without such a comment is followed
//! by `{>>author<<}` so every change keeps its attribution. Markup delimiters
//! occurring in document text are escaped with a backslash before the brace.
//! Paragraph styles map to Markdown block prefixes.

use crate::document::{ChangeKind, Document, Paragraph, Run};
use std::borrow::Cow;

const OPENERS: [&str; 5] = ["{--", "{++", "{==", "{>>", "{~~"];
const CLOSERS: [&str; 5] = ["--}", "++}", "==}", "<<}", "~~}"];

/// Render the whole document, paragraphs separated by blank lines
pub fn render_critic_markup(document: &Document) -> String {
    let mut out = String::new();
    for (idx, paragraph) in document.paragraphs.iter().enumerate() {
        if idx > 0 {
            out.push_str("\n\n");
        }
        render_paragraph(document, paragraph, &mut out);
    }
    out.push('\n');
    out
}

fn render_paragraph(document: &Document, paragraph: &Paragraph, out: &mut String) {
    match paragraph.style.as_deref() {
        Some("Heading1") => out.push_str("# "),
        Some("Heading2") => out.push_str("## "),
        Some("Heading3") => out.push_str("### "),
        Some("ListBullet") => out.push_str("- "),
        Some("PageBreak") => {
            out.push_str("---");
            return;
        }
        _ => {}
    }

    for run in &paragraph.runs {
        render_run(document, run, out);
    }
}

fn render_run(document: &Document, run: &Run, out: &mut String) {
    match (&run.change, run.comment) {
        (Some(change), _) if change.kind == ChangeKind::Deletion => {
            wrap(out, "{--", &run.text, "--}");
        }
        (Some(_), _) => wrap(out, "{++", &run.text, "++}"),
        (None, Some(_)) => wrap(out, "{==", &run.text, "==}"),
        (None, None) => out.push_str(&escape(&run.text)),
    }

    let comment = run.comment.and_then(|id| document.comment(id));
    if let Some(change) = &run.change {
        if comment.map_or(true, |comment| comment.author != change.author) {
            wrap(out, "{>>", &change.author, "<<}");
        }
    }
    if let Some(comment) = comment {
        out.push_str("{>>");
        out.push_str(&escape(&comment.author));
        out.push_str(": ");
        out.push_str(&escape(&comment.text));
        out.push_str("<<}");
    }
}

fn wrap(out: &mut String, open: &str, text: &str, close: &str) {
    out.push_str(open);
    out.push_str(&escape(text));
    out.push_str(close);
}

/// Backslash-escape markup delimiters so text cannot open or close a span
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['{', '}']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = text.to_string();
    for opener in OPENERS {
        escaped = escaped.replace(opener, &format!("\\{opener}"));
    }
    for closer in CLOSERS {
        let (marks, brace) = closer.split_at(2);
        escaped = escaped.replace(closer, &format!("{marks}\\{brace}"));
    }
    Cow::Owned(escaped)
}
