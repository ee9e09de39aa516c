//! Token-set similarity scoring
//!
//! Scores are on a 0–100 scale. Tokens are lower-cased alphanumeric runs, so
//! punctuation and hyphenation differences ("region-specific" vs "region
//! specific") do not count against a match.

use std::collections::BTreeSet;

/// Split `text` into lower-cased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

/// Edit-distance similarity of two strings, 0–100
///
/// Either side empty scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Token-set similarity of two strings, 0–100
///
/// Compares the sorted token intersection against each side's intersection
/// plus its leftover tokens, and takes the best pairing. A string whose tokens
/// are a subset of the other's scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tokens_b: BTreeSet<String> = tokenize(b).into_iter().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = concat(&intersection, &only_a);
    let combined_b = concat(&intersection, &only_b);

    ratio(&intersection, &combined_a)
        .max(ratio(&intersection, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

/// Share of the distinct needle tokens that also occur in `window`, 0–1
///
/// A window whose tokens are a subset of the needle's scores 100 on
/// [`token_set_ratio`] however little of the needle it covers; this is the
/// counterweight.
pub fn needle_coverage(needle: &str, window: &str) -> f64 {
    let needle_tokens: BTreeSet<String> = tokenize(needle).into_iter().collect();
    if needle_tokens.is_empty() {
        return 0.0;
    }
    let window_tokens: BTreeSet<String> = tokenize(window).into_iter().collect();
    let shared = needle_tokens.intersection(&window_tokens).count();
    shared as f64 / needle_tokens.len() as f64
}

fn join<'a>(tokens: impl Iterator<Item = &'a String>) -> String {
    tokens.map(String::as_str).collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}
