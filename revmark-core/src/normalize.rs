//! Whitespace normalization for comparison
//!
//! Normalization collapses every run of Unicode whitespace (newlines included)
//! to a single ASCII space and trims both ends. All other characters are kept
//! verbatim: no case folding, no diacritic stripping, so Greek letters and
//! mathematical symbols compare exactly.
//!
//! [`NormalizedText`] additionally remembers where every normalized character
//! came from in the raw text. Match offsets live in normalized space, while
//! text written back into a document is always cut from the raw paragraph.

use std::ops::Range;

/// Normalize `text` for comparison purposes.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Whitespace-normalized view of a raw string with a character map back to it
#[derive(Debug, Clone)]
pub struct NormalizedText<'a> {
    raw: &'a str,
    text: String,
    /// Byte offset in `text` of each normalized char, plus a final `text.len()`
    byte_offsets: Vec<usize>,
    /// Raw byte range each normalized char stands for
    raw_ranges: Vec<Range<usize>>,
}

impl<'a> NormalizedText<'a> {
    /// Build the normalized view of `raw`
    pub fn new(raw: &'a str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut byte_offsets = Vec::with_capacity(raw.len() + 1);
        let mut raw_ranges = Vec::with_capacity(raw.len());

        // Raw byte offset where the pending whitespace gap started
        let mut gap_start: Option<usize> = None;

        for (idx, ch) in raw.char_indices() {
            if ch.is_whitespace() {
                if gap_start.is_none() && !text.is_empty() {
                    gap_start = Some(idx);
                }
                continue;
            }

            if let Some(start) = gap_start.take() {
                byte_offsets.push(text.len());
                raw_ranges.push(start..idx);
                text.push(' ');
            }

            byte_offsets.push(text.len());
            raw_ranges.push(idx..idx + ch.len_utf8());
            text.push(ch);
        }
        byte_offsets.push(text.len());

        Self {
            raw,
            text,
            byte_offsets,
            raw_ranges,
        }
    }

    /// The raw text this view was built from
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The normalized text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the normalized text in characters
    pub fn char_len(&self) -> usize {
        self.raw_ranges.len()
    }

    /// Whether the normalized text is empty
    pub fn is_empty(&self) -> bool {
        self.raw_ranges.is_empty()
    }

    /// Normalized substring for the char range `start..end`
    ///
    /// Out-of-range bounds are clamped.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let len = self.char_len();
        let end = end.min(len);
        let start = start.min(end);
        &self.text[self.byte_offsets[start]..self.byte_offsets[end]]
    }

    /// Convert a byte offset in the normalized text into a char offset
    pub fn char_offset_of_byte(&self, byte: usize) -> usize {
        match self.byte_offsets.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }

    /// Raw byte offset where normalized char `start` begins
    ///
    /// `char_len()` maps to the end of the raw text so trailing whitespace
    /// stays with the remainder.
    pub fn raw_start(&self, start: usize) -> usize {
        if start >= self.char_len() {
            self.raw.len()
        } else {
            self.raw_ranges[start].start
        }
    }

    /// Raw byte offset where normalized char `end - 1` ends
    ///
    /// `0` maps to the raw start so leading whitespace stays with the first gap.
    pub fn raw_end(&self, end: usize) -> usize {
        if end == 0 {
            0
        } else {
            self.raw_ranges[end.min(self.char_len()) - 1].end
        }
    }

    /// Raw substring covering the normalized char range `start..end`
    pub fn raw_slice(&self, start: usize, end: usize) -> &'a str {
        if start >= end {
            return "";
        }
        &self.raw[self.raw_start(start)..self.raw_end(end)]
    }

    /// Char offsets at which words begin
    pub fn word_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut prev_space = true;
        for (idx, ch) in self.text.chars().enumerate() {
            if ch == ' ' {
                prev_space = true;
            } else {
                if prev_space {
                    starts.push(idx);
                }
                prev_space = false;
            }
        }
        starts
    }

    /// Char offsets at which words end (exclusive)
    pub fn word_ends(&self) -> Vec<usize> {
        let mut ends = Vec::new();
        let mut prev_word = false;
        for (idx, ch) in self.text.chars().enumerate() {
            if ch == ' ' {
                if prev_word {
                    ends.push(idx);
                }
                prev_word = false;
            } else {
                prev_word = true;
            }
        }
        if prev_word {
            ends.push(self.char_len());
        }
        ends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  The  pelvis\nwas\t\tconstrained  "), "The pelvis was constrained");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_normalize_preserves_symbols_and_case() {
        assert_eq!(normalize("E = 0.4 MPa⁻¹ ± 5%"), "E = 0.4 MPa⁻¹ ± 5%");
        assert_eq!(normalize("α  β\u{00A0}γ"), "α β γ");
        assert_eq!(normalize("Risser SIGN"), "Risser SIGN");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("  a \n b\u{2003}c ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalized_text_maps_back_to_raw() {
        let raw = "  Growth  was\nmodeled. ";
        let view = NormalizedText::new(raw);

        assert_eq!(view.as_str(), "Growth was modeled.");
        assert_eq!(view.char_len(), 19);
        assert_eq!(view.raw_slice(0, 10), "Growth  was");
        assert_eq!(view.raw_slice(7, 19), "was\nmodeled.");
        assert_eq!(view.raw_start(0), 2);
        assert_eq!(view.raw_end(view.char_len()), raw.len() - 1);
        assert_eq!(view.raw_start(view.char_len()), raw.len());
    }

    #[test]
    fn test_normalized_text_multibyte() {
        let view = NormalizedText::new("θ  ≈ 0.5°");
        assert_eq!(view.as_str(), "θ ≈ 0.5°");
        assert_eq!(view.char_len(), 8);
        assert_eq!(view.slice(2, 3), "≈");
        assert_eq!(view.raw_slice(0, 3), "θ  ≈");
        let byte = view.as_str().find("0.5").unwrap();
        assert_eq!(view.char_offset_of_byte(byte), 4);
    }

    #[test]
    fn test_word_boundaries() {
        let view = NormalizedText::new("one two  three");
        assert_eq!(view.word_starts(), vec![0, 4, 8]);
        assert_eq!(view.word_ends(), vec![3, 7, 13]);

        let empty = NormalizedText::new("   ");
        assert!(empty.is_empty());
        assert!(empty.word_starts().is_empty());
        assert!(empty.word_ends().is_empty());
    }
}
