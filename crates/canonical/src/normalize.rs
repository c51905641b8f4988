//! Structural clean-up of a segment string.
//!
//! ```text
//! raw ──NFC──▶ composed ──strip (…) / […]──▶ normalized text
//! ```
//!
//! Enclosing parentheses and square brackets are how several surveys flag a
//! segment as rare or uncertain, so removing them also marks the result
//! marginal. Stripping repeats until no enclosing pair is left, which keeps
//! [`normalize_grapheme`] idempotent.
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

const ENCLOSURES: [(char, char); 2] = [('(', ')'), ('[', ']')];

/// A segment after Unicode composition and marker stripping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NormalizedSegment {
    pub text: String,
    pub is_marginal: bool,
}

/// Returns the inner slice when `text` is enclosed by `open`…`close`.
pub(crate) fn strip_enclosure(text: &str, open: char, close: char) -> Option<&str> {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if first == open && last == close => Some(chars.as_str()),
        _ => None,
    }
}

/// Applies NFC and strips enclosing `(`…`)` and `[`…`]` pairs.
pub fn normalize_segment(raw: &str) -> NormalizedSegment {
    let composed: String = raw.nfc().collect();
    let mut text = composed.as_str();
    let mut is_marginal = false;

    loop {
        let before = text.len();
        for (open, close) in ENCLOSURES {
            if let Some(inner) = strip_enclosure(text, open, close) {
                text = inner;
                is_marginal = true;
            }
        }
        if text.len() == before {
            break;
        }
    }

    NormalizedSegment {
        text: text.to_string(),
        is_marginal,
    }
}

/// Text-only form of [`normalize_segment`].
pub fn normalize_grapheme(raw: &str) -> String {
    normalize_segment(raw).text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_to_nfc() {
        assert_eq!(normalize_grapheme("e\u{0301}"), "\u{00E9}");
        assert_eq!(normalize_grapheme("a\u{0303}"), "\u{00E3}");
    }

    #[test]
    fn strips_parentheses_and_brackets_as_marginal() {
        let seg = normalize_segment("(p)");
        assert_eq!(seg.text, "p");
        assert!(seg.is_marginal);

        let seg = normalize_segment("[kʰ]");
        assert_eq!(seg.text, "kʰ");
        assert!(seg.is_marginal);

        let seg = normalize_segment("([ŋ])");
        assert_eq!(seg.text, "ŋ");
    }

    #[test]
    fn plain_segments_are_untouched() {
        let seg = normalize_segment("tʃ");
        assert_eq!(seg.text, "tʃ");
        assert!(!seg.is_marginal);

        // unmatched or inner delimiters stay
        assert_eq!(normalize_grapheme("(p"), "(p");
        assert_eq!(normalize_grapheme("p)"), "p)");
        assert_eq!(normalize_grapheme("a(b)c"), "a(b)c");
        assert_eq!(normalize_grapheme("(a]"), "(a]");
    }

    #[test]
    fn bare_delimiter_pair_yields_empty_text() {
        assert_eq!(normalize_grapheme("()"), "");
        assert_eq!(normalize_grapheme("[]"), "");
        assert_eq!(normalize_grapheme("("), "(");
        assert_eq!(normalize_grapheme(")"), ")");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "p",
            "(p)",
            "((p))",
            "[(p)]",
            "([p])",
            "e\u{0301}",
            "(a\u{0303})",
            "()",
            "(",
            "[[]]",
            "t\u{0361}s",
            "\u{0301}",
            "(\u{0301})",
        ];
        for input in inputs {
            let once = normalize_grapheme(input);
            let twice = normalize_grapheme(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }
}
