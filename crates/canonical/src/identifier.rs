//! Stable identifiers derived from segment text.
//!
//! An identifier has two halves joined by `_`:
//!
//! - a readable **slug**: the text transliterated to lowercase ASCII with
//!   every run of other characters collapsed into one separator, and
//! - a **codepoint fingerprint**: every char of the text as `u` followed by
//!   its codepoint in uppercase hex, at least four digits wide.
//!
//! The fingerprint alone determines the text, so two strings that differ in
//! any codepoint (a combining mark, a lookalike letter) never share an id.
//! [`text_from_id`] recovers the original string.
//!
//! ```
//! use canonical::compute_id;
//!
//! assert_eq!(compute_id("p"), "p_u0070");
//! assert_eq!(compute_id("\u{00E9}"), "e_u00E9");
//! ```
use std::fmt::Write as _;

use deunicode::deunicode_with_tofu;
use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::config::CanonicalizeConfig;

const PART_SEPARATOR: char = '_';
const CODEPOINT_MARKER: char = 'u';

/// Transliterates `text` to a lowercase ASCII slug.
pub fn slug(text: &str, separator: char) -> String {
    let stripped: String = text.nfd().filter(|c| !c.is_mark_nonspacing()).collect();
    let ascii = deunicode_with_tofu(&stripped, "");

    let mut out = String::with_capacity(ascii.len());
    let mut pending_separator = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push(separator);
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

/// Renders every char of `text` as a `uXXXX` token.
pub fn codepoint_fingerprint(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 5);
    for c in text.chars() {
        // writing into a String cannot fail
        let _ = write!(out, "{CODEPOINT_MARKER}{:04X}", u32::from(c));
    }
    out
}

/// Identifier for `text` with the default slug separator.
pub fn compute_id(text: &str) -> String {
    compute_id_with(text, &CanonicalizeConfig::default())
}

pub fn compute_id_with(text: &str, config: &CanonicalizeConfig) -> String {
    let mut id = slug(text, config.slug_separator);
    id.push(PART_SEPARATOR);
    id.push_str(&codepoint_fingerprint(text));
    id
}

/// Recovers the text an identifier was computed from.
///
/// Accepts an id with or without a parameter prefix. Returns `None` when the
/// fingerprint half is malformed.
pub fn text_from_id(id: &str) -> Option<String> {
    let (_, fingerprint) = id.rsplit_once(PART_SEPARATOR)?;
    if fingerprint.is_empty() {
        return Some(String::new());
    }
    let tokens = fingerprint.strip_prefix(CODEPOINT_MARKER)?;
    tokens
        .split(CODEPOINT_MARKER)
        .map(|hex| {
            if hex.len() < 4 {
                return None;
            }
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        })
        .collect()
}
