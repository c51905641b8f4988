//! String-shape rules applied to a raw segment before normalization.
//!
//! Two rules run in order:
//!
//! 1. A segment bounded by `<`…`>`, `'`…`'` or `"`…`"` loses the bounding
//!    characters and is flagged marginal.
//! 2. If what remains is at least three characters long and contains `|`,
//!    only the part before the first `|` is kept. The alternatives after the
//!    pipe are an allophone group and are dropped without further parsing.
//!
//! The marginal flag produced here replaces any flag a reader supplied; it
//! is never merged with it.
use serde::{Deserialize, Serialize};

use crate::normalize::strip_enclosure;

const MARGINAL_BOUNDS: [(char, char); 3] = [('<', '>'), ('\'', '\''), ('"', '"')];
const ALLOPHONE_SEPARATOR: char = '|';
const ALLOPHONE_MIN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentShape {
    /// Effective segment string handed to the normalizer.
    pub segment: String,
    pub marginal: bool,
}

/// Applies the marginal-bound and allophone-group rules to `raw`.
///
/// ```
/// use canonical::apply_shape_rules;
///
/// let shape = apply_shape_rules("<ts>");
/// assert_eq!(shape.segment, "ts");
/// assert!(shape.marginal);
///
/// assert_eq!(apply_shape_rules("p|pʰ").segment, "p");
/// ```
pub fn apply_shape_rules(raw: &str) -> SegmentShape {
    let (mut segment, marginal) = MARGINAL_BOUNDS
        .iter()
        .find_map(|&(open, close)| {
            // a lone quote character is not a bounded pair
            if raw.chars().count() < 2 {
                return None;
            }
            strip_enclosure(raw, open, close)
        })
        .map_or((raw, false), |inner| (inner, true));

    if segment.chars().count() >= ALLOPHONE_MIN_CHARS {
        if let Some((head, _)) = segment.split_once(ALLOPHONE_SEPARATOR) {
            segment = head;
        }
    }

    SegmentShape {
        segment: segment.to_string(),
        marginal,
    }
}
