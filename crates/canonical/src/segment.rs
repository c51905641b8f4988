use serde::{Deserialize, Serialize};

use crate::config::CanonicalizeConfig;
use crate::error::CanonicalError;
use crate::identifier::compute_id_with;
use crate::normalize::normalize_segment;
use crate::reference::{PhoneticReference, Transcription};
use crate::shape::apply_shape_rules;

/// A distinct phonetic segment as emitted in the parameter table.
///
/// Every field is a pure function of `normalized_text`, the reference and
/// the config. Two entries with the same normalized text always yield equal
/// segments, whatever source they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalSegment {
    pub parameter_id: String,
    pub normalized_text: String,
    /// Empty when the reference does not know the segment.
    pub canonical_form: String,
    /// Empty when the reference does not know the segment.
    pub description: String,
}

impl CanonicalSegment {
    /// True when the reference recognized the segment.
    pub fn is_resolved(&self) -> bool {
        !self.canonical_form.is_empty()
    }
}

/// Resolves a normalized string and derives its parameter id.
pub fn canonicalize(
    normalized_text: &str,
    reference: &dyn PhoneticReference,
    cfg: &CanonicalizeConfig,
) -> CanonicalSegment {
    let (canonical_form, description, resolved) = match reference.resolve(normalized_text) {
        Transcription::Known { grapheme, name } => (grapheme, name, true),
        Transcription::Unknown => (String::new(), String::new(), false),
    };

    let mut parameter_id = cfg.prefix(resolved).to_string();
    parameter_id.push_str(&compute_id_with(normalized_text, cfg));

    CanonicalSegment {
        parameter_id,
        normalized_text: normalized_text.to_string(),
        canonical_form,
        description,
    }
}

/// Everything derived from one raw segment string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSegment {
    /// The raw string after shape rules, as reported in the value table.
    pub value: String,
    pub segment: CanonicalSegment,
    pub marginal: bool,
}

/// Shape rules, normalization and canonicalization of one raw segment.
///
/// The returned `marginal` flag comes from the string alone. Callers that
/// hold a flag from the source replace it with this one.
///
/// ```
/// use canonical::{process_segment, BipaTable, CanonicalizeConfig};
///
/// let table = BipaTable::default();
/// let cfg = CanonicalizeConfig::default();
///
/// let out = process_segment("(kʰ)", &table, &cfg).unwrap();
/// assert!(out.marginal);
/// assert_eq!(out.segment.normalized_text, "kʰ");
/// assert!(out.segment.parameter_id.starts_with("BIPA_"));
/// ```
pub fn process_segment(
    raw: &str,
    reference: &dyn PhoneticReference,
    cfg: &CanonicalizeConfig,
) -> Result<ProcessedSegment, CanonicalError> {
    if raw.is_empty() {
        return Err(CanonicalError::EmptySegment);
    }
    let shape = apply_shape_rules(raw);
    let normalized = normalize_segment(&shape.segment);
    let segment = canonicalize(&normalized.text, reference, cfg);

    Ok(ProcessedSegment {
        value: shape.segment,
        segment,
        marginal: shape.marginal || normalized.is_marginal,
    })
}
