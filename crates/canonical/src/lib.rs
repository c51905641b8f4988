//! Phonorm canonical segment layer.
//!
//! This crate turns one raw segment string into a stable segment identity.
//! The aggregation stage relies on it to merge the same sound reported by
//! different surveys.
//!
//! ## What we do
//!
//! - String-shape rules: marginal bounds and allophone groups ([`apply_shape_rules`])
//! - Unicode composition and bracket stripping ([`normalize_segment`])
//! - Lookup in a phonetic reference ([`PhoneticReference`], [`BipaTable`])
//! - Readable, reversible identifiers ([`compute_id`])
//!
//! ## Pure function guarantee
//!
//! No I/O outside [`BipaTable::from_path`], no clock calls, no locale
//! dependence. The parameter id of a segment depends only on its normalized
//! text, the reference and the config, never on which source reported it.
//!
//! ## Invariants worth knowing
//!
//! - `normalize_grapheme(normalize_grapheme(s)) == normalize_grapheme(s)`
//! - Distinct normalized texts have distinct codepoint fingerprints
//! - Resolved ids start with `BIPA_`, unresolved ones with `UNK_` (configurable)
//!
//! ```
//! use canonical::{process_segment, BipaTable, CanonicalizeConfig};
//!
//! let table = BipaTable::default();
//! let cfg = CanonicalizeConfig::default();
//! let a = process_segment("a", &table, &cfg).unwrap();
//! let b = process_segment("[a]", &table, &cfg).unwrap();
//!
//! assert_eq!(a.segment, b.segment);
//! assert!(!a.marginal);
//! assert!(b.marginal);
//! ```

mod config;
mod error;
mod identifier;
mod normalize;
mod reference;
mod segment;
mod shape;

pub use crate::config::CanonicalizeConfig;
pub use crate::error::CanonicalError;
pub use crate::identifier::{codepoint_fingerprint, compute_id, compute_id_with, slug, text_from_id};
pub use crate::normalize::{normalize_grapheme, normalize_segment, NormalizedSegment};
pub use crate::reference::{BipaTable, PhoneticReference, Transcription};
pub use crate::segment::{canonicalize, process_segment, CanonicalSegment, ProcessedSegment};
pub use crate::shape::{apply_shape_rules, SegmentShape};
