//! Merging raw entries into values and distinct segments.
//!
//! Every [`RawEntry`] becomes exactly one [`Value`]. Its processed segment
//! goes into a [`SegmentRegistry`], which keeps one copy per parameter id and
//! refuses a second segment that shares an id but differs in any field.
//!
//! ```text
//! RawEntry ─▶ process_segment ─▶ CanonicalSegment ─▶ SegmentRegistry (dedup)
//!     │                                 │
//!     └── language, citations ──────────┴─▶ Value #n
//! ```
use std::collections::HashMap;
use std::time::Instant;

use canonical::{process_segment, slug, CanonicalSegment, CanonicalizeConfig, PhoneticReference};
use ingest::RawEntry;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{error, info, Level};

use crate::bibliography::CitationMap;
use crate::languages::LanguageTable;
use crate::PipelineError;

/// One attestation: this language's inventory contains this segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    /// Sequence number, unique within a run, starting at 1.
    pub id: u64,
    pub language_id: String,
    pub parameter_id: String,
    /// Segment string after marker stripping and allophone simplification.
    pub raw_value: String,
    pub inventory_id: String,
    /// Citation keys; serialized as one `;`-joined string.
    #[serde(with = "citation_list")]
    pub source_citations: Vec<String>,
    pub catalog_tag: String,
    pub marginal: bool,
}

pub(crate) const CITATION_SEPARATOR: &str = ";";

/// Serde adapter writing a key list as `a;b;c`. An empty string reads back
/// as an empty list.
pub(crate) mod citation_list {
    use super::*;

    pub fn serialize<S: Serializer>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&keys.join(CITATION_SEPARATOR))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(joined
            .split(CITATION_SEPARATOR)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Distinct canonical segments in first-seen order, keyed by parameter id.
#[derive(Debug, Clone, Default)]
pub struct SegmentRegistry {
    segments: Vec<CanonicalSegment>,
    by_id: HashMap<String, usize>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `segment` unless an identical one is already present. Returns
    /// `true` when the segment was new.
    ///
    /// A segment whose parameter id is known but whose other fields differ is
    /// an internal consistency violation and fails the run.
    pub fn insert(&mut self, segment: CanonicalSegment) -> Result<bool, PipelineError> {
        if let Some(&idx) = self.by_id.get(&segment.parameter_id) {
            let existing = &self.segments[idx];
            if *existing == segment {
                return Ok(false);
            }
            error!(
                parameter_id = %segment.parameter_id,
                existing = ?existing,
                conflicting = ?segment,
                "inconsistent_segment"
            );
            return Err(PipelineError::InconsistentSegment {
                existing: Box::new(existing.clone()),
                conflicting: Box::new(segment),
            });
        }
        self.by_id
            .insert(segment.parameter_id.clone(), self.segments.len());
        self.segments.push(segment);
        Ok(true)
    }

    pub fn get(&self, parameter_id: &str) -> Option<&CanonicalSegment> {
        self.by_id.get(parameter_id).map(|&idx| &self.segments[idx])
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[CanonicalSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<CanonicalSegment> {
        self.segments
    }
}

/// Result of a full aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub parameters: Vec<CanonicalSegment>,
    pub values: Vec<Value>,
}

impl Aggregation {
    pub fn unresolved_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_resolved()).count()
    }
}

/// Sequential aggregator over a stream of raw entries.
pub struct Aggregator<'a> {
    reference: &'a dyn PhoneticReference,
    config: &'a CanonicalizeConfig,
    languages: &'a LanguageTable,
    citations: &'a CitationMap,
    registry: SegmentRegistry,
    values: Vec<Value>,
    next_id: u64,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        reference: &'a dyn PhoneticReference,
        config: &'a CanonicalizeConfig,
        languages: &'a LanguageTable,
        citations: &'a CitationMap,
    ) -> Self {
        Self {
            reference,
            config,
            languages,
            citations,
            registry: SegmentRegistry::new(),
            values: Vec::new(),
            next_id: 1,
        }
    }

    /// Processes one entry into a value and registers its segment.
    ///
    /// Any marginal flag the reader supplied is replaced by the flag derived
    /// from the segment string.
    pub fn push(&mut self, entry: &RawEntry) -> Result<&Value, PipelineError> {
        let language_id = self
            .languages
            .language_for(&entry.inventory_id)
            .ok_or_else(|| PipelineError::UnmappedInventory {
                inventory_id: entry.inventory_id.clone(),
                source_tag: entry.source_tag.clone(),
            })?
            .to_string();

        let processed = process_segment(&entry.segment_raw, self.reference, self.config)?;
        let parameter_id = processed.segment.parameter_id.clone();
        self.registry.insert(processed.segment)?;

        let id = self.next_id;
        self.next_id += 1;
        self.values.push(Value {
            id,
            language_id,
            parameter_id,
            raw_value: processed.value,
            inventory_id: entry.inventory_id.clone(),
            source_citations: self.citations.citations(&entry.inventory_id).to_vec(),
            catalog_tag: slug(&entry.source_tag, self.config.slug_separator),
            marginal: processed.marginal,
        });
        Ok(&self.values[self.values.len() - 1])
    }

    pub fn finish(self) -> Aggregation {
        Aggregation {
            parameters: self.registry.into_segments(),
            values: self.values,
        }
    }
}

/// Runs every entry through an [`Aggregator`], failing on the first error.
pub fn aggregate(
    entries: &[RawEntry],
    reference: &dyn PhoneticReference,
    config: &CanonicalizeConfig,
    languages: &LanguageTable,
    citations: &CitationMap,
) -> Result<Aggregation, PipelineError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "aggregate", entries = entries.len());
    let _guard = span.enter();

    let mut aggregator = Aggregator::new(reference, config, languages, citations);
    for entry in entries {
        aggregator.push(entry)?;
    }
    let aggregation = aggregator.finish();

    info!(
        values = aggregation.values.len(),
        parameters = aggregation.parameters.len(),
        unresolved = aggregation.unresolved_count(),
        elapsed_micros = start.elapsed().as_micros(),
        "aggregate_success"
    );
    Ok(aggregation)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use canonical::{BipaTable, Transcription};

    use super::*;

    fn entry(tag: &str, inventory: &str, segment: &str, marginal: Option<bool>) -> RawEntry {
        RawEntry {
            language_key: format!("{tag}_Lang{inventory}"),
            source_tag: format!("PHOIBLE_{tag}"),
            inventory_id: inventory.to_string(),
            segment_raw: segment.to_string(),
            marginal,
        }
    }

    fn languages() -> LanguageTable {
        let csv = "ID,Name,Glottocode\n1_a,Lang One,\n2_b,Lang Two,\n";
        LanguageTable::from_reader(csv.as_bytes(), Path::new("languages.csv"), None).expect("languages")
    }

    fn citations() -> CitationMap {
        let csv = "InventoryID,BibtexKey\n1,key1\n1,key2\n";
        CitationMap::from_reader(csv.as_bytes(), Path::new("map.csv")).expect("citations")
    }

    #[test]
    fn values_are_numbered_from_one_in_entry_order() {
        let table = BipaTable::default();
        let cfg = CanonicalizeConfig::default();
        let entries = vec![
            entry("AA", "1", "p", None),
            entry("RA", "2", "t", None),
            entry("AA", "1", "k", None),
        ];
        let out = aggregate(&entries, &table, &cfg, &languages(), &citations()).expect("aggregate");
        let ids: Vec<u64> = out.values.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(out.values[0].language_id, "1_a");
        assert_eq!(out.values[1].language_id, "2_b");
        assert_eq!(out.values[0].source_citations, vec!["key1", "key2"]);
        assert!(out.values[1].source_citations.is_empty());
        assert_eq!(out.values[0].catalog_tag, "phoible-aa");
    }

    #[test]
    fn equal_segments_from_different_sources_collapse() {
        let table = BipaTable::default();
        let cfg = CanonicalizeConfig::default();
        let entries = vec![entry("AA", "1", "a", None), entry("RA", "2", "(a)", None)];
        let out = aggregate(&entries, &table, &cfg, &languages(), &citations()).expect("aggregate");

        assert_eq!(out.parameters.len(), 1);
        assert_eq!(out.values.len(), 2);
        assert_eq!(out.values[0].parameter_id, out.values[1].parameter_id);
        assert_eq!(out.values[0].parameter_id, out.parameters[0].parameter_id);
    }

    #[test]
    fn string_shape_overrides_reader_flag() {
        let table = BipaTable::default();
        let cfg = CanonicalizeConfig::default();
        let entries = vec![
            entry("UPSID", "1", "(x)", Some(true)),
            entry("UPSID", "1", "x", Some(true)),
            entry("UPSID", "1", "<x>", Some(false)),
        ];
        let out = aggregate(&entries, &table, &cfg, &languages(), &citations()).expect("aggregate");
        let flags: Vec<bool> = out.values.iter().map(|v| v.marginal).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn allophone_group_is_simplified_before_lookup() {
        let table = BipaTable::default();
        let cfg = CanonicalizeConfig::default();
        let entries = vec![entry("AA", "1", "p|pʰ", None)];
        let out = aggregate(&entries, &table, &cfg, &languages(), &citations()).expect("aggregate");
        assert_eq!(out.values[0].raw_value, "p");
        assert_eq!(out.parameters[0].normalized_text, "p");
    }

    #[test]
    fn unmapped_inventory_is_fatal() {
        let table = BipaTable::default();
        let cfg = CanonicalizeConfig::default();
        let entries = vec![entry("AA", "1", "p", None), entry("AA", "99", "p", None)];
        let err = aggregate(&entries, &table, &cfg, &languages(), &citations()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnmappedInventory { ref inventory_id, .. } if inventory_id == "99"
        ));
    }

    #[test]
    fn unresolved_segments_are_kept_with_unknown_prefix() {
        let table = BipaTable::default();
        let cfg = CanonicalizeConfig::default();
        let entries = vec![entry("AA", "1", "p", None), entry("AA", "1", "@", None)];
        let out = aggregate(&entries, &table, &cfg, &languages(), &citations()).expect("aggregate");
        assert_eq!(out.unresolved_count(), 1);
        assert!(out.parameters[1].parameter_id.starts_with("UNK_"));
        assert_eq!(out.parameters[1].canonical_form, "");
    }

    /// Resolves the same text differently on every call.
    struct Flaky(std::cell::Cell<u32>);

    impl PhoneticReference for Flaky {
        fn resolve(&self, text: &str) -> Transcription {
            let n = self.0.get();
            self.0.set(n + 1);
            Transcription::Known {
                grapheme: text.to_string(),
                name: format!("reading {n}"),
            }
        }
    }

    #[test]
    fn conflicting_tuple_for_same_id_is_fatal() {
        let reference = Flaky(std::cell::Cell::new(0));
        let cfg = CanonicalizeConfig::default();
        let entries = vec![entry("AA", "1", "p", None), entry("RA", "2", "p", None)];
        let err = aggregate(&entries, &reference, &cfg, &languages(), &citations()).unwrap_err();
        match err {
            PipelineError::InconsistentSegment { existing, conflicting } => {
                assert_eq!(existing.parameter_id, conflicting.parameter_id);
                assert_eq!(existing.description, "reading 0");
                assert_eq!(conflicting.description, "reading 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn registry_reports_new_and_known_segments() {
        let mut registry = SegmentRegistry::new();
        let segment = CanonicalSegment {
            parameter_id: "BIPA_p_u0070".into(),
            normalized_text: "p".into(),
            canonical_form: "p".into(),
            description: "voiceless bilabial stop consonant".into(),
        };
        assert!(registry.insert(segment.clone()).expect("insert"));
        assert!(!registry.insert(segment.clone()).expect("insert"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("BIPA_p_u0070"), Some(&segment));
    }
}
