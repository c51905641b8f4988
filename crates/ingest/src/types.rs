//! Core data types for the ingest crate.
//!
//! A survey source is described by a [`SourceSpec`]: which reader family
//! understands its layout, the short tag the survey is known by, and where its
//! file (or directory, for multi-file families) lives. Reading any source
//! yields a flat list of [`RawEntry`] records in file order.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Prefix shared by every catalog tag emitted by the bundled readers.
pub const SOURCE_TAG_PREFIX: &str = "PHOIBLE";

/// One attested segment as reported by a survey, before any normalization.
///
/// `language_key` is scoped to its source (`"<TAG>_<name>"`); it is not yet
/// resolved to a global language identity. `marginal` is only populated by
/// families that encode anomalous segments in a dedicated column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    pub language_key: String,
    pub source_tag: String,
    pub inventory_id: String,
    pub segment_raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal: Option<bool>,
}

impl RawEntry {
    pub(crate) fn new(
        tag: &str,
        language_name: &str,
        inventory_id: impl Into<String>,
        segment_raw: impl Into<String>,
    ) -> Self {
        Self {
            language_key: format!("{tag}_{language_name}"),
            source_tag: source_tag(tag),
            inventory_id: inventory_id.into(),
            segment_raw: segment_raw.into(),
            marginal: None,
        }
    }
}

/// Builds the provenance tag for a survey, e.g. `PHOIBLE_AA`.
pub fn source_tag(tag: &str) -> String {
    format!("{SOURCE_TAG_PREFIX}_{tag}")
}

/// The closed set of legacy table layouts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceFamily {
    /// Tab-separated rows where inventory id and language name are only given on
    /// the first row of each block.
    RowInheritance,
    /// Comma-separated presence matrix with two preamble rows and a fixed set of
    /// metadata columns.
    BinaryMatrix,
    /// Tab-separated presence matrix whose segment columns sit between a fixed
    /// prefix and suffix of metadata columns.
    WindowedMatrix,
    /// Four tab-separated files joined in memory (languages, inventory codes,
    /// segment codes, segment rows).
    CrossReference,
}

impl SourceFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFamily::RowInheritance => "row_inheritance",
            SourceFamily::BinaryMatrix => "binary_matrix",
            SourceFamily::WindowedMatrix => "windowed_matrix",
            SourceFamily::CrossReference => "cross_reference",
        }
    }
}

/// Location and layout of one survey source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    /// Short survey tag (`AA`, `RA`, `UPSID`, ...).
    pub tag: String,
    pub family: SourceFamily,
    /// File for single-file families, directory for [`SourceFamily::CrossReference`].
    pub path: PathBuf,
}

impl SourceSpec {
    pub fn new(tag: impl Into<String>, family: SourceFamily, path: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            family,
            path: path.into(),
        }
    }

    /// Provenance tag attached to every entry this source yields.
    pub fn source_tag(&self) -> String {
        source_tag(&self.tag)
    }

    /// Returns a copy with a relative `path` resolved against `root`.
    pub fn rooted_at(&self, root: &Path) -> Self {
        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        };
        Self {
            path,
            ..self.clone()
        }
    }
}

/// Ordered list of sources. Order only affects the sequence numbers assigned to
/// values downstream, never which entries are produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCatalog {
    pub sources: Vec<SourceSpec>,
}

impl SourceCatalog {
    pub fn new(sources: Vec<SourceSpec>) -> Self {
        Self { sources }
    }

    /// The documented layout of the upstream survey archive under `raw_dir`.
    pub fn phoible(raw_dir: impl AsRef<Path>) -> Self {
        let base = raw_dir.as_ref().join("phoible-dev").join("raw-data");
        let row = |tag: &str, dir: &str, file: &str| {
            SourceSpec::new(tag, SourceFamily::RowInheritance, base.join(dir).join(file))
        };

        Self::new(vec![
            row("AA", "AA", "AA_inventories.tsv"),
            row("EA", "EA", "EA_inventories.tsv"),
            row("ER", "ER", "ER_inventories.tsv"),
            row("GM", "GM", "gm-afr-inventories.tsv"),
            row("GM", "GM", "gm-sea-inventories.tsv"),
            row("PH", "PH", "phoible_inventories.tsv"),
            row("UZ", "UZ", "UZ_inventories.tsv"),
            SourceSpec::new(
                "RA",
                SourceFamily::BinaryMatrix,
                base.join("RA").join("Ramaswami1999.csv"),
            ),
            SourceSpec::new(
                "SAPHON",
                SourceFamily::WindowedMatrix,
                base.join("SAPHON").join("saphon20121031.tsv"),
            ),
            SourceSpec::new("UPSID", SourceFamily::CrossReference, base.join("UPSID")),
        ])
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
