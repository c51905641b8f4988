//! Workspace umbrella crate for phonorm.
//!
//! This crate stitches the survey readers ([`ingest`]) and the segment
//! canonicalizer ([`canonical`]) together with the collaborators a full run
//! needs: the language table, the taxonomy, the citation map and the
//! bibliography. [`run_pipeline`] is the single entry point; the result is a
//! [`Dataset`] ready for a [`DatasetWriter`].
//!
//! The run is one sequential pass. Any failing source, unmapped inventory or
//! inconsistent segment aborts it; there is no partial output.

pub mod aggregate;
pub mod bibliography;
pub mod config;
pub mod languages;
pub mod output;

pub use canonical::{
    apply_shape_rules, canonicalize, compute_id, normalize_grapheme, process_segment, slug,
    BipaTable, CanonicalError, CanonicalSegment, CanonicalizeConfig, PhoneticReference,
    Transcription,
};
pub use ingest::{read_catalog, read_source, IngestError, RawEntry, SourceCatalog, SourceFamily, SourceSpec};

pub use crate::aggregate::{aggregate, Aggregation, Aggregator, SegmentRegistry, Value};
pub use crate::bibliography::{BibEntry, Bibliography, CitationMap};
pub use crate::config::{ConfigLoadError, OutputFormat, PipelineConfig};
pub use crate::languages::{Language, LanguageTable, Languoid, Taxonomy, TaxonomyTable};
pub use crate::output::{
    writer_for, CsvWriter, Dataset, DatasetSummary, DatasetWriter, Inventory, JsonWriter,
};

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn, Level};

/// Errors that can occur while running the pipeline.
#[derive(Debug)]
pub enum PipelineError {
    Ingest(IngestError),
    Canonical(CanonicalError),
    Config(ConfigLoadError),
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    Json(serde_json::Error),
    InvalidRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },
    UnmappedInventory {
        inventory_id: String,
        source_tag: String,
    },
    UnknownGlottocode {
        language_id: String,
        glottocode: String,
    },
    InconsistentSegment {
        existing: Box<CanonicalSegment>,
        conflicting: Box<CanonicalSegment>,
    },
}

impl PipelineError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "ingest failure: {err}"),
            PipelineError::Canonical(err) => write!(f, "canonicalization failure: {err}"),
            PipelineError::Config(err) => write!(f, "configuration failure: {err}"),
            PipelineError::Io { path, source } => {
                write!(f, "i/o failure on {}: {source}", path.display())
            }
            PipelineError::Csv { path, source } => {
                write!(f, "malformed table {}: {source}", path.display())
            }
            PipelineError::Json(err) => write!(f, "json serialization failed: {err}"),
            PipelineError::InvalidRow { path, row, reason } => {
                write!(f, "invalid row {row} in {}: {reason}", path.display())
            }
            PipelineError::UnmappedInventory {
                inventory_id,
                source_tag,
            } => write!(
                f,
                "inventory `{inventory_id}` from {source_tag} has no language mapping"
            ),
            PipelineError::UnknownGlottocode {
                language_id,
                glottocode,
            } => write!(
                f,
                "language `{language_id}` references unknown glottocode `{glottocode}`"
            ),
            PipelineError::InconsistentSegment {
                existing,
                conflicting,
            } => write!(
                f,
                "parameter id `{}` maps to conflicting segments ({:?} vs {:?})",
                existing.parameter_id, existing.description, conflicting.description
            ),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Canonical(err) => Some(err),
            PipelineError::Config(err) => Some(err),
            PipelineError::Io { source, .. } => Some(source),
            PipelineError::Csv { source, .. } => Some(source),
            PipelineError::Json(err) => Some(err),
            PipelineError::InvalidRow { .. }
            | PipelineError::UnmappedInventory { .. }
            | PipelineError::UnknownGlottocode { .. }
            | PipelineError::InconsistentSegment { .. } => None,
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<CanonicalError> for PipelineError {
    fn from(value: CanonicalError) -> Self {
        PipelineError::Canonical(value)
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Json(value)
    }
}

/// Aggregates already-read entries into a dataset.
///
/// This is the pure half of [`run_pipeline`]: no file access, the
/// collaborators are passed in.
pub fn process_entries(
    entries: &[RawEntry],
    reference: &dyn PhoneticReference,
    config: &CanonicalizeConfig,
    languages: &LanguageTable,
    citations: &CitationMap,
    bibliography: Option<&Bibliography>,
) -> Result<Dataset, PipelineError> {
    config.validate()?;
    let aggregation = aggregate::aggregate(entries, reference, config, languages, citations)?;

    let sources = match bibliography {
        Some(bibliography) => bibliography.select(
            aggregation
                .values
                .iter()
                .flat_map(|value| value.source_citations.iter().map(String::as_str)),
        ),
        None => Vec::new(),
    };

    Ok(Dataset::new(
        languages.languages().to_vec(),
        aggregation,
        sources,
    ))
}

/// Loads every collaborator named by `config`, reads all sources and
/// aggregates them.
pub fn run_pipeline(config: &PipelineConfig) -> Result<Dataset, PipelineError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "pipeline.run",
        name = config.name.as_deref().unwrap_or("unnamed"),
    );
    let _guard = span.enter();

    config.validate()?;

    let reference = match &config.reference_path {
        Some(path) => BipaTable::from_path(path)?,
        None => BipaTable::default(),
    };
    info!(
        bases = reference.base_count(),
        modifiers = reference.modifier_count(),
        "reference_ready"
    );

    let taxonomy = config
        .taxonomy_path
        .as_deref()
        .map(TaxonomyTable::from_path)
        .transpose()?;
    if taxonomy.is_none() {
        warn!("no taxonomy configured, languages keep id, name and glottocode only");
    }
    let languages = LanguageTable::from_path(
        &config.languages_path,
        taxonomy.as_ref().map(|t| t as &dyn Taxonomy),
    )?;
    let citations = CitationMap::from_path(&config.citation_map_path)?;
    let bibliography = config
        .bibliography_path
        .as_deref()
        .map(Bibliography::from_path)
        .transpose()?;

    let entries = read_catalog(&config.catalog())?;
    let dataset = process_entries(
        &entries,
        &reference,
        &config.canonical,
        &languages,
        &citations,
        bibliography.as_ref(),
    )?;

    let summary = dataset.summary();
    info!(
        values = summary.values,
        parameters = summary.parameters,
        unresolved = summary.unresolved,
        languages = summary.languages,
        sources = summary.sources,
        elapsed_micros = start.elapsed().as_micros(),
        "pipeline_success"
    );
    Ok(dataset)
}
