//! Phonorm ingest layer.
//!
//! This is where survey data enters the pipeline. Each legacy source family
//! publishes its phoneme inventories in a different ad-hoc table layout; the
//! readers here turn every one of them into the same flat [`RawEntry`] shape.
//!
//! ## What we do here
//!
//! - **Row-inheritance tables** - carry inventory id and language name forward
//!   over sparse rows ([`read_row_inheritance`])
//! - **Presence matrices** - one column per segment, `"1"` marks presence
//!   ([`read_binary_matrix`], [`read_windowed_matrix`])
//! - **Cross-referenced files** - join four files on name, number and segment
//!   code ([`read_cross_reference`])
//! - **Log everything** - one structured `tracing` event per source read.
//!
//! Readers are pure functions of their input and share no state. A reader
//! that cannot find an expected file or column fails the whole source.
//!
//! ## Example
//!
//! ```
//! use ingest::read_row_inheritance;
//!
//! let table = "InventoryID\tLanguageName\tPhoneme\n1\tKhmer\tp\n\t\tt\n";
//! let entries = read_row_inheritance(table.as_bytes(), "AA").unwrap();
//!
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[1].inventory_id, "1");
//! assert_eq!(entries[1].language_key, "AA_Khmer");
//! ```
use std::time::Instant;

use tracing::{info, warn, Level};

mod common;
mod error;
mod matrix;
mod table;
mod types;
mod upsid;

pub use crate::common::{read_row_inheritance, SEGMENT_COLUMNS};
pub use crate::error::IngestError;
pub use crate::matrix::{
    read_binary_matrix, read_windowed_matrix, BINARY_MATRIX_METADATA,
    BINARY_MATRIX_PREAMBLE_ROWS, WINDOW_PREFIX, WINDOW_SUFFIX,
};
pub use crate::types::{
    source_tag, RawEntry, SourceCatalog, SourceFamily, SourceSpec, SOURCE_TAG_PREFIX,
};
pub use crate::upsid::{
    read_cross_reference, CrossReferenceFiles, CHAR_CODES_FILE, LANGUAGES_FILE,
    LANGUAGE_CODES_FILE, SEGMENTS_FILE,
};

/// Reads one source with the reader for its family.
pub fn read_source(spec: &SourceSpec) -> Result<Vec<RawEntry>, IngestError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "ingest.read_source",
        source = %spec.source_tag(),
        family = spec.family.as_str(),
    );
    let _guard = span.enter();

    let result = match spec.family {
        SourceFamily::RowInheritance => common::read_row_inheritance_file(&spec.path, &spec.tag),
        SourceFamily::BinaryMatrix => matrix::read_binary_matrix_file(&spec.path, &spec.tag),
        SourceFamily::WindowedMatrix => matrix::read_windowed_matrix_file(&spec.path, &spec.tag),
        SourceFamily::CrossReference => upsid::read_cross_reference_dir(&spec.path, &spec.tag),
    };

    let elapsed_micros = start.elapsed().as_micros();
    match result {
        Ok(entries) => {
            info!(
                path = %spec.path.display(),
                entries = entries.len(),
                elapsed_micros,
                "read_source_success"
            );
            Ok(entries)
        }
        Err(err) => {
            warn!(
                path = %spec.path.display(),
                error = %err,
                elapsed_micros,
                "read_source_failure"
            );
            Err(err)
        }
    }
}

/// Reads every source in catalog order and concatenates the results.
/// The first failing source aborts the whole read.
pub fn read_catalog(catalog: &SourceCatalog) -> Result<Vec<RawEntry>, IngestError> {
    let mut entries = Vec::new();
    for spec in &catalog.sources {
        entries.extend(read_source(spec)?);
    }
    info!(
        sources = catalog.len(),
        entries = entries.len(),
        "read_catalog_complete"
    );
    Ok(entries)
}
