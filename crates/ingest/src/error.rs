//! Error types produced by the ingest crate.
//!
//! Every reader failure is fatal for its source: a survey table that is
//! missing a column or a file cannot be partially trusted, so readers never
//! fall back to emitting a subset of rows.
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | [`Io`](IngestError::Io) | A source file cannot be opened or read |
//! | [`Csv`](IngestError::Csv) | The tabular parser rejects a record |
//! | [`MissingColumn`](IngestError::MissingColumn) | An expected header is absent |
//! | [`MissingPreamble`](IngestError::MissingPreamble) | A matrix file ends before its header row |
//! | [`HeaderTooShort`](IngestError::HeaderTooShort) | A windowed matrix header is shorter than its fixed metadata blocks |
//! | [`OrphanRow`](IngestError::OrphanRow) | A sparse row precedes any inventory/language value |
//! | [`UnknownLanguage`](IngestError::UnknownLanguage) | A cross-reference join key is missing |
//! | [`UnknownCharCode`](IngestError::UnknownCharCode) | A segment code has no phonetic string |
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a survey source.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IngestError {
    /// A source file could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tabular parser rejected the file contents.
    #[error("malformed table in {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    /// A column the reader depends on is not present in the header.
    #[error("{source_name}: missing expected column `{column}`")]
    MissingColumn { source_name: String, column: String },

    /// A matrix file ended before its descriptive preamble and header were read.
    #[error("{source_name}: file ended before header row {row}")]
    MissingPreamble { source_name: String, row: usize },

    /// A windowed matrix header is too short to hold the excluded prefix and suffix.
    #[error("{source_name}: header has {columns} columns, need at least {required}")]
    HeaderTooShort {
        source_name: String,
        columns: usize,
        required: usize,
    },

    /// A sparse row appeared before any inventory id or language name was seen.
    #[error("{source_name}: row {row} has no inventory id or language name to inherit")]
    OrphanRow { source_name: String, row: usize },

    /// A cross-reference join key did not resolve to a language.
    #[error("{source_name}: unknown language key `{key}`")]
    UnknownLanguage { source_name: String, key: String },

    /// A segment code did not resolve to a phonetic string.
    #[error("{source_name}: unknown segment code `{code}`")]
    UnknownCharCode { source_name: String, code: String },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(source_name: &str, source: csv::Error) -> Self {
        IngestError::Csv {
            source_name: source_name.to_string(),
            source,
        }
    }

    pub(crate) fn missing_column(source_name: &str, column: &str) -> Self {
        IngestError::MissingColumn {
            source_name: source_name.to_string(),
            column: column.to_string(),
        }
    }
}
