use thiserror::Error;

/// Errors that can occur while canonicalizing segments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("raw segment is empty")]
    EmptySegment,
    #[error("invalid reference table row {row}: {reason}")]
    InvalidReferenceRow { row: usize, reason: String },
    #[error("failed to read reference table: {0}")]
    ReferenceRead(String),
}
