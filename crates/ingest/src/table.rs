//! Shared plumbing for the tabular readers: opening files, building `csv`
//! readers for the two delimiters in use, and header lookups.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::IngestError;

pub(crate) fn open(path: &Path) -> Result<BufReader<File>, IngestError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| IngestError::io(path, err))
}

/// Builds a lenient reader: rows may be shorter or longer than the header.
pub(crate) fn reader<R: Read>(input: R, delimiter: u8, has_headers: bool) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(input)
}

/// Column-name lookup over a header record. Duplicate names resolve to the
/// right-most column.
#[derive(Debug, Clone)]
pub(crate) struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub(crate) fn new(record: &StringRecord) -> Self {
        let names: Vec<String> = record.iter().map(str::to_string).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.clone(), pos))
            .collect();
        Self { names, index }
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn require(&self, source_name: &str, name: &str) -> Result<usize, IngestError> {
        self.position(name)
            .ok_or_else(|| IngestError::missing_column(source_name, name))
    }

    /// First of `candidates` present in the header.
    pub(crate) fn first_of(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|name| self.position(name))
    }
}

/// Cell value, empty when the row is shorter than the header.
pub(crate) fn cell(record: &StringRecord, pos: usize) -> &str {
    record.get(pos).unwrap_or("")
}
