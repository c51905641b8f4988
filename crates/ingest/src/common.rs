//! Reader for the row-inheritance family (AA, EA, ER, GM, PH, UZ).
//!
//! These tab-separated tables only fill `InventoryID` and `LanguageName` on the
//! first row of each inventory block; following rows leave them blank and
//! inherit the last non-empty value. The segment itself comes from the first
//! column present among `PhonemeOld`, `Segment` and `Phoneme`.
use std::io::Read;
use std::path::Path;

use crate::error::IngestError;
use crate::table::{self, cell, Header};
use crate::types::{source_tag, RawEntry};

/// Segment column names, highest priority first.
pub const SEGMENT_COLUMNS: [&str; 3] = ["PhonemeOld", "Segment", "Phoneme"];

/// Last non-empty inventory id and language name seen so far in one file.
#[derive(Debug, Default)]
struct Carry {
    inventory_id: Option<String>,
    language_name: Option<String>,
}

impl Carry {
    fn absorb(&mut self, inventory_id: &str, language_name: &str) {
        if !inventory_id.is_empty() {
            self.inventory_id = Some(inventory_id.to_string());
        }
        if !language_name.is_empty() {
            self.language_name = Some(language_name.to_string());
        }
    }

    fn current(&self) -> Option<(&str, &str)> {
        match (&self.inventory_id, &self.language_name) {
            (Some(inv), Some(lang)) => Some((inv.as_str(), lang.as_str())),
            _ => None,
        }
    }
}

/// Reads one row-inheritance table tagged `tag`.
pub fn read_row_inheritance<R: Read>(input: R, tag: &str) -> Result<Vec<RawEntry>, IngestError> {
    let source_name = source_tag(tag);
    let mut reader = table::reader(input, b'\t', true);
    let header = Header::new(
        reader
            .headers()
            .map_err(|err| IngestError::csv(&source_name, err))?,
    );

    let inventory_col = header.require(&source_name, "InventoryID")?;
    let language_col = header.require(&source_name, "LanguageName")?;
    let segment_col = header
        .first_of(&SEGMENT_COLUMNS)
        .ok_or_else(|| IngestError::missing_column(&source_name, SEGMENT_COLUMNS[2]))?;

    let mut carry = Carry::default();
    let mut entries = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| IngestError::csv(&source_name, err))?;
        carry.absorb(cell(&record, inventory_col), cell(&record, language_col));

        let segment_raw = cell(&record, segment_col);
        if segment_raw.is_empty() {
            continue;
        }

        let Some((inventory_id, language_name)) = carry.current() else {
            return Err(IngestError::OrphanRow {
                source_name,
                row: idx + 1,
            });
        };
        entries.push(RawEntry::new(tag, language_name, inventory_id, segment_raw));
    }

    Ok(entries)
}

pub(crate) fn read_row_inheritance_file(
    path: &Path,
    tag: &str,
) -> Result<Vec<RawEntry>, IngestError> {
    read_row_inheritance(table::open(path)?, tag)
}
