//! Readers for presence-matrix sources.
//!
//! Both layouts enumerate segments as column names and mark an attested
//! segment with the literal cell value `"1"`; they differ only in how the
//! segment columns are told apart from metadata columns.
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::IngestError;
use crate::table::{self, cell, Header};
use crate::types::{source_tag, RawEntry};

/// Columns of the binary-matrix layout that never name a segment.
pub const BINARY_MATRIX_METADATA: [&str; 4] = ["InventoryID", "#", "Language Name", "Language Code"];

/// Descriptive rows preceding the binary-matrix header.
pub const BINARY_MATRIX_PREAMBLE_ROWS: usize = 2;

/// Metadata columns before the segment window of the windowed layout.
pub const WINDOW_PREFIX: usize = 17;

/// Metadata columns after the segment window of the windowed layout.
pub const WINDOW_SUFFIX: usize = 37;

const PRESENT: &str = "1";

/// Emits one entry per segment column whose cell is exactly `"1"`.
fn emit_present(
    record: &StringRecord,
    header: &Header,
    columns: impl Iterator<Item = usize>,
    mut emit: impl FnMut(&str),
) {
    for pos in columns {
        let label = &header.names()[pos];
        if !label.is_empty() && cell(record, pos) == PRESENT {
            emit(label);
        }
    }
}

/// Reads a comma-separated binary matrix: two preamble rows, a header row
/// naming segments, then one row per inventory.
pub fn read_binary_matrix<R: Read>(input: R, tag: &str) -> Result<Vec<RawEntry>, IngestError> {
    let source_name = source_tag(tag);
    let mut reader = table::reader(input, b',', false);
    let mut records = reader.records();

    let mut next_row = |row: usize| -> Result<StringRecord, IngestError> {
        records
            .next()
            .ok_or_else(|| IngestError::MissingPreamble {
                source_name: source_name.clone(),
                row,
            })?
            .map_err(|err| IngestError::csv(&source_name, err))
    };
    for row in 1..=BINARY_MATRIX_PREAMBLE_ROWS {
        next_row(row)?;
    }
    let header = Header::new(&next_row(BINARY_MATRIX_PREAMBLE_ROWS + 1)?);

    let inventory_col = header.require(&source_name, "InventoryID")?;
    let language_col = header.require(&source_name, "Language Name")?;
    let segment_cols: Vec<usize> = (0..header.len())
        .filter(|&pos| !BINARY_MATRIX_METADATA.contains(&header.names()[pos].as_str()))
        .collect();

    let mut entries = Vec::new();
    for record in records {
        let record = record.map_err(|err| IngestError::csv(&source_name, err))?;
        let inventory_id = cell(&record, inventory_col);
        let language_name = cell(&record, language_col);
        emit_present(&record, &header, segment_cols.iter().copied(), |segment| {
            entries.push(RawEntry::new(tag, language_name, inventory_id, segment));
        });
    }

    Ok(entries)
}

/// Reads a tab-separated matrix whose segment columns are the header minus
/// the first [`WINDOW_PREFIX`] and last [`WINDOW_SUFFIX`] columns. A header
/// with exactly that many columns has an empty window.
pub fn read_windowed_matrix<R: Read>(input: R, tag: &str) -> Result<Vec<RawEntry>, IngestError> {
    let source_name = source_tag(tag);
    let mut reader = table::reader(input, b'\t', true);
    let header = Header::new(
        reader
            .headers()
            .map_err(|err| IngestError::csv(&source_name, err))?,
    );

    let required = WINDOW_PREFIX + WINDOW_SUFFIX;
    if header.len() < required {
        return Err(IngestError::HeaderTooShort {
            source_name,
            columns: header.len(),
            required,
        });
    }
    let inventory_col = header.require(&source_name, "InventoryID")?;
    let language_col = header.require(&source_name, "Name")?;
    let window = WINDOW_PREFIX..header.len() - WINDOW_SUFFIX;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::csv(&source_name, err))?;
        let inventory_id = cell(&record, inventory_col);
        let language_name = cell(&record, language_col);
        emit_present(&record, &header, window.clone(), |segment| {
            entries.push(RawEntry::new(tag, language_name, inventory_id, segment));
        });
    }

    Ok(entries)
}

pub(crate) fn read_binary_matrix_file(path: &Path, tag: &str) -> Result<Vec<RawEntry>, IngestError> {
    read_binary_matrix(table::open(path)?, tag)
}

pub(crate) fn read_windowed_matrix_file(
    path: &Path,
    tag: &str,
) -> Result<Vec<RawEntry>, IngestError> {
    read_windowed_matrix(table::open(path)?, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "full segment descriptions,,,,,\nsecond preamble row,,,,,\n";

    #[test]
    fn binary_matrix_emits_only_literal_ones() {
        let data = format!(
            "{PREAMBLE}InventoryID,#,Language Name,Language Code,p,t\n7,1,Tamil,tam,1,\n"
        );
        let entries = read_binary_matrix(data.as_bytes(), "RA").expect("read");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].segment_raw, "p");
        assert_eq!(entries[0].inventory_id, "7");
        assert_eq!(entries[0].language_key, "RA_Tamil");
        assert_eq!(entries[0].source_tag, "PHOIBLE_RA");
    }

    #[test]
    fn binary_matrix_ignores_metadata_and_non_one_cells() {
        let data = format!(
            "{PREAMBLE}InventoryID,#,Language Name,Language Code,p,t,k\n\
             7,1,Tamil,1,1,x,1\n\
             8,1,Telugu,tel,,1, 1\n"
        );
        let entries = read_binary_matrix(data.as_bytes(), "RA").expect("read");
        let got: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.inventory_id.as_str(), e.segment_raw.as_str()))
            .collect();
        assert_eq!(got, vec![("7", "p"), ("7", "k"), ("8", "t")]);
    }

    #[test]
    fn binary_matrix_without_header_row_is_fatal() {
        let err = read_binary_matrix(PREAMBLE.as_bytes(), "RA").expect_err("must fail");
        assert!(matches!(err, IngestError::MissingPreamble { row: 3, .. }));
    }

    #[test]
    fn binary_matrix_requires_metadata_columns() {
        let data = format!("{PREAMBLE}InventoryID,#,Language,Language Code,p\n7,1,Tamil,tam,1\n");
        let err = read_binary_matrix(data.as_bytes(), "RA").expect_err("must fail");
        assert!(matches!(
            err,
            IngestError::MissingColumn { ref column, .. } if column == "Language Name"
        ));
    }

    fn windowed_fixture(segments: &[&str], rows: &[(&str, &str, &[&str])]) -> String {
        let mut header: Vec<String> = vec!["InventoryID".into(), "Name".into()];
        header.extend((2..WINDOW_PREFIX).map(|i| format!("pre{i}")));
        header.extend(segments.iter().map(|s| s.to_string()));
        header.extend((0..WINDOW_SUFFIX).map(|i| format!("post{i}")));

        let mut out = header.join("\t");
        out.push('\n');
        for (inv, name, cells) in rows {
            let mut row: Vec<String> = vec![inv.to_string(), name.to_string()];
            row.extend((2..WINDOW_PREFIX).map(|_| "1".to_string()));
            row.extend(cells.iter().map(|c| c.to_string()));
            row.extend((0..WINDOW_SUFFIX).map(|_| "1".to_string()));
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }

    #[test]
    fn windowed_matrix_reads_only_the_window() {
        let data = windowed_fixture(
            &["a", "e", "ɨ"],
            &[
                ("300", "Yanomami", &["1", "", "1"][..]),
                ("301", "Tupi", &["", "1", "0"][..]),
            ],
        );
        let entries = read_windowed_matrix(data.as_bytes(), "SAPHON").expect("read");
        let got: Vec<(&str, &str, &str)> = entries
            .iter()
            .map(|e| {
                (
                    e.inventory_id.as_str(),
                    e.language_key.as_str(),
                    e.segment_raw.as_str(),
                )
            })
            .collect();
        assert_eq!(
            got,
            vec![
                ("300", "SAPHON_Yanomami", "a"),
                ("300", "SAPHON_Yanomami", "ɨ"),
                ("301", "SAPHON_Tupi", "e"),
            ]
        );
    }

    #[test]
    fn windowed_matrix_with_empty_window_yields_nothing() {
        let data = windowed_fixture(&[], &[("300", "Yanomami", &[][..])]);
        let entries = read_windowed_matrix(data.as_bytes(), "SAPHON").expect("read");
        assert!(entries.is_empty());
    }

    #[test]
    fn windowed_matrix_rejects_short_header() {
        let data = "InventoryID\tName\tp\n1\tX\t1\n";
        let err = read_windowed_matrix(data.as_bytes(), "SAPHON").expect_err("must fail");
        assert!(matches!(
            err,
            IngestError::HeaderTooShort {
                columns: 3,
                required: 54,
                ..
            }
        ));
    }
}
