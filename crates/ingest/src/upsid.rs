//! Reader for the multi-file cross-reference family (UPSID).
//!
//! Four tab-separated files are joined in memory:
//!
//! ```text
//! languages   LangNum ─┬─ LangName
//! codes       upsidLangNum / LanguageName ─→ InventoryID
//! char codes  CCID ─→ IPA
//! segments    upsidLangNum, upsidCCID, anomalous
//! ```
//!
//! This is the only family that reports marginality explicitly: `anomalous`
//! marks the segment marginal unless it is the literal `"0"`.
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::IngestError;
use crate::table::{self, cell, Header};
use crate::types::{source_tag, RawEntry};

pub const LANGUAGES_FILE: &str = "UPSID_Languages.tsv";
pub const LANGUAGE_CODES_FILE: &str = "UPSID_LanguageCodes.tsv";
pub const CHAR_CODES_FILE: &str = "UPSID_CharCodes.tsv";
pub const SEGMENTS_FILE: &str = "UPSID_Segments.tsv";

/// The four inputs of one cross-reference source.
pub struct CrossReferenceFiles<R> {
    pub languages: R,
    pub language_codes: R,
    pub char_codes: R,
    pub segments: R,
}

#[derive(Debug)]
struct Language {
    name: String,
    inventory_id: Option<String>,
}

fn headers<R: Read>(
    reader: &mut csv::Reader<R>,
    source_name: &str,
) -> Result<Header, IngestError> {
    reader
        .headers()
        .map(Header::new)
        .map_err(|err| IngestError::csv(source_name, err))
}

/// Language number → language, plus the name → number index used to check
/// the inventory-code file.
fn load_languages<R: Read>(
    input: R,
    source_name: &str,
) -> Result<(HashMap<String, Language>, HashMap<String, String>), IngestError> {
    let mut reader = table::reader(input, b'\t', true);
    let header = headers(&mut reader, source_name)?;
    let name_col = header.require(source_name, "LangName")?;
    let num_col = header.require(source_name, "LangNum")?;

    let mut by_num = HashMap::new();
    let mut name_to_num = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::csv(source_name, err))?;
        let name = cell(&record, name_col).to_string();
        let num = cell(&record, num_col).to_string();
        name_to_num.insert(name.clone(), num.clone());
        by_num.insert(
            num,
            Language {
                name,
                inventory_id: None,
            },
        );
    }
    Ok((by_num, name_to_num))
}

fn attach_inventory_ids<R: Read>(
    input: R,
    source_name: &str,
    by_num: &mut HashMap<String, Language>,
    name_to_num: &HashMap<String, String>,
) -> Result<(), IngestError> {
    let mut reader = table::reader(input, b'\t', true);
    let header = headers(&mut reader, source_name)?;
    let name_col = header.require(source_name, "LanguageName")?;
    let num_col = header.require(source_name, "upsidLangNum")?;
    let inventory_col = header.require(source_name, "InventoryID")?;

    for record in reader.records() {
        let record = record.map_err(|err| IngestError::csv(source_name, err))?;
        let name = cell(&record, name_col);
        if !name_to_num.contains_key(name) {
            return Err(IngestError::UnknownLanguage {
                source_name: source_name.to_string(),
                key: name.to_string(),
            });
        }
        let num = cell(&record, num_col);
        let language = by_num
            .get_mut(num)
            .ok_or_else(|| IngestError::UnknownLanguage {
                source_name: source_name.to_string(),
                key: num.to_string(),
            })?;
        language.inventory_id = Some(cell(&record, inventory_col).to_string());
    }
    Ok(())
}

/// Segment code → phonetic string. The char-code table carries unescaped
/// quote characters, so it is split on raw tabs instead of going through the
/// quoting parser.
fn load_char_codes<R: Read>(
    input: R,
    source_name: &str,
) -> Result<HashMap<String, String>, IngestError> {
    let mut lines = BufReader::new(input).lines();
    let header_line = match lines.next() {
        Some(line) => line.map_err(|err| IngestError::io(CHAR_CODES_FILE, err))?,
        None => return Err(IngestError::missing_column(source_name, "CCID")),
    };
    let fields: Vec<&str> = header_line.trim_end_matches(['\r', '\n']).split('\t').collect();
    let position = |name: &str| {
        fields
            .iter()
            .position(|field| *field == name)
            .ok_or_else(|| IngestError::missing_column(source_name, name))
    };
    let code_col = position("CCID")?;
    let ipa_col = position("IPA")?;

    let mut codes = HashMap::new();
    for line in lines {
        let line = line.map_err(|err| IngestError::io(CHAR_CODES_FILE, err))?;
        let values: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        let value = |pos: usize| values.get(pos).copied().unwrap_or("");
        codes.insert(value(code_col).to_string(), value(ipa_col).to_string());
    }
    Ok(codes)
}

/// Joins the four inputs and emits one entry per segment row.
pub fn read_cross_reference<R: Read>(
    files: CrossReferenceFiles<R>,
    tag: &str,
) -> Result<Vec<RawEntry>, IngestError> {
    let source_name = source_tag(tag);
    let (mut by_num, name_to_num) = load_languages(files.languages, &source_name)?;
    attach_inventory_ids(files.language_codes, &source_name, &mut by_num, &name_to_num)?;
    let char_codes = load_char_codes(files.char_codes, &source_name)?;

    let mut reader = table::reader(files.segments, b'\t', true);
    let header = headers(&mut reader, &source_name)?;
    let num_col = header.require(&source_name, "upsidLangNum")?;
    let code_col = header.require(&source_name, "upsidCCID")?;
    let anomalous_col = header.require(&source_name, "anomalous")?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::csv(&source_name, err))?;
        let num = cell(&record, num_col);
        let unknown_language = || IngestError::UnknownLanguage {
            source_name: source_name.clone(),
            key: num.to_string(),
        };
        let language = by_num.get(num).ok_or_else(unknown_language)?;
        let inventory_id = language
            .inventory_id
            .as_deref()
            .ok_or_else(unknown_language)?;

        let code = cell(&record, code_col);
        let segment_raw = char_codes
            .get(code)
            .ok_or_else(|| IngestError::UnknownCharCode {
                source_name: source_name.clone(),
                code: code.to_string(),
            })?;

        let mut entry = RawEntry::new(tag, &language.name, inventory_id, segment_raw.as_str());
        entry.marginal = Some(cell(&record, anomalous_col) != "0");
        entries.push(entry);
    }

    Ok(entries)
}

pub(crate) fn read_cross_reference_dir(dir: &Path, tag: &str) -> Result<Vec<RawEntry>, IngestError> {
    let files = CrossReferenceFiles {
        languages: table::open(&dir.join(LANGUAGES_FILE))?,
        language_codes: table::open(&dir.join(LANGUAGE_CODES_FILE))?,
        char_codes: table::open(&dir.join(CHAR_CODES_FILE))?,
        segments: table::open(&dir.join(SEGMENTS_FILE))?,
    };
    read_cross_reference(files, tag)
}
