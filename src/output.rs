//! The output dataset and its writers.
//!
//! A [`Dataset`] holds the four entity collections other tooling consumes
//! (languages, parameters, values, inventories) plus the bibliography entries
//! the values cite. Writers serialize it into a directory:
//!
//! | Writer        | Files |
//! |---------------|-------|
//! | [`CsvWriter`] | `languages.csv`, `parameters.csv`, `values.csv`, `inventories.csv`, `sources.bib` |
//! | [`JsonWriter`]| `dataset.json` |
//!
//! CSV column names follow the table conventions downstream tools expect
//! (`ID`, `Language_ID`, `Parameter_ID`, ...); JSON uses the field names.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use canonical::CanonicalSegment;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{citation_list, Aggregation, Value, CITATION_SEPARATOR};
use crate::bibliography::BibEntry;
use crate::config::OutputFormat;
use crate::languages::Language;
use crate::PipelineError;

/// Per-inventory metadata. Always empty for now; kept so the table exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: String,
    pub name: String,
    pub contributor_id: String,
    #[serde(with = "citation_list")]
    pub source: Vec<String>,
    pub url: String,
    pub tones: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub languages: Vec<Language>,
    pub parameters: Vec<CanonicalSegment>,
    pub values: Vec<Value>,
    pub inventories: Vec<Inventory>,
    pub sources: Vec<BibEntry>,
}

/// Counts logged at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub values: usize,
    pub parameters: usize,
    pub unresolved: usize,
    pub languages: usize,
    pub sources: usize,
}

impl Dataset {
    pub fn new(languages: Vec<Language>, aggregation: Aggregation, sources: Vec<BibEntry>) -> Self {
        Self {
            languages,
            parameters: aggregation.parameters,
            values: aggregation.values,
            inventories: Vec::new(),
            sources,
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            values: self.values.len(),
            parameters: self.parameters.len(),
            unresolved: self.parameters.iter().filter(|p| !p.is_resolved()).count(),
            languages: self.languages.len(),
            sources: self.sources.len(),
        }
    }
}

/// Serializes a dataset into an output directory.
pub trait DatasetWriter {
    /// Writes every file and returns their paths.
    fn write(&self, dataset: &Dataset, dir: &Path) -> Result<Vec<PathBuf>, PipelineError>;
}

pub fn writer_for(format: OutputFormat) -> Box<dyn DatasetWriter> {
    match format {
        OutputFormat::Csv => Box::new(CsvWriter),
        OutputFormat::Json => Box::new(JsonWriter),
    }
}

#[derive(Serialize)]
struct LanguageRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Glottocode")]
    glottocode: Option<&'a str>,
    #[serde(rename = "Family_Glottocode")]
    family_glottocode: Option<&'a str>,
    #[serde(rename = "Family_Name")]
    family_name: Option<&'a str>,
    #[serde(rename = "ISO639P3code")]
    iso_code: Option<&'a str>,
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "Macroarea")]
    macroarea: Option<&'a str>,
    #[serde(rename = "Glottolog_Name")]
    glottolog_name: Option<&'a str>,
}

impl<'a> From<&'a Language> for LanguageRow<'a> {
    fn from(language: &'a Language) -> Self {
        Self {
            id: &language.id,
            name: &language.name,
            glottocode: language.glottocode.as_deref(),
            family_glottocode: language.family_glottocode.as_deref(),
            family_name: language.family_name.as_deref(),
            iso_code: language.iso_code.as_deref(),
            latitude: language.latitude,
            longitude: language.longitude,
            macroarea: language.macroarea.as_deref(),
            glottolog_name: language.glottolog_name.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct ParameterRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "BIPA")]
    bipa: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
}

impl<'a> From<&'a CanonicalSegment> for ParameterRow<'a> {
    fn from(segment: &'a CanonicalSegment) -> Self {
        Self {
            id: &segment.parameter_id,
            name: &segment.normalized_text,
            bipa: &segment.canonical_form,
            description: &segment.description,
        }
    }
}

#[derive(Serialize)]
struct ValueRow<'a> {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "Language_ID")]
    language_id: &'a str,
    #[serde(rename = "Parameter_ID")]
    parameter_id: &'a str,
    #[serde(rename = "Value")]
    value: &'a str,
    #[serde(rename = "Contribution_ID")]
    contribution_id: &'a str,
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Catalog")]
    catalog: &'a str,
    #[serde(rename = "Marginal")]
    marginal: bool,
}

impl<'a> From<&'a Value> for ValueRow<'a> {
    fn from(value: &'a Value) -> Self {
        Self {
            id: value.id,
            language_id: &value.language_id,
            parameter_id: &value.parameter_id,
            value: &value.raw_value,
            contribution_id: &value.inventory_id,
            source: value.source_citations.join(CITATION_SEPARATOR),
            catalog: &value.catalog_tag,
            marginal: value.marginal,
        }
    }
}

#[derive(Serialize)]
struct InventoryRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Contributor_ID")]
    contributor_id: &'a str,
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Tones")]
    tones: bool,
}

impl<'a> From<&'a Inventory> for InventoryRow<'a> {
    fn from(inventory: &'a Inventory) -> Self {
        Self {
            id: &inventory.id,
            name: &inventory.name,
            contributor_id: &inventory.contributor_id,
            source: inventory.source.join(CITATION_SEPARATOR),
            url: &inventory.url,
            tones: inventory.tones,
        }
    }
}

const INVENTORY_HEADER: [&str; 6] = ["ID", "Name", "Contributor_ID", "Source", "URL", "Tones"];

/// Writes the dataset as CSV tables plus a BibTeX file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl CsvWriter {
    fn write_table<'a, T, R>(
        path: &Path,
        items: &'a [T],
        header: Option<&[&str]>,
    ) -> Result<(), PipelineError>
    where
        R: Serialize + From<&'a T>,
    {
        let mut writer = csv::Writer::from_path(path).map_err(|err| PipelineError::csv(path, err))?;
        // serde only emits a header with the first row
        if items.is_empty() {
            if let Some(header) = header {
                writer
                    .write_record(header)
                    .map_err(|err| PipelineError::csv(path, err))?;
            }
        }
        for item in items {
            writer
                .serialize(R::from(item))
                .map_err(|err| PipelineError::csv(path, err))?;
        }
        writer.flush().map_err(|err| PipelineError::io(path, err))?;
        Ok(())
    }
}

const LANGUAGE_HEADER: [&str; 10] = [
    "ID",
    "Name",
    "Glottocode",
    "Family_Glottocode",
    "Family_Name",
    "ISO639P3code",
    "Latitude",
    "Longitude",
    "Macroarea",
    "Glottolog_Name",
];
const PARAMETER_HEADER: [&str; 4] = ["ID", "Name", "BIPA", "Description"];
const VALUE_HEADER: [&str; 8] = [
    "ID",
    "Language_ID",
    "Parameter_ID",
    "Value",
    "Contribution_ID",
    "Source",
    "Catalog",
    "Marginal",
];

impl DatasetWriter for CsvWriter {
    fn write(&self, dataset: &Dataset, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        fs::create_dir_all(dir).map_err(|err| PipelineError::io(dir, err))?;

        let languages = dir.join("languages.csv");
        Self::write_table::<_, LanguageRow>(&languages, &dataset.languages, Some(&LANGUAGE_HEADER))?;
        let parameters = dir.join("parameters.csv");
        Self::write_table::<_, ParameterRow>(&parameters, &dataset.parameters, Some(&PARAMETER_HEADER))?;
        let values = dir.join("values.csv");
        Self::write_table::<_, ValueRow>(&values, &dataset.values, Some(&VALUE_HEADER))?;
        let inventories = dir.join("inventories.csv");
        Self::write_table::<_, InventoryRow>(
            &inventories,
            &dataset.inventories,
            Some(&INVENTORY_HEADER),
        )?;

        let sources = dir.join("sources.bib");
        let file = File::create(&sources).map_err(|err| PipelineError::io(&sources, err))?;
        let mut out = BufWriter::new(file);
        for entry in &dataset.sources {
            writeln!(out, "{}\n", entry.text).map_err(|err| PipelineError::io(&sources, err))?;
        }
        out.flush().map_err(|err| PipelineError::io(&sources, err))?;

        let written = vec![languages, parameters, values, inventories, sources];
        info!(dir = %dir.display(), files = written.len(), "csv_dataset_written");
        Ok(written)
    }
}

/// Writes the whole dataset as one pretty-printed JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl DatasetWriter for JsonWriter {
    fn write(&self, dataset: &Dataset, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        fs::create_dir_all(dir).map_err(|err| PipelineError::io(dir, err))?;
        let path = dir.join("dataset.json");
        let file = File::create(&path).map_err(|err| PipelineError::io(&path, err))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, dataset)?;
        out.flush().map_err(|err| PipelineError::io(&path, err))?;
        info!(path = %path.display(), "json_dataset_written");
        Ok(vec![path])
    }
}
