//! Language entities and the inventory → language mapping.
//!
//! `languages.csv` lists one language entity per row (`ID`, `Name`,
//! `Glottocode`). Entity ids start with the inventory id they describe
//! (`"1019_mund1320"` → inventory `"1019"`), which is how values find their
//! language. When a [`Taxonomy`] is available, rows with a glottocode are
//! enriched with family, ISO code, coordinates and macro-area.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::PipelineError;

const INVENTORY_SEPARATOR: char = '_';
const LIST_SEPARATOR: char = ';';
const LINEAGE_SEPARATOR: char = '/';

/// A language entity of the output dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub glottocode: Option<String>,
    pub family_glottocode: Option<String>,
    pub family_name: Option<String>,
    pub iso_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub macroarea: Option<String>,
    pub glottolog_name: Option<String>,
}

impl Language {
    fn bare(id: &str, name: &str, glottocode: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            glottocode,
            family_glottocode: None,
            family_name: None,
            iso_code: None,
            latitude: None,
            longitude: None,
            macroarea: None,
            glottolog_name: None,
        }
    }

    fn enrich(&mut self, languoid: &Languoid) {
        if let Some((family_name, family_glottocode)) = languoid.lineage.first() {
            self.family_name = Some(family_name.clone());
            self.family_glottocode = Some(family_glottocode.clone());
        }
        self.iso_code = languoid.iso_code.clone();
        self.latitude = languoid.latitude;
        self.longitude = languoid.longitude;
        self.macroarea = languoid.macroareas.first().cloned();
        self.glottolog_name = Some(languoid.name.clone());
    }
}

/// One node of the language taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Languoid {
    pub glottocode: String,
    pub name: String,
    pub iso_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub macroareas: Vec<String>,
    /// Ancestors from the top-level family down, as `(name, glottocode)`.
    pub lineage: Vec<(String, String)>,
}

/// Language taxonomy lookup by glottocode.
pub trait Taxonomy {
    fn languoid(&self, glottocode: &str) -> Option<&Languoid>;
}

#[derive(Debug, Deserialize)]
struct TaxonomyRow {
    #[serde(rename = "Glottocode")]
    glottocode: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ISO639P3code", default)]
    iso_code: String,
    #[serde(rename = "Latitude", default)]
    latitude: String,
    #[serde(rename = "Longitude", default)]
    longitude: String,
    #[serde(rename = "Macroarea", default)]
    macroarea: String,
    #[serde(rename = "Lineage", default)]
    lineage: String,
}

/// CSV-backed [`Taxonomy`].
///
/// Columns: `Glottocode`, `Name`, `ISO639P3code`, `Latitude`, `Longitude`,
/// `Macroarea` (`;`-separated) and `Lineage` (`;`-separated `name/glottocode`
/// pairs, top-level family first).
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    languoids: HashMap<String, Languoid>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

impl TaxonomyTable {
    pub fn from_reader<R: Read>(input: R, origin: &Path) -> Result<Self, PipelineError> {
        let mut reader = csv::Reader::from_reader(input);
        let mut languoids = HashMap::new();

        for (idx, row) in reader.deserialize::<TaxonomyRow>().enumerate() {
            let row_number = idx + 2;
            let row = row.map_err(|err| PipelineError::csv(origin, err))?;
            let invalid = |reason: String| PipelineError::InvalidRow {
                path: origin.to_path_buf(),
                row: row_number,
                reason,
            };

            let coordinate = |value: &str, column: &str| -> Result<Option<f64>, PipelineError> {
                if value.trim().is_empty() {
                    return Ok(None);
                }
                value
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|err| invalid(format!("{column} `{value}`: {err}")))
            };
            let latitude = coordinate(&row.latitude, "Latitude")?;
            let longitude = coordinate(&row.longitude, "Longitude")?;

            let lineage = split_list(&row.lineage)
                .map(|pair| {
                    pair.rsplit_once(LINEAGE_SEPARATOR)
                        .map(|(name, code)| (name.to_string(), code.to_string()))
                        .ok_or_else(|| {
                            invalid(format!("lineage entry `{pair}` is not name/glottocode"))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let languoid = Languoid {
                glottocode: row.glottocode.clone(),
                name: row.name,
                iso_code: non_empty(row.iso_code),
                latitude,
                longitude,
                macroareas: split_list(&row.macroarea).map(str::to_string).collect(),
                lineage,
            };
            languoids.insert(row.glottocode, languoid);
        }

        Ok(Self { languoids })
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|err| PipelineError::io(path, err))?;
        let table = Self::from_reader(BufReader::new(file), path)?;
        info!(path = %path.display(), languoids = table.len(), "taxonomy_loaded");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.languoids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languoids.is_empty()
    }
}

impl Taxonomy for TaxonomyTable {
    fn languoid(&self, glottocode: &str) -> Option<&Languoid> {
        self.languoids.get(glottocode)
    }
}

#[derive(Debug, Deserialize)]
struct LanguageRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Glottocode", default)]
    glottocode: String,
}

/// Language entities plus the inventory id → language id mapping.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    languages: Vec<Language>,
    by_inventory: HashMap<String, String>,
}

impl LanguageTable {
    /// Reads `languages.csv`. A non-empty glottocode the taxonomy does not
    /// know is an error; without a taxonomy, glottocodes are kept as-is.
    pub fn from_reader<R: Read>(
        input: R,
        origin: &Path,
        taxonomy: Option<&dyn Taxonomy>,
    ) -> Result<Self, PipelineError> {
        let mut reader = csv::Reader::from_reader(input);
        let mut table = Self::default();

        for row in reader.deserialize::<LanguageRow>() {
            let row = row.map_err(|err| PipelineError::csv(origin, err))?;
            let glottocode = non_empty(row.glottocode);
            let mut language = Language::bare(&row.id, &row.name, glottocode.clone());

            if let (Some(code), Some(taxonomy)) = (glottocode.as_deref(), taxonomy) {
                let languoid =
                    taxonomy
                        .languoid(code)
                        .ok_or_else(|| PipelineError::UnknownGlottocode {
                            language_id: row.id.clone(),
                            glottocode: code.to_string(),
                        })?;
                language.enrich(languoid);
            }

            let inventory = inventory_prefix(&row.id);
            debug!(inventory, language = %row.id, "inventory_mapped");
            table
                .by_inventory
                .insert(inventory.to_string(), row.id.clone());
            table.languages.push(language);
        }

        Ok(table)
    }

    pub fn from_path(path: &Path, taxonomy: Option<&dyn Taxonomy>) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|err| PipelineError::io(path, err))?;
        let table = Self::from_reader(BufReader::new(file), path, taxonomy)?;
        info!(
            path = %path.display(),
            languages = table.languages.len(),
            inventories = table.by_inventory.len(),
            "languages_loaded"
        );
        Ok(table)
    }

    /// Language id for an inventory id, if the mapping knows it.
    pub fn language_for(&self, inventory_id: &str) -> Option<&str> {
        self.by_inventory.get(inventory_id).map(String::as_str)
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// The inventory part of a language entity id.
pub fn inventory_prefix(language_id: &str) -> &str {
    language_id
        .split_once(INVENTORY_SEPARATOR)
        .map_or(language_id, |(prefix, _)| prefix)
}
