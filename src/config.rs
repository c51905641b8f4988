//! YAML configuration for a phonorm run.
//!
//! One file describes where the survey archive and mapping tables live, how
//! segments are canonicalized and where the dataset goes.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "phoible import"
//!
//! raw_dir: "raw"
//! languages_path: "etc/languages.csv"
//! citation_map_path: "raw/phoible-dev/mappings/InventoryID-Bibtex.csv"
//! bibliography_path: "raw/phoible-dev/data/phoible-references.bib"
//! taxonomy_path: "etc/glottolog.csv"
//!
//! output_dir: "cldf"
//! output_format: "csv"
//! log_level: "info"
//! json_logs: true
//!
//! canonical:
//!   version: 1
//!   slug_separator: "-"
//!   resolved_prefix: "BIPA_"
//!   unresolved_prefix: "UNK_"
//!
//! # optional, replaces the bundled archive layout
//! sources:
//!   - tag: "AA"
//!     family: "row_inheritance"
//!     path: "phoible-dev/raw-data/AA/AA_inventories.tsv"
//! ```
//!
//! Relative paths in a file loaded with [`PipelineConfig::from_file`] are
//! resolved against the directory holding the file. Source paths are
//! resolved against `raw_dir`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use canonical::CanonicalizeConfig;
use ingest::{SourceCatalog, SourceSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Top-level configuration of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Root of the downloaded survey archive
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Language entities (`ID`, `Name`, `Glottocode`)
    #[serde(default = "default_languages_path")]
    pub languages_path: PathBuf,

    /// Inventory → BibTeX key mapping (`InventoryID`, `BibtexKey`)
    #[serde(default = "default_citation_map_path")]
    pub citation_map_path: PathBuf,

    #[serde(default)]
    pub bibliography_path: Option<PathBuf>,

    /// CSV export of the language taxonomy; languages stay bare without it
    #[serde(default)]
    pub taxonomy_path: Option<PathBuf>,

    /// TSV phonetic reference table; the bundled table is used without it
    #[serde(default)]
    pub reference_path: Option<PathBuf>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,

    /// Explicit source list, in reader order
    #[serde(default)]
    pub sources: Option<Vec<SourceSpec>>,

    #[serde(default)]
    pub canonical: CanonicalizeConfig,
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        Ok(match path.parent() {
            Some(base) if !base.as_os_str().is_empty() => config.rooted_at(base),
            _ => config,
        })
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.canonical
            .validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;

        if self.log_level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "log_level must not be empty".into(),
            ));
        }

        if let Some(sources) = &self.sources {
            if sources.is_empty() {
                return Err(ConfigLoadError::Validation(
                    "sources must list at least one source when given".into(),
                ));
            }
            let mut seen = HashSet::new();
            for source in sources {
                if !seen.insert((source.tag.as_str(), source.path.as_path())) {
                    return Err(ConfigLoadError::Validation(format!(
                        "source `{}` at {} is listed twice",
                        source.tag,
                        source.path.display()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Returns a copy with every relative path resolved against `base`.
    pub fn rooted_at(&self, base: &Path) -> Self {
        let root = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };
        Self {
            raw_dir: root(&self.raw_dir),
            languages_path: root(&self.languages_path),
            citation_map_path: root(&self.citation_map_path),
            bibliography_path: self.bibliography_path.as_deref().map(root),
            taxonomy_path: self.taxonomy_path.as_deref().map(root),
            reference_path: self.reference_path.as_deref().map(root),
            output_dir: root(&self.output_dir),
            ..self.clone()
        }
    }

    /// Sources to read, in order.
    pub fn catalog(&self) -> SourceCatalog {
        match &self.sources {
            Some(sources) => SourceCatalog::new(
                sources
                    .iter()
                    .map(|source| source.rooted_at(&self.raw_dir))
                    .collect(),
            ),
            None => SourceCatalog::phoible(&self.raw_dir),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            raw_dir: default_raw_dir(),
            languages_path: default_languages_path(),
            citation_map_path: default_citation_map_path(),
            bibliography_path: None,
            taxonomy_path: None,
            reference_path: None,
            output_dir: default_output_dir(),
            output_format: OutputFormat::default(),
            log_level: default_log_level(),
            json_logs: false,
            sources: None,
            canonical: CanonicalizeConfig::default(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("raw")
}
fn default_languages_path() -> PathBuf {
    PathBuf::from("etc/languages.csv")
}
fn default_citation_map_path() -> PathBuf {
    PathBuf::from("raw/phoible-dev/mappings/InventoryID-Bibtex.csv")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("cldf")
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::SourceFamily;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
output_format: "json"
canonical:
  version: 2
  resolved_prefix: "IPA_"
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, Some("test config".to_string()));
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.canonical.version, 2);
        assert_eq!(config.canonical.resolved_prefix, "IPA_");
        assert_eq!(config.canonical.unresolved_prefix, "UNK_");
        assert_eq!(config.raw_dir, PathBuf::from("raw"));
    }

    #[test]
    fn test_load_from_file_roots_relative_paths() {
        let yaml = r#"
version: "1"
raw_dir: "data"
taxonomy_path: "/abs/glottolog.csv"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = PipelineConfig::from_file(temp_file.path()).unwrap();
        let base = temp_file.path().parent().unwrap();
        assert_eq!(config.raw_dir, base.join("data"));
        assert_eq!(config.languages_path, base.join("etc/languages.csv"));
        assert_eq!(config.taxonomy_path, Some(PathBuf::from("/abs/glottolog.csv")));
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.name.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog().len(), 10);
    }

    #[test]
    fn test_unsupported_version() {
        let result = PipelineConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(ref v)) if v == "2.0"));
    }

    #[test]
    fn test_canonical_validation() {
        let yaml = r#"
version: "1.0"
canonical:
  slug_separator: "_"
"#;

        let result = PipelineConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("separator"));
    }

    #[test]
    fn test_explicit_sources_are_rooted_at_raw_dir() {
        let yaml = r#"
version: "1.0"
raw_dir: "/data/raw"
sources:
  - tag: "RA"
    family: "binary_matrix"
    path: "RA/Ramaswami1999.csv"
  - tag: "UPSID"
    family: "cross_reference"
    path: "/elsewhere/UPSID"
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        let catalog = config.catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.sources[0].family, SourceFamily::BinaryMatrix);
        assert_eq!(
            catalog.sources[0].path,
            PathBuf::from("/data/raw/RA/Ramaswami1999.csv")
        );
        assert_eq!(catalog.sources[1].path, PathBuf::from("/elsewhere/UPSID"));
    }

    #[test]
    fn test_empty_or_duplicate_sources_rejected() {
        let empty = "version: \"1.0\"\nsources: []\n";
        assert!(matches!(
            PipelineConfig::from_yaml(empty),
            Err(ConfigLoadError::Validation(_))
        ));

        let duplicate = r#"
version: "1.0"
sources:
  - { tag: "AA", family: "row_inheritance", path: "AA.tsv" }
  - { tag: "AA", family: "row_inheritance", path: "AA.tsv" }
"#;
        assert!(matches!(
            PipelineConfig::from_yaml(duplicate),
            Err(ConfigLoadError::Validation(_))
        ));
    }
}
