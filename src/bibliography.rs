//! Provenance: inventory citations and the bibliography they point into.
//!
//! `InventoryID-Bibtex.csv` maps each inventory to zero or more BibTeX keys;
//! every value of that inventory carries the keys as its source list. The
//! BibTeX file itself is only indexed by key, entries are passed through to
//! the output verbatim.
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::PipelineError;

#[derive(Debug, Deserialize)]
struct CitationRow {
    #[serde(rename = "InventoryID")]
    inventory_id: String,
    #[serde(rename = "BibtexKey")]
    bibtex_key: String,
}

/// Inventory id → ordered citation keys.
#[derive(Debug, Clone, Default)]
pub struct CitationMap {
    by_inventory: HashMap<String, Vec<String>>,
}

impl CitationMap {
    pub fn from_reader<R: Read>(input: R, origin: &Path) -> Result<Self, PipelineError> {
        let mut reader = csv::Reader::from_reader(input);
        let mut map = Self::default();
        for row in reader.deserialize::<CitationRow>() {
            let row = row.map_err(|err| PipelineError::csv(origin, err))?;
            if row.bibtex_key.is_empty() {
                continue;
            }
            map.by_inventory
                .entry(row.inventory_id)
                .or_default()
                .push(row.bibtex_key);
        }
        Ok(map)
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|err| PipelineError::io(path, err))?;
        let map = Self::from_reader(BufReader::new(file), path)?;
        info!(path = %path.display(), inventories = map.by_inventory.len(), "citations_loaded");
        Ok(map)
    }

    /// Citation keys for an inventory; empty when it has none.
    pub fn citations(&self, inventory_id: &str) -> &[String] {
        self.by_inventory
            .get(inventory_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One BibTeX entry, kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    /// The full entry from `@` to its closing brace.
    pub text: String,
}

/// BibTeX entries indexed by citation key.
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    entries: Vec<BibEntry>,
    index: HashMap<String, usize>,
}

impl Bibliography {
    /// Scans `text` for `@type{key, ...}` entries. Comments, preambles and
    /// string macros are skipped; an unterminated entry ends the scan.
    pub fn parse(text: &str) -> Self {
        let mut bibliography = Self::default();
        let mut rest = text;

        while let Some(at) = rest.find('@') {
            let candidate = &rest[at..];
            // an entry is `@` + letters + optional whitespace + `{` or `(`;
            // any other `@` is free text between entries
            let name_len = candidate[1..]
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(candidate.len() - 1);
            let after_name = candidate[1 + name_len..].trim_start();
            if name_len == 0 || !after_name.starts_with(['{', '(']) {
                rest = &candidate[1..];
                continue;
            }
            let open = candidate.len() - after_name.len();
            let entry_type = candidate[1..1 + name_len].to_ascii_lowercase();
            let Some(len) = balanced_len(&candidate[open..]) else {
                break;
            };
            let end = open + len;
            let body = &candidate[open + 1..end - 1];
            rest = &candidate[end..];

            if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
                continue;
            }
            let key = body.split(',').next().unwrap_or("").trim();
            if key.is_empty() {
                continue;
            }
            bibliography.insert(BibEntry {
                key: key.to_string(),
                entry_type,
                text: candidate[..end].to_string(),
            });
        }

        bibliography
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|err| PipelineError::io(path, err))?;
        let bibliography = Self::parse(&text);
        info!(path = %path.display(), entries = bibliography.len(), "bibliography_loaded");
        Ok(bibliography)
    }

    fn insert(&mut self, entry: BibEntry) {
        // the first entry for a key wins
        if self.index.contains_key(&entry.key) {
            return;
        }
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for the cited keys, in bibliography order. Keys the
    /// bibliography lacks are reported once each.
    pub fn select<'a>(&self, cited: impl IntoIterator<Item = &'a str>) -> Vec<BibEntry> {
        let cited: BTreeSet<&str> = cited.into_iter().collect();
        let mut missing = 0usize;
        for key in &cited {
            if !self.index.contains_key(*key) {
                warn!(key, "citation_key_missing_from_bibliography");
                missing += 1;
            }
        }
        if missing > 0 {
            warn!(missing, cited = cited.len(), "bibliography_incomplete");
        }
        self.entries
            .iter()
            .filter(|entry| cited.contains(entry.key.as_str()))
            .cloned()
            .collect()
    }
}

/// Length of the brace- or paren-delimited group at the start of `text`,
/// including both delimiters.
fn balanced_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    let (_, open) = chars.next()?;
    let close = match open {
        '{' => '}',
        '(' => ')',
        _ => return None,
    };
    let mut depth = 1usize;
    for (idx, c) in chars {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx + c.len_utf8());
            }
        }
    }
    None
}
