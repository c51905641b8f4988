//! Phonetic transcription reference.
//!
//! The canonicalizer treats the reference as an opaque collaborator behind
//! [`PhoneticReference`]: hand it a normalized string, get back either a
//! canonical transcription or [`Transcription::Unknown`].
//!
//! [`BipaTable`] is the built-in implementation. It knows a set of base
//! sounds and a set of modifier diacritics, and accepts any string made of
//! exactly one base followed by modifiers (each used at most once):
//!
//! ```text
//! k ʷ ʰ           base "k" + modifiers {ʷ, ʰ}
//!   canonical     kʰʷ                        (modifiers in table order)
//!   name          aspirated labialized voiceless velar stop consonant
//! ```
//!
//! Matching happens on the NFD form with tie bars removed, so `t͡s` and `ts`
//! name the same affricate and precomposed letters such as `ã` split into a
//! base plus a modifier.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::CanonicalError;

const TIE_BARS: [char; 2] = ['\u{0361}', '\u{035C}'];

/// Result of looking a string up in a phonetic reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Transcription {
    Known { grapheme: String, name: String },
    Unknown,
}

impl Transcription {
    pub fn is_known(&self) -> bool {
        matches!(self, Transcription::Known { .. })
    }
}

/// A standardized phonetic alphabet that can resolve free-form strings.
pub trait PhoneticReference {
    fn resolve(&self, text: &str) -> Transcription;
}

impl<T: PhoneticReference + ?Sized> PhoneticReference for &T {
    fn resolve(&self, text: &str) -> Transcription {
        (**self).resolve(text)
    }
}

const DEFAULT_BASES: &[(&str, &str)] = &[
    // plosives
    ("p", "voiceless bilabial stop consonant"),
    ("b", "voiced bilabial stop consonant"),
    ("t", "voiceless alveolar stop consonant"),
    ("d", "voiced alveolar stop consonant"),
    ("ʈ", "voiceless retroflex stop consonant"),
    ("ɖ", "voiced retroflex stop consonant"),
    ("c", "voiceless palatal stop consonant"),
    ("ɟ", "voiced palatal stop consonant"),
    ("k", "voiceless velar stop consonant"),
    ("ɡ", "voiced velar stop consonant"),
    ("q", "voiceless uvular stop consonant"),
    ("ɢ", "voiced uvular stop consonant"),
    ("ʔ", "voiceless glottal stop consonant"),
    // nasals
    ("m", "voiced bilabial nasal consonant"),
    ("ɱ", "voiced labio-dental nasal consonant"),
    ("n", "voiced alveolar nasal consonant"),
    ("ɳ", "voiced retroflex nasal consonant"),
    ("ɲ", "voiced palatal nasal consonant"),
    ("ŋ", "voiced velar nasal consonant"),
    ("ɴ", "voiced uvular nasal consonant"),
    // trills and taps
    ("ʙ", "voiced bilabial trill consonant"),
    ("r", "voiced alveolar trill consonant"),
    ("ʀ", "voiced uvular trill consonant"),
    ("ⱱ", "voiced labio-dental tap consonant"),
    ("ɾ", "voiced alveolar tap consonant"),
    ("ɽ", "voiced retroflex tap consonant"),
    // fricatives
    ("ɸ", "voiceless bilabial fricative consonant"),
    ("β", "voiced bilabial fricative consonant"),
    ("f", "voiceless labio-dental fricative consonant"),
    ("v", "voiced labio-dental fricative consonant"),
    ("θ", "voiceless dental fricative consonant"),
    ("ð", "voiced dental fricative consonant"),
    ("s", "voiceless alveolar sibilant fricative consonant"),
    ("z", "voiced alveolar sibilant fricative consonant"),
    ("ʃ", "voiceless post-alveolar sibilant fricative consonant"),
    ("ʒ", "voiced post-alveolar sibilant fricative consonant"),
    ("ʂ", "voiceless retroflex sibilant fricative consonant"),
    ("ʐ", "voiced retroflex sibilant fricative consonant"),
    ("ɕ", "voiceless alveolo-palatal sibilant fricative consonant"),
    ("ʑ", "voiced alveolo-palatal sibilant fricative consonant"),
    ("ç", "voiceless palatal fricative consonant"),
    ("ʝ", "voiced palatal fricative consonant"),
    ("x", "voiceless velar fricative consonant"),
    ("ɣ", "voiced velar fricative consonant"),
    ("χ", "voiceless uvular fricative consonant"),
    ("ʁ", "voiced uvular fricative consonant"),
    ("ħ", "voiceless pharyngeal fricative consonant"),
    ("ʕ", "voiced pharyngeal fricative consonant"),
    ("h", "voiceless glottal fricative consonant"),
    ("ɦ", "voiced glottal fricative consonant"),
    ("ɬ", "voiceless alveolar lateral fricative consonant"),
    ("ɮ", "voiced alveolar lateral fricative consonant"),
    // affricates
    ("ts", "voiceless alveolar sibilant affricate consonant"),
    ("dz", "voiced alveolar sibilant affricate consonant"),
    ("tʃ", "voiceless post-alveolar sibilant affricate consonant"),
    ("dʒ", "voiced post-alveolar sibilant affricate consonant"),
    ("tɕ", "voiceless alveolo-palatal sibilant affricate consonant"),
    ("dʑ", "voiced alveolo-palatal sibilant affricate consonant"),
    ("ʈʂ", "voiceless retroflex sibilant affricate consonant"),
    ("ɖʐ", "voiced retroflex sibilant affricate consonant"),
    ("tɬ", "voiceless alveolar lateral affricate consonant"),
    // approximants
    ("ʋ", "voiced labio-dental approximant consonant"),
    ("ɹ", "voiced alveolar approximant consonant"),
    ("ɻ", "voiced retroflex approximant consonant"),
    ("j", "voiced palatal approximant consonant"),
    ("ɰ", "voiced velar approximant consonant"),
    ("w", "voiced labio-velar approximant consonant"),
    ("l", "voiced alveolar lateral approximant consonant"),
    ("ɭ", "voiced retroflex lateral approximant consonant"),
    ("ʎ", "voiced palatal lateral approximant consonant"),
    ("ʟ", "voiced velar lateral approximant consonant"),
    // implosives and clicks
    ("ɓ", "voiced bilabial implosive consonant"),
    ("ɗ", "voiced alveolar implosive consonant"),
    ("ʄ", "voiced palatal implosive consonant"),
    ("ɠ", "voiced velar implosive consonant"),
    ("ʘ", "bilabial click consonant"),
    ("ǀ", "dental click consonant"),
    ("ǃ", "alveolar click consonant"),
    ("ǂ", "palatoalveolar click consonant"),
    ("ǁ", "alveolar lateral click consonant"),
    // vowels
    ("i", "unrounded close front vowel"),
    ("y", "rounded close front vowel"),
    ("ɨ", "unrounded close central vowel"),
    ("ʉ", "rounded close central vowel"),
    ("ɯ", "unrounded close back vowel"),
    ("u", "rounded close back vowel"),
    ("ɪ", "unrounded near-close near-front vowel"),
    ("ʏ", "rounded near-close near-front vowel"),
    ("ʊ", "rounded near-close near-back vowel"),
    ("e", "unrounded close-mid front vowel"),
    ("ø", "rounded close-mid front vowel"),
    ("ɘ", "unrounded close-mid central vowel"),
    ("ɵ", "rounded close-mid central vowel"),
    ("ɤ", "unrounded close-mid back vowel"),
    ("o", "rounded close-mid back vowel"),
    ("ə", "unrounded mid central vowel"),
    ("ɛ", "unrounded open-mid front vowel"),
    ("œ", "rounded open-mid front vowel"),
    ("ɜ", "unrounded open-mid central vowel"),
    ("ɞ", "rounded open-mid central vowel"),
    ("ʌ", "unrounded open-mid back vowel"),
    ("ɔ", "rounded open-mid back vowel"),
    ("æ", "unrounded near-open front vowel"),
    ("ɐ", "unrounded near-open central vowel"),
    ("a", "unrounded open front vowel"),
    ("ɶ", "rounded open front vowel"),
    ("ɑ", "unrounded open back vowel"),
    ("ɒ", "rounded open back vowel"),
];

const DEFAULT_MODIFIERS: &[(&str, &str)] = &[
    ("ʼ", "ejective"),
    ("ʰ", "aspirated"),
    ("ʱ", "breathy-aspirated"),
    ("\u{0325}", "devoiced"),
    ("\u{0324}", "breathy-voiced"),
    ("\u{0330}", "creaky-voiced"),
    ("ʷ", "labialized"),
    ("ʲ", "palatalized"),
    ("ˠ", "velarized"),
    ("ˤ", "pharyngealized"),
    ("\u{0303}", "nasalized"),
    ("\u{0329}", "syllabic"),
    ("\u{032F}", "non-syllabic"),
    ("\u{031A}", "unreleased"),
    ("ˑ", "half-long"),
    ("ː", "long"),
];

#[derive(Debug, Clone)]
struct Base {
    grapheme: String,
    name: String,
}

#[derive(Debug, Clone)]
struct Modifier {
    grapheme: String,
    feature: String,
}

/// Table-driven [`PhoneticReference`] over base sounds and modifiers.
#[derive(Debug, Clone)]
pub struct BipaTable {
    bases: FxHashMap<String, Base>,
    modifiers: Vec<Modifier>,
    modifier_index: FxHashMap<char, usize>,
    longest_base: usize,
}

/// Lookup key: NFD with tie bars removed.
fn lookup_key(text: &str) -> String {
    text.nfd().filter(|c| !TIE_BARS.contains(c)).collect()
}

impl BipaTable {
    fn empty() -> Self {
        Self {
            bases: FxHashMap::default(),
            modifiers: Vec::new(),
            modifier_index: FxHashMap::default(),
            longest_base: 0,
        }
    }

    fn insert_base(&mut self, row: usize, grapheme: &str, name: &str) -> Result<(), CanonicalError> {
        let key = lookup_key(grapheme);
        if key.is_empty() {
            return Err(invalid_row(row, "empty base grapheme"));
        }
        if self.bases.contains_key(&key) {
            return Err(invalid_row(row, format!("duplicate base `{grapheme}`")));
        }
        self.longest_base = self.longest_base.max(key.chars().count());
        self.bases.insert(
            key,
            Base {
                grapheme: grapheme.nfc().collect(),
                name: name.to_string(),
            },
        );
        Ok(())
    }

    fn insert_modifier(
        &mut self,
        row: usize,
        grapheme: &str,
        feature: &str,
    ) -> Result<(), CanonicalError> {
        let key = lookup_key(grapheme);
        let mut chars = key.chars();
        let symbol = match (chars.next(), chars.next()) {
            (Some(symbol), None) => symbol,
            _ => {
                return Err(invalid_row(
                    row,
                    format!("modifier `{grapheme}` must be a single character"),
                ))
            }
        };
        if self.modifier_index.contains_key(&symbol) {
            return Err(invalid_row(row, format!("duplicate modifier `{grapheme}`")));
        }
        self.modifier_index.insert(symbol, self.modifiers.len());
        self.modifiers.push(Modifier {
            grapheme: key,
            feature: feature.to_string(),
        });
        Ok(())
    }

    /// Loads a tab-separated table with `kind`, `grapheme` and `name`
    /// columns, where `kind` is `base` or `modifier`. Modifier order in the
    /// file is the order used for canonical forms.
    pub fn from_reader<R: Read>(input: R) -> Result<Self, CanonicalError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_reader(input);

        let mut table = Self::empty();
        for (idx, record) in reader.records().enumerate() {
            // header is row 1
            let row = idx + 2;
            let record = record.map_err(|err| CanonicalError::ReferenceRead(err.to_string()))?;
            let field = |pos: usize| record.get(pos).unwrap_or("");
            match field(0) {
                "base" => table.insert_base(row, field(1), field(2))?,
                "modifier" => table.insert_modifier(row, field(1), field(2))?,
                other => return Err(invalid_row(row, format!("unknown kind `{other}`"))),
            }
        }
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, CanonicalError> {
        let file = File::open(path).map_err(|err| {
            CanonicalError::ReferenceRead(format!("{}: {err}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn base_count(&self) -> usize {
        self.bases.len()
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// Splits a lookup key into the longest matching base and the modifier
    /// indices that follow it.
    fn parse<'a>(&'a self, key: &str) -> Option<(&'a Base, Vec<usize>)> {
        let chars: Vec<char> = key.chars().collect();
        let max = self.longest_base.min(chars.len());
        (1..=max).rev().find_map(|len| {
            let head: String = chars[..len].iter().collect();
            let base = self.bases.get(&head)?;
            let mut seen = Vec::with_capacity(chars.len() - len);
            for c in &chars[len..] {
                let idx = *self.modifier_index.get(c)?;
                if seen.contains(&idx) {
                    return None;
                }
                seen.push(idx);
            }
            Some((base, seen))
        })
    }
}

impl Default for BipaTable {
    fn default() -> Self {
        let mut table = Self::empty();
        // the bundled rows are unique and non-empty, insertion cannot fail
        for (row, (grapheme, name)) in DEFAULT_BASES.iter().enumerate() {
            let _ = table.insert_base(row, grapheme, name);
        }
        for (row, (grapheme, feature)) in DEFAULT_MODIFIERS.iter().enumerate() {
            let _ = table.insert_modifier(row, grapheme, feature);
        }
        table
    }
}

impl PhoneticReference for BipaTable {
    fn resolve(&self, text: &str) -> Transcription {
        let key = lookup_key(text);
        let Some((base, mut modifiers)) = self.parse(&key) else {
            return Transcription::Unknown;
        };
        modifiers.sort_unstable();

        let mut grapheme = base.grapheme.clone();
        let mut name = String::new();
        for idx in &modifiers {
            let modifier = &self.modifiers[*idx];
            grapheme.push_str(&modifier.grapheme);
            name.push_str(&modifier.feature);
            name.push(' ');
        }
        name.push_str(&base.name);

        Transcription::Known {
            grapheme: grapheme.nfc().collect(),
            name,
        }
    }
}

fn invalid_row(row: usize, reason: impl Into<String>) -> CanonicalError {
    CanonicalError::InvalidReferenceRow {
        row,
        reason: reason.into(),
    }
}
