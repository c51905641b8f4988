//! A miniature survey archive on disk, one source per reader family.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use phonorm::PipelineConfig;
use tempfile::TempDir;

pub const AA: &str = "\
InventoryID\tLanguageName\tPhoneme
1\tKhmer\tp
\t\t(t)
\t\ta
\t\tb|p
";

pub const RA: &str = "\
segment descriptions,,,,,
second preamble row,,,,,
InventoryID,#,Language Name,Language Code,p,a
7,1,Tamil,tam,1,1
";

pub const UPSID_LANGUAGES: &str = "LangNum\tLangName\n100\tHawaiian\n";
pub const UPSID_CODES: &str = "upsidLangNum\tLanguageName\tInventoryID\n100\tHawaiian\t451\n";
pub const UPSID_CHAR_CODES: &str = "CCID\tIPA\tDescription\n1\tp\tvoiceless bilabial\n3\tk\tvelar\n";
pub const UPSID_SEGMENTS: &str = "upsidLangNum\tupsidCCID\tanomalous\n100\t1\t0\n100\t3\t1\n";

pub const LANGUAGES: &str = "\
ID,Name,Glottocode
1_khmer,Khmer,cent1989
7_tamil,Tamil,tami1289
300_tupi,Tupi,
451_hawaiian,Hawaiian,hawa1245
";

pub const TAXONOMY: &str = "\
Glottocode,Name,ISO639P3code,Latitude,Longitude,Macroarea,Lineage
cent1989,Central Khmer,khm,12.5,104.0,Eurasia,Austroasiatic/aust1305;Khmeric/khme1253
tami1289,Tamil,tam,10.5,78.8,Eurasia,Dravidian/drav1251;Tamil-Kota/tami1291
hawa1245,Hawaiian,haw,19.6,-155.4,Papunesia,Austronesian/aust1307
";

pub const CITATION_MAP: &str = "\
InventoryID,BibtexKey
1,huffman1970
7,ramaswami1999
451,maddieson1984
";

pub const BIBLIOGRAPHY: &str = "\
@book{maddieson1984,
  author = {Maddieson, Ian},
  title = {Patterns of Sounds},
}

@book{unused2000,
  title = {Never cited},
}

@misc{huffman1970,
  title = {Cambodian System of Writing},
}

@book{ramaswami1999,
  title = {Common Linguistic Features in Indian Languages},
}
";

/// Windowed matrix with segment columns `p` and `<m>` between the fixed
/// metadata blocks.
pub fn saphon() -> String {
    let mut header: Vec<String> = vec!["InventoryID".into(), "Name".into()];
    header.extend((2..17).map(|i| format!("pre{i}")));
    header.push("p".into());
    header.push("<m>".into());
    header.extend((0..37).map(|i| format!("post{i}")));

    let mut row: Vec<String> = vec!["300".into(), "Tupi".into()];
    row.extend((2..17).map(|_| String::new()));
    row.push("1".into());
    row.push("1".into());
    row.extend((0..37).map(|_| "1".to_string()));

    format!("{}\n{}\n", header.join("\t"), row.join("\t"))
}

pub const CONFIG: &str = r#"
version: "1.0"
name: "fixture"
raw_dir: "raw"
languages_path: "etc/languages.csv"
citation_map_path: "etc/citations.csv"
bibliography_path: "etc/sources.bib"
taxonomy_path: "etc/glottolog.csv"
output_dir: "cldf"
sources:
  - { tag: "AA", family: "row_inheritance", path: "AA/AA_inventories.tsv" }
  - { tag: "RA", family: "binary_matrix", path: "RA/Ramaswami1999.csv" }
  - { tag: "SAPHON", family: "windowed_matrix", path: "SAPHON/saphon.tsv" }
  - { tag: "UPSID", family: "cross_reference", path: "UPSID" }
"#;

pub struct Archive {
    pub dir: TempDir,
}

impl Archive {
    pub fn new() -> Self {
        let archive = Self {
            dir: tempfile::tempdir().expect("tempdir"),
        };
        archive.write("raw/AA/AA_inventories.tsv", AA);
        archive.write("raw/RA/Ramaswami1999.csv", RA);
        archive.write("raw/SAPHON/saphon.tsv", &saphon());
        archive.write("raw/UPSID/UPSID_Languages.tsv", UPSID_LANGUAGES);
        archive.write("raw/UPSID/UPSID_LanguageCodes.tsv", UPSID_CODES);
        archive.write("raw/UPSID/UPSID_CharCodes.tsv", UPSID_CHAR_CODES);
        archive.write("raw/UPSID/UPSID_Segments.tsv", UPSID_SEGMENTS);
        archive.write("etc/languages.csv", LANGUAGES);
        archive.write("etc/glottolog.csv", TAXONOMY);
        archive.write("etc/citations.csv", CITATION_MAP);
        archive.write("etc/sources.bib", BIBLIOGRAPHY);
        archive.write("phonorm.yaml", CONFIG);
        archive
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes (or replaces) a file inside the archive.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::from_file(self.path("phonorm.yaml")).expect("fixture config")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
