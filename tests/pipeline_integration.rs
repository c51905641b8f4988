mod common;

use std::fs;

use common::Archive;
use phonorm::{
    compute_id, run_pipeline, writer_for, CsvWriter, DatasetWriter, OutputFormat, PipelineError,
};

fn parameter_id(text: &str) -> String {
    format!("BIPA_{}", compute_id(text))
}

#[test]
fn run_pipeline_merges_every_family() -> Result<(), PipelineError> {
    let archive = Archive::new();
    let dataset = run_pipeline(&archive.config())?;

    let summary = dataset.summary();
    assert_eq!(summary.values, 10);
    assert_eq!(summary.parameters, 6);
    assert_eq!(summary.unresolved, 0);
    assert_eq!(summary.languages, 4);
    assert_eq!(summary.sources, 3);

    let ids: Vec<u64> = dataset.values.iter().map(|v| v.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());

    let texts: Vec<&str> = dataset
        .parameters
        .iter()
        .map(|p| p.normalized_text.as_str())
        .collect();
    assert_eq!(texts, vec!["p", "t", "a", "b", "m", "k"]);
    Ok(())
}

#[test]
fn same_segment_from_every_source_shares_one_parameter() -> Result<(), PipelineError> {
    let archive = Archive::new();
    let dataset = run_pipeline(&archive.config())?;

    let p_values: Vec<_> = dataset
        .values
        .iter()
        .filter(|v| v.raw_value == "p")
        .collect();
    assert_eq!(p_values.len(), 4);
    assert!(p_values.iter().all(|v| v.parameter_id == parameter_id("p")));

    let catalogs: Vec<&str> = p_values.iter().map(|v| v.catalog_tag.as_str()).collect();
    assert_eq!(
        catalogs,
        vec!["phoible-aa", "phoible-ra", "phoible-saphon", "phoible-upsid"]
    );
    Ok(())
}

#[test]
fn marginal_markers_and_allophones_are_resolved() -> Result<(), PipelineError> {
    let archive = Archive::new();
    let dataset = run_pipeline(&archive.config())?;

    let find = |raw: &str| {
        dataset
            .values
            .iter()
            .find(|v| v.raw_value == raw)
            .unwrap_or_else(|| panic!("no value {raw}"))
    };

    let bracketed = find("(t)");
    assert!(bracketed.marginal);
    assert_eq!(bracketed.parameter_id, parameter_id("t"));

    let angled = find("m");
    assert!(angled.marginal);
    assert_eq!(angled.language_id, "300_tupi");

    let allophone = find("b");
    assert!(!allophone.marginal);
    assert_eq!(allophone.parameter_id, parameter_id("b"));

    // the explicit anomalous flag is overridden by the shape of the string
    let anomalous = find("k");
    assert!(!anomalous.marginal);
    assert_eq!(anomalous.language_id, "451_hawaiian");
    Ok(())
}

#[test]
fn languages_citations_and_sources_are_attached() -> Result<(), PipelineError> {
    let archive = Archive::new();
    let dataset = run_pipeline(&archive.config())?;

    let khmer = dataset
        .languages
        .iter()
        .find(|l| l.id == "1_khmer")
        .expect("khmer");
    assert_eq!(khmer.family_name.as_deref(), Some("Austroasiatic"));
    assert_eq!(khmer.iso_code.as_deref(), Some("khm"));
    assert_eq!(khmer.macroarea.as_deref(), Some("Eurasia"));

    let tupi = dataset
        .languages
        .iter()
        .find(|l| l.id == "300_tupi")
        .expect("tupi");
    assert!(tupi.glottocode.is_none());
    assert!(tupi.family_name.is_none());

    for value in &dataset.values {
        match value.inventory_id.as_str() {
            "1" => assert_eq!(value.source_citations, vec!["huffman1970".to_string()]),
            "300" => assert!(value.source_citations.is_empty()),
            _ => assert_eq!(value.source_citations.len(), 1),
        }
    }

    let keys: Vec<&str> = dataset.sources.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["maddieson1984", "huffman1970", "ramaswami1999"]);
    Ok(())
}

#[test]
fn csv_writer_emits_all_tables() -> Result<(), PipelineError> {
    let archive = Archive::new();
    let config = archive.config();
    let dataset = run_pipeline(&config)?;

    let written = CsvWriter.write(&dataset, &config.output_dir)?;
    assert_eq!(written.len(), 5);

    let values = fs::read_to_string(archive.path("cldf/values.csv")).expect("values");
    let mut lines = values.lines();
    assert_eq!(
        lines.next(),
        Some("ID,Language_ID,Parameter_ID,Value,Contribution_ID,Source,Catalog,Marginal")
    );
    assert_eq!(lines.count(), 10);
    assert!(values.contains("1,1_khmer,BIPA_p_u0070,p,1,huffman1970,phoible-aa,false"));

    let parameters = fs::read_to_string(archive.path("cldf/parameters.csv")).expect("parameters");
    assert_eq!(parameters.lines().count(), 7);

    let inventories = fs::read_to_string(archive.path("cldf/inventories.csv")).expect("inventories");
    assert_eq!(inventories.lines().count(), 1);

    let bib = fs::read_to_string(archive.path("cldf/sources.bib")).expect("bib");
    assert!(bib.contains("maddieson1984"));
    assert!(!bib.contains("unused2000"));
    Ok(())
}

#[test]
fn json_writer_round_trips_counts() -> Result<(), PipelineError> {
    let archive = Archive::new();
    let config = archive.config();
    let dataset = run_pipeline(&config)?;

    let written = writer_for(OutputFormat::Json).write(&dataset, &config.output_dir)?;
    assert_eq!(written, vec![archive.path("cldf/dataset.json")]);

    let text = fs::read_to_string(&written[0]).expect("json");
    let json: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(json["values"].as_array().map(Vec::len), Some(10));
    assert_eq!(json["parameters"].as_array().map(Vec::len), Some(6));
    assert_eq!(json["values"][0]["source_citations"], "huffman1970");
    assert!(json["values"]
        .as_array()
        .into_iter()
        .flatten()
        .all(|value| value["source_citations"].is_string()));
    Ok(())
}
