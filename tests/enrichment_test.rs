use std::path::{Path, PathBuf};

use sourcerer::config::{Config, YamlBundleConfig};
use sourcerer::domain::DdmEntry;
use sourcerer::infra::yaml_output_adapter::write_yaml_stream;
use sourcerer::pipeline::ingestion::{load_corpus, load_profile, load_yaml_bundle, CorpusSource};
use sourcerer::pipeline::processing::enrich_ddm;
use sourcerer::pipeline::storage::OssemCorpus;
use tempfile::TempDir;

fn fixture(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
}

fn markdown_corpus() -> OssemCorpus {
    let mut config = Config::default();
    config.resources.data_channels = fixture("resources/dcs.yml");
    load_corpus(&CorpusSource::Markdown(fixture("tests/resources/ossem")), &config).unwrap()
}

fn enriched(corpus: &OssemCorpus) -> Vec<DdmEntry> {
    let profile = load_profile(&fixture("profiles/default.yml")).unwrap();
    let mut entries = corpus.ddm_entries.clone();
    enrich_ddm(
        &mut entries,
        &corpus.data_dictionaries,
        &corpus.data_channels,
        &corpus.cim_entities,
        &profile,
    );
    entries
}

#[test]
fn test_fixture_corpus_scores() {
    let corpus = markdown_corpus();
    let entries = enriched(&corpus);

    // security channel, 4 of 12 profile fields, 3 of 4 standardized fields
    assert_eq!(entries[0].dimensions(), [4, 4, 3, 2, 3]);
    assert_eq!(entries[0].data_channel.as_deref(), Some("security"));
    assert!((entries[0].score - 3.2).abs() < 1e-9);
    assert_eq!(entries[0].comment, "");

    // sysmon channel, 8 of 12 profile fields, fully standardized
    assert_eq!(entries[1].dimensions(), [5, 5, 3, 3, 5]);
    assert!((entries[1].score - 4.2).abs() < 1e-9);

    assert_eq!(entries[2].dimensions(), [0; 5]);
    assert_eq!(entries[2].score, 0.0);
    assert_eq!(entries[2].comment, "data dictionary not found");
    assert!(entries[2].data_channel.is_none());

    assert_eq!(entries[3].dimensions(), [4, 4, 3, 0, 5]);
    assert_eq!(entries[3].comment, "host not found in CIM");

    assert_eq!(entries[4].dimensions(), [4, 4, 3, 0, 5]);
    assert_eq!(entries[4].comment, "both entities are missing");
}

#[test]
fn test_summary_counts_comment_reasons() {
    let corpus = markdown_corpus();
    let profile = load_profile(&fixture("profiles/default.yml")).unwrap();
    let mut entries = corpus.ddm_entries.clone();

    let summary = enrich_ddm(
        &mut entries,
        &corpus.data_dictionaries,
        &corpus.data_channels,
        &corpus.cim_entities,
        &profile,
    );

    assert_eq!(summary.total, 5);
    assert_eq!(summary.scored, 4);
    assert_eq!(summary.comments.get("data dictionary not found"), Some(&1));
    assert_eq!(summary.comments.get("entity not found in CIM"), Some(&1));
    assert_eq!(summary.comments.get("both entities are missing"), Some(&1));
}

#[test]
fn test_enrichment_is_idempotent() {
    let corpus = markdown_corpus();
    let profile = load_profile(&fixture("profiles/default.yml")).unwrap();
    let mut entries = enriched(&corpus);
    let first = entries.clone();

    enrich_ddm(
        &mut entries,
        &corpus.data_dictionaries,
        &corpus.data_channels,
        &corpus.cim_entities,
        &profile,
    );
    assert_eq!(entries, first);
}

#[test]
fn test_yaml_export_reloads_to_the_same_scores() {
    let corpus = markdown_corpus();
    let dir = TempDir::new().unwrap();
    let bundle = YamlBundleConfig::default();

    write_yaml_stream(&dir.path().join(&bundle.ddm), &corpus.ddm_entries).unwrap();
    write_yaml_stream(&dir.path().join(&bundle.dds), &corpus.data_dictionaries).unwrap();
    write_yaml_stream(&dir.path().join(&bundle.cim), &corpus.cim_entities).unwrap();

    let collections = load_yaml_bundle(dir.path(), &bundle).unwrap();
    assert_eq!(collections.ddm_entries, corpus.ddm_entries);
    assert_eq!(collections.data_dictionaries, corpus.data_dictionaries);
    assert_eq!(collections.cim_entities, corpus.cim_entities);

    let reloaded = OssemCorpus::new(
        collections.cim_entities,
        collections.data_dictionaries,
        collections.ddm_entries,
        corpus.data_channels.clone(),
    );
    assert_eq!(enriched(&reloaded), enriched(&corpus));
}

#[test]
fn test_enriched_ddm_survives_yaml_round_trip() {
    let corpus = markdown_corpus();
    let first = enriched(&corpus);
    assert!(first.iter().any(|entry| entry.data_channel.is_some() && entry.score > 0.0));
    assert!(first.iter().any(|entry| !entry.comment.is_empty()));

    let dir = TempDir::new().unwrap();
    let bundle = YamlBundleConfig::default();
    write_yaml_stream(&dir.path().join(&bundle.ddm), &first).unwrap();
    write_yaml_stream(&dir.path().join(&bundle.dds), &corpus.data_dictionaries).unwrap();
    write_yaml_stream(&dir.path().join(&bundle.cim), &corpus.cim_entities).unwrap();

    let collections = load_yaml_bundle(dir.path(), &bundle).unwrap();
    assert_eq!(collections.ddm_entries, first);

    let reloaded = OssemCorpus::new(
        collections.cim_entities,
        collections.data_dictionaries,
        collections.ddm_entries,
        corpus.data_channels.clone(),
    );
    assert_eq!(enriched(&reloaded), first);
}
