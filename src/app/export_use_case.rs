use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::app::enrich_use_case::EnrichUseCase;
use crate::app::ports::{
    CollectionExportPort, DdmSheetPort, LayerOutputPort, SearchIndexPort, TechniqueCatalogPort,
};
use crate::constants::{INDEX_CIM, INDEX_DCS, INDEX_DDM, INDEX_DDS};
use crate::error::SourcererError;
use crate::pipeline::processing::aggregate::{
    build_quality_layer, data_source_scores, score_techniques, NavigatorLayer,
};
use crate::pipeline::processing::flatten::{flatten_cim, flatten_dictionaries};

/// An output the run can produce, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputMode {
    Excel,
    Elastic,
    Yaml,
    Layer,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Excel => "excel",
            OutputMode::Elastic => "elastic",
            OutputMode::Yaml => "yaml",
            OutputMode::Layer => "layer",
        }
    }
}

/// Output flags as given on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputSelection {
    pub excel: bool,
    pub elastic: bool,
    pub yaml: bool,
    pub layer: bool,
}

impl OutputSelection {
    /// Selected modes in execution order; selecting nothing is rejected
    pub fn modes(&self) -> std::result::Result<Vec<OutputMode>, SourcererError> {
        let modes: Vec<OutputMode> = [
            (self.excel, OutputMode::Excel),
            (self.elastic, OutputMode::Elastic),
            (self.yaml, OutputMode::Yaml),
            (self.layer, OutputMode::Layer),
        ]
        .into_iter()
        .filter_map(|(selected, mode)| selected.then_some(mode))
        .collect();

        if modes.is_empty() {
            return Err(SourcererError::NoOutputSelected);
        }
        Ok(modes)
    }
}

/// Adapters for the selected outputs; a mode whose port is missing fails when it runs
#[derive(Default)]
pub struct ExportPorts {
    pub sheet: Option<Box<dyn DdmSheetPort>>,
    pub search_index: Option<Box<dyn SearchIndexPort>>,
    pub collections: Option<Box<dyn CollectionExportPort>>,
    pub layer: Option<Box<dyn LayerOutputPort>>,
    pub catalog: Option<Box<dyn TechniqueCatalogPort>>,
}

/// What one run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    pub files: Vec<PathBuf>,
    pub indexed: Vec<(String, usize)>,
    pub techniques: usize,
}

/// Use case that drives enrichment and hands results to the selected outputs
pub struct ExportUseCase {
    ports: ExportPorts,
    layer_template: NavigatorLayer,
}

impl ExportUseCase {
    pub fn new(ports: ExportPorts, layer_template: NavigatorLayer) -> Self {
        Self {
            ports,
            layer_template,
        }
    }

    pub async fn run(&self, enrich: &mut EnrichUseCase, modes: &[OutputMode]) -> Result<ExportReport> {
        let mut report = ExportReport::default();

        for mode in modes {
            let started = Instant::now();
            let outcome = self.run_mode(*mode, enrich, &mut report).await;
            match outcome {
                Ok(()) => {
                    crate::observability::metrics::export::output_written(
                        mode.as_str(),
                        started.elapsed().as_secs_f64(),
                    );
                    info!(mode = mode.as_str(), "output complete");
                }
                Err(e) => {
                    crate::observability::metrics::export::output_error(mode.as_str());
                    return Err(e.context(format!("{} output failed", mode.as_str())));
                }
            }
        }

        Ok(report)
    }

    async fn run_mode(&self, mode: OutputMode, enrich: &mut EnrichUseCase, report: &mut ExportReport) -> Result<()> {
        match mode {
            OutputMode::Excel => {
                let sheet = required(&self.ports.sheet, mode)?;
                let path = sheet.write_ddm_sheet(enrich.enriched_entries()).await?;
                report.files.push(path);
            }
            OutputMode::Elastic => {
                let index = required(&self.ports.search_index, mode)?;
                let ddm = to_documents(enrich.enriched_entries())?;
                let cim = to_documents(&flatten_cim(&enrich.corpus().cim_entities, enrich.profile()))?;
                let dds = to_documents(&flatten_dictionaries(&enrich.corpus().data_dictionaries))?;
                let dcs = to_documents(&enrich.corpus().data_channels)?;

                for (name, documents) in [(INDEX_DDM, ddm), (INDEX_CIM, cim), (INDEX_DDS, dds), (INDEX_DCS, dcs)] {
                    let loaded = index
                        .replace_index(name, &documents)
                        .await
                        .with_context(|| format!("Failed to load index {}", name))?;
                    crate::observability::metrics::export::index_documents(name, loaded);
                    report.indexed.push((name.to_string(), loaded));
                }
            }
            OutputMode::Yaml => {
                let collections = required(&self.ports.collections, mode)?;
                let paths = collections.export_collections(enrich.corpus()).await?;
                report.files.extend(paths);
            }
            OutputMode::Layer => {
                let catalog = required(&self.ports.catalog, mode)?;
                let layer_output = required(&self.ports.layer, mode)?;

                let techniques = catalog
                    .techniques()
                    .await
                    .context("Failed to load ATT&CK techniques")?;
                let scores = data_source_scores(enrich.enriched_entries());
                let technique_scores = score_techniques(&techniques, &scores);
                let layer = build_quality_layer(self.layer_template.clone(), &technique_scores);

                report.files.push(layer_output.write_layer(&layer).await?);
                report.techniques = technique_scores.len();
            }
        }
        Ok(())
    }
}

fn required<T: ?Sized>(port: &Option<Box<T>>, mode: OutputMode) -> Result<&T> {
    port.as_deref()
        .ok_or_else(|| anyhow::anyhow!("no adapter configured for {} output", mode.as_str()))
}

fn to_documents<T: Serialize>(records: &[T]) -> Result<Vec<serde_json::Value>> {
    records
        .iter()
        .map(|record| serde_json::to_value(record).map_err(anyhow::Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttackTechnique, DataChannel, DataDictionary, DdmEntry, DictionaryField, Profile};
    use crate::pipeline::storage::OssemCorpus;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockIndex {
        loads: Arc<Mutex<Vec<(String, usize)>>>,
    }

    #[async_trait]
    impl SearchIndexPort for MockIndex {
        async fn replace_index(&self, index: &str, documents: &[serde_json::Value]) -> Result<usize> {
            self.loads.lock().await.push((index.to_string(), documents.len()));
            Ok(documents.len())
        }
    }

    struct MockLayerOutput {
        layers: Arc<Mutex<Vec<NavigatorLayer>>>,
    }

    #[async_trait]
    impl LayerOutputPort for MockLayerOutput {
        async fn write_layer(&self, layer: &NavigatorLayer) -> Result<PathBuf> {
            self.layers.lock().await.push(layer.clone());
            Ok(PathBuf::from("ds_layer.json"))
        }
    }

    struct StaticCatalog;

    #[async_trait]
    impl TechniqueCatalogPort for StaticCatalog {
        async fn techniques(&self) -> Result<Vec<AttackTechnique>> {
            Ok(vec![
                AttackTechnique {
                    technique_id: "T1059".to_string(),
                    name: "Command and Scripting Interpreter".to_string(),
                    data_sources: Some(vec!["Process".to_string()]),
                },
                AttackTechnique {
                    technique_id: "T1200".to_string(),
                    name: "Hardware Additions".to_string(),
                    data_sources: None,
                },
            ])
        }
    }

    fn use_case_corpus() -> EnrichUseCase {
        let corpus = OssemCorpus::new(
            Vec::new(),
            vec![DataDictionary {
                operating_system: "windows".to_string(),
                data_channel: "security".to_string(),
                description: None,
                event: "4688".to_string(),
                data_fields: vec![DictionaryField {
                    standard_name: "process_name".to_string(),
                    field_name: "NewProcessName".to_string(),
                    ..Default::default()
                }],
            }],
            vec![DdmEntry {
                attack_data_source: Some("Process".to_string()),
                eventid: "4688".to_string(),
                ..Default::default()
            }],
            vec![DataChannel {
                data_channel: "security".to_string(),
                coverage: 5,
                timeliness: 5,
                retention: 5,
            }],
        );
        EnrichUseCase::new(corpus, Profile::default())
    }

    #[test]
    fn test_no_output_selected_is_rejected() {
        let result = OutputSelection::default().modes();
        assert!(matches!(result, Err(SourcererError::NoOutputSelected)));
    }

    #[test]
    fn test_modes_run_in_fixed_order() {
        let selection = OutputSelection {
            excel: false,
            elastic: true,
            yaml: true,
            layer: true,
        };
        assert_eq!(
            selection.modes().unwrap(),
            vec![OutputMode::Elastic, OutputMode::Yaml, OutputMode::Layer]
        );
    }

    #[tokio::test]
    async fn test_elastic_loads_four_indices() {
        let index = MockIndex::default();
        let loads = index.loads.clone();
        let use_case = ExportUseCase::new(
            ExportPorts {
                search_index: Some(Box::new(index)),
                ..Default::default()
            },
            NavigatorLayer::default(),
        );
        let mut enrich = use_case_corpus();

        let report = use_case.run(&mut enrich, &[OutputMode::Elastic]).await.unwrap();

        let loads = loads.lock().await.clone();
        assert_eq!(
            loads,
            vec![
                ("ossem.ddm".to_string(), 1),
                ("ossem.cim".to_string(), 0),
                ("ossem.dds".to_string(), 1),
                ("ossem.dcs".to_string(), 1),
            ]
        );
        assert_eq!(report.indexed, loads);
    }

    #[tokio::test]
    async fn test_layer_scores_catalog_techniques() {
        let layers = Arc::new(Mutex::new(Vec::new()));
        let use_case = ExportUseCase::new(
            ExportPorts {
                layer: Some(Box::new(MockLayerOutput { layers: layers.clone() })),
                catalog: Some(Box::new(StaticCatalog)),
                ..Default::default()
            },
            NavigatorLayer::default(),
        );
        let mut enrich = use_case_corpus();

        let report = use_case.run(&mut enrich, &[OutputMode::Layer]).await.unwrap();

        assert_eq!(report.techniques, 2);
        let layers = layers.lock().await;
        let layer = &layers[0];
        assert_eq!(layer.name, "Data Quality");
        assert_eq!(layer.techniques[0].technique_id, "T1059");
        assert!(layer.techniques[0].score > 0.0);
        assert_eq!(layer.techniques[1].comment, "technique has no data sources");
    }

    #[tokio::test]
    async fn test_missing_adapter_fails_the_mode() {
        let use_case = ExportUseCase::new(ExportPorts::default(), NavigatorLayer::default());
        let mut enrich = use_case_corpus();

        let result = use_case.run(&mut enrich, &[OutputMode::Excel]).await;
        assert!(result.is_err());
        assert!(!enrich.is_enriched());
    }
}
