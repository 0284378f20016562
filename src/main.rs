use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser};
use tracing::info;

use sourcerer::app::ports::TechniqueCatalogPort;
use sourcerer::app::{EnrichUseCase, ExportPorts, ExportUseCase, OutputMode, OutputSelection};
use sourcerer::config::{Config, DEFAULT_CONFIG_PATH};
use sourcerer::infra::{
    ElasticIndexAdapter, FileAttackCatalog, HttpAttackCatalog, JsonLayerOutputAdapter, XlsxDdmSheetAdapter,
    YamlCollectionExportAdapter,
};
use sourcerer::observability;
use sourcerer::pipeline::ingestion::{load_corpus, load_profile, read_yaml_document, CorpusSource};
use sourcerer::pipeline::processing::aggregate::NavigatorLayer;

#[derive(Parser)]
#[command(name = "sourcerer")]
#[command(about = "Map ATT&CK data source coverage and quality using the OSSEM data model")]
#[command(version)]
#[command(group(ArgGroup::new("source").required(true).args(["ossem", "ossem_yaml"])))]
struct Cli {
    /// Path to an OSSEM markdown checkout
    #[arg(short = 'o', long)]
    ossem: Option<PathBuf>,

    /// Path to a directory with OSSEM YAML exports
    #[arg(short = 'y', long)]
    ossem_yaml: Option<PathBuf>,

    /// Path to the CIM relevance profile
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local enterprise ATT&CK STIX bundle, instead of downloading it
    #[arg(long)]
    attack_bundle: Option<PathBuf>,

    /// Export the enriched DDM to Excel
    #[arg(long)]
    excel: bool,

    /// Export OSSEM data models to Elasticsearch
    #[arg(long)]
    elastic: bool,

    /// Export OSSEM data models to YAML
    #[arg(long)]
    yaml: bool,

    /// Export data source quality as an ATT&CK Navigator layer
    #[arg(long)]
    layer: bool,
}

impl Cli {
    fn selection(&self) -> OutputSelection {
        OutputSelection {
            excel: self.excel,
            elastic: self.elastic,
            yaml: self.yaml,
            layer: self.layer,
        }
    }

    fn source(&self) -> Option<CorpusSource> {
        match (&self.ossem, &self.ossem_yaml) {
            (Some(path), _) => Some(CorpusSource::Markdown(path.clone())),
            (None, Some(path)) => Some(CorpusSource::Yaml(path.clone())),
            (None, None) => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Reject a run without outputs before anything touches the filesystem
    let modes = cli.selection().modes()?;

    dotenv::dotenv().ok();
    observability::init_logging();

    let config = load_config(cli.config.as_deref())?;
    observability::metrics::init()?;

    let source = cli
        .source()
        .context("one of --ossem or --ossem-yaml is required")?;
    let profile_path = cli
        .profile
        .clone()
        .unwrap_or_else(|| config.resources.default_profile.clone());
    info!(profile = %profile_path.display(), "loading profile");
    let profile = load_profile(&profile_path)?;
    let corpus = load_corpus(&source, &config)?;

    let layer_template = if modes.contains(&OutputMode::Layer) {
        read_yaml_document::<NavigatorLayer>(&config.resources.navigator_layer)?
    } else {
        NavigatorLayer::default()
    };

    let ports = build_ports(&modes, &config, cli.attack_bundle.as_deref())?;
    let export = ExportUseCase::new(ports, layer_template);
    let mut enrich = EnrichUseCase::new(corpus, profile);

    let report = export.run(&mut enrich, &modes).await?;
    for file in &report.files {
        info!(path = %file.display(), "created");
    }
    for (index, documents) in &report.indexed {
        info!(index = %index, documents, "indexed");
    }

    if config.output.metrics_snapshot {
        write_metrics_snapshot(&config.output.directory)?;
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Ok(Config::load(DEFAULT_CONFIG_PATH)?),
        None => {
            let mut config = Config::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }
}

fn build_ports(modes: &[OutputMode], config: &Config, attack_bundle: Option<&Path>) -> anyhow::Result<ExportPorts> {
    let output_dir = &config.output.directory;
    let mut ports = ExportPorts::default();

    for mode in modes {
        match mode {
            OutputMode::Excel => ports.sheet = Some(Box::new(XlsxDdmSheetAdapter::new(output_dir))),
            OutputMode::Elastic => {
                ports.search_index = Some(Box::new(ElasticIndexAdapter::new(&config.elastic)?));
            }
            OutputMode::Yaml => {
                ports.collections = Some(Box::new(YamlCollectionExportAdapter::new(output_dir)));
            }
            OutputMode::Layer => {
                let catalog: Box<dyn TechniqueCatalogPort> = match attack_bundle {
                    Some(path) => Box::new(FileAttackCatalog::new(path)),
                    None => Box::new(HttpAttackCatalog::new(&config.attack)?),
                };
                ports.catalog = Some(catalog);
                ports.layer = Some(Box::new(JsonLayerOutputAdapter::new(output_dir)));
            }
        }
    }

    Ok(ports)
}

fn write_metrics_snapshot(output_dir: &Path) -> anyhow::Result<()> {
    let Some(snapshot) = observability::render_snapshot() else {
        return Ok(());
    };
    fs::create_dir_all(output_dir)?;
    let stamp = chrono::Local::now().format(sourcerer::constants::OUTPUT_TIMESTAMP_FORMAT);
    let path = output_dir.join(format!("metrics_{}.prom", stamp));
    fs::write(&path, snapshot).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote metrics snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_without_outputs_is_rejected_at_parse() {
        let cli = Cli::try_parse_from(["sourcerer", "--ossem", "OSSEM"]).unwrap();
        assert!(cli.selection().modes().is_err());
        assert_eq!(cli.source(), Some(CorpusSource::Markdown(PathBuf::from("OSSEM"))));
    }

    #[test]
    fn test_selected_outputs_keep_run_order() {
        let cli = Cli::try_parse_from(["sourcerer", "-y", "bundle", "--layer", "--excel"]).unwrap();
        assert_eq!(cli.selection().modes().unwrap(), vec![OutputMode::Excel, OutputMode::Layer]);
    }

    #[test]
    fn test_corpus_source_is_required() {
        assert!(Cli::try_parse_from(["sourcerer", "--yaml"]).is_err());
    }
}
