// Pipeline ingestion: loading the OSSEM corpus and its reference resources

pub mod yaml_stream;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{Config, YamlBundleConfig};
use crate::domain::{CimEntity, DataChannel, DataDictionary, DdmEntry, Profile};
use crate::error::{Result, SourcererError};
use crate::pipeline::processing::normalize::{CorpusNormalizer, NormalizedCollections};
use crate::pipeline::storage::OssemCorpus;

pub use yaml_stream::{parse_yaml_stream, read_yaml_document, read_yaml_stream};

const MAX_RATING: u8 = 5;

/// Where the corpus comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    /// Root of an OSSEM markdown checkout
    Markdown(PathBuf),
    /// Directory holding the canonical YAML streams
    Yaml(PathBuf),
}

impl CorpusSource {
    pub fn path(&self) -> &Path {
        match self {
            CorpusSource::Markdown(path) | CorpusSource::Yaml(path) => path,
        }
    }
}

/// Load the three collections from either source plus the data channel table
pub fn load_corpus(source: &CorpusSource, config: &Config) -> Result<OssemCorpus> {
    let collections = match source {
        CorpusSource::Markdown(root) => {
            let (collections, _summary) = CorpusNormalizer::new().normalize_tree(root)?;
            collections
        }
        CorpusSource::Yaml(dir) => load_yaml_bundle(dir, &config.yaml_bundle)?,
    };
    let data_channels = load_data_channels(&config.resources.data_channels)?;

    let corpus = OssemCorpus::new(
        collections.cim_entities,
        collections.data_dictionaries,
        collections.ddm_entries,
        data_channels,
    );
    let (cim, dds, ddm, dcs) = corpus.counts();
    info!(source = %source.path().display(), cim, dds, ddm, dcs, "loaded OSSEM corpus");

    Ok(corpus)
}

/// Load pre-normalized collections from `<dir>/<ddm|dds|cim file>`
pub fn load_yaml_bundle(dir: &Path, bundle: &YamlBundleConfig) -> Result<NormalizedCollections> {
    if !dir.is_dir() {
        return Err(SourcererError::resource(dir, "OSSEM YAML directory does not exist"));
    }

    let ddm_entries: Vec<DdmEntry> = read_yaml_stream(&dir.join(&bundle.ddm))?;
    let data_dictionaries: Vec<DataDictionary> = read_yaml_stream(&dir.join(&bundle.dds))?;
    let cim_entities: Vec<CimEntity> = read_yaml_stream(&dir.join(&bundle.cim))?;

    crate::observability::metrics::ingestion::records_loaded("ddm", ddm_entries.len());
    crate::observability::metrics::ingestion::records_loaded("dds", data_dictionaries.len());
    crate::observability::metrics::ingestion::records_loaded("cim", cim_entities.len());

    Ok(NormalizedCollections {
        cim_entities,
        data_dictionaries,
        ddm_entries,
    })
}

pub fn load_profile(path: &Path) -> Result<Profile> {
    let profile: Profile = read_yaml_document(path)?;
    if profile.is_empty() {
        warn!(path = %path.display(), "profile declares no entities, structure will not be scored");
    }
    Ok(profile)
}

pub fn load_data_channels(path: &Path) -> Result<Vec<DataChannel>> {
    let channels: Vec<DataChannel> = read_yaml_stream(path)?;
    for channel in &channels {
        let ratings = [channel.coverage, channel.timeliness, channel.retention];
        if ratings.iter().any(|rating| *rating > MAX_RATING) {
            warn!(
                data_channel = %channel.data_channel,
                coverage = channel.coverage,
                timeliness = channel.timeliness,
                retention = channel.retention,
                "data channel rating outside 0..=5"
            );
        }
    }
    crate::observability::metrics::ingestion::records_loaded("dcs", channels.len());
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_yaml_bundle_loads_all_three_streams() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "ddm.yml",
            "att&ck data source: Process\nsub data source: Process Creation\nsource data object: process\nrelationship: created\ndestination data object: process\neventid: 4688\n",
        );
        write(
            dir.path(),
            "dds.yml",
            "operating system: windows\ndata channel: security\nevent: '4688'\ndescription: null\ndata fields:\n- standard name: process_name\n  field name: NewProcessName\n  type: string\n  description: ''\n  sample value: ''\n",
        );
        write(dir.path(), "cim.yml", "entity: process\ndescription: Process\ndata fields: []\n---\n");

        let collections = load_yaml_bundle(dir.path(), &YamlBundleConfig::default()).unwrap();
        assert_eq!(collections.ddm_entries.len(), 1);
        assert_eq!(collections.ddm_entries[0].eventid, "4688");
        assert_eq!(collections.data_dictionaries[0].data_fields.len(), 1);
        assert_eq!(collections.cim_entities[0].entity, "process");
    }

    #[test]
    fn test_missing_stream_is_a_resource_error() {
        let dir = TempDir::new().unwrap();
        let result = load_yaml_bundle(dir.path(), &YamlBundleConfig::default());
        assert!(matches!(result, Err(SourcererError::ResourceLoad { .. })));
    }

    #[test]
    fn test_profile_loads_from_yaml() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "profile.yml", "process:\n  - process_name\n  - process_id\n");
        let profile = load_profile(&dir.path().join("profile.yml")).unwrap();
        assert_eq!(profile.fields_for("process").map(|f| f.len()), Some(2));
    }
}
