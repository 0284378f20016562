use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::app::ports::CollectionExportPort;
use crate::infra::timestamped_path;
use crate::pipeline::storage::OssemCorpus;

/// Writes `ddm_<ts>.yml`, `cim_<ts>.yml` and `dds_<ts>.yml` as multi-document YAML
pub struct YamlCollectionExportAdapter {
    output_dir: PathBuf,
}

impl YamlCollectionExportAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write_stream<T: Serialize>(&self, prefix: &str, records: &[T]) -> anyhow::Result<PathBuf> {
        let path = timestamped_path(&self.output_dir, prefix, "yml")?;
        write_yaml_stream(&path, records)?;
        info!(path = %path.display(), documents = records.len(), "wrote YAML collection");
        Ok(path)
    }
}

#[async_trait]
impl CollectionExportPort for YamlCollectionExportAdapter {
    async fn export_collections(&self, corpus: &OssemCorpus) -> anyhow::Result<Vec<PathBuf>> {
        Ok(vec![
            self.write_stream("ddm", &corpus.ddm_entries)?,
            self.write_stream("cim", &corpus.cim_entities)?,
            self.write_stream("dds", &corpus.data_dictionaries)?,
        ])
    }
}

/// One document per record, separated by `---`
pub fn to_yaml_stream<T: Serialize>(records: &[T]) -> Result<String, serde_yaml::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(record)?);
    }
    Ok(out)
}

pub fn write_yaml_stream<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    fs::write(path, to_yaml_stream(records)?)?;
    Ok(())
}
