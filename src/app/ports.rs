use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{AttackTechnique, DdmEntry};
use crate::pipeline::processing::aggregate::NavigatorLayer;
use crate::pipeline::storage::OssemCorpus;

/// Spreadsheet view of the enriched detection data model
#[async_trait]
pub trait DdmSheetPort: Send + Sync {
    async fn write_ddm_sheet(&self, entries: &[DdmEntry]) -> anyhow::Result<PathBuf>;
}

/// Canonical export of the ddm, cim and data dictionary collections
#[async_trait]
pub trait CollectionExportPort: Send + Sync {
    async fn export_collections(&self, corpus: &OssemCorpus) -> anyhow::Result<Vec<PathBuf>>;
}

#[async_trait]
pub trait LayerOutputPort: Send + Sync {
    async fn write_layer(&self, layer: &NavigatorLayer) -> anyhow::Result<PathBuf>;
}

/// Search index that is dropped and rebuilt on every load
#[async_trait]
pub trait SearchIndexPort: Send + Sync {
    /// Replace the index with one document per record; returns the number loaded
    async fn replace_index(&self, index: &str, documents: &[serde_json::Value]) -> anyhow::Result<usize>;
}

#[async_trait]
pub trait TechniqueCatalogPort: Send + Sync {
    async fn techniques(&self) -> anyhow::Result<Vec<AttackTechnique>>;
}
