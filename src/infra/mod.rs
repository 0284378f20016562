pub mod xlsx_output_adapter;
pub mod yaml_output_adapter;
pub mod layer_output_adapter;
pub mod elastic_index_adapter;
pub mod attack_catalog_adapter;
pub mod http_client;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::constants::OUTPUT_TIMESTAMP_FORMAT;

pub use attack_catalog_adapter::{FileAttackCatalog, HttpAttackCatalog};
pub use elastic_index_adapter::ElasticIndexAdapter;
pub use layer_output_adapter::JsonLayerOutputAdapter;
pub use xlsx_output_adapter::XlsxDdmSheetAdapter;
pub use yaml_output_adapter::YamlCollectionExportAdapter;

/// `<dir>/<prefix>_<timestamp>.<extension>`, creating `dir` when missing
pub(crate) fn timestamped_path(dir: &Path, prefix: &str, extension: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format(OUTPUT_TIMESTAMP_FORMAT);
    Ok(dir.join(format!("{}_{}.{}", prefix, stamp, extension)))
}
