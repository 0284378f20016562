use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::app::ports::LayerOutputPort;
use crate::infra::timestamped_path;
use crate::pipeline::processing::aggregate::NavigatorLayer;

/// Writes the navigator layer as `ds_layer_<ts>.json`
pub struct JsonLayerOutputAdapter {
    output_dir: PathBuf,
}

impl JsonLayerOutputAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl LayerOutputPort for JsonLayerOutputAdapter {
    async fn write_layer(&self, layer: &NavigatorLayer) -> anyhow::Result<PathBuf> {
        let path = timestamped_path(&self.output_dir, "ds_layer", "json")?;
        fs::write(&path, serde_json::to_string(layer)?)?;
        info!(path = %path.display(), techniques = layer.techniques.len(), "wrote navigator layer");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_layer_file_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonLayerOutputAdapter::new(dir.path());
        let layer = NavigatorLayer {
            name: "Data Quality".to_string(),
            ..Default::default()
        };

        let path = adapter.write_layer(&layer).await.unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["name"], "Data Quality");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("ds_layer_"));
    }
}
