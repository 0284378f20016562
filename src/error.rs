use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourcererError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML deserialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spreadsheet export failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to load resource '{path}': {message}")]
    ResourceLoad { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Technique catalog error: {0}")]
    Catalog(String),

    #[error("Search index error: {message}")]
    SearchIndex { message: String },

    #[error("No output selected; choose at least one of --excel, --elastic, --yaml or --layer")]
    NoOutputSelected,
}

impl SourcererError {
    pub fn resource(path: impl AsRef<std::path::Path>, message: impl std::fmt::Display) -> Self {
        SourcererError::ResourceLoad {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourcererError>;
