use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, SourcererError};

/// Read every non-empty document of a multi-document YAML stream
pub fn read_yaml_stream<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).map_err(|e| SourcererError::resource(path, e))?;
    parse_yaml_stream(&text).map_err(|e| SourcererError::resource(path, e))
}

pub fn parse_yaml_stream<T: DeserializeOwned>(text: &str) -> std::result::Result<Vec<T>, serde_yaml::Error> {
    let mut records = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        records.push(serde_yaml::from_value(value)?);
    }
    Ok(records)
}

/// Read a single YAML document
pub fn read_yaml_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| SourcererError::resource(path, e))?;
    serde_yaml::from_str(&text).map_err(|e| SourcererError::resource(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataChannel;

    #[test]
    fn test_empty_documents_are_skipped() {
        let text = "---\ndata channel: security\ncoverage: 4\ntimeliness: 4\nretention: 3\n---\n---\ndata channel: sysmon\ncoverage: '5'\ntimeliness: 5\nretention: 3\n";
        let channels: Vec<DataChannel> = parse_yaml_stream(text).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].data_channel, "sysmon");
        assert_eq!(channels[1].coverage, 5);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let channels: Vec<DataChannel> = parse_yaml_stream("").unwrap();
        assert!(channels.is_empty());
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let result: std::result::Result<Vec<DataChannel>, _> = parse_yaml_stream("coverage: 4\n");
        assert!(result.is_err());
    }
}
