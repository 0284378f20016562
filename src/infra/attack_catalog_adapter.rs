use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::app::ports::TechniqueCatalogPort;
use crate::config::AttackConfig;
use crate::domain::AttackTechnique;
use crate::error::{Result, SourcererError};
use crate::infra::http_client::build_client;

const ATTACK_PATTERN: &str = "attack-pattern";
const MITRE_ATTACK_SOURCE: &str = "mitre-attack";

#[derive(Debug, Deserialize)]
struct StixBundle {
    #[serde(default)]
    objects: Vec<StixObject>,
}

#[derive(Debug, Deserialize)]
struct StixObject {
    #[serde(rename = "type")]
    object_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    revoked: bool,
    #[serde(default)]
    external_references: Vec<ExternalReference>,
    #[serde(default)]
    x_mitre_data_sources: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ExternalReference {
    source_name: String,
    #[serde(default)]
    external_id: Option<String>,
}

/// Non-revoked techniques of an enterprise ATT&CK STIX bundle, ordered by technique id
pub fn parse_attack_bundle(json: &str) -> Result<Vec<AttackTechnique>> {
    let bundle: StixBundle = serde_json::from_str(json)?;

    let mut techniques: Vec<AttackTechnique> = bundle
        .objects
        .into_iter()
        .filter(|object| object.object_type == ATTACK_PATTERN && !object.revoked)
        .filter_map(|object| {
            let technique_id = object
                .external_references
                .iter()
                .find(|reference| reference.source_name == MITRE_ATTACK_SOURCE)
                .and_then(|reference| reference.external_id.clone())?;
            Some(AttackTechnique {
                technique_id,
                name: object.name,
                data_sources: object.x_mitre_data_sources,
            })
        })
        .collect();

    if techniques.is_empty() {
        return Err(SourcererError::Catalog("bundle contains no ATT&CK techniques".to_string()));
    }
    techniques.sort_by(|a, b| a.technique_id.cmp(&b.technique_id));
    Ok(techniques)
}

/// Pulls the enterprise bundle over HTTP
pub struct HttpAttackCatalog {
    client: Client,
    url: String,
}

impl HttpAttackCatalog {
    pub fn new(config: &AttackConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            url: config.enterprise_url.clone(),
        })
    }
}

#[async_trait]
impl TechniqueCatalogPort for HttpAttackCatalog {
    async fn techniques(&self) -> anyhow::Result<Vec<AttackTechnique>> {
        info!(url = %self.url, "pulling ATT&CK data");
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let techniques = parse_attack_bundle(&body)?;
        info!(techniques = techniques.len(), "loaded ATT&CK techniques");
        Ok(techniques)
    }
}

/// Reads a STIX bundle from disk, for offline runs
pub struct FileAttackCatalog {
    path: PathBuf,
}

impl FileAttackCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TechniqueCatalogPort for FileAttackCatalog {
    async fn techniques(&self) -> anyhow::Result<Vec<AttackTechnique>> {
        let body = fs::read_to_string(&self.path).map_err(|e| SourcererError::resource(&self.path, e))?;
        let techniques = parse_attack_bundle(&body)?;
        info!(path = %self.path.display(), techniques = techniques.len(), "loaded ATT&CK techniques");
        Ok(techniques)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "type": "bundle",
        "objects": [
            {
                "type": "attack-pattern",
                "name": "Command and Scripting Interpreter",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "T1059"},
                    {"source_name": "capec", "external_id": "CAPEC-1"}
                ],
                "x_mitre_data_sources": ["Process: Process Creation", "Command: Command Execution"]
            },
            {
                "type": "attack-pattern",
                "name": "Old Technique",
                "revoked": true,
                "external_references": [{"source_name": "mitre-attack", "external_id": "T9999"}]
            },
            {
                "type": "attack-pattern",
                "name": "Hardware Additions",
                "external_references": [{"source_name": "mitre-attack", "external_id": "T1200"}]
            },
            {
                "type": "malware",
                "name": "Not a technique",
                "external_references": [{"source_name": "mitre-attack", "external_id": "S0001"}]
            }
        ]
    }"#;

    #[test]
    fn test_parses_non_revoked_techniques() {
        let techniques = parse_attack_bundle(BUNDLE).unwrap();
        let ids: Vec<&str> = techniques.iter().map(|t| t.technique_id.as_str()).collect();
        assert_eq!(ids, vec!["T1059", "T1200"]);
        assert_eq!(techniques[0].data_sources.as_ref().map(|d| d.len()), Some(2));
        assert!(techniques[1].data_sources.is_none());
    }

    #[test]
    fn test_bundle_without_techniques_is_a_catalog_error() {
        let result = parse_attack_bundle(r#"{"type": "bundle", "objects": []}"#);
        assert!(matches!(result, Err(SourcererError::Catalog(_))));
    }

    #[tokio::test]
    async fn test_file_catalog_reads_bundle() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("enterprise-attack.json");
        fs::write(&path, BUNDLE).unwrap();

        let techniques = FileAttackCatalog::new(&path).techniques().await.unwrap();
        assert_eq!(techniques.len(), 2);
    }
}
