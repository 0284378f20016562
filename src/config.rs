use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SourcererError};

pub const DEFAULT_CONFIG_PATH: &str = "resources/config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub yaml_bundle: YamlBundleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub elastic: ElasticConfig,
    #[serde(default)]
    pub attack: AttackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesConfig {
    pub data_channels: PathBuf,
    pub navigator_layer: PathBuf,
    pub default_profile: PathBuf,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            data_channels: PathBuf::from("resources/dcs.yml"),
            navigator_layer: PathBuf::from("resources/navigator_layer.yml"),
            default_profile: PathBuf::from("profiles/default.yml"),
        }
    }
}

/// File names of the canonical YAML streams inside an `--ossem-yaml` directory
#[derive(Debug, Clone, Deserialize)]
pub struct YamlBundleConfig {
    pub ddm: String,
    pub dds: String,
    pub cim: String,
}

impl Default for YamlBundleConfig {
    fn default() -> Self {
        Self {
            ddm: "ddm.yml".to_string(),
            dds: "dds.yml".to_string(),
            cim: "cim.yml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    #[serde(default)]
    pub metrics_snapshot: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            metrics_snapshot: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElasticConfig {
    pub server: String,
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost".to_string(),
            port: 9200,
            user: String::new(),
            password: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ElasticConfig {
    pub fn base_url(&self) -> String {
        let server = self.server.trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            format!("{}:{}", server, self.port)
        } else {
            format!("http://{}:{}", server, self.port)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttackConfig {
    pub enterprise_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            enterprise_url:
                "https://raw.githubusercontent.com/mitre/cti/master/enterprise-attack/enterprise-attack.json"
                    .to_string(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Config {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            SourcererError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Credentials and endpoints may come from the environment (`.env` is loaded by the binary)
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(user) = std::env::var("ELASTIC_USER") {
            self.elastic.user = user;
        }
        if let Ok(password) = std::env::var("ELASTIC_PASS") {
            self.elastic.password = password;
        }
        if let Ok(server) = std::env::var("ELASTIC_SERVER") {
            self.elastic.server = server;
        }
        if let Ok(port) = std::env::var("ELASTIC_PORT") {
            self.elastic.port = port
                .parse()
                .map_err(|_| SourcererError::Config(format!("ELASTIC_PORT is not a port: '{}'", port)))?;
        }
        if let Ok(url) = std::env::var("ATTACK_ENTERPRISE_URL") {
            self.attack.enterprise_url = url;
        }
        Ok(())
    }
}
