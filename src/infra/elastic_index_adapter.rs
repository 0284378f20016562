use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::app::ports::SearchIndexPort;
use crate::config::ElasticConfig;
use crate::error::SourcererError;
use crate::infra::http_client::{build_client, truncate_body};

/// Elasticsearch index loader: drop, create, then `_bulk` one document per record
pub struct ElasticIndexAdapter {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

impl ElasticIndexAdapter {
    pub fn new(config: &ElasticConfig) -> anyhow::Result<Self> {
        let credentials = (!config.user.is_empty()).then(|| (config.user.clone(), config.password.clone()));
        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            base_url: config.base_url(),
            credentials,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.base_url, index)
    }

    async fn delete_index(&self, index: &str) {
        let request = self.authorized(self.client.delete(self.index_url(index)));
        match request.send().await {
            Ok(response) => debug!(index, status = %response.status(), "deleted index"),
            Err(e) => warn!(index, error = %e, "index delete failed, continuing"),
        }
    }

    async fn create_index(&self, index: &str) -> anyhow::Result<()> {
        let response = self
            .authorized(self.client.put(self.index_url(index)))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourcererError::SearchIndex {
                message: format!("create {} returned {}: {}", index, status, truncate_body(&body)),
            }
            .into());
        }
        Ok(())
    }

    async fn bulk_load(&self, index: &str, documents: &[serde_json::Value]) -> anyhow::Result<usize> {
        let body = bulk_body(documents)?;
        let response = self
            .authorized(self.client.post(format!("{}/_bulk", self.index_url(index))))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let bulk: BulkResponse = response.json().await?;
        if bulk.errors {
            let failed = bulk
                .items
                .iter()
                .filter(|item| item.pointer("/index/error").is_some())
                .count();
            return Err(SourcererError::SearchIndex {
                message: format!("{} of {} documents rejected by {}", failed, documents.len(), index),
            }
            .into());
        }
        Ok(documents.len())
    }
}

#[async_trait]
impl SearchIndexPort for ElasticIndexAdapter {
    async fn replace_index(&self, index: &str, documents: &[serde_json::Value]) -> anyhow::Result<usize> {
        info!(index, documents = documents.len(), "creating elastic index");

        self.delete_index(index).await;
        self.create_index(index).await?;

        if documents.is_empty() {
            return Ok(0);
        }
        self.bulk_load(index, documents).await
    }
}

/// Newline-delimited `_bulk` body with one index action per document
pub fn bulk_body(documents: &[serde_json::Value]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for document in documents {
        body.push_str("{\"index\":{}}\n");
        body.push_str(&serde_json::to_string(document)?);
        body.push('\n');
    }
    Ok(body)
}
