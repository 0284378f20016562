//! Metrics for the sourcerer pipeline
//!
//! Names follow the Prometheus conventions. Recording is a no-op until
//! [`init`] installs the recorder, so library code and tests can call the
//! phase functions freely.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion metrics
    IngestionRecordsLoaded,

    // Parser metrics
    ParserDocumentsExtracted,
    ParserRowsExtracted,

    // Normalize metrics
    NormalizeDocumentsRouted,
    NormalizeDocumentsIgnored,
    NormalizeDocumentsSkipped,

    // Enrich metrics
    EnrichEntriesProcessed,
    EnrichComments,
    EnrichScore,

    // Aggregate metrics
    AggregateDataSources,
    AggregateTechniquesScored,
    AggregateTechniquesUnscored,

    // Export metrics
    ExportOutputsWritten,
    ExportOutputErrors,
    ExportDuration,
    ExportIndexDocuments,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestionRecordsLoaded => "sourcerer_ingestion_records_loaded_total",

            MetricName::ParserDocumentsExtracted => "sourcerer_parser_documents_extracted_total",
            MetricName::ParserRowsExtracted => "sourcerer_parser_rows_extracted",

            MetricName::NormalizeDocumentsRouted => "sourcerer_normalize_documents_routed_total",
            MetricName::NormalizeDocumentsIgnored => "sourcerer_normalize_documents_ignored_total",
            MetricName::NormalizeDocumentsSkipped => "sourcerer_normalize_documents_skipped_total",

            MetricName::EnrichEntriesProcessed => "sourcerer_enrich_entries_processed_total",
            MetricName::EnrichComments => "sourcerer_enrich_comments_total",
            MetricName::EnrichScore => "sourcerer_enrich_score",

            MetricName::AggregateDataSources => "sourcerer_aggregate_data_sources",
            MetricName::AggregateTechniquesScored => "sourcerer_aggregate_techniques_scored_total",
            MetricName::AggregateTechniquesUnscored => "sourcerer_aggregate_techniques_unscored_total",

            MetricName::ExportOutputsWritten => "sourcerer_export_outputs_written_total",
            MetricName::ExportOutputErrors => "sourcerer_export_output_errors_total",
            MetricName::ExportDuration => "sourcerer_export_duration_seconds",
            MetricName::ExportIndexDocuments => "sourcerer_export_index_documents_total",
        }
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder; calling it twice is a no-op
pub fn init() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();

    info!("Metrics system initialized");
    Ok(())
}

/// Current metrics in the Prometheus text format, if the recorder is installed
pub fn render_snapshot() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod ingestion {
    use super::MetricName;

    pub fn records_loaded(collection: &'static str, count: usize) {
        ::metrics::counter!(MetricName::IngestionRecordsLoaded.as_str(), "collection" => collection)
            .increment(count as u64);
    }
}

pub mod parser {
    use super::MetricName;

    pub fn document_extracted(context: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::ParserDocumentsExtracted.as_str(), "context" => context).increment(1);
        ::metrics::histogram!(MetricName::ParserRowsExtracted.as_str(), "context" => context).record(rows as f64);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn document_routed(collection: &'static str) {
        ::metrics::counter!(MetricName::NormalizeDocumentsRouted.as_str(), "collection" => collection).increment(1);
    }

    pub fn document_ignored(collection: &'static str) {
        ::metrics::counter!(MetricName::NormalizeDocumentsIgnored.as_str(), "collection" => collection).increment(1);
    }

    pub fn document_skipped(collection: &'static str) {
        ::metrics::counter!(MetricName::NormalizeDocumentsSkipped.as_str(), "collection" => collection).increment(1);
    }
}

pub mod enrich {
    use super::MetricName;

    pub fn entry_enriched() {
        ::metrics::counter!(MetricName::EnrichEntriesProcessed.as_str()).increment(1);
    }

    pub fn comment_recorded(reason: &str, count: usize) {
        ::metrics::counter!(MetricName::EnrichComments.as_str(), "reason" => reason.to_string())
            .increment(count as u64);
    }

    pub fn score_recorded(score: f64) {
        ::metrics::histogram!(MetricName::EnrichScore.as_str()).record(score);
    }
}

pub mod aggregate {
    use super::MetricName;

    pub fn data_sources_scored(count: usize) {
        ::metrics::gauge!(MetricName::AggregateDataSources.as_str()).set(count as f64);
    }

    pub fn techniques_scored(total: usize, unscored: usize) {
        ::metrics::counter!(MetricName::AggregateTechniquesScored.as_str()).increment(total as u64);
        ::metrics::counter!(MetricName::AggregateTechniquesUnscored.as_str()).increment(unscored as u64);
    }
}

pub mod export {
    use super::MetricName;

    pub fn output_written(mode: &'static str, secs: f64) {
        ::metrics::counter!(MetricName::ExportOutputsWritten.as_str(), "mode" => mode).increment(1);
        ::metrics::histogram!(MetricName::ExportDuration.as_str(), "mode" => mode).record(secs);
    }

    pub fn output_error(mode: &'static str) {
        ::metrics::counter!(MetricName::ExportOutputErrors.as_str(), "mode" => mode).increment(1);
    }

    pub fn index_documents(index: &str, count: usize) {
        ::metrics::counter!(MetricName::ExportIndexDocuments.as_str(), "index" => index.to_string())
            .increment(count as u64);
    }
}
