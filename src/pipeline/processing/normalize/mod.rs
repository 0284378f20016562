use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::EVENT_PREFIX;
use crate::domain::{CimEntity, CimField, DataDictionary, DdmEntry, DictionaryField};
use crate::error::{Result, SourcererError};
use crate::pipeline::processing::parser::{DocumentExtractor, MarkdownTableExtractor};

pub mod registry;

pub use registry::{Collection, Route, RouteDecision, RouteTable};

/// A single markdown document normalized into its canonical collection
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedDocument {
    CimEntity(CimEntity),
    DataDictionary(DataDictionary),
    DdmEntries(Vec<DdmEntry>),
}

/// The three collections produced by either ingestion path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedCollections {
    pub cim_entities: Vec<CimEntity>,
    pub data_dictionaries: Vec<DataDictionary>,
    pub ddm_entries: Vec<DdmEntry>,
}

impl NormalizedCollections {
    fn push(&mut self, document: NormalizedDocument) {
        match document {
            NormalizedDocument::CimEntity(entity) => self.cim_entities.push(entity),
            NormalizedDocument::DataDictionary(dd) => self.data_dictionaries.push(dd),
            NormalizedDocument::DdmEntries(entries) => self.ddm_entries.extend(entries),
        }
    }
}

/// Counts of what a markdown walk saw, for logging and metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationSummary {
    pub cim_documents: usize,
    pub dictionary_documents: usize,
    pub ddm_documents: usize,
    pub ignored: usize,
    pub skipped: usize,
}

impl NormalizationSummary {
    fn record(&mut self, collection: Collection) {
        match collection {
            Collection::CimEntities => self.cim_documents += 1,
            Collection::DataDictionaries => self.dictionary_documents += 1,
            Collection::DetectionDataModel => self.ddm_documents += 1,
        }
    }
}

/// Trait for turning a routed markdown document into canonical records
pub trait Normalizer {
    /// `name` is the file name; `trailing` the directory segments after the collection marker
    fn normalize(
        &self,
        collection: Collection,
        name: &str,
        trailing: &[String],
        markdown: &str,
    ) -> Option<NormalizedDocument>;
}

/// Default normalizer for the OSSEM markdown repository
pub struct CorpusNormalizer<E: DocumentExtractor = MarkdownTableExtractor> {
    extractor: E,
    routes: RouteTable,
}

impl Default for CorpusNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusNormalizer {
    pub fn new() -> Self {
        Self {
            extractor: MarkdownTableExtractor::new(),
            routes: RouteTable::ossem(),
        }
    }
}

impl<E: DocumentExtractor> CorpusNormalizer<E> {
    pub fn with_parts(extractor: E, routes: RouteTable) -> Self {
        Self { extractor, routes }
    }

    /// Walk a markdown tree in file-name order and normalize every routed document
    pub fn normalize_tree(&self, root: &Path) -> Result<(NormalizedCollections, NormalizationSummary)> {
        if !root.is_dir() {
            return Err(SourcererError::resource(root, "OSSEM markdown directory does not exist"));
        }

        let mut collections = NormalizedCollections::default();
        let mut summary = NormalizationSummary::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| SourcererError::resource(root, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            // Route on the path below the root so directories above the checkout never match a marker
            let relative = path.strip_prefix(root).unwrap_or(path);

            let (collection, trailing) = match self.routes.route(relative) {
                RouteDecision::Routed { collection, trailing } => (collection, trailing),
                RouteDecision::Ignored { collection } => {
                    debug!(path = %path.display(), collection = collection.as_str(), "ignored document");
                    summary.ignored += 1;
                    crate::observability::metrics::normalize::document_ignored(collection.as_str());
                    continue;
                }
                RouteDecision::Unrouted => continue,
            };

            let bytes = fs::read(path).map_err(|e| SourcererError::resource(path, e))?;
            let markdown = String::from_utf8_lossy(&bytes);
            let name = entry.file_name().to_string_lossy();

            match self.normalize(collection, &name, &trailing, &markdown) {
                Some(document) => {
                    summary.record(collection);
                    collections.push(document);
                    crate::observability::metrics::normalize::document_routed(collection.as_str());
                }
                None => {
                    summary.skipped += 1;
                    crate::observability::metrics::normalize::document_skipped(collection.as_str());
                }
            }
        }

        info!(
            cim = collections.cim_entities.len(),
            data_dictionaries = collections.data_dictionaries.len(),
            ddm = collections.ddm_entries.len(),
            ignored = summary.ignored,
            skipped = summary.skipped,
            "normalized OSSEM markdown"
        );

        Ok((collections, summary))
    }
}

impl<E: DocumentExtractor> Normalizer for CorpusNormalizer<E> {
    fn normalize(
        &self,
        collection: Collection,
        name: &str,
        trailing: &[String],
        markdown: &str,
    ) -> Option<NormalizedDocument> {
        let document = self.extractor.extract(markdown, collection.context());
        let stem = name.split('.').next().unwrap_or(name);

        match collection {
            Collection::CimEntities => Some(NormalizedDocument::CimEntity(CimEntity {
                entity: stem.to_string(),
                description: document.description,
                data_fields: document.field_rows.iter().map(CimField::from_row).collect(),
            })),
            Collection::DataDictionaries => {
                let (Some(operating_system), Some(data_channel)) = (trailing.first(), trailing.get(1))
                else {
                    warn!(file = name, "data dictionary is not under <os>/<channel>, skipping");
                    return None;
                };
                Some(NormalizedDocument::DataDictionary(DataDictionary {
                    operating_system: operating_system.clone(),
                    data_channel: data_channel.clone(),
                    description: document.description,
                    event: event_id(stem),
                    data_fields: document.field_rows.iter().map(DictionaryField::from_row).collect(),
                }))
            }
            Collection::DetectionDataModel => Some(NormalizedDocument::DdmEntries(
                document.field_rows.iter().map(DdmEntry::from_row).collect(),
            )),
        }
    }
}

/// Event identifier from a data dictionary file stem
pub fn event_id(stem: &str) -> String {
    stem.strip_prefix(EVENT_PREFIX).unwrap_or(stem).to_string()
}
