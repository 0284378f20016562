//! OSSEM record shapes shared by ingestion, enrichment and export.
//!
//! Serialized keys follow the OSSEM spelling (`standard name`, `data fields`,
//! `att&ck data source`, ...). Markdown table headers lower-case to the same
//! keys, so both ingestion paths land on identical records.

pub mod loose;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One markdown table row: lower-cased column header to cell text
pub type FieldRow = BTreeMap<String, String>;

fn cell(row: &FieldRow, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

/// A standard field declared by a CIM entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CimField {
    #[serde(rename = "standard name", alias = "standard_name", default, deserialize_with = "loose::string")]
    pub standard_name: String,
    #[serde(rename = "type", default, deserialize_with = "loose::string")]
    pub field_type: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub description: String,
    #[serde(rename = "sample value", alias = "sample_value", default, deserialize_with = "loose::string")]
    pub sample_value: String,
}

impl CimField {
    pub fn from_row(row: &FieldRow) -> Self {
        Self {
            standard_name: cell(row, "standard name"),
            field_type: cell(row, "type"),
            description: cell(row, "description"),
            sample_value: cell(row, "sample value"),
        }
    }
}

/// A Common Information Model entity such as `process` or `user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimEntity {
    #[serde(deserialize_with = "loose::string")]
    pub entity: String,
    #[serde(default, deserialize_with = "loose::optional_string")]
    pub description: Option<String>,
    #[serde(rename = "data fields", alias = "data_fields", default)]
    pub data_fields: Vec<CimField>,
}

/// A raw event field mapped (or not) to a CIM standard name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DictionaryField {
    #[serde(rename = "standard name", alias = "standard_name", default, deserialize_with = "loose::string")]
    pub standard_name: String,
    #[serde(rename = "field name", alias = "field_name", default, deserialize_with = "loose::string")]
    pub field_name: String,
    #[serde(rename = "type", default, deserialize_with = "loose::string")]
    pub field_type: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub description: String,
    #[serde(rename = "sample value", alias = "sample_value", default, deserialize_with = "loose::string")]
    pub sample_value: String,
}

impl DictionaryField {
    pub fn from_row(row: &FieldRow) -> Self {
        Self {
            standard_name: cell(row, "standard name"),
            field_name: cell(row, "field name"),
            field_type: cell(row, "type"),
            description: cell(row, "description"),
            sample_value: cell(row, "sample value"),
        }
    }

    pub fn has_standard_name(&self) -> bool {
        !self.standard_name.is_empty()
    }
}

/// Per-event data dictionary of one data channel on one operating system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDictionary {
    #[serde(rename = "operating system", alias = "operating_system", default, deserialize_with = "loose::string")]
    pub operating_system: String,
    #[serde(rename = "data channel", alias = "data_channel", default, deserialize_with = "loose::string")]
    pub data_channel: String,
    #[serde(default, deserialize_with = "loose::optional_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "loose::string")]
    pub event: String,
    #[serde(rename = "data fields", alias = "data_fields", default)]
    pub data_fields: Vec<DictionaryField>,
}

impl DataDictionary {
    /// Whether any field of this dictionary maps to the given standard name
    pub fn provides(&self, standard_name: &str) -> bool {
        self.data_fields
            .iter()
            .any(|field| field.standard_name == standard_name)
    }
}

/// Externally rated quality of a logging channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChannel {
    #[serde(rename = "data channel", alias = "data_channel", deserialize_with = "loose::string")]
    pub data_channel: String,
    #[serde(default, deserialize_with = "loose::rating")]
    pub coverage: u8,
    #[serde(default, deserialize_with = "loose::rating")]
    pub timeliness: u8,
    #[serde(default, deserialize_with = "loose::rating")]
    pub retention: u8,
}

/// One Detection Data Model row, carrying its data quality once enriched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DdmEntry {
    #[serde(rename = "att&ck data source", alias = "attack_data_source", default, deserialize_with = "loose::label")]
    pub attack_data_source: Option<String>,
    #[serde(rename = "sub data source", alias = "sub_data_source", default, deserialize_with = "loose::string")]
    pub sub_data_source: String,
    #[serde(rename = "source data object", alias = "source_data_object", default, deserialize_with = "loose::string")]
    pub source_data_object: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub relationship: String,
    #[serde(rename = "destination data object", alias = "destination_data_object", default, deserialize_with = "loose::string")]
    pub destination_data_object: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub eventid: String,
    #[serde(default, deserialize_with = "loose::rating")]
    pub coverage: u8,
    #[serde(default, deserialize_with = "loose::rating")]
    pub timeliness: u8,
    #[serde(default, deserialize_with = "loose::rating")]
    pub retention: u8,
    #[serde(default, deserialize_with = "loose::rating")]
    pub structure: u8,
    #[serde(default, deserialize_with = "loose::rating")]
    pub consistency: u8,
    #[serde(default)]
    pub score: f64,
    #[serde(rename = "data channel", alias = "data_channel", default, deserialize_with = "loose::optional_string")]
    pub data_channel: Option<String>,
    #[serde(default, deserialize_with = "loose::string")]
    pub comment: String,
}

impl DdmEntry {
    pub fn from_row(row: &FieldRow) -> Self {
        let attack_data_source = Some(cell(row, "att&ck data source"))
            .filter(|source| !source.trim().is_empty() && source.trim() != "0");

        Self {
            attack_data_source,
            sub_data_source: cell(row, "sub data source"),
            source_data_object: cell(row, "source data object"),
            relationship: cell(row, "relationship"),
            destination_data_object: cell(row, "destination data object"),
            eventid: cell(row, "eventid"),
            ..Default::default()
        }
    }

    /// Quality dimensions in the fixed order coverage, timeliness, retention, structure, consistency
    pub fn dimensions(&self) -> [u8; 5] {
        [
            self.coverage,
            self.timeliness,
            self.retention,
            self.structure,
            self.consistency,
        ]
    }

    /// Clear every field written by enrichment
    pub fn reset_quality(&mut self) {
        self.coverage = 0;
        self.timeliness = 0;
        self.retention = 0;
        self.structure = 0;
        self.consistency = 0;
        self.score = 0.0;
        self.data_channel = None;
        self.comment.clear();
    }
}

/// An ATT&CK technique and the data sources that can observe it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackTechnique {
    pub technique_id: String,
    #[serde(default)]
    pub name: String,
    /// `None` when the catalog declares no data sources for the technique
    #[serde(default)]
    pub data_sources: Option<Vec<String>>,
}

/// Relevant CIM standard names per entity
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "HashMap<String, Option<Vec<String>>>")]
pub struct Profile {
    entities: HashMap<String, Vec<String>>,
}

impl From<HashMap<String, Option<Vec<String>>>> for Profile {
    fn from(raw: HashMap<String, Option<Vec<String>>>) -> Self {
        Self {
            entities: raw
                .into_iter()
                .map(|(entity, fields)| (entity, fields.unwrap_or_default()))
                .collect(),
        }
    }
}

impl Profile {
    pub fn new(entities: HashMap<String, Vec<String>>) -> Self {
        Self { entities }
    }

    /// Relevant standard names declared for an entity, if the entity is profiled at all
    pub fn fields_for(&self, entity: &str) -> Option<&[String]> {
        self.entities.get(entity).map(|fields| fields.as_slice())
    }

    pub fn is_relevant(&self, entity: &str, standard_name: &str) -> bool {
        self.fields_for(entity)
            .map(|fields| fields.iter().any(|field| field == standard_name))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
