use serde::Serialize;

use crate::domain::{CimEntity, DataDictionary, Profile};

/// One CIM standard field, flagged when the profile cares about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CimFieldView {
    pub entity: String,
    #[serde(rename = "standard name")]
    pub standard_name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub description: String,
    #[serde(rename = "sample value")]
    pub sample_value: String,
    pub relevant: bool,
}

/// One data dictionary field with its event context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryFieldView {
    #[serde(rename = "data channel")]
    pub data_channel: String,
    #[serde(rename = "operating system")]
    pub operating_system: String,
    pub event: String,
    #[serde(rename = "standard name")]
    pub standard_name: String,
    #[serde(rename = "field name")]
    pub field_name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub description: String,
    #[serde(rename = "sample value")]
    pub sample_value: String,
}

pub fn flatten_cim(entities: &[CimEntity], profile: &Profile) -> Vec<CimFieldView> {
    entities
        .iter()
        .flat_map(|entity| {
            entity.data_fields.iter().map(move |field| CimFieldView {
                entity: entity.entity.clone(),
                standard_name: field.standard_name.clone(),
                field_type: field.field_type.clone(),
                description: field.description.clone(),
                sample_value: field.sample_value.clone(),
                relevant: profile.is_relevant(&entity.entity, &field.standard_name),
            })
        })
        .collect()
}

pub fn flatten_dictionaries(dictionaries: &[DataDictionary]) -> Vec<DictionaryFieldView> {
    dictionaries
        .iter()
        .flat_map(|dd| {
            dd.data_fields.iter().map(move |field| DictionaryFieldView {
                data_channel: dd.data_channel.clone(),
                operating_system: dd.operating_system.clone(),
                event: dd.event.clone(),
                standard_name: field.standard_name.clone(),
                field_name: field.field_name.clone(),
                field_type: field.field_type.clone(),
                description: field.description.clone(),
                sample_value: field.sample_value.clone(),
            })
        })
        .collect()
}
