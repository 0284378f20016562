/// Directory markers and file conventions of the OSSEM markdown corpus
/// These are matched against path segments, never substrings of a segment
pub const CIM_DIR: &str = "common_information_model";
pub const DATA_DICTIONARIES_DIR: &str = "data_dictionaries";
pub const DETECTION_DATA_MODEL_DIR: &str = "detection_data_model";

pub const MARKDOWN_EXTENSION: &str = "md";
pub const EVENT_PREFIX: &str = "event-";

// Files that live next to real documents but are not records themselves
pub const CIM_IGNORE: &[&str] = &["domain_or_hostname_or_fqdn.md"];
pub const DATA_DICTIONARIES_IGNORE: &[&str] = &[];
pub const DDM_IGNORE: &[&str] = &["object_relationships.md"];

// Section headings recognised by the table extractor
pub const DESCRIPTION_HEADING: &str = "Description";
pub const DATA_FIELDS_HEADINGS: &[&str] = &["Data Fields", "Data Dictionary"];

// Enrichment comments (part of the output contract, keep stable)
pub const COMMENT_DICTIONARY_NOT_FOUND: &str = "data dictionary not found";
pub const COMMENT_CHANNEL_NOT_FOUND: &str = "data channel not found";
pub const COMMENT_BOTH_ENTITIES_MISSING: &str = "both entities are missing";
pub const COMMENT_NO_DATA_FIELDS: &str = "data dictionary has no data fields";

// Technique aggregation comments
pub const COMMENT_TECHNIQUE_NO_DATA_SOURCES: &str = "technique has no data sources";
pub const COMMENT_TECHNIQUE_NO_SCORED_SOURCES: &str = "no scored data sources for technique";

// Navigator layer labels
pub const LAYER_NAME: &str = "Data Quality";
pub const LAYER_DESCRIPTION: &str = "Data source quality according OSSEM data model";

// Search index names
pub const INDEX_DDM: &str = "ossem.ddm";
pub const INDEX_CIM: &str = "ossem.cim";
pub const INDEX_DDS: &str = "ossem.dds";
pub const INDEX_DCS: &str = "ossem.dcs";

/// Timestamp format used in exported file names
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Build the "not found in CIM" comment for an entity
pub fn entity_not_in_cim(entity: &str) -> String {
    format!("{} not found in CIM", entity)
}

/// Build the "not found in profiles" comment for an entity
pub fn entity_not_in_profile(entity: &str) -> String {
    format!("{} not found in profiles", entity)
}
