//! Data quality enrichment of Detection Data Model entries.
//!
//! Every entry is joined to its data dictionary (by event id), the dictionary's
//! data channel, and the CIM entities named by its source and destination data
//! objects. Five dimensions are scored from those joins:
//!
//! - coverage, timeliness and retention are copied from the data channel
//! - structure measures how many profile-relevant standard names the dictionary provides
//! - consistency measures how many dictionary fields carry a standard name at all
//!
//! Missing joins never fail the run; they leave a comment on the entry instead.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::constants::{
    entity_not_in_cim, entity_not_in_profile, COMMENT_BOTH_ENTITIES_MISSING,
    COMMENT_CHANNEL_NOT_FOUND, COMMENT_DICTIONARY_NOT_FOUND, COMMENT_NO_DATA_FIELDS,
};
use crate::domain::{CimEntity, DataChannel, DataDictionary, DdmEntry, Profile};
use crate::pipeline::storage::CorpusIndex;

/// What enrichment could establish for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// No data dictionary for the entry's event id; every dimension stays at zero
    DictionaryNotFound,
    /// A dictionary matched; `channel_found` tells whether its data channel was rated
    Scored { channel_found: bool },
}

/// Result of the structure join over the source and destination data objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureOutcome {
    Scored { matched: usize, total: usize },
    BothMissing,
    NotInCim(String),
    NotInProfile(String),
}

impl StructureOutcome {
    pub fn bucket(&self) -> u8 {
        match self {
            StructureOutcome::Scored { matched, total } => structure_bucket(*matched, *total),
            _ => 0,
        }
    }

    pub fn comment(&self) -> Option<String> {
        match self {
            StructureOutcome::Scored { .. } => None,
            StructureOutcome::BothMissing => Some(COMMENT_BOTH_ENTITIES_MISSING.to_string()),
            StructureOutcome::NotInCim(entity) => Some(entity_not_in_cim(entity)),
            StructureOutcome::NotInProfile(entity) => Some(entity_not_in_profile(entity)),
        }
    }
}

/// Trait for scoring DDM entries in place
pub trait Enricher {
    /// Reset and recompute every quality field of the entry
    fn enrich(&self, entry: &mut DdmEntry) -> EnrichmentOutcome;
}

/// Enricher backed by an indexed corpus and a relevance profile
pub struct QualityEnricher<'a> {
    index: &'a CorpusIndex<'a>,
    profile: &'a Profile,
}

impl<'a> QualityEnricher<'a> {
    pub fn new(index: &'a CorpusIndex<'a>, profile: &'a Profile) -> Self {
        Self { index, profile }
    }

    /// Walk source then destination object; the first entity that cannot be scored aborts the join
    pub fn structure(&self, entry: &DdmEntry, dictionary: &DataDictionary) -> StructureOutcome {
        let mut matched = 0;
        let mut total = 0;
        let mut missing = 0;

        for object in [&entry.source_data_object, &entry.destination_data_object] {
            if object.is_empty() {
                missing += 1;
                if missing == 2 {
                    return StructureOutcome::BothMissing;
                }
                continue;
            }

            let Some(entity) = self.index.entity(object) else {
                return StructureOutcome::NotInCim(object.clone());
            };
            let Some(fields) = self.profile.fields_for(&entity.entity) else {
                return StructureOutcome::NotInProfile(object.clone());
            };

            for standard_name in fields {
                total += 1;
                if dictionary.provides(standard_name) {
                    matched += 1;
                }
            }
        }

        StructureOutcome::Scored { matched, total }
    }
}

impl<'a> Enricher for QualityEnricher<'a> {
    fn enrich(&self, entry: &mut DdmEntry) -> EnrichmentOutcome {
        entry.reset_quality();

        let Some(dictionary) = self.index.dictionary(&entry.eventid) else {
            entry.comment = COMMENT_DICTIONARY_NOT_FOUND.to_string();
            return EnrichmentOutcome::DictionaryNotFound;
        };

        let channel = self.index.channel(&dictionary.data_channel);
        match channel {
            Some(channel) => {
                entry.coverage = channel.coverage;
                entry.timeliness = channel.timeliness;
                entry.retention = channel.retention;
                entry.data_channel = Some(channel.data_channel.clone());
            }
            None => entry.comment = COMMENT_CHANNEL_NOT_FOUND.to_string(),
        }

        let structure = self.structure(entry, dictionary);
        entry.structure = structure.bucket();
        if let Some(comment) = structure.comment() {
            entry.comment = comment;
        }

        let with_standard_name = dictionary
            .data_fields
            .iter()
            .filter(|field| field.has_standard_name())
            .count();
        match consistency_bucket(with_standard_name, dictionary.data_fields.len()) {
            Some(bucket) => entry.consistency = bucket,
            None => {
                if entry.comment.is_empty() {
                    entry.comment = COMMENT_NO_DATA_FIELDS.to_string();
                }
            }
        }

        entry.score = mean_score(&entry.dimensions());

        debug!(
            eventid = %entry.eventid,
            structure = entry.structure,
            consistency = entry.consistency,
            score = entry.score,
            "enriched ddm entry"
        );

        EnrichmentOutcome::Scored {
            channel_found: channel.is_some(),
        }
    }
}

/// Map the share of matched profile fields onto 1..=5; no match scores 0
///
/// Thresholds are inclusive upper bounds: up to 25% is 1, up to 50% is 2,
/// up to 75% is 3, anything short of 100% is 4.
pub fn structure_bucket(matched: usize, total: usize) -> u8 {
    if matched == 0 || total == 0 {
        return 0;
    }
    let percent = matched * 100;
    if percent <= 25 * total {
        1
    } else if percent <= 50 * total {
        2
    } else if percent <= 75 * total {
        3
    } else if matched < total {
        4
    } else {
        5
    }
}

/// Map the share of standardized dictionary fields onto {1, 3, 5}; `None` for an empty dictionary
pub fn consistency_bucket(with_standard_name: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let bucket = if with_standard_name * 100 <= 50 * total {
        1
    } else if with_standard_name < total {
        3
    } else {
        5
    };
    Some(bucket)
}

fn mean_score(dimensions: &[u8; 5]) -> f64 {
    dimensions.iter().map(|d| f64::from(*d)).sum::<f64>() / dimensions.len() as f64
}

/// Counts produced by one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub scored: usize,
    pub comments: BTreeMap<String, usize>,
}

/// Enrich every entry in place against the given collections
pub fn enrich_ddm(
    entries: &mut [DdmEntry],
    data_dictionaries: &[DataDictionary],
    data_channels: &[DataChannel],
    cim_entities: &[CimEntity],
    profile: &Profile,
) -> EnrichmentSummary {
    let index = CorpusIndex::build(data_dictionaries, data_channels, cim_entities);
    let enricher = QualityEnricher::new(&index, profile);
    let mut summary = EnrichmentSummary {
        total: entries.len(),
        ..Default::default()
    };

    for entry in entries.iter_mut() {
        if let EnrichmentOutcome::Scored { .. } = enricher.enrich(entry) {
            summary.scored += 1;
            crate::observability::metrics::enrich::score_recorded(entry.score);
        }
        if !entry.comment.is_empty() {
            *summary.comments.entry(comment_reason(&entry.comment)).or_insert(0) += 1;
        }
        crate::observability::metrics::enrich::entry_enriched();
    }

    for (reason, count) in &summary.comments {
        crate::observability::metrics::enrich::comment_recorded(reason, *count);
    }

    info!(
        total = summary.total,
        scored = summary.scored,
        commented = summary.comments.values().sum::<usize>(),
        "enriched detection data model"
    );

    summary
}

/// Collapse entity-specific comments into a bounded set of reasons
fn comment_reason(comment: &str) -> String {
    if comment.ends_with(" not found in CIM") {
        "entity not found in CIM".to_string()
    } else if comment.ends_with(" not found in profiles") {
        "entity not found in profiles".to_string()
    } else {
        comment.to_string()
    }
}
