use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::domain::{CimEntity, DataChannel, DataDictionary};

/// A key that appears more than once in a collection; lookups keep the first record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub collection: &'static str,
    pub key: String,
    pub occurrences: usize,
}

/// Key to record lookups over the corpus collections, built once per run
pub struct CorpusIndex<'a> {
    dictionaries: HashMap<&'a str, &'a DataDictionary>,
    channels: HashMap<&'a str, &'a DataChannel>,
    entities: HashMap<&'a str, &'a CimEntity>,
    duplicates: Vec<DuplicateKey>,
}

impl<'a> CorpusIndex<'a> {
    pub fn build(
        data_dictionaries: &'a [DataDictionary],
        data_channels: &'a [DataChannel],
        cim_entities: &'a [CimEntity],
    ) -> Self {
        let mut duplicates = Vec::new();

        let dictionaries = index_first(
            data_dictionaries,
            |dd| dd.event.as_str(),
            "data dictionaries",
            &mut duplicates,
        );
        let channels = index_first(
            data_channels,
            |dc| dc.data_channel.as_str(),
            "data channels",
            &mut duplicates,
        );
        let entities = index_first(
            cim_entities,
            |entity| entity.entity.as_str(),
            "cim entities",
            &mut duplicates,
        );

        for duplicate in &duplicates {
            warn!(
                collection = duplicate.collection,
                key = %duplicate.key,
                occurrences = duplicate.occurrences,
                "duplicate key, first record wins"
            );
        }

        Self {
            dictionaries,
            channels,
            entities,
            duplicates,
        }
    }

    /// Data dictionary for an event id; keyed by event only, so the first operating system wins
    pub fn dictionary(&self, event: &str) -> Option<&'a DataDictionary> {
        self.dictionaries.get(event).copied()
    }

    pub fn channel(&self, data_channel: &str) -> Option<&'a DataChannel> {
        self.channels.get(data_channel).copied()
    }

    pub fn entity(&self, name: &str) -> Option<&'a CimEntity> {
        self.entities.get(name).copied()
    }

    pub fn duplicates(&self) -> &[DuplicateKey] {
        &self.duplicates
    }
}

fn index_first<'a, T>(
    items: &'a [T],
    key: impl Fn(&'a T) -> &'a str,
    collection: &'static str,
    duplicates: &mut Vec<DuplicateKey>,
) -> HashMap<&'a str, &'a T> {
    let mut index = HashMap::with_capacity(items.len());
    let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();

    for item in items {
        let k = key(item);
        index.entry(k).or_insert(item);
        *counts.entry(k).or_insert(0) += 1;
    }

    duplicates.extend(
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(k, occurrences)| DuplicateKey {
                collection,
                key: k.to_string(),
                occurrences,
            }),
    );

    index
}
