use serde::Serialize;

use crate::domain::{CimEntity, DataChannel, DataDictionary, DdmEntry};

/// The three normalized OSSEM collections plus the data channel ratings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OssemCorpus {
    pub cim_entities: Vec<CimEntity>,
    pub data_dictionaries: Vec<DataDictionary>,
    pub ddm_entries: Vec<DdmEntry>,
    pub data_channels: Vec<DataChannel>,
}

impl OssemCorpus {
    pub fn new(
        cim_entities: Vec<CimEntity>,
        data_dictionaries: Vec<DataDictionary>,
        ddm_entries: Vec<DdmEntry>,
        data_channels: Vec<DataChannel>,
    ) -> Self {
        Self {
            cim_entities,
            data_dictionaries,
            ddm_entries,
            data_channels,
        }
    }

    /// Record counts as (cim, data dictionaries, ddm, data channels)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.cim_entities.len(),
            self.data_dictionaries.len(),
            self.ddm_entries.len(),
            self.data_channels.len(),
        )
    }
}
