use crate::domain::{DdmEntry, Profile};
use crate::pipeline::processing::enrich::{enrich_ddm, EnrichmentSummary};
use crate::pipeline::storage::OssemCorpus;

/// Holds the loaded corpus and runs the enrichment pass at most once
///
/// The normalized DDM entries stay untouched; enrichment works on its own copy,
/// so collection exports see the corpus exactly as it was ingested.
pub struct EnrichUseCase {
    corpus: OssemCorpus,
    profile: Profile,
    enriched: Option<(Vec<DdmEntry>, EnrichmentSummary)>,
}

impl EnrichUseCase {
    pub fn new(corpus: OssemCorpus, profile: Profile) -> Self {
        Self {
            corpus,
            profile,
            enriched: None,
        }
    }

    pub fn corpus(&self) -> &OssemCorpus {
        &self.corpus
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn is_enriched(&self) -> bool {
        self.enriched.is_some()
    }

    /// Enriched entries, computing them on first use
    pub fn enriched_entries(&mut self) -> &[DdmEntry] {
        &self.ensure_enriched().0
    }

    pub fn summary(&mut self) -> &EnrichmentSummary {
        &self.ensure_enriched().1
    }

    fn ensure_enriched(&mut self) -> &(Vec<DdmEntry>, EnrichmentSummary) {
        let corpus = &self.corpus;
        let profile = &self.profile;
        self.enriched.get_or_insert_with(|| {
            let mut entries = corpus.ddm_entries.clone();
            let summary = enrich_ddm(
                &mut entries,
                &corpus.data_dictionaries,
                &corpus.data_channels,
                &corpus.cim_entities,
                profile,
            );
            (entries, summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataChannel, DataDictionary};

    fn corpus() -> OssemCorpus {
        OssemCorpus::new(
            Vec::new(),
            vec![DataDictionary {
                operating_system: "windows".to_string(),
                data_channel: "security".to_string(),
                description: None,
                event: "4688".to_string(),
                data_fields: Vec::new(),
            }],
            vec![DdmEntry {
                eventid: "4688".to_string(),
                ..Default::default()
            }],
            vec![DataChannel {
                data_channel: "security".to_string(),
                coverage: 4,
                timeliness: 4,
                retention: 3,
            }],
        )
    }

    #[test]
    fn test_enrichment_runs_on_a_copy() {
        let mut use_case = EnrichUseCase::new(corpus(), Profile::default());
        assert!(!use_case.is_enriched());

        let coverage = use_case.enriched_entries()[0].coverage;
        assert_eq!(coverage, 4);
        assert!(use_case.is_enriched());
        assert_eq!(use_case.corpus().ddm_entries[0].coverage, 0);
        assert_eq!(use_case.summary().scored, 1);
    }
}
