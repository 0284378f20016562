use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{
    COMMENT_TECHNIQUE_NO_DATA_SOURCES, COMMENT_TECHNIQUE_NO_SCORED_SOURCES, LAYER_DESCRIPTION,
    LAYER_NAME,
};
use crate::domain::{AttackTechnique, DdmEntry};

/// Quality dimensions in vector order; the sixth slot holds the overall score
pub const DIMENSION_NAMES: [&str; 5] = ["coverage", "timeliness", "retention", "structure", "consistency"];

/// coverage, timeliness, retention, structure, consistency, overall
pub type ScoreVector = [f64; 6];

/// Average quality per ATT&CK data source, keyed by lower-cased name
///
/// Entries without a data source are left out so unmapped rows do not drag the averages down.
pub fn data_source_scores(entries: &[DdmEntry]) -> BTreeMap<String, ScoreVector> {
    let mut grouped: BTreeMap<String, Vec<[u8; 5]>> = BTreeMap::new();
    for entry in entries {
        let Some(source) = entry.attack_data_source.as_deref() else {
            continue;
        };
        grouped
            .entry(source.trim().to_lowercase())
            .or_default()
            .push(entry.dimensions());
    }

    let scores: BTreeMap<String, ScoreVector> = grouped
        .into_iter()
        .map(|(source, rows)| {
            let count = rows.len() as f64;
            let mut vector = [0.0; 6];
            for (i, slot) in vector.iter_mut().take(5).enumerate() {
                *slot = rows.iter().map(|row| f64::from(row[i])).sum::<f64>() / count;
            }
            vector[5] = vector[..5].iter().sum::<f64>() / 5.0;
            (source, vector)
        })
        .collect();

    crate::observability::metrics::aggregate::data_sources_scored(scores.len());
    scores
}

/// Aggregated quality of one technique
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechniqueScore {
    pub technique_id: String,
    pub scores: ScoreVector,
    pub comment: String,
}

impl TechniqueScore {
    fn unscored(technique_id: &str, comment: &str) -> Self {
        Self {
            technique_id: technique_id.to_string(),
            scores: [0.0; 6],
            comment: comment.to_string(),
        }
    }

    pub fn overall(&self) -> f64 {
        self.scores[5]
    }
}

/// Look up a catalog data source; `Process: Process Creation` style names fall back to the part before the colon
fn lookup<'a>(scores: &'a BTreeMap<String, ScoreVector>, data_source: &str) -> Option<&'a ScoreVector> {
    let name = data_source.trim().to_lowercase();
    scores.get(&name).or_else(|| {
        name.split_once(':')
            .and_then(|(source, _)| scores.get(source.trim()))
    })
}

pub fn score_technique(technique: &AttackTechnique, scores: &BTreeMap<String, ScoreVector>) -> TechniqueScore {
    let data_sources = match technique.data_sources.as_deref() {
        Some(sources) if !sources.is_empty() => sources,
        _ => return TechniqueScore::unscored(&technique.technique_id, COMMENT_TECHNIQUE_NO_DATA_SOURCES),
    };

    let vectors: Vec<Option<&ScoreVector>> = data_sources.iter().map(|ds| lookup(scores, ds)).collect();
    if vectors.iter().all(Option::is_none) {
        return TechniqueScore::unscored(&technique.technique_id, COMMENT_TECHNIQUE_NO_SCORED_SOURCES);
    }

    // Unknown data sources count as zero so poorly covered techniques rank lower
    let count = vectors.len() as f64;
    let mut averaged = [0.0; 6];
    for vector in vectors.iter().flatten() {
        for (slot, value) in averaged.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
    }
    for slot in averaged.iter_mut() {
        *slot = round2(*slot / count);
    }

    TechniqueScore {
        technique_id: technique.technique_id.clone(),
        scores: averaged,
        comment: String::new(),
    }
}

pub fn score_techniques(
    techniques: &[AttackTechnique],
    scores: &BTreeMap<String, ScoreVector>,
) -> Vec<TechniqueScore> {
    let scored: Vec<TechniqueScore> = techniques
        .iter()
        .map(|technique| score_technique(technique, scores))
        .collect();

    let unscored = scored.iter().filter(|t| !t.comment.is_empty()).count();
    crate::observability::metrics::aggregate::techniques_scored(scored.len(), unscored);
    info!(techniques = scored.len(), unscored, "aggregated technique scores");

    scored
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a dimension value the way the navigator metadata expects it (`3.0`, `2.67`)
pub fn metadata_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// ATT&CK Navigator layer; keys the template carries beyond these are preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigatorLayer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub techniques: Vec<LayerTechnique>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTechnique {
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub metadata: Vec<LayerMetadata>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    pub name: String,
    pub value: String,
}

impl From<&TechniqueScore> for LayerTechnique {
    fn from(score: &TechniqueScore) -> Self {
        Self {
            technique_id: score.technique_id.clone(),
            score: score.overall(),
            comment: score.comment.clone(),
            enabled: true,
            metadata: DIMENSION_NAMES
                .iter()
                .zip(score.scores.iter())
                .map(|(name, value)| LayerMetadata {
                    name: name.to_string(),
                    value: metadata_value(*value),
                })
                .collect(),
        }
    }
}

/// Fill a layer template with one record per technique
pub fn build_quality_layer(mut template: NavigatorLayer, scores: &[TechniqueScore]) -> NavigatorLayer {
    template.name = LAYER_NAME.to_string();
    template.description = LAYER_DESCRIPTION.to_string();
    template.techniques.extend(scores.iter().map(LayerTechnique::from));
    debug!(techniques = template.techniques.len(), "built data quality layer");
    template
}
