// Pipeline processing: extraction, normalization, enrichment and aggregation

pub mod parser;
pub mod normalize;
pub mod enrich;
pub mod aggregate;
pub mod flatten;

pub use aggregate::{build_quality_layer, data_source_scores, score_techniques, NavigatorLayer, TechniqueScore};
pub use enrich::{enrich_ddm, EnrichmentSummary};
pub use flatten::{flatten_cim, flatten_dictionaries};
