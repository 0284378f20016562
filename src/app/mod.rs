pub mod ports;
pub mod enrich_use_case;
pub mod export_use_case;

pub use enrich_use_case::EnrichUseCase;
pub use export_use_case::{ExportPorts, ExportReport, ExportUseCase, OutputMode, OutputSelection};
