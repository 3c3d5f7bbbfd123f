pub mod export;
pub mod types;

pub use export::{export_json, export_results};
pub use types::{
    ExportFormat, LegacyResult, LegacyValidation, RetractionDetails, ScanContext, ScanItem,
    ScanVerdict,
};
