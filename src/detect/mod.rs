//! Detection module for breaking-change findings.

mod imports;
mod runner;
mod signature;
mod stale;
pub mod types;

pub use imports::detect_import_mismatches;
pub use runner::{AnalysisConfig, Analyzer};
pub use signature::detect_signature_mismatches;
pub use stale::detect_stale_references;
pub use types::{AnalysisResult, Finding, FindingKind, RelatedSite, Severity, Summary};
