//! Ripplecheck - breaking-change detection for JavaScript/TypeScript.
//!
//! Ripplecheck statically analyzes a set of source files and reports the
//! downstream damage of signature edits: call sites that no longer satisfy
//! a function's parameter contract, calls to functions that were renamed or
//! removed, and imports that no longer match the target module's exports.
//!
//! # Architecture
//!
//! - `facts`: Extracted per-file facts (definitions, calls, imports, exports)
//! - `parser`: Dual-strategy extraction - tree-sitter grammars with a
//!   regex fallback
//! - `registry`: Name-indexed collection of every definition in a run
//! - `resolve`: Name-based matching of call sites to definitions
//! - `check`: Call-vs-contract compatibility verdicts
//! - `detect`: The three detectors plus the orchestrating `Analyzer`
//!
//! Analysis is deterministic: the same input files in the same order always
//! produce the same findings with the same ids.
//!
//! # Example
//!
//! ```
//! use ripplecheck::{Analyzer, SourceFile};
//!
//! let files = vec![
//!     SourceFile::new("lib.ts", "export function greet(name: string) {}"),
//!     SourceFile::new("app.ts", "import { greet } from './lib';\ngreet();"),
//! ];
//! let result = Analyzer::default().analyze(&files);
//! assert!(!result.success());
//! ```

pub mod check;
pub mod detect;
pub mod facts;
pub mod parser;
pub mod registry;
pub mod resolve;

pub use check::{CompatibilityChecker, Verdict};
pub use detect::{
    AnalysisConfig, AnalysisResult, Analyzer, Finding, FindingKind, RelatedSite, Severity, Summary,
};
pub use facts::{
    CallSite, ExportRecord, FileFacts, FunctionDefinition, ImportRecord, Language,
    ParameterContract, SourceFile,
};
pub use parser::{ParseStrategy, ParserConfig, SourceParser};
pub use registry::FunctionRegistry;
pub use resolve::CallSiteResolver;
