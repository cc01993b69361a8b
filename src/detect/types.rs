//! Core types for analysis findings.

use serde::{Deserialize, Serialize};

/// Severity levels for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Kinds of breaking-change findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    #[serde(rename = "stale_reference")]
    StaleReference,
    #[serde(rename = "signature_mismatch")]
    SignatureMismatch,
    #[serde(rename = "missing_export")]
    MissingExport,
    #[serde(rename = "module_not_found")]
    ModuleNotFound,
    /// Catch-all for findings that fit no specific kind; kept so consumers
    /// can round-trip results from other producers.
    #[serde(rename = "other")]
    Other,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::StaleReference => "stale_reference",
            FindingKind::SignatureMismatch => "signature_mismatch",
            FindingKind::MissingExport => "missing_export",
            FindingKind::ModuleNotFound => "module_not_found",
            FindingKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stale_reference" => Some(FindingKind::StaleReference),
            "signature_mismatch" => Some(FindingKind::SignatureMismatch),
            "missing_export" => Some(FindingKind::MissingExport),
            "module_not_found" => Some(FindingKind::ModuleNotFound),
            "other" => Some(FindingKind::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A secondary location attached to a finding, e.g. the call site for a
/// finding anchored on a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedSite {
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// Trimmed source line at the site.
    pub context: String,
    /// Corrected text for this site, when one can be produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

/// A single analysis finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable identifier derived from kind, subject, file and line. The
    /// same input always yields the same id.
    pub id: String,
    pub kind: FindingKind,
    pub severity: Severity,
    /// The function/import name this finding is about.
    pub subject: String,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// 0.0 - 1.0 heuristic certainty.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedSite>,
}

impl Finding {
    /// Create a finding with its id derived from the identifying fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        column: usize,
        confidence: f64,
    ) -> Self {
        let subject = subject.into();
        let file = file.into();
        Self {
            id: format!("{}:{}:{}:{}", kind, subject, file, line),
            kind,
            severity,
            subject,
            message: message.into(),
            file,
            line,
            column,
            suggested_fix: None,
            confidence,
            related: Vec::new(),
        }
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    pub fn with_related(mut self, site: RelatedSite) -> Self {
        self.related.push(site);
        self
    }
}

/// Aggregate counts for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub functions_found: usize,
    pub calls_found: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub elapsed_ms: u64,
}

/// Full result of one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub summary: Summary,
}

impl AnalysisResult {
    /// True when no error-severity findings were produced. Warnings and
    /// infos do not fail a run.
    pub fn success(&self) -> bool {
        self.summary.errors == 0
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_round_trip() {
        assert_eq!(Severity::from_str("error").unwrap(), Severity::Error);
        assert_eq!(Severity::from_str("WARNING").unwrap(), Severity::Warning);
        assert!(Severity::from_str("fatal").is_err());
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_finding_kind_parse() {
        assert_eq!(
            FindingKind::parse("signature_mismatch"),
            Some(FindingKind::SignatureMismatch)
        );
        assert_eq!(FindingKind::parse("nonsense"), None);
        assert_eq!(FindingKind::parse("other"), Some(FindingKind::Other));
        assert_eq!(FindingKind::ModuleNotFound.as_str(), "module_not_found");
    }

    #[test]
    fn test_finding_id_is_deterministic() {
        let a = Finding::new(
            FindingKind::StaleReference,
            Severity::Error,
            "doStuff",
            "msg one",
            "app.ts",
            12,
            3,
            0.9,
        );
        let b = Finding::new(
            FindingKind::StaleReference,
            Severity::Error,
            "doStuff",
            "different message",
            "app.ts",
            12,
            7,
            0.9,
        );
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "stale_reference:doStuff:app.ts:12");
    }

    #[test]
    fn test_success_ignores_warnings() {
        let result = AnalysisResult {
            findings: vec![],
            summary: Summary {
                warnings: 3,
                ..Default::default()
            },
        };
        assert!(result.success());
    }
}
