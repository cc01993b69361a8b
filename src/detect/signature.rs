//! Signature mismatch detection: calls that no longer fit the definition.

use crate::check::CompatibilityChecker;
use crate::facts::FileFacts;
use crate::registry::FunctionRegistry;
use crate::resolve::CallSiteResolver;

use super::types::{Finding, FindingKind, RelatedSite};

/// Check every call against the definition it most plausibly targets.
///
/// Findings are anchored on the call site, with the definition attached as
/// a related location so a reader can jump to the contract that changed.
pub fn detect_signature_mismatches(
    files: &[FileFacts],
    registry: &FunctionRegistry,
) -> Vec<Finding> {
    let resolver = CallSiteResolver::default();
    let checker = CompatibilityChecker::new();

    let mut findings = Vec::new();
    for facts in files {
        for call in &facts.calls {
            let Some(definition) = resolver.relevant_definition(registry, call) else {
                continue;
            };
            // Only definitions the call site could actually reference: the
            // same file, or an export. A private same-name function in some
            // other file is not this call's target.
            if definition.file != call.file && !definition.is_exported {
                continue;
            }
            let Some(verdict) = checker.check(definition, call) else {
                continue;
            };

            let mut finding = Finding::new(
                FindingKind::SignatureMismatch,
                verdict.severity,
                definition.name.clone(),
                verdict.message,
                call.file.clone(),
                call.line,
                call.column,
                verdict.confidence,
            )
            .with_related(RelatedSite {
                file: definition.file.clone(),
                line: definition.line,
                column: definition.column,
                context: definition.signature(),
                suggested_fix: None,
            });
            if let Some(fix) = verdict.suggested_fix {
                finding = finding.with_fix(fix);
            }
            findings.push(finding);
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::types::Severity;
    use crate::facts::{CallSite, FunctionDefinition, ParameterContract};

    fn two_arg_def() -> FunctionDefinition {
        FunctionDefinition {
            name: "createUser".to_string(),
            parameters: vec![
                ParameterContract::new("name", Some("string".into()), false, None, false),
                ParameterContract::new("age", Some("number".into()), false, None, false),
            ],
            file: "users.ts".to_string(),
            line: 3,
            column: 1,
            is_exported: true,
            is_async: false,
            is_arrow: false,
        }
    }

    fn call_with(args: Vec<&str>) -> CallSite {
        CallSite {
            callee: "createUser".to_string(),
            file: "app.ts".to_string(),
            line: 17,
            column: 5,
            context: "const u = createUser('bob');".to_string(),
            arguments: args.into_iter().map(String::from).collect(),
        }
    }

    fn files_with(call: CallSite) -> Vec<FileFacts> {
        vec![FileFacts {
            path: "app.ts".to_string(),
            calls: vec![call],
            ..Default::default()
        }]
    }

    #[test]
    fn test_under_supplied_call_is_reported_at_call_site() {
        let registry = FunctionRegistry::from_definitions(vec![two_arg_def()]);
        let findings =
            detect_signature_mismatches(&files_with(call_with(vec!["'bob'"])), &registry);

        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.kind, FindingKind::SignatureMismatch);
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.file, "app.ts");
        assert_eq!(finding.line, 17);
        assert_eq!(finding.related[0].file, "users.ts");
        assert_eq!(finding.related[0].line, 3);
        assert!(finding.suggested_fix.is_some());
    }

    #[test]
    fn test_compatible_call_produces_nothing() {
        let registry = FunctionRegistry::from_definitions(vec![two_arg_def()]);
        let findings =
            detect_signature_mismatches(&files_with(call_with(vec!["'bob'", "42"])), &registry);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_private_definition_elsewhere_is_not_a_match() {
        // `helper` in internal.ts is not exported; a call in app.ts cannot
        // reference it, so the checker must not run against it.
        let private_def = FunctionDefinition {
            name: "helper".to_string(),
            parameters: vec![
                ParameterContract::plain("a"),
                ParameterContract::plain("b"),
            ],
            file: "internal.ts".to_string(),
            line: 2,
            column: 1,
            is_exported: false,
            is_async: false,
            is_arrow: false,
        };
        let registry = FunctionRegistry::from_definitions(vec![private_def]);

        let call = CallSite {
            callee: "helper".to_string(),
            file: "app.ts".to_string(),
            line: 8,
            column: 1,
            context: "helper('only-arg');".to_string(),
            arguments: vec!["'only-arg'".to_string()],
        };
        let findings = detect_signature_mismatches(&files_with(call), &registry);
        assert!(findings.is_empty(), "unexpected: {findings:?}");
    }

    #[test]
    fn test_same_file_private_definition_is_still_checked() {
        let mut private_def = two_arg_def();
        private_def.is_exported = false;
        private_def.file = "app.ts".to_string();
        let registry = FunctionRegistry::from_definitions(vec![private_def]);

        let findings =
            detect_signature_mismatches(&files_with(call_with(vec!["'bob'"])), &registry);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_unresolvable_call_is_ignored_here() {
        let registry = FunctionRegistry::new();
        let findings =
            detect_signature_mismatches(&files_with(call_with(vec!["'bob'"])), &registry);
        assert!(findings.is_empty());
    }
}
