//! Import/export mismatch detection.
//!
//! Only relative imports are checked; package imports resolve outside the
//! analyzed set. Resolution is string-based against the paths that were
//! handed to the analyzer, trying the usual extension and index candidates.

use std::collections::HashMap;

use crate::facts::{FileFacts, ImportRecord};

use super::types::{Finding, FindingKind, Severity};

/// Extensions and index files tried when resolving a bare module specifier.
const RESOLUTION_CANDIDATES: &[&str] = &[
    "", ".ts", ".tsx", ".js", ".jsx", ".mts", ".mjs",
    "/index.ts", "/index.tsx", "/index.js",
];

/// Collapse `.` and `..` segments in a slash-separated path.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Resolve a relative specifier against the importing file's directory.
fn resolve_base(importer: &str, specifier: &str) -> String {
    let dir = importer.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    normalize(&format!("{dir}/{specifier}"))
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Verify every relative import against the target file's export surface.
pub fn detect_import_mismatches(files: &[FileFacts]) -> Vec<Finding> {
    let by_path: HashMap<String, &FileFacts> = files
        .iter()
        .map(|f| (normalize(&f.path), f))
        .collect();

    let mut findings = Vec::new();
    for facts in files {
        for import in &facts.imports {
            if !is_relative(&import.module) {
                continue;
            }

            let base = resolve_base(&facts.path, &import.module);
            let target = RESOLUTION_CANDIDATES
                .iter()
                .find_map(|suffix| by_path.get(&format!("{base}{suffix}")));

            let Some(target) = target else {
                findings.push(module_not_found(import));
                continue;
            };

            // A namespace import only needs the module to exist.
            if import.is_namespace {
                continue;
            }
            // A file whose exports could not be extracted (parse failure,
            // CommonJS) gives no surface to check against.
            if target.parse_failed || target.exports.is_empty() {
                continue;
            }

            if import.is_default {
                if !target.exports.iter().any(|e| e.is_default) {
                    findings.push(missing_export(
                        import,
                        format!(
                            "`{}` has no default export but `{}` imports one",
                            target.path, facts.path
                        ),
                        target,
                    ));
                }
            } else if !target.exports.iter().any(|e| e.name == import.name) {
                findings.push(missing_export(
                    import,
                    format!(
                        "`{}` is not exported by `{}`; available exports: {}",
                        import.name,
                        target.path,
                        available_names(target)
                    ),
                    target,
                ));
            }
        }
    }

    findings
}

fn available_names(target: &FileFacts) -> String {
    target
        .exports
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn module_not_found(import: &ImportRecord) -> Finding {
    Finding::new(
        FindingKind::ModuleNotFound,
        Severity::Warning,
        import.name.clone(),
        format!(
            "module `{}` was not found among the analyzed files",
            import.module
        ),
        import.file.clone(),
        import.line,
        import.column,
        0.6,
    )
}

fn missing_export(import: &ImportRecord, message: String, _target: &FileFacts) -> Finding {
    Finding::new(
        FindingKind::MissingExport,
        Severity::Error,
        import.name.clone(),
        message,
        import.file.clone(),
        import.line,
        import.column,
        0.95,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ExportRecord;

    fn import(name: &str, module: &str, file: &str, is_default: bool) -> ImportRecord {
        ImportRecord {
            name: name.to_string(),
            module: module.to_string(),
            is_default,
            is_namespace: false,
            file: file.to_string(),
            line: 1,
            column: 10,
        }
    }

    fn export(name: &str, file: &str, is_default: bool) -> ExportRecord {
        ExportRecord {
            name: name.to_string(),
            is_default,
            file: file.to_string(),
            line: 1,
        }
    }

    fn exporting_file(path: &str, exports: Vec<ExportRecord>) -> FileFacts {
        FileFacts {
            path: path.to_string(),
            exports,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_named_export_lists_available() {
        let files = vec![
            FileFacts {
                path: "src/app.ts".to_string(),
                imports: vec![import("baz", "./util", "src/app.ts", false)],
                ..Default::default()
            },
            exporting_file(
                "src/util.ts",
                vec![export("foo", "src/util.ts", false), export("bar", "src/util.ts", false)],
            ),
        ];

        let findings = detect_import_mismatches(&files);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MissingExport);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("foo, bar"));
    }

    #[test]
    fn test_resolution_tries_extensions_and_index() {
        let files = vec![
            FileFacts {
                path: "src/app.ts".to_string(),
                imports: vec![
                    import("helper", "./lib", "src/app.ts", false),
                    import("model", "../models", "src/app.ts", false),
                ],
                ..Default::default()
            },
            exporting_file("src/lib/index.ts", vec![export("helper", "src/lib/index.ts", false)]),
            exporting_file("models.ts", vec![export("model", "models.ts", false)]),
        ];

        assert!(detect_import_mismatches(&files).is_empty());
    }

    #[test]
    fn test_unresolved_relative_module_is_low_confidence_warning() {
        let files = vec![FileFacts {
            path: "src/app.ts".to_string(),
            imports: vec![import("gone", "./vanished", "src/app.ts", false)],
            ..Default::default()
        }];

        let findings = detect_import_mismatches(&files);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::ModuleNotFound);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!((findings[0].confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_package_imports_and_namespace_imports_are_skipped() {
        let files = vec![
            FileFacts {
                path: "src/app.ts".to_string(),
                imports: vec![
                    import("axios", "axios", "src/app.ts", true),
                    ImportRecord {
                        is_namespace: true,
                        ..import("helpers", "./util", "src/app.ts", false)
                    },
                ],
                ..Default::default()
            },
            exporting_file("src/util.ts", vec![export("unrelated", "src/util.ts", false)]),
        ];

        assert!(detect_import_mismatches(&files).is_empty());
    }

    #[test]
    fn test_default_import_without_default_export() {
        let files = vec![
            FileFacts {
                path: "src/app.ts".to_string(),
                imports: vec![import("util", "./util", "src/app.ts", true)],
                ..Default::default()
            },
            exporting_file("src/util.ts", vec![export("foo", "src/util.ts", false)]),
        ];

        let findings = detect_import_mismatches(&files);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("no default export"));
    }
}
