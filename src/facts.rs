//! Fact structures extracted from source files.
//!
//! Everything the detectors consume is one of these types. They are produced
//! once per parse pass and never mutated afterward; a set of facts lives for
//! exactly one analysis run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source language, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
}

impl Language {
    /// Determine the language from a file path.
    ///
    /// Returns None for unsupported extensions; the orchestrator skips
    /// those files entirely.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?;
        match ext {
            "ts" | "tsx" | "mts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" => Some(Language::JavaScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source file handed to the analysis core.
///
/// The caller (file discovery, git integration) decides which files to read;
/// the core only ever sees path + content pairs.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn language(&self) -> Option<Language> {
        Language::from_path(&self.path)
    }
}

/// One declared parameter of a function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterContract {
    /// Parameter name. For destructured patterns this is the first bound
    /// identifier inside the pattern, not the full binding list.
    pub name: String,
    /// Raw type annotation text, if any. Opaque - no type system is modeled.
    pub declared_type: Option<String>,
    /// Declared with `?` or carrying a default value.
    pub optional: bool,
    /// Raw default-value expression text, if any.
    pub default_value: Option<String>,
    /// Rest parameter (`...args`). Never required, accepts any count.
    pub is_rest: bool,
}

impl ParameterContract {
    /// Create a parameter, enforcing the invariant that a default value
    /// implies optional.
    pub fn new(
        name: impl Into<String>,
        declared_type: Option<String>,
        optional: bool,
        default_value: Option<String>,
        is_rest: bool,
    ) -> Self {
        let optional = optional || default_value.is_some() || is_rest;
        Self {
            name: name.into(),
            declared_type,
            optional,
            default_value,
            is_rest,
        }
    }

    /// A plain, untyped, required parameter.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, None, false, None, false)
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

/// A parsed function/method declaration with its parameter contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub parameters: Vec<ParameterContract>,
    pub file: String,
    /// 1-indexed line of the declaration.
    pub line: usize,
    /// 1-indexed column of the declaration.
    pub column: usize,
    /// Reachable from other files (export statement ancestor, or a method of
    /// an exported class).
    pub is_exported: bool,
    pub is_async: bool,
    pub is_arrow: bool,
}

impl FunctionDefinition {
    /// Number of parameters that a call must supply.
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_required()).count()
    }

    /// Whether a trailing rest parameter makes the accepted argument count
    /// unbounded.
    pub fn accepts_unbounded(&self) -> bool {
        self.parameters.last().map(|p| p.is_rest).unwrap_or(false)
    }

    /// Human-readable parameter list, e.g. `a: string, b?: number`.
    pub fn parameter_signature(&self) -> String {
        self.parameters
            .iter()
            .map(|p| {
                let mut s = String::new();
                if p.is_rest {
                    s.push_str("...");
                }
                s.push_str(&p.name);
                if p.optional && !p.is_rest {
                    s.push('?');
                }
                if let Some(ty) = &p.declared_type {
                    s.push_str(": ");
                    s.push_str(ty);
                }
                s
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Full display form, e.g. `greet(name: string, loud?)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameter_signature())
    }
}

/// A parsed invocation expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Callee as written: bare identifier or `receiver.method`.
    pub callee: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// Trimmed text of the line containing the call.
    pub context: String,
    /// Raw argument expression text, one entry per top-level argument.
    /// Never evaluated - used for counting and literal-shape sniffing only.
    pub arguments: Vec<String>,
}

impl CallSite {
    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// The callee with any receiver stripped: `obj.save` -> `save`.
    pub fn base_name(&self) -> &str {
        self.callee.rsplit('.').next().unwrap_or(&self.callee)
    }
}

/// A single imported name from one import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub name: String,
    /// The module specifier as written, quotes stripped.
    pub module: String,
    pub is_default: bool,
    pub is_namespace: bool,
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// A single exported name from one export statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: String,
    pub is_default: bool,
    pub file: String,
    pub line: usize,
}

/// Everything extracted from one file in a single parse pass.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub path: String,
    pub language: Option<Language>,
    pub definitions: Vec<FunctionDefinition>,
    pub calls: Vec<CallSite>,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    /// Neither strategy produced anything useful for this file. The file
    /// still counts as scanned; detectors just see empty fact lists.
    pub parse_failed: bool,
}

impl FileFacts {
    /// Empty facts for a file that could not be parsed at all.
    pub fn failed(path: &str, language: Option<Language>) -> Self {
        Self {
            path: path.to_string(),
            language,
            parse_failed: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path("src/a.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("a.tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("lib/b.js"), Some(Language::JavaScript));
        assert_eq!(Language::from_path("b.jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_path("notes.md"), None);
        assert_eq!(Language::from_path("Makefile"), None);
    }

    #[test]
    fn test_default_value_implies_optional() {
        let p = ParameterContract::new("count", None, false, Some("0".to_string()), false);
        assert!(p.optional);
        assert!(!p.is_required());
    }

    #[test]
    fn test_required_count_ignores_optional_and_rest() {
        let def = FunctionDefinition {
            name: "f".to_string(),
            parameters: vec![
                ParameterContract::plain("a"),
                ParameterContract::new("b", None, true, None, false),
                ParameterContract::new("rest", None, false, None, true),
            ],
            file: "a.ts".to_string(),
            line: 1,
            column: 1,
            is_exported: true,
            is_async: false,
            is_arrow: false,
        };
        assert_eq!(def.required_count(), 1);
        assert!(def.accepts_unbounded());
    }

    #[test]
    fn test_signature_rendering() {
        let def = FunctionDefinition {
            name: "greet".to_string(),
            parameters: vec![
                ParameterContract::new("name", Some("string".to_string()), false, None, false),
                ParameterContract::new("loud", Some("boolean".to_string()), true, None, false),
            ],
            file: "a.ts".to_string(),
            line: 1,
            column: 1,
            is_exported: true,
            is_async: false,
            is_arrow: false,
        };
        assert_eq!(def.signature(), "greet(name: string, loud?: boolean)");
    }

    #[test]
    fn test_call_site_base_name() {
        let call = CallSite {
            callee: "service.users.save".to_string(),
            file: "b.ts".to_string(),
            line: 3,
            column: 1,
            context: "service.users.save(u)".to_string(),
            arguments: vec!["u".to_string()],
        };
        assert_eq!(call.base_name(), "save");
        assert_eq!(call.argument_count(), 1);
    }
}
