//! Dual-strategy source parsing for JavaScript/TypeScript.
//!
//! This module provides:
//! - `ParseStrategy` trait: one interface over both extraction strategies
//! - `TreeSitterStrategy`: grammar-based structural parsing (preferred)
//! - `PatternStrategy`: line/regex fallback parsing (always available)
//! - `SourceParser`: facade that tries the structural strategy first and
//!   falls back on failure or empty results
//!
//! Extraction must never panic or abort a run for bad input: the facade
//! converts structural failures into fallback attempts, and the orchestrator
//! converts remaining failures into empty per-file facts.

use thiserror::Error;
use tracing::debug;

use crate::facts::{
    CallSite, ExportRecord, FileFacts, FunctionDefinition, ImportRecord, Language, SourceFile,
};

pub mod pattern;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

/// Parsing failure surfaced when fallback is disabled.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("structural parse failed for {path}: {message}")]
    Structural { path: String, message: String },
}

/// A parsing strategy that can extract all four fact lists from source text.
///
/// Implementations must be deterministic and side-effect-free: repeated runs
/// on unchanged input produce the same result.
pub trait ParseStrategy: Send + Sync {
    /// Strategy name for logging (e.g. "tree-sitter", "pattern").
    fn name(&self) -> &'static str;

    fn extract_definitions(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<FunctionDefinition>>;

    fn extract_calls(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<CallSite>>;

    fn extract_imports(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<ImportRecord>>;

    fn extract_exports(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<ExportRecord>>;
}

/// Parser behavior switches, passed in explicitly by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Attempt the grammar-based strategy first.
    pub use_structural: bool,
    /// Fall back to the pattern strategy when the structural strategy errors
    /// or yields no results. When false, structural errors propagate.
    pub fallback_enabled: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            use_structural: true,
            fallback_enabled: true,
        }
    }
}

/// Facade over the two strategies.
///
/// Owns a fallback `PatternStrategy` unconditionally and a structural
/// strategy when the `tree-sitter` feature is enabled and grammar setup
/// succeeded. A failed grammar setup downgrades the parser to fallback-only
/// for its lifetime; this is logged once at construction.
pub struct SourceParser {
    #[cfg(feature = "tree-sitter")]
    structural: Option<treesitter::TreeSitterStrategy>,
    fallback: pattern::PatternStrategy,
    config: ParserConfig,
}

impl SourceParser {
    pub fn new(config: ParserConfig) -> Self {
        #[cfg(feature = "tree-sitter")]
        let structural = if config.use_structural {
            match treesitter::TreeSitterStrategy::new() {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("structural parser unavailable, using pattern fallback: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            #[cfg(feature = "tree-sitter")]
            structural,
            fallback: pattern::PatternStrategy::new(),
            config,
        }
    }

    /// Whether the structural strategy is active.
    pub fn structural_available(&self) -> bool {
        self.structural_strategy().is_some()
    }

    #[cfg(feature = "tree-sitter")]
    fn structural_strategy(&self) -> Option<&dyn ParseStrategy> {
        self.structural.as_ref().map(|s| s as &dyn ParseStrategy)
    }

    #[cfg(not(feature = "tree-sitter"))]
    fn structural_strategy(&self) -> Option<&dyn ParseStrategy> {
        None
    }

    /// Run one extraction through the strategy chain.
    fn extract<T>(
        &self,
        path: &str,
        run: impl Fn(&dyn ParseStrategy) -> anyhow::Result<Vec<T>>,
    ) -> anyhow::Result<Vec<T>> {
        if let Some(structural) = self.structural_strategy() {
            match run(structural) {
                Ok(items) if !items.is_empty() => return Ok(items),
                Ok(items) => {
                    if !self.config.fallback_enabled {
                        return Ok(items);
                    }
                    debug!(
                        "{} strategy found nothing in {path}, trying {}",
                        structural.name(),
                        self.fallback.name()
                    );
                }
                Err(e) => {
                    if !self.config.fallback_enabled {
                        return Err(ParserError::Structural {
                            path: path.to_string(),
                            message: e.to_string(),
                        }
                        .into());
                    }
                    debug!(
                        "{} strategy failed for {path}, trying {}: {e}",
                        structural.name(),
                        self.fallback.name()
                    );
                }
            }
        }
        run(&self.fallback)
    }

    pub fn extract_definitions(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<FunctionDefinition>> {
        self.extract(path, |s| s.extract_definitions(text, path, language))
    }

    pub fn extract_calls(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<CallSite>> {
        self.extract(path, |s| s.extract_calls(text, path, language))
    }

    pub fn extract_imports(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<ImportRecord>> {
        self.extract(path, |s| s.extract_imports(text, path, language))
    }

    pub fn extract_exports(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<ExportRecord>> {
        self.extract(path, |s| s.extract_exports(text, path, language))
    }

    /// Extract all four fact lists for a file in one pass.
    ///
    /// Files with unsupported extensions yield empty facts rather than an
    /// error.
    pub fn file_facts(&self, file: &SourceFile) -> anyhow::Result<FileFacts> {
        let language = match file.language() {
            Some(l) => l,
            None => {
                return Ok(FileFacts {
                    path: file.path.clone(),
                    language: None,
                    ..Default::default()
                })
            }
        };

        Ok(FileFacts {
            path: file.path.clone(),
            language: Some(language),
            definitions: self.extract_definitions(&file.text, &file.path, language)?,
            calls: self.extract_calls(&file.text, &file.path, language)?,
            imports: self.extract_imports(&file.text, &file.path, language)?,
            exports: self.extract_exports(&file.text, &file.path, language)?,
            parse_failed: false,
        })
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

/// Split a comma-separated expression list at depth zero.
///
/// Tracks paren/bracket/brace nesting and string literals so that commas
/// inside `{}`, `[]`, `()`, or quoted text never split an entry. Used for
/// call arguments in the fallback strategy and for parameter lists.
pub fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in list.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(split_top_level("a, b, c"), vec!["a", "b", "c"]);
        assert!(split_top_level("").is_empty());
        assert!(split_top_level("   ").is_empty());
    }

    #[test]
    fn test_split_does_not_break_nested_literals() {
        let parts = split_top_level("a, {x: 1, y: 2}, [1,2,3]");
        assert_eq!(parts, vec!["a", "{x: 1, y: 2}", "[1,2,3]"]);
    }

    #[test]
    fn test_split_nested_calls_and_strings() {
        let parts = split_top_level("f(1, 2), 'a,b', `t${x},u`");
        assert_eq!(parts, vec!["f(1, 2)", "'a,b'", "`t${x},u`"]);
    }

    #[test]
    fn test_facade_unsupported_extension_is_empty() {
        let parser = SourceParser::default();
        let file = SourceFile::new("README.md", "not code(1, 2)");
        let facts = parser.file_facts(&file).unwrap();
        assert!(facts.language.is_none());
        assert!(facts.definitions.is_empty());
        assert!(facts.calls.is_empty());
    }

    #[test]
    fn test_facade_pattern_only_mode() {
        let parser = SourceParser::new(ParserConfig {
            use_structural: false,
            fallback_enabled: true,
        });
        assert!(!parser.structural_available());

        let defs = parser
            .extract_definitions(
                "export function add(a, b) { return a + b; }",
                "math.js",
                Language::JavaScript,
            )
            .unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "add");
    }
}
