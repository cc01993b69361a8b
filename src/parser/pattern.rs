//! Pattern-based fallback parsing.
//!
//! Line-oriented regex extraction used when the grammar-based strategy is
//! unavailable or produced nothing. Handles the common, simple forms only:
//! `function name(...)` declarations, `const name = (...) =>` arrows,
//! `IDENT(` call occurrences, and single-line import/export statements.
//! Anything more exotic is the structural strategy's job.

use lazy_static::lazy_static;
use regex::Regex;

use crate::facts::{
    CallSite, ExportRecord, FunctionDefinition, ImportRecord, Language, ParameterContract,
};

use super::{split_top_level, ParseStrategy};

lazy_static! {
    // function name(params) / export async function name(params)
    static ref FUNC_RE: Regex =
        Regex::new(r"(?:export\s+)?(?:default\s+)?(async\s+)?function\s+(\w+)\s*\(([^)]*)\)")
            .unwrap();
    // const name = (params) => / export const name = async (params) =>
    static ref ARROW_RE: Regex =
        Regex::new(r"(?:export\s+)?const\s+(\w+)\s*=\s*(async\s*)?\(([^)]*)\)\s*=>").unwrap();
    // callee( - bare identifier or dotted member chain
    static ref CALL_RE: Regex =
        Regex::new(r"((?:[A-Za-z_$][\w$]*\.)*[A-Za-z_$][\w$]*)\s*\(").unwrap();
    // import { a, b } from 'm' / import * as ns from 'm' / import d from 'm'
    static ref IMPORT_RE: Regex = Regex::new(
        r#"import\s+(?:type\s+)?(?:\{([^}]+)\}|\*\s+as\s+(\w+)|(\w+))\s+from\s+['"]([^'"]+)['"]"#
    )
    .unwrap();
    // export function name / export const name / export class name
    static ref NAMED_EXPORT_RE: Regex =
        Regex::new(r"export\s+(?:async\s+)?(?:function|const|let|var|class|interface|type|enum)\s+(\w+)")
            .unwrap();
    // export default function name / export default name
    static ref DEFAULT_EXPORT_RE: Regex =
        Regex::new(r"export\s+default\s+(?:async\s+)?(?:function\s+(\w+)|class\s+(\w+)|(\w+))")
            .unwrap();
    // export { a, b as c }
    static ref EXPORT_LIST_RE: Regex = Regex::new(r"export\s*\{([^}]+)\}").unwrap();
    // name?: type = default
    static ref TYPED_PARAM_RE: Regex =
        Regex::new(r"^(\w+)(\?)?\s*:\s*([^=]+?)(?:\s*=\s*(.+))?$").unwrap();
    // name = default
    static ref DEFAULT_PARAM_RE: Regex = Regex::new(r"^(\w+)\s*=\s*(.+)$").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"[A-Za-z_$][\w$]*").unwrap();
}

/// Language keywords and runtime globals that look like calls but are not
/// user-defined functions.
static EXCLUDED_CALLEES: phf::Set<&'static str> = phf::phf_set! {
    // control flow and operators
    "if", "for", "while", "switch", "catch", "return", "throw", "do",
    "function", "typeof", "instanceof", "new", "await", "yield", "in", "of",
    "import", "export", "require", "super", "constructor", "else",
    // runtime globals
    "console", "JSON", "Promise", "Object", "Array", "String", "Number",
    "Boolean", "Date", "Math", "RegExp", "Error", "Map", "Set", "Symbol",
    "parseInt", "parseFloat", "isNaN", "isFinite", "encodeURIComponent",
    "decodeURIComponent", "setTimeout", "setInterval", "clearTimeout",
    "clearInterval", "fetch",
};

/// Whether a callee should be skipped during call extraction.
pub fn is_excluded_callee(callee: &str) -> bool {
    let first = callee.split('.').next().unwrap_or(callee);
    EXCLUDED_CALLEES.contains(first)
}

/// Classify one raw parameter text into a contract.
///
/// Recognizes typed (`name: Type`), optional (`name?`), defaulted
/// (`name = expr`), rest (`...name`) and destructured (`{a, b}` / `[a]`)
/// forms. Destructured patterns are displayed by their first bound
/// identifier.
pub fn parse_parameter(raw: &str) -> Option<ParameterContract> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(rest) = raw.strip_prefix("...") {
        let name = IDENT_RE.find(rest)?.as_str().to_string();
        return Some(ParameterContract::new(name, None, false, None, true));
    }

    if raw.starts_with('{') || raw.starts_with('[') {
        // Destructured pattern: display name is the first bound identifier.
        let name = IDENT_RE.find(raw)?.as_str().to_string();
        let has_default = raw.contains('=');
        return Some(ParameterContract::new(
            name,
            None,
            false,
            has_default.then(|| raw.split('=').nth(1).unwrap_or("").trim().to_string()),
            false,
        ));
    }

    if let Some(caps) = TYPED_PARAM_RE.captures(raw) {
        let name = caps.get(1).unwrap().as_str().to_string();
        let optional = caps.get(2).is_some();
        let ty = caps.get(3).map(|m| m.as_str().trim().to_string());
        let default = caps.get(4).map(|m| m.as_str().trim().to_string());
        return Some(ParameterContract::new(name, ty, optional, default, false));
    }

    if let Some(caps) = DEFAULT_PARAM_RE.captures(raw) {
        let name = caps.get(1).unwrap().as_str().to_string();
        let default = caps.get(2).unwrap().as_str().trim().to_string();
        return Some(ParameterContract::new(name, None, true, Some(default), false));
    }

    let name = IDENT_RE.find(raw)?.as_str();
    let optional = raw.contains('?');
    Some(ParameterContract::new(name, None, optional, None, false))
}

/// Parse a raw parameter list into contracts, splitting at depth zero.
pub fn parse_parameter_list(params: &str) -> Vec<ParameterContract> {
    split_top_level(params)
        .iter()
        .filter_map(|p| parse_parameter(p))
        .collect()
}

/// Collect the argument text of a call starting just after its `(`.
///
/// Scans to the matching close paren with depth tracking; if the call spans
/// past the end of the line, whatever is visible on the line is used.
fn call_argument_text(line: &str, open_paren: usize) -> &str {
    let bytes = line.as_bytes();
    let mut depth = 0usize;
    let start = open_paren + 1;
    let mut quote: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate().skip(open_paren) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return &line[start..i];
                }
            }
            _ => {}
        }
    }

    &line[start.min(line.len())..]
}

/// Regex-based fallback strategy.
pub struct PatternStrategy;

impl PatternStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract_definitions(
        &self,
        text: &str,
        path: &str,
        _language: Language,
    ) -> anyhow::Result<Vec<FunctionDefinition>> {
        let mut definitions = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            if let Some(caps) = FUNC_RE.captures(line) {
                let name = caps.get(2).unwrap().as_str().to_string();
                let params = caps.get(3).unwrap().as_str();
                definitions.push(FunctionDefinition {
                    name,
                    parameters: parse_parameter_list(params),
                    file: path.to_string(),
                    line: idx + 1,
                    column: caps.get(0).unwrap().start() + 1,
                    is_exported: line.trim_start().starts_with("export"),
                    is_async: caps.get(1).is_some(),
                    is_arrow: false,
                });
                continue;
            }

            if let Some(caps) = ARROW_RE.captures(line) {
                let name = caps.get(1).unwrap().as_str().to_string();
                let params = caps.get(3).unwrap().as_str();
                definitions.push(FunctionDefinition {
                    name,
                    parameters: parse_parameter_list(params),
                    file: path.to_string(),
                    line: idx + 1,
                    column: caps.get(0).unwrap().start() + 1,
                    is_exported: line.trim_start().starts_with("export"),
                    is_async: caps.get(2).is_some(),
                    is_arrow: true,
                });
            }
        }

        Ok(definitions)
    }

    fn extract_calls(
        &self,
        text: &str,
        path: &str,
        _language: Language,
    ) -> anyhow::Result<Vec<CallSite>> {
        let mut calls = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            for caps in CALL_RE.captures_iter(line) {
                let m = caps.get(1).unwrap();
                let callee = m.as_str();

                if is_excluded_callee(callee) {
                    continue;
                }
                // Skip definitions: `function name(` matches the call shape.
                let before = line[..m.start()].trim_end();
                if before.ends_with("function") {
                    continue;
                }

                // The full match ends at the opening paren.
                let open = caps.get(0).unwrap().end() - 1;
                let args = split_top_level(call_argument_text(line, open));

                calls.push(CallSite {
                    callee: callee.to_string(),
                    file: path.to_string(),
                    line: idx + 1,
                    column: m.start() + 1,
                    context: line.trim().to_string(),
                    arguments: args,
                });
            }
        }

        Ok(calls)
    }

    fn extract_imports(
        &self,
        text: &str,
        path: &str,
        _language: Language,
    ) -> anyhow::Result<Vec<ImportRecord>> {
        let mut imports = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let caps = match IMPORT_RE.captures(line) {
                Some(c) => c,
                None => continue,
            };
            let module = caps.get(4).unwrap().as_str().to_string();

            if let Some(named) = caps.get(1) {
                for spec in named.as_str().split(',') {
                    let spec = spec.trim();
                    if spec.is_empty() {
                        continue;
                    }
                    // `name as alias` imports the exported `name`.
                    let name = spec.split_whitespace().next().unwrap_or(spec);
                    imports.push(ImportRecord {
                        name: name.to_string(),
                        module: module.clone(),
                        is_default: false,
                        is_namespace: false,
                        file: path.to_string(),
                        line: idx + 1,
                        column: line.find(name).unwrap_or(0) + 1,
                    });
                }
            } else if let Some(ns) = caps.get(2) {
                imports.push(ImportRecord {
                    name: ns.as_str().to_string(),
                    module,
                    is_default: false,
                    is_namespace: true,
                    file: path.to_string(),
                    line: idx + 1,
                    column: ns.start() + 1,
                });
            } else if let Some(default) = caps.get(3) {
                imports.push(ImportRecord {
                    name: default.as_str().to_string(),
                    module,
                    is_default: true,
                    is_namespace: false,
                    file: path.to_string(),
                    line: idx + 1,
                    column: default.start() + 1,
                });
            }
        }

        Ok(imports)
    }

    fn extract_exports(
        &self,
        text: &str,
        path: &str,
        _language: Language,
    ) -> anyhow::Result<Vec<ExportRecord>> {
        let mut exports = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            if let Some(caps) = DEFAULT_EXPORT_RE.captures(line) {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or("default");
                exports.push(ExportRecord {
                    name: name.to_string(),
                    is_default: true,
                    file: path.to_string(),
                    line: idx + 1,
                });
                continue;
            }

            if let Some(caps) = NAMED_EXPORT_RE.captures(line) {
                exports.push(ExportRecord {
                    name: caps.get(1).unwrap().as_str().to_string(),
                    is_default: false,
                    file: path.to_string(),
                    line: idx + 1,
                });
                continue;
            }

            if let Some(caps) = EXPORT_LIST_RE.captures(line) {
                for spec in caps.get(1).unwrap().as_str().split(',') {
                    let spec = spec.trim();
                    if spec.is_empty() {
                        continue;
                    }
                    // `a as b` exports the name `b`.
                    let name = spec.split_whitespace().last().unwrap_or(spec);
                    exports.push(ExportRecord {
                        name: name.to_string(),
                        is_default: false,
                        file: path.to_string(),
                        line: idx + 1,
                    });
                }
            }
        }

        Ok(exports)
    }
}
