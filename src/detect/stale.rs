//! Stale reference detection: calls to functions that no longer exist.

use phf::phf_set;

use crate::facts::{CallSite, FileFacts};
use crate::registry::FunctionRegistry;

use super::types::{Finding, FindingKind, Severity};

/// Runtime and language globals that are callable without a project
/// definition. Calls to or through these never count as stale.
static KNOWN_GLOBALS: phf::Set<&'static str> = phf_set! {
    "console", "Math", "JSON", "Object", "Array", "String", "Number",
    "Boolean", "Date", "RegExp", "Error", "TypeError", "RangeError",
    "Promise", "Map", "Set", "WeakMap", "WeakSet", "Symbol", "Proxy",
    "Reflect", "Intl", "BigInt", "ArrayBuffer", "DataView", "URL",
    "URLSearchParams", "TextEncoder", "TextDecoder", "AbortController",
    "parseInt", "parseFloat", "isNaN", "isFinite", "encodeURIComponent",
    "decodeURIComponent", "encodeURI", "decodeURI", "structuredClone",
    "fetch", "alert", "confirm", "prompt", "require",
    "setTimeout", "setInterval", "clearTimeout", "clearInterval",
    "setImmediate", "queueMicrotask", "atob", "btoa",
    "describe", "it", "test", "expect", "beforeEach", "afterEach",
    "beforeAll", "afterAll", "jest", "vi",
};

/// Builtin prototype methods that show up constantly in member position.
/// Without receiver types these cannot be told apart from project methods,
/// so they are allow-listed by name.
static KNOWN_METHODS: phf::Set<&'static str> = phf_set! {
    // Array
    "map", "filter", "forEach", "reduce", "reduceRight", "find", "findIndex",
    "findLast", "some", "every", "push", "pop", "shift", "unshift", "slice",
    "splice", "concat", "join", "flat", "flatMap", "fill", "sort", "reverse",
    "indexOf", "lastIndexOf", "includes", "at",
    // String
    "split", "trim", "trimStart", "trimEnd", "replace", "replaceAll",
    "toLowerCase", "toUpperCase", "charAt", "charCodeAt", "startsWith",
    "endsWith", "padStart", "padEnd", "repeat", "substring", "match",
    "matchAll", "search", "localeCompare",
    // Object / generic
    "toString", "valueOf", "hasOwnProperty", "keys", "values", "entries",
    "toFixed", "toPrecision", "toISOString", "toJSON", "getTime",
    // Map/Set
    "get", "set", "has", "add", "delete", "clear",
    // Promise / function
    "then", "catch", "finally", "call", "apply", "bind",
    // console-style loggers
    "log", "warn", "error", "info", "debug", "trace", "assert",
    // events / DOM-ish
    "addEventListener", "removeEventListener", "dispatchEvent", "emit",
    "on", "off", "once",
    // serialization
    "parse", "stringify",
};

/// Whether a name imported in this file covers the call, either directly or
/// as the receiver of a member call (`helpers.formatDate` with
/// `import * as helpers`).
fn covered_by_import(facts: &FileFacts, call: &CallSite) -> bool {
    let receiver = call.callee.split('.').next().unwrap_or(&call.callee);
    facts
        .imports
        .iter()
        .any(|i| i.name == call.callee || i.name == receiver)
}

/// Find calls whose base name has no definition anywhere in the analyzed
/// set.
///
/// Member-style calls are checked by their base name, same as bare calls;
/// builtin receivers and prototype method names are allow-listed since
/// there is no receiver type to consult. Names imported in the calling file
/// are skipped; if the import itself is broken the import detector reports
/// it.
pub fn detect_stale_references(
    files: &[FileFacts],
    registry: &FunctionRegistry,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for facts in files {
        for call in &facts.calls {
            let base = call.base_name();
            let receiver = call.callee.split('.').next().unwrap_or(&call.callee);

            if KNOWN_GLOBALS.contains(receiver) || KNOWN_GLOBALS.contains(base) {
                continue;
            }
            if call.callee.contains('.') && KNOWN_METHODS.contains(base) {
                continue;
            }
            if covered_by_import(facts, call) {
                continue;
            }
            if registry.contains(base) {
                continue;
            }

            findings.push(Finding::new(
                FindingKind::StaleReference,
                Severity::Error,
                base.to_string(),
                format!(
                    "`{}` is called but `{base}` is not defined in any analyzed file; it may have been renamed or removed",
                    call.callee
                ),
                call.file.clone(),
                call.line,
                call.column,
                0.9,
            ));
        }
    }

    findings
}
