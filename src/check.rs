//! Compatibility checking between a call site and a definition's contract.
//!
//! Arity is the primary signal. Literal arguments additionally get a shallow
//! shape check against declared types; anything that is not an obvious
//! literal is left alone, since argument text is never evaluated.

use crate::detect::types::Severity;
use crate::facts::{CallSite, FunctionDefinition, ParameterContract};

/// Outcome of checking one call against one definition.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub severity: Severity,
    pub message: String,
    pub suggested_fix: Option<String>,
    /// 0.0 - 1.0; arity problems are near-certain, shape problems are not.
    pub confidence: f64,
}

/// Literal shape sniffed from raw argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralShape {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl LiteralShape {
    fn of(argument: &str) -> Option<Self> {
        let arg = argument.trim();
        let first = arg.chars().next()?;
        match first {
            '\'' | '"' | '`' => Some(LiteralShape::String),
            '{' => Some(LiteralShape::Object),
            '[' => Some(LiteralShape::Array),
            _ if arg == "true" || arg == "false" => Some(LiteralShape::Boolean),
            _ if arg.parse::<f64>().is_ok() => Some(LiteralShape::Number),
            _ => None,
        }
    }

    /// Whether a declared type plausibly accepts this shape. Unknown or
    /// complex type text accepts everything.
    fn fits(&self, declared: &str) -> bool {
        let ty = declared.trim().to_lowercase();
        if ty == "any" || ty == "unknown" || ty.contains('|') || ty.contains('&') {
            return true;
        }
        match self {
            LiteralShape::String => ty == "string" || ty.starts_with('\'') || ty.starts_with('"'),
            LiteralShape::Number => ty == "number",
            LiteralShape::Boolean => ty == "boolean",
            LiteralShape::Array => ty.ends_with("[]") || ty.starts_with("array"),
            LiteralShape::Object => {
                // Most named types are object-shaped; only reject clear
                // primitive annotations.
                !matches!(ty.as_str(), "string" | "number" | "boolean")
            }
        }
    }
}

/// Placeholder expression for a missing argument, chosen from the declared
/// type when present.
fn placeholder_for(parameter: &ParameterContract) -> &'static str {
    let ty = parameter
        .declared_type
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    if ty == "string" {
        "''"
    } else if ty == "number" {
        "0"
    } else if ty == "boolean" {
        "false"
    } else if ty.ends_with("[]") || ty.starts_with("array") {
        "[]"
    } else if !ty.is_empty() {
        "{}"
    } else {
        "undefined"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityChecker;

impl CompatibilityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check one call against one definition. Returns None when compatible.
    ///
    /// The first problem found wins, in decreasing order of certainty:
    /// missing required arguments, then too many arguments, then literal
    /// shape mismatches.
    pub fn check(&self, definition: &FunctionDefinition, call: &CallSite) -> Option<Verdict> {
        let provided = call.argument_count();
        let required = definition.required_count();
        let total = definition.parameters.len();

        if provided < required {
            return Some(self.missing_arguments(definition, call, provided));
        }

        if provided > total && !definition.accepts_unbounded() {
            return Some(Verdict {
                severity: Severity::Warning,
                message: format!(
                    "{} called with {provided} arguments but accepts at most {total}",
                    definition.signature()
                ),
                suggested_fix: None,
                confidence: 0.7,
            });
        }

        self.shape_mismatch(definition, call)
    }

    fn missing_arguments(
        &self,
        definition: &FunctionDefinition,
        call: &CallSite,
        provided: usize,
    ) -> Verdict {
        // Placeholders must fill every skipped position through the last
        // required parameter, optional ones included, or later placeholders
        // land in the wrong slot.
        let last_required = definition
            .parameters
            .iter()
            .rposition(|p| p.is_required())
            .unwrap_or(0);
        let skipped = &definition.parameters[provided..=last_required];
        let names: Vec<_> = skipped
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name.as_str())
            .collect();

        let mut fixed_args: Vec<String> = call.arguments.clone();
        fixed_args.extend(skipped.iter().map(|p| placeholder_for(p).to_string()));

        Verdict {
            severity: Severity::Error,
            message: format!(
                "{} requires {} argument(s) but only {provided} provided; missing: {}",
                definition.signature(),
                definition.required_count(),
                names.join(", ")
            ),
            suggested_fix: Some(format!("{}({})", call.callee, fixed_args.join(", "))),
            confidence: 0.95,
        }
    }

    fn shape_mismatch(&self, definition: &FunctionDefinition, call: &CallSite) -> Option<Verdict> {
        for (parameter, argument) in definition.parameters.iter().zip(&call.arguments) {
            let Some(declared) = &parameter.declared_type else {
                continue;
            };
            let Some(shape) = LiteralShape::of(argument) else {
                continue;
            };
            if !shape.fits(declared) {
                return Some(Verdict {
                    severity: Severity::Warning,
                    message: format!(
                        "argument `{}` for parameter {}: {} looks like the wrong type",
                        argument.trim(),
                        parameter.name,
                        declared
                    ),
                    suggested_fix: None,
                    confidence: 0.5,
                });
            }
        }
        None
    }
}
