//! Tree-sitter based structural parsing.
//!
//! Queries locate the nodes of interest (definitions, calls, imports,
//! exports); node-field inspection pulls out names, parameter contracts and
//! argument lists. Queries are compiled once per strategy for both grammars,
//! so a broken grammar surfaces at construction time and downgrades the
//! facade to the pattern fallback.

use anyhow::anyhow;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser as TsParser, Query, QueryCursor, Tree};

use crate::facts::{
    CallSite, ExportRecord, FunctionDefinition, ImportRecord, Language, ParameterContract,
};

use super::ParseStrategy;

/// Query for definition-shaped nodes, valid for both grammars.
const DEFINITION_QUERY: &str = r#"
(function_declaration) @function
(variable_declarator) @variable
(method_definition) @method
"#;

/// Query for invocation-shaped nodes.
const CALL_QUERY: &str = r#"
(call_expression) @call
(new_expression) @new
"#;

const IMPORT_QUERY: &str = "(import_statement) @import";

const EXPORT_QUERY: &str = "(export_statement) @export";

/// Compiled queries for one grammar.
struct GrammarSet {
    language: tree_sitter::Language,
    definitions: Query,
    calls: Query,
    imports: Query,
    exports: Query,
}

impl GrammarSet {
    fn new(language: tree_sitter::Language) -> anyhow::Result<Self> {
        Ok(Self {
            definitions: Query::new(&language, DEFINITION_QUERY)?,
            calls: Query::new(&language, CALL_QUERY)?,
            imports: Query::new(&language, IMPORT_QUERY)?,
            exports: Query::new(&language, EXPORT_QUERY)?,
            language,
        })
    }
}

/// Grammar-based extraction strategy.
///
/// `tree_sitter::Parser` is not Sync, so a parser is created per call; the
/// compiled queries are shared.
pub struct TreeSitterStrategy {
    js: GrammarSet,
    ts: GrammarSet,
}

impl TreeSitterStrategy {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            js: GrammarSet::new(tree_sitter_javascript::LANGUAGE.into())?,
            ts: GrammarSet::new(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?,
        })
    }

    fn grammar(&self, language: Language) -> &GrammarSet {
        match language {
            Language::JavaScript => &self.js,
            Language::TypeScript => &self.ts,
        }
    }

    fn parse(&self, text: &str, language: Language) -> anyhow::Result<Tree> {
        let grammar = self.grammar(language);
        let mut parser = TsParser::new();
        parser.set_language(&grammar.language)?;
        parser
            .parse(text, None)
            .ok_or_else(|| anyhow!("tree-sitter returned no tree"))
    }
}

/// Node text, empty on invalid UTF-8 slices.
fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Trimmed text of the physical line containing a node.
fn line_context(text: &str, row: usize) -> String {
    text.lines().nth(row).unwrap_or("").trim().to_string()
}

/// Walk ancestors until an export statement is found or the root is reached.
fn has_export_ancestor(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "export_statement" {
            return true;
        }
        current = n.parent();
    }
    false
}

/// The `async` keyword shows up as an anonymous child token.
fn has_async_keyword(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == "async");
    found
}

/// First bound identifier inside a (possibly destructured) pattern.
///
/// For `{ id, name }` this yields `id`; the full binding list is not
/// expanded. Documented limitation of the parameter display name.
fn first_bound_identifier(node: Node, source: &str) -> Option<String> {
    if matches!(
        node.kind(),
        "identifier" | "shorthand_property_identifier_pattern" | "shorthand_property_identifier"
    ) {
        return Some(node_text(node, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(name) = first_bound_identifier(child, source) {
            return Some(name);
        }
    }
    None
}

/// Type annotation text with the leading `:` stripped.
fn annotation_text(node: Node, source: &str) -> Option<String> {
    let raw = node_text(node, source).trim_start_matches(':').trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Parse one child of a `formal_parameters` node into a contract.
///
/// JavaScript surfaces parameters directly (identifier, assignment_pattern,
/// rest_pattern, object/array patterns); TypeScript wraps them in
/// required_parameter/optional_parameter nodes carrying pattern, type and
/// default-value fields.
fn parse_parameter_node(node: Node, source: &str) -> Option<ParameterContract> {
    match node.kind() {
        "identifier" => Some(ParameterContract::plain(node_text(node, source))),
        "rest_pattern" => {
            let name = first_bound_identifier(node, source)?;
            Some(ParameterContract::new(name, None, false, None, true))
        }
        "object_pattern" | "array_pattern" => {
            let name = first_bound_identifier(node, source)?;
            Some(ParameterContract::new(name, None, false, None, false))
        }
        "assignment_pattern" => {
            let left = node.child_by_field_name("left")?;
            let name = first_bound_identifier(left, source)?;
            let default = node
                .child_by_field_name("right")
                .map(|n| node_text(n, source).to_string());
            Some(ParameterContract::new(name, None, true, default, false))
        }
        "required_parameter" | "optional_parameter" => {
            let pattern = node.child_by_field_name("pattern")?;
            let is_rest = pattern.kind() == "rest_pattern";
            let name = first_bound_identifier(pattern, source)?;
            let declared_type = node
                .child_by_field_name("type")
                .and_then(|n| annotation_text(n, source));
            let default = node
                .child_by_field_name("value")
                .map(|n| node_text(n, source).to_string());
            let optional = node.kind() == "optional_parameter";
            Some(ParameterContract::new(
                name,
                declared_type,
                optional,
                default,
                is_rest,
            ))
        }
        _ => None,
    }
}

/// Parse a `formal_parameters` node into an ordered contract list.
fn parse_parameters(params_node: Node, source: &str) -> Vec<ParameterContract> {
    let mut cursor = params_node.walk();
    params_node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .filter_map(|n| parse_parameter_node(n, source))
        .collect()
}

/// Argument text list from an `arguments` node, one entry per named child.
///
/// Nesting is handled by the grammar: an object literal is a single child
/// regardless of the commas inside it.
fn parse_arguments(args_node: Node, source: &str) -> Vec<String> {
    let mut cursor = args_node.walk();
    args_node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .map(|n| node_text(n, source).trim().to_string())
        .collect()
}

impl TreeSitterStrategy {
    fn definition_from_function(
        &self,
        node: Node,
        source: &str,
        path: &str,
    ) -> Option<FunctionDefinition> {
        let name = node_text(node.child_by_field_name("name")?, source).to_string();
        let params = node.child_by_field_name("parameters")?;
        Some(FunctionDefinition {
            name,
            parameters: parse_parameters(params, source),
            file: path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            is_exported: has_export_ancestor(node),
            is_async: has_async_keyword(node),
            is_arrow: false,
        })
    }

    fn definition_from_variable(
        &self,
        node: Node,
        source: &str,
        path: &str,
    ) -> Option<FunctionDefinition> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.kind() != "identifier" {
            return None;
        }
        let value = node.child_by_field_name("value")?;
        if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
            return None;
        }

        // `x => ...` has a bare `parameter` field; `(a, b) => ...` has a
        // `parameters` list.
        let parameters = if let Some(params) = value.child_by_field_name("parameters") {
            parse_parameters(params, source)
        } else if let Some(single) = value.child_by_field_name("parameter") {
            parse_parameter_node(single, source).into_iter().collect()
        } else {
            Vec::new()
        };

        Some(FunctionDefinition {
            name: node_text(name_node, source).to_string(),
            parameters,
            file: path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            is_exported: has_export_ancestor(node),
            is_async: has_async_keyword(value),
            is_arrow: value.kind() == "arrow_function",
        })
    }

    fn definition_from_method(
        &self,
        node: Node,
        source: &str,
        path: &str,
    ) -> Option<FunctionDefinition> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(name_node, source).to_string();
        if name == "constructor" {
            return None;
        }
        let params = node.child_by_field_name("parameters")?;
        Some(FunctionDefinition {
            name,
            parameters: parse_parameters(params, source),
            file: path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            is_exported: has_export_ancestor(node),
            is_async: has_async_keyword(node),
            is_arrow: false,
        })
    }

    fn call_from_expression(
        &self,
        node: Node,
        source: &str,
        text: &str,
        path: &str,
    ) -> Option<CallSite> {
        let function = node.child_by_field_name("function")?;
        // Only direct and member-style callees; computed targets and call
        // chains are out of scope.
        if !matches!(function.kind(), "identifier" | "member_expression") {
            return None;
        }
        let callee = node_text(function, source).to_string();
        if callee.is_empty() || callee.contains('\n') {
            return None;
        }

        let arguments = node
            .child_by_field_name("arguments")
            .map(|n| parse_arguments(n, source))
            .unwrap_or_default();

        Some(CallSite {
            callee,
            file: path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            context: line_context(text, node.start_position().row),
            arguments,
        })
    }

    fn call_from_new(
        &self,
        node: Node,
        source: &str,
        text: &str,
        path: &str,
    ) -> Option<CallSite> {
        let constructor = node.child_by_field_name("constructor")?;
        if constructor.kind() != "identifier" {
            return None;
        }
        let arguments = node
            .child_by_field_name("arguments")
            .map(|n| parse_arguments(n, source))
            .unwrap_or_default();

        Some(CallSite {
            callee: node_text(constructor, source).to_string(),
            file: path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            context: line_context(text, node.start_position().row),
            arguments,
        })
    }

    fn imports_from_statement(
        &self,
        node: Node,
        source: &str,
        path: &str,
    ) -> Vec<ImportRecord> {
        let mut records = Vec::new();

        let module = match node.child_by_field_name("source") {
            Some(s) => node_text(s, source)
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string(),
            None => return records,
        };
        let line = node.start_position().row + 1;

        let mut cursor = node.walk();
        for clause in node
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "import_clause")
        {
            let mut clause_cursor = clause.walk();
            for item in clause.named_children(&mut clause_cursor) {
                match item.kind() {
                    "identifier" => records.push(ImportRecord {
                        name: node_text(item, source).to_string(),
                        module: module.clone(),
                        is_default: true,
                        is_namespace: false,
                        file: path.to_string(),
                        line,
                        column: item.start_position().column + 1,
                    }),
                    "namespace_import" => {
                        if let Some(name) = first_bound_identifier(item, source) {
                            records.push(ImportRecord {
                                name,
                                module: module.clone(),
                                is_default: false,
                                is_namespace: true,
                                file: path.to_string(),
                                line,
                                column: item.start_position().column + 1,
                            });
                        }
                    }
                    "named_imports" => {
                        let mut spec_cursor = item.walk();
                        for spec in item
                            .named_children(&mut spec_cursor)
                            .filter(|n| n.kind() == "import_specifier")
                        {
                            if let Some(name_node) = spec.child_by_field_name("name") {
                                records.push(ImportRecord {
                                    name: node_text(name_node, source).to_string(),
                                    module: module.clone(),
                                    is_default: false,
                                    is_namespace: false,
                                    file: path.to_string(),
                                    line,
                                    column: name_node.start_position().column + 1,
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        records
    }

    fn exports_from_statement(
        &self,
        node: Node,
        source: &str,
        path: &str,
    ) -> Vec<ExportRecord> {
        let mut records = Vec::new();
        let line = node.start_position().row + 1;

        let mut cursor = node.walk();
        let is_default = node.children(&mut cursor).any(|c| c.kind() == "default");

        if let Some(decl) = node.child_by_field_name("declaration") {
            match decl.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    let mut decl_cursor = decl.walk();
                    for declarator in decl
                        .named_children(&mut decl_cursor)
                        .filter(|n| n.kind() == "variable_declarator")
                    {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            if name.kind() == "identifier" {
                                records.push(ExportRecord {
                                    name: node_text(name, source).to_string(),
                                    is_default,
                                    file: path.to_string(),
                                    line,
                                });
                            }
                        }
                    }
                }
                _ => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        records.push(ExportRecord {
                            name: node_text(name, source).to_string(),
                            is_default,
                            file: path.to_string(),
                            line,
                        });
                    } else if is_default {
                        records.push(ExportRecord {
                            name: "default".to_string(),
                            is_default: true,
                            file: path.to_string(),
                            line,
                        });
                    }
                }
            }
            return records;
        }

        // export { a, b as c } - the exported name is the alias when present.
        let mut clause_cursor = node.walk();
        for clause in node
            .named_children(&mut clause_cursor)
            .filter(|n| n.kind() == "export_clause")
        {
            let mut spec_cursor = clause.walk();
            for spec in clause
                .named_children(&mut spec_cursor)
                .filter(|n| n.kind() == "export_specifier")
            {
                let name_node = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"));
                if let Some(n) = name_node {
                    records.push(ExportRecord {
                        name: node_text(n, source).to_string(),
                        is_default: false,
                        file: path.to_string(),
                        line,
                    });
                }
            }
        }

        // export default <expression>
        if records.is_empty() && is_default {
            if let Some(value) = node.child_by_field_name("value") {
                let name = if value.kind() == "identifier" {
                    node_text(value, source).to_string()
                } else {
                    "default".to_string()
                };
                records.push(ExportRecord {
                    name,
                    is_default: true,
                    file: path.to_string(),
                    line,
                });
            }
        }

        records
    }

    /// Run a query and collect the per-capture results.
    fn collect<T>(
        &self,
        query: &Query,
        tree: &Tree,
        text: &str,
        mut visit: impl FnMut(&str, Node) -> Vec<T>,
    ) -> Vec<T> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, tree.root_node(), text.as_bytes());

        let mut out = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                out.extend(visit(capture_name, capture.node));
            }
        }
        out
    }
}

impl ParseStrategy for TreeSitterStrategy {
    fn name(&self) -> &'static str {
        "tree-sitter"
    }

    fn extract_definitions(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<FunctionDefinition>> {
        let tree = self.parse(text, language)?;
        let grammar = self.grammar(language);

        Ok(self.collect(&grammar.definitions, &tree, text, |capture, node| {
            let def = match capture {
                "function" => self.definition_from_function(node, text, path),
                "variable" => self.definition_from_variable(node, text, path),
                "method" => self.definition_from_method(node, text, path),
                _ => None,
            };
            def.into_iter().collect()
        }))
    }

    fn extract_calls(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<CallSite>> {
        let tree = self.parse(text, language)?;
        let grammar = self.grammar(language);

        Ok(self.collect(&grammar.calls, &tree, text, |capture, node| {
            let call = match capture {
                "call" => self.call_from_expression(node, text, text, path),
                "new" => self.call_from_new(node, text, text, path),
                _ => None,
            };
            call.into_iter().collect()
        }))
    }

    fn extract_imports(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<ImportRecord>> {
        let tree = self.parse(text, language)?;
        let grammar = self.grammar(language);

        Ok(self.collect(&grammar.imports, &tree, text, |_, node| {
            self.imports_from_statement(node, text, path)
        }))
    }

    fn extract_exports(
        &self,
        text: &str,
        path: &str,
        language: Language,
    ) -> anyhow::Result<Vec<ExportRecord>> {
        let tree = self.parse(text, language)?;
        let grammar = self.grammar(language);

        Ok(self.collect(&grammar.exports, &tree, text, |_, node| {
            self.exports_from_statement(node, text, path)
        }))
    }
}
