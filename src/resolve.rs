//! Call-site resolution: which invocations refer to a given definition.
//!
//! Name-based matching only. There is no scope or type analysis, so a call
//! to `save` matches every definition named `save`; the tiered matching and
//! the defining-file preference keep the noise down.

use tracing::debug;

use crate::facts::{CallSite, FileFacts, FunctionDefinition};
use crate::registry::FunctionRegistry;

#[derive(Debug, Clone, Copy)]
pub struct CallSiteResolver {
    /// Also include calls in the file that defines the function. Off by
    /// default: the interesting fallout of a signature edit is in the other
    /// files.
    pub include_defining_file: bool,
}

impl Default for CallSiteResolver {
    fn default() -> Self {
        Self {
            include_defining_file: false,
        }
    }
}

impl CallSiteResolver {
    pub fn new(include_defining_file: bool) -> Self {
        Self {
            include_defining_file,
        }
    }

    /// All call sites across `files` that plausibly invoke `name`.
    ///
    /// Three tiers, checked in order per call:
    /// 1. exact callee match (`save(...)`)
    /// 2. member-style match (`repo.save(...)`, callee ends in `.save`)
    /// 3. context fallback: the source line contains `save(` even though the
    ///    extracted callee differs (covers callback positions and chained
    ///    expressions the extractor flattened)
    pub fn find_call_sites<'a>(
        &self,
        files: &'a [FileFacts],
        name: &str,
        defining_file: Option<&str>,
    ) -> Vec<&'a CallSite> {
        let member_suffix = format!(".{name}");
        let context_needle = format!("{name}(");

        let mut sites = Vec::new();
        for facts in files {
            if !self.include_defining_file && Some(facts.path.as_str()) == defining_file {
                continue;
            }
            for call in &facts.calls {
                let matched = call.callee == name
                    || call.callee.ends_with(&member_suffix)
                    || (call.base_name() != name && call.context.contains(&context_needle));
                if matched {
                    sites.push(call);
                }
            }
        }
        sites
    }

    /// Pick the definition a call most plausibly refers to.
    ///
    /// Preference order: a definition in the calling file, then the first
    /// exported definition, then the first definition seen. The registry
    /// preserves insertion order, so ties resolve the same way every run.
    pub fn relevant_definition<'a>(
        &self,
        registry: &'a FunctionRegistry,
        call: &CallSite,
    ) -> Option<&'a FunctionDefinition> {
        let candidates = registry.lookup(call.base_name());
        if candidates.is_empty() {
            return None;
        }
        if candidates.len() > 1 {
            debug!(
                callee = %call.callee,
                file = %call.file,
                count = candidates.len(),
                "ambiguous call target, applying preference order"
            );
        }

        candidates
            .iter()
            .find(|d| d.file == call.file)
            .or_else(|| candidates.iter().find(|d| d.is_exported))
            .or_else(|| candidates.first())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ParameterContract;

    fn def(name: &str, file: &str, exported: bool) -> FunctionDefinition {
        FunctionDefinition {
            name: name.to_string(),
            parameters: vec![ParameterContract::plain("x")],
            file: file.to_string(),
            line: 1,
            column: 1,
            is_exported: exported,
            is_async: false,
            is_arrow: false,
        }
    }

    fn call(callee: &str, file: &str, context: &str) -> CallSite {
        CallSite {
            callee: callee.to_string(),
            file: file.to_string(),
            line: 5,
            column: 1,
            context: context.to_string(),
            arguments: vec!["x".to_string()],
        }
    }

    fn facts(path: &str, calls: Vec<CallSite>) -> FileFacts {
        FileFacts {
            path: path.to_string(),
            calls,
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_and_member_matching() {
        let files = vec![
            facts("a.ts", vec![call("save", "a.ts", "save(user);")]),
            facts("b.ts", vec![call("repo.save", "b.ts", "repo.save(user);")]),
            facts("c.ts", vec![call("saveAll", "c.ts", "saveAll(users);")]),
        ];

        let resolver = CallSiteResolver::default();
        let sites = resolver.find_call_sites(&files, "save", None);
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().all(|s| s.base_name() == "save"));
    }

    #[test]
    fn test_context_fallback_catches_callback_position() {
        let files = vec![facts(
            "a.ts",
            vec![call("items.map", "a.ts", "items.map(x => format(x));")],
        )];

        let resolver = CallSiteResolver::default();
        let sites = resolver.find_call_sites(&files, "format", None);
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn test_defining_file_exclusion() {
        let files = vec![
            facts("def.ts", vec![call("save", "def.ts", "save(u);")]),
            facts("use.ts", vec![call("save", "use.ts", "save(u);")]),
        ];

        let resolver = CallSiteResolver::new(false);
        let sites = resolver.find_call_sites(&files, "save", Some("def.ts"));
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].file, "use.ts");
    }

    #[test]
    fn test_relevant_definition_preference_order() {
        let registry = FunctionRegistry::from_definitions(vec![
            def("save", "lib.ts", false),
            def("save", "api.ts", true),
            def("save", "local.ts", false),
        ]);
        let resolver = CallSiteResolver::default();

        // Same-file definition wins.
        let local = call("save", "local.ts", "save(u);");
        assert_eq!(
            resolver.relevant_definition(&registry, &local).unwrap().file,
            "local.ts"
        );

        // Otherwise the first exported definition.
        let elsewhere = call("save", "other.ts", "save(u);");
        assert_eq!(
            resolver
                .relevant_definition(&registry, &elsewhere)
                .unwrap()
                .file,
            "api.ts"
        );

        // No match at all.
        let ghost = call("purge", "other.ts", "purge();");
        assert!(resolver.relevant_definition(&registry, &ghost).is_none());
    }
}
