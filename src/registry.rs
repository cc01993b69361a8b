//! Function registry: every definition seen in a run, indexed by name.
//!
//! Insertion order is preserved both globally and per name, so lookups are
//! deterministic across runs on the same input.

use std::collections::HashMap;

use crate::facts::FunctionDefinition;

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    definitions: Vec<FunctionDefinition>,
    by_name: HashMap<String, Vec<usize>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions in file order.
    pub fn from_definitions(definitions: impl IntoIterator<Item = FunctionDefinition>) -> Self {
        let mut registry = Self::new();
        for def in definitions {
            registry.insert(def);
        }
        registry
    }

    pub fn insert(&mut self, definition: FunctionDefinition) {
        let index = self.definitions.len();
        self.by_name
            .entry(definition.name.clone())
            .or_default()
            .push(index);
        self.definitions.push(definition);
    }

    /// All definitions with the given name, in insertion order. Multiple
    /// files may define the same name; the resolver picks between them.
    pub fn lookup(&self, name: &str) -> Vec<&FunctionDefinition> {
        self.by_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.definitions[i]).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All definitions in insertion order.
    pub fn all(&self) -> &[FunctionDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ParameterContract;

    fn def(name: &str, file: &str, line: usize) -> FunctionDefinition {
        FunctionDefinition {
            name: name.to_string(),
            parameters: vec![ParameterContract::plain("x")],
            file: file.to_string(),
            line,
            column: 1,
            is_exported: false,
            is_async: false,
            is_arrow: false,
        }
    }

    #[test]
    fn test_lookup_preserves_insertion_order() {
        let registry = FunctionRegistry::from_definitions(vec![
            def("save", "a.ts", 10),
            def("load", "a.ts", 20),
            def("save", "b.ts", 5),
        ]);

        let saves = registry.lookup("save");
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].file, "a.ts");
        assert_eq!(saves[1].file, "b.ts");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_lookup_missing_name() {
        let registry = FunctionRegistry::new();
        assert!(registry.lookup("ghost").is_empty());
        assert!(!registry.contains("ghost"));
        assert!(registry.is_empty());
    }
}
