// SPDX-License-Identifier: MIT OR Apache-2.0
//! `{{variable}}` expansion across scoped variable stores.

use std::collections::HashMap;

/// Default bound on how many rounds of substitution a template is
/// expanded through before giving up and returning it as-is. A variable
/// whose value references another variable needs at least depth 2 to
/// resolve fully; anything deeper is almost always a cycle (spec §9).
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Variable scopes in precedence order, narrowest first: a request
/// variable shadows a folder variable, which shadows a collection
/// variable, which shadows a workspace/environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    /// A global or workspace-level environment.
    Environment,
    /// Collection-level variables.
    Collection,
    /// Folder-level variables.
    Folder,
    /// Request-level variables.
    Request,
}

/// A store of `{{name}} -> value` pairs collected from every scope a
/// workspace exposes, with narrower scopes shadowing wider ones.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionStore {
    layers: Vec<(Scope, HashMap<String, String>)>,
}

impl SubstitutionStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a scope's variables. Later calls with a narrower scope
    /// shadow earlier ones on lookup.
    pub fn add_scope(&mut self, scope: Scope, vars: HashMap<String, String>) {
        self.layers.push((scope, vars));
    }

    /// Look up a variable by name, preferring the narrowest scope that
    /// defines it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.layers
            .iter()
            .filter(|(_, vars)| vars.contains_key(name))
            .max_by_key(|(scope, _)| *scope)
            .and_then(|(_, vars)| vars.get(name))
            .map(String::as_str)
    }

    /// Expand every `{{name}}` token in `template`, substituting values
    /// from the store, recursing into a substituted value up to
    /// `max_depth` levels deep. A token whose name isn't found is left
    /// untouched. A variable whose own value refers back to itself
    /// (directly or through a chain already being expanded) is a
    /// cycle: rather than recurse forever, the self-referring token is
    /// stripped down to its bare name and expansion of that occurrence
    /// stops there.
    #[must_use]
    pub fn resolve(&self, template: &str, max_depth: usize) -> String {
        let mut stack = Vec::new();
        self.expand(template, &mut stack, max_depth)
    }

    fn expand(&self, template: &str, stack: &mut Vec<String>, depth_remaining: usize) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = after[..end].trim();
                    if stack.iter().any(|s| s == name) {
                        out.push_str(name);
                    } else if let Some(value) = self.lookup(name) {
                        if depth_remaining == 0 {
                            out.push_str(value);
                        } else {
                            stack.push(name.to_string());
                            out.push_str(&self.expand(value, stack, depth_remaining - 1));
                            stack.pop();
                        }
                    } else {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn resolves_single_level_variable() {
        let mut store = SubstitutionStore::new();
        store.add_scope(Scope::Environment, vars(&[("host", "api.example.com")]));
        assert_eq!(store.resolve("https://{{host}}/v1", DEFAULT_MAX_DEPTH), "https://api.example.com/v1");
    }

    #[test]
    fn narrower_scope_shadows_wider_scope() {
        let mut store = SubstitutionStore::new();
        store.add_scope(Scope::Environment, vars(&[("token", "env-token")]));
        store.add_scope(Scope::Request, vars(&[("token", "req-token")]));
        assert_eq!(store.resolve("{{token}}", DEFAULT_MAX_DEPTH), "req-token");
    }

    #[test]
    fn resolves_nested_variable_references() {
        let mut store = SubstitutionStore::new();
        store.add_scope(
            Scope::Environment,
            vars(&[("full_key", "{{prefix}}-SECRET"), ("prefix", "AKIA")]),
        );
        assert_eq!(store.resolve("{{full_key}}", DEFAULT_MAX_DEPTH), "AKIA-SECRET");
    }

    #[test]
    fn unknown_variable_is_left_untouched() {
        let store = SubstitutionStore::new();
        assert_eq!(store.resolve("{{missing}}", DEFAULT_MAX_DEPTH), "{{missing}}");
    }

    #[test]
    fn self_referential_variable_does_not_loop_forever() {
        let mut store = SubstitutionStore::new();
        store.add_scope(Scope::Environment, vars(&[("a", "{{a}}")]));
        let result = store.resolve("{{a}}", DEFAULT_MAX_DEPTH);
        assert_eq!(result, "a");
    }

    #[test]
    fn self_referential_variable_embedded_in_a_literal_resolves_per_scenario() {
        let mut store = SubstitutionStore::new();
        store.add_scope(
            Scope::Environment,
            vars(&[("var1", "value1"), ("continuation_token", "'{{continuation_token}}'")]),
        );
        let result = store.resolve("{{var1}}:{{continuation_token}}", DEFAULT_MAX_DEPTH);
        assert_eq!(result, "value1:'continuation_token'");
    }

    #[test]
    fn mutually_referential_variables_terminate() {
        let mut store = SubstitutionStore::new();
        store.add_scope(Scope::Environment, vars(&[("a", "{{b}}"), ("b", "{{a}}")]));
        // Should terminate without panicking or looping; exact text
        // isn't load-bearing, only that it returns promptly.
        let result = store.resolve("{{a}}", 8);
        assert!(!result.is_empty());
    }
}
