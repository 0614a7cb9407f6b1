// SPDX-License-Identifier: MIT OR Apache-2.0
//! A simplified Postman collection export model: just enough structure
//! to locate variables, auth blocks, and request text.

use std::collections::HashMap;

use serde::Deserialize;

use crate::auth::AuthBlock;

/// A `{{name}}` variable with its value, as found in an `variable`
/// array on a workspace, collection, environment, or folder.
#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    /// Variable name, without the `{{ }}` delimiters.
    pub key: String,
    /// Variable value. Absent for disabled or unset variables.
    #[serde(default)]
    pub value: Option<String>,
}

impl Variable {
    /// Collapse a variable list into a name/value map, skipping unset
    /// variables.
    #[must_use]
    pub fn to_map(vars: &[Variable]) -> HashMap<String, String> {
        vars.iter()
            .filter_map(|v| v.value.clone().map(|val| (v.key.clone(), val)))
            .collect()
    }
}

/// One HTTP request within a collection.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Request {
    /// Request URL template (may itself contain `{{variables}}`).
    #[serde(default)]
    pub url: Option<String>,
    /// Header name/value pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Raw request body text, if any.
    #[serde(default)]
    pub body: Option<String>,
    /// This request's own auth block, if it overrides the folder's.
    #[serde(default)]
    pub auth: Option<AuthBlock>,
}

/// One node in a collection's folder tree: either a folder containing
/// more items, or a leaf request.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    /// Display name.
    pub name: String,
    /// Stable ID, where the export provides one.
    #[serde(default)]
    pub id: Option<String>,
    /// Child items, for a folder.
    #[serde(default)]
    pub items: Vec<Item>,
    /// The request itself, for a leaf.
    #[serde(default)]
    pub request: Option<Request>,
    /// Folder- or request-level auth.
    #[serde(default)]
    pub auth: Option<AuthBlock>,
    /// Folder- or request-level variables.
    #[serde(default)]
    pub variable: Vec<Variable>,
}

impl Item {
    /// `true` if this item is a leaf request rather than a folder.
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.request.is_some()
    }
}

/// A collection: a named tree of folders and requests plus its own
/// variable scope.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    /// Collection ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Collection display name.
    pub name: String,
    /// Top-level items.
    #[serde(default)]
    pub item: Vec<Item>,
    /// Collection-level variables.
    #[serde(default)]
    pub variable: Vec<Variable>,
    /// Collection-level auth, inherited by every request that doesn't
    /// override it.
    #[serde(default)]
    pub auth: Option<AuthBlock>,
}

/// A workspace export: a name, a set of collections, and a workspace
/// (or linked environment) variable scope.
#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    /// Workspace ID.
    pub id: String,
    /// Workspace display name.
    pub name: String,
    /// Collections belonging to this workspace.
    #[serde(default)]
    pub collections: Vec<Collection>,
    /// Workspace/environment-level variables.
    #[serde(default)]
    pub variable: Vec<Variable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_to_map_skips_unset_values() {
        let vars = vec![
            Variable {
                key: "a".into(),
                value: Some("1".into()),
            },
            Variable {
                key: "b".into(),
                value: None,
            },
        ];
        let map = Variable::to_map(&vars);
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn item_is_request_distinguishes_folders_from_leaves() {
        let folder = Item {
            name: "Auth".into(),
            id: None,
            items: vec![],
            request: None,
            auth: None,
            variable: vec![],
        };
        assert!(!folder.is_request());
    }
}
