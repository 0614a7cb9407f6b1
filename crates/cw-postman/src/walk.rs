// SPDX-License-Identifier: MIT OR Apache-2.0
//! Depth-first traversal of a workspace's collection tree, with
//! breadcrumb tracking and substitution applied at each level.

use cw_core::ApiLocationType;
use cw_glob::PathFilter;

use crate::auth::{normalize, AuthBlock};
use crate::keywords::KeywordAccumulator;
use crate::model::{Collection, Item, Variable, Workspace};
use crate::substitution::{Scope, SubstitutionStore, DEFAULT_MAX_DEPTH};

/// One piece of scannable text extracted from a workspace, with enough
/// breadcrumb to reconstruct exactly where it came from.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Fully expanded, scannable text.
    pub text: String,
    /// Which field this text came from.
    pub location_type: ApiLocationType,
    /// Workspace ID.
    pub workspace_id: String,
    /// Collection ID (falls back to the collection name if the export
    /// didn't provide a stable ID).
    pub collection_id: String,
    /// `/`-joined folder path from the collection root to this item.
    pub folder_path: String,
    /// Request ID, if this text came from a request rather than a
    /// folder or collection directly.
    pub request_id: Option<String>,
    /// A human-followable link back to the source (not a real URL,
    /// just a breadcrumb string).
    pub link: String,
}

/// Walk every collection in `workspace`, applying `filter` to folder
/// paths and collecting every piece of scannable text along the way,
/// plus the structural-name keywords accumulated while walking.
#[must_use]
pub fn walk_workspace(workspace: &Workspace, filter: &PathFilter) -> (Vec<ExtractedText>, KeywordAccumulator) {
    let mut out = Vec::new();
    let mut base_store = SubstitutionStore::new();
    base_store.add_scope(Scope::Environment, Variable::to_map(&workspace.variable));

    let mut keywords = KeywordAccumulator::new();
    keywords.record(&workspace.name);

    for collection in &workspace.collections {
        walk_collection(workspace, collection, &base_store, &mut keywords, filter, &mut out);
    }

    (out, keywords)
}

fn walk_collection(
    workspace: &Workspace,
    collection: &Collection,
    base_store: &SubstitutionStore,
    keywords: &mut KeywordAccumulator,
    filter: &PathFilter,
    out: &mut Vec<ExtractedText>,
) {
    keywords.record(&collection.name);
    let collection_id = collection.id.clone().unwrap_or_else(|| collection.name.clone());

    let mut store = base_store.clone();
    store.add_scope(Scope::Collection, Variable::to_map(&collection.variable));

    let folder_path = String::new();
    if let Some(auth) = &collection.auth {
        emit_auth(workspace, &collection_id, &folder_path, None, auth, None, &store, out);
    }

    for item in &collection.item {
        walk_item(
            workspace,
            &collection_id,
            &folder_path,
            item,
            &store,
            collection.auth.as_ref(),
            keywords,
            filter,
            out,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_item(
    workspace: &Workspace,
    collection_id: &str,
    parent_path: &str,
    item: &Item,
    parent_store: &SubstitutionStore,
    inherited_auth: Option<&AuthBlock>,
    keywords: &mut KeywordAccumulator,
    filter: &PathFilter,
    out: &mut Vec<ExtractedText>,
) {
    keywords.record(&item.name);
    let path = if parent_path.is_empty() {
        item.name.clone()
    } else {
        format!("{parent_path}/{}", item.name)
    };

    if !filter.is_included(&path) {
        return;
    }

    let mut store = parent_store.clone();
    store.add_scope(Scope::Folder, Variable::to_map(&item.variable));

    let effective_auth = item.auth.as_ref().or(inherited_auth);

    if item.is_request() {
        let request = item.request.as_ref().expect("is_request checked Some");
        let request_id = item.id.clone().unwrap_or_else(|| item.name.clone());

        if let Some(url) = &request.url {
            push(out, workspace, collection_id, &path, Some(&request_id), ApiLocationType::Url, &store.resolve(url, DEFAULT_MAX_DEPTH));
        }
        for (name, value) in &request.headers {
            let rendered = format!("{name}: {}", store.resolve(value, DEFAULT_MAX_DEPTH));
            push(out, workspace, collection_id, &path, Some(&request_id), ApiLocationType::Header, &rendered);
        }
        if let Some(body) = &request.body {
            push(out, workspace, collection_id, &path, Some(&request_id), ApiLocationType::Body, &store.resolve(body, DEFAULT_MAX_DEPTH));
        }
        if let Some(auth) = request.auth.as_ref().or(effective_auth) {
            emit_auth(workspace, collection_id, &path, Some(&request_id), auth, request.url.as_deref(), &store, out);
        }
    } else {
        for child in &item.items {
            walk_item(workspace, collection_id, &path, child, &store, effective_auth, keywords, filter, out);
        }
    }
}

fn emit_auth(
    workspace: &Workspace,
    collection_id: &str,
    path: &str,
    request_id: Option<&str>,
    auth: &AuthBlock,
    url: Option<&str>,
    store: &SubstitutionStore,
    out: &mut Vec<ExtractedText>,
) {
    let resolved_url = url.map(|u| store.resolve(u, DEFAULT_MAX_DEPTH));
    let rendered = normalize(auth, resolved_url.as_deref());
    if rendered.is_empty() {
        return;
    }
    push(out, workspace, collection_id, path, request_id, ApiLocationType::Auth, &store.resolve(&rendered, DEFAULT_MAX_DEPTH));
}

fn push(
    out: &mut Vec<ExtractedText>,
    workspace: &Workspace,
    collection_id: &str,
    path: &str,
    request_id: Option<&str>,
    location_type: ApiLocationType,
    text: &str,
) {
    out.push(ExtractedText {
        text: text.to_string(),
        location_type,
        workspace_id: workspace.id.clone(),
        collection_id: collection_id.to_string(),
        folder_path: path.to_string(),
        request_id: request_id.map(str::to_string),
        link: format!("postman://{}/{}/{}", workspace.id, collection_id, path),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workspace() -> Workspace {
        Workspace {
            id: "ws1".into(),
            name: "Team Workspace".into(),
            variable: vec![Variable {
                key: "host".into(),
                value: Some("api.example.com".into()),
            }],
            collections: vec![Collection {
                id: Some("c1".into()),
                name: "Billing API".into(),
                variable: vec![],
                auth: None,
                item: vec![Item {
                    name: "Get Invoice".into(),
                    id: Some("r1".into()),
                    items: vec![],
                    auth: None,
                    variable: vec![],
                    request: Some(crate::model::Request {
                        url: Some("https://{{host}}/invoices".into()),
                        headers: vec![],
                        body: None,
                        auth: None,
                    }),
                }],
            }],
        }
    }

    #[test]
    fn walk_resolves_variables_in_request_url() {
        let workspace = sample_workspace();
        let filter = PathFilter::build(Vec::<&str>::new(), Vec::<&str>::new()).unwrap();
        let (extracted, _keywords) = walk_workspace(&workspace, &filter);
        let url_text = extracted.iter().find(|e| e.location_type == ApiLocationType::Url).unwrap();
        assert_eq!(url_text.text, "https://api.example.com/invoices");
    }

    #[test]
    fn exclude_filter_skips_matching_folder_paths() {
        let workspace = sample_workspace();
        let filter = PathFilter::build(Vec::<&str>::new(), vec!["Get Invoice"]).unwrap();
        let (extracted, _keywords) = walk_workspace(&workspace, &filter);
        assert!(extracted.is_empty());
    }

    #[test]
    fn breadcrumb_link_includes_workspace_and_collection() {
        let workspace = sample_workspace();
        let filter = PathFilter::build(Vec::<&str>::new(), Vec::<&str>::new()).unwrap();
        let (extracted, _keywords) = walk_workspace(&workspace, &filter);
        assert!(extracted.iter().all(|e| e.link.starts_with("postman://ws1/c1/")));
    }
}
