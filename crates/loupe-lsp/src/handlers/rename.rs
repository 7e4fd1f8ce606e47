//! Rename provider.
//!
//! Rewrites the declaration and every reference across the open-file set.
//! Like references, renames never reach outside open files.

use super::utils::{from_lsp_position, is_ident_char, lsp_uri, name_range, resolve_declaration, to_lsp_range};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::NodeKind;
use lsp_types::{RenameParams, TextEdit, Uri, WorkspaceEdit};
use std::collections::HashMap;

/// Handle a rename request.
pub fn handle_rename(params: &RenameParams, snapshot: &WorldSnapshot) -> Option<WorkspaceEdit> {
    let new_name = params.new_name.as_str();
    if new_name.is_empty() || !new_name.chars().all(is_ident_char) {
        tracing::debug!(new_name, "rejecting rename to invalid identifier");
        return None;
    }

    let uri = canonical_uri(params.text_document_position.text_document.uri.as_str());
    let position = from_lsp_position(params.text_document_position.position);

    let generation = &snapshot.generation;
    let index = generation.index();
    let id = index.find_node_at(&uri, position)?;

    let name = resolve_declaration(index, id)
        .and_then(|decl| index.node(decl).name.clone())
        .or_else(|| index.node(id).name.clone())?;

    let mut changes: HashMap<Uri, Vec<TextEdit>> = HashMap::new();
    for file in index.files() {
        let Some(text) = generation.text(file) else {
            continue;
        };
        let Some(file_uri) = lsp_uri(file) else {
            continue;
        };
        for &node_id in index.nodes_in_file(file) {
            let entry = index.node(node_id);
            if entry.name.as_deref() != Some(name.as_str()) {
                continue;
            }
            if entry.kind.is_declaration() || matches!(entry.kind, NodeKind::Reference | NodeKind::Call)
            {
                changes.entry(file_uri.clone()).or_default().push(TextEdit {
                    range: to_lsp_range(name_range(text, entry)),
                    new_text: new_name.to_string(),
                });
            }
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        })
    }
}
