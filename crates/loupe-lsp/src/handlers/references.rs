//! Find-references provider.
//!
//! Performs a name-based symbol-table scan constrained to the open-file
//! set, ordered by file then by range start. Cross-project references
//! outside open files are out of scope.

use super::utils::{from_lsp_position, lsp_uri, name_range, resolve_declaration, to_lsp_range};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::NodeKind;
use lsp_types::{Location, ReferenceParams};

/// Handle a references request.
pub fn handle_references(
    params: &ReferenceParams,
    snapshot: &WorldSnapshot,
) -> Option<Vec<Location>> {
    let uri = canonical_uri(params.text_document_position.text_document.uri.as_str());
    let position = from_lsp_position(params.text_document_position.position);
    let include_declaration = params.context.include_declaration;

    let generation = &snapshot.generation;
    let index = generation.index();
    let id = index.find_node_at(&uri, position)?;

    // Name of the declaration under (or referred to by) the cursor.
    let name = resolve_declaration(index, id)
        .and_then(|decl| index.node(decl).name.clone())
        .or_else(|| index.node(id).name.clone())?;

    let mut locations = Vec::new();
    for file in generation.index().files() {
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
            let is_use = matches!(entry.kind, NodeKind::Reference | NodeKind::Call);
            let is_declaration = entry.kind.is_declaration();
            if is_use || (is_declaration && include_declaration) {
                locations.push(Location {
                    uri: file_uri.clone(),
                    range: to_lsp_range(name_range(text, entry)),
                });
            }
        }
    }

    if locations.is_empty() {
        None
    } else {
        Some(locations)
    }
}
