//! Workspace-symbols provider for cross-file symbol search.
//!
//! Walks the symbol table of the current generation across every open
//! file, filtered by a case-insensitive substring query, ordered by file
//! then by range start.

use super::utils::{lsp_uri, symbol_kind, to_lsp_range};
use crate::session::WorldSnapshot;
use lsp_types::{Location, SymbolInformation, WorkspaceSymbolParams};

/// Handle a workspace-symbols request.
#[allow(deprecated)] // SymbolInformation::deprecated field is deprecated but required
pub fn handle_workspace_symbols(
    params: &WorkspaceSymbolParams,
    snapshot: &WorldSnapshot,
) -> Option<Vec<SymbolInformation>> {
    let query = params.query.to_lowercase();
    let index = snapshot.generation.index();

    let mut symbols = Vec::new();
    for file in index.files() {
        let Some(file_uri) = lsp_uri(file) else {
            continue;
        };
        for &id in index.nodes_in_file(file) {
            let entry = index.node(id);
            if !entry.kind.is_declaration() {
                continue;
            }
            let Some(name) = &entry.name else {
                continue;
            };
            if !query.is_empty() && !name.to_lowercase().contains(&query) {
                continue;
            }
            let container_name = entry
                .parent()
                .and_then(|parent| index.node(parent).name.clone());
            symbols.push(SymbolInformation {
                name: name.clone(),
                kind: symbol_kind(entry.kind),
                tags: None,
                deprecated: None,
                location: Location {
                    uri: file_uri.clone(),
                    range: to_lsp_range(entry.range),
                },
                container_name,
            });
        }
    }

    if symbols.is_empty() {
        None
    } else {
        Some(symbols)
    }
}
