//! Document-symbols provider for the outline view.
//!
//! Walks the structural tree of one file and nests declarations the way
//! they nest in source: classes contain methods and fields, methods
//! contain their locals. Non-declaration nodes are transparent; their
//! declared descendants lift into the nearest declared ancestor.

use super::utils::{node_label, symbol_kind, to_lsp_range};
use crate::index::{AstIndex, NodeId};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use lsp_types::{DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse};

/// Handle a document-symbols request.
pub fn handle_document_symbols(
    params: &DocumentSymbolParams,
    snapshot: &WorldSnapshot,
) -> Option<DocumentSymbolResponse> {
    let uri = canonical_uri(params.text_document.uri.as_str());
    let index = snapshot.generation.index();

    let root = index
        .nodes_in_file(&uri)
        .iter()
        .copied()
        .find(|&id| index.node(id).parent().is_none())?;

    let symbols = collect(index, root);
    if symbols.is_empty() {
        None
    } else {
        Some(DocumentSymbolResponse::Nested(symbols))
    }
}

#[allow(deprecated)] // DocumentSymbol::deprecated field is deprecated but required
fn collect(index: &AstIndex, id: NodeId) -> Vec<DocumentSymbol> {
    let mut symbols = Vec::new();

    for &child in index.node(id).children() {
        let entry = index.node(child);
        match &entry.name {
            Some(name) if entry.kind.is_declaration() => {
                let children = collect(index, child);
                let range = to_lsp_range(entry.range);
                symbols.push(DocumentSymbol {
                    name: name.clone(),
                    detail: Some(node_label(entry)),
                    kind: symbol_kind(entry.kind),
                    tags: None,
                    deprecated: None,
                    range,
                    selection_range: range,
                    children: if children.is_empty() {
                        None
                    } else {
                        Some(children)
                    },
                });
            }
            _ => symbols.extend(collect(index, child)),
        }
    }

    symbols.sort_by_key(|s| (s.range.start.line, s.range.start.character));
    symbols
}
