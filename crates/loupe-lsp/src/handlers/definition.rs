//! Go-to-definition provider.
//!
//! Resolves the node under the cursor to its declaration: a local
//! declaration in the nearest enclosing scope, or the import that binds
//! the name in this file, or any open-file declaration with the name.

use super::utils::{from_lsp_position, node_location, resolve_declaration};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use lsp_types::{GotoDefinitionParams, GotoDefinitionResponse};

/// Handle a go-to-definition request.
pub fn handle_goto_definition(
    params: &GotoDefinitionParams,
    snapshot: &WorldSnapshot,
) -> Option<GotoDefinitionResponse> {
    let uri = canonical_uri(
        params
            .text_document_position_params
            .text_document
            .uri
            .as_str(),
    );
    let position = from_lsp_position(params.text_document_position_params.position);
    let index = snapshot.generation.index();

    let id = index.find_node_at(&uri, position)?;
    let decl = resolve_declaration(index, id)?;
    let location = node_location(index, decl)?;

    Some(GotoDefinitionResponse::Scalar(location))
}
