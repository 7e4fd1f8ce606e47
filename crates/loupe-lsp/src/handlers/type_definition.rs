//! Go-to-type-definition provider.
//!
//! Follows the declared type of the node under the cursor to a class
//! declaration in the open set. Types that exist only on the classpath
//! have no source location and yield an empty result.

use super::utils::{from_lsp_position, node_location, resolve_declaration};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::NodeKind;
use lsp_types::{GotoDefinitionParams, GotoDefinitionResponse};

/// Handle a go-to-type-definition request.
pub fn handle_goto_type_definition(
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

    // The node's own declared type, or the type of the declaration it
    // resolves to.
    let type_name = index
        .node(id)
        .type_name
        .clone()
        .or_else(|| {
            resolve_declaration(index, id).and_then(|decl| index.node(decl).type_name.clone())
        })?;

    let class = index
        .declarations_named(&type_name)
        .iter()
        .copied()
        .find(|&decl| index.node(decl).kind == NodeKind::Class)?;

    Some(GotoDefinitionResponse::Scalar(node_location(index, class)?))
}
