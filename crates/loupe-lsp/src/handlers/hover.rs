//! Hover provider.

use super::utils::{from_lsp_position, node_label, resolve_declaration, to_lsp_range};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::NodeKind;
use lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

/// Handle a hover request.
pub fn handle_hover(params: &HoverParams, snapshot: &WorldSnapshot) -> Option<Hover> {
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
    let node_range = index.node(id).range;

    let value = match resolve_declaration(index, id) {
        Some(decl) => {
            let entry = index.node(decl);
            let mut value = format!("```\n{}\n```", node_label(entry));
            if entry.kind == NodeKind::Import {
                if let Some(class) = entry
                    .qualified_name
                    .as_deref()
                    .and_then(|q| snapshot.classpath.lookup(q))
                {
                    value.push_str(&format!(
                        "\n\n`{}` has {} members on the classpath",
                        class.qualified_name,
                        class.members.len()
                    ));
                }
            }
            value
        }
        None => {
            // Not declared anywhere in the open set; try the classpath.
            let name = index.node(id).name.as_deref()?;
            let class = snapshot.classpath.lookup(name)?;
            format!(
                "```\nclass {}\n```\n\n{} members on the classpath",
                class.qualified_name,
                class.members.len()
            )
        }
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(to_lsp_range(node_range)),
    })
}
