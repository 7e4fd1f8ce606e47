//! Signature-help provider.
//!
//! Resolves the call enclosing the cursor and lists matching method
//! signatures: methods declared in the open set, plus classpath methods
//! reachable through this file's imports. The active parameter is the
//! count of top-level commas between the call's opening parenthesis and
//! the cursor.

use super::utils::{from_lsp_position, node_label};
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::{MemberKind, NodeKind, ParamSig, Position};
use lsp_types::{
    ParameterInformation, ParameterLabel, SignatureHelp, SignatureHelpParams, SignatureInformation,
};

/// Handle a signature-help request.
pub fn handle_signature_help(
    params: &SignatureHelpParams,
    snapshot: &WorldSnapshot,
) -> Option<SignatureHelp> {
    let uri = canonical_uri(
        params
            .text_document_position_params
            .text_document
            .uri
            .as_str(),
    );
    let position = from_lsp_position(params.text_document_position_params.position);

    let generation = &snapshot.generation;
    let index = generation.index();

    // Innermost node, then the nearest enclosing call.
    let mut id = index.find_node_at(&uri, position)?;
    while index.node(id).kind != NodeKind::Call {
        id = index.node(id).parent()?;
    }
    let call = index.node(id);
    let name = call.name.as_deref()?;

    let mut signatures = Vec::new();

    for &decl in index.declarations_named(name) {
        let entry = index.node(decl);
        if entry.kind == NodeKind::Method {
            signatures.push(SignatureInformation {
                label: node_label(entry),
                documentation: None,
                parameters: Some(entry.params.iter().map(param_info).collect()),
                active_parameter: None,
            });
        }
    }

    for &import in index.imports_in(&uri) {
        let Some(class) = index
            .node(import)
            .qualified_name
            .as_deref()
            .and_then(|q| snapshot.classpath.lookup(q))
        else {
            continue;
        };
        for member in &class.members {
            if member.name == name && member.kind == MemberKind::Method {
                signatures.push(SignatureInformation {
                    label: member.render(),
                    documentation: None,
                    parameters: Some(
                        member
                            .params
                            .iter()
                            .map(|p| ParameterInformation {
                                label: ParameterLabel::Simple(p.clone()),
                                documentation: None,
                            })
                            .collect(),
                    ),
                    active_parameter: None,
                });
            }
        }
    }

    if signatures.is_empty() {
        return None;
    }

    let text = generation.text(&uri)?;
    Some(SignatureHelp {
        signatures,
        active_signature: Some(0),
        active_parameter: Some(active_parameter(text, call.range.start, position)),
    })
}

fn param_info(param: &ParamSig) -> ParameterInformation {
    ParameterInformation {
        label: ParameterLabel::Simple(param.render()),
        documentation: None,
    }
}

/// Count top-level commas between a call's opening parenthesis and the
/// cursor.
fn active_parameter(text: &str, call_start: Position, cursor: Position) -> u32 {
    let mut depth = 0u32;
    let mut commas = 0u32;

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no as u32;
        if line_no < call_start.line {
            continue;
        }
        if line_no > cursor.line {
            break;
        }
        for (col, ch) in line.chars().enumerate() {
            let col = col as u32;
            if line_no == call_start.line && col < call_start.column {
                continue;
            }
            if line_no == cursor.line && col >= cursor.column {
                return commas;
            }
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 1 => commas += 1,
                _ => {}
            }
        }
    }

    commas
}
