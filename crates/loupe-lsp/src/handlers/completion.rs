//! Completion provider.
//!
//! Merges two symbol sources: AST-local declarations visible from the
//! cursor's scope (locals, parameters, members, imports), and classpath
//! members when the cursor sits after a `Type.` qualifier.

use super::utils::{completion_context, completion_kind, from_lsp_position, node_label};
use crate::index::AstIndex;
use crate::session::WorldSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::{MemberKind, NodeKind, Position};
use lsp_types::{CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse};
use std::collections::HashSet;

/// Handle a completion request.
pub fn handle_completion(
    params: &CompletionParams,
    snapshot: &WorldSnapshot,
) -> Option<CompletionResponse> {
    let uri = canonical_uri(params.text_document_position.text_document.uri.as_str());
    let position = from_lsp_position(params.text_document_position.position);
    let generation = &snapshot.generation;
    let text = generation.text(&uri)?;
    let context = completion_context(text, position);

    tracing::debug!(uri = %uri, prefix = %context.prefix, qualifier = ?context.qualifier, "completion");

    let mut items = Vec::new();
    match &context.qualifier {
        Some(qualifier) => {
            collect_member_items(snapshot, &uri, qualifier, &context.prefix, &mut items);
        }
        None => {
            collect_scope_items(generation.index(), &uri, position, &context.prefix, &mut items);
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(CompletionResponse::Array(items))
    }
}

/// Members of the type named by the qualifier: a class declared in the
/// open set first, then the classpath (via this file's import when the
/// qualifier is a simple name).
fn collect_member_items(
    snapshot: &WorldSnapshot,
    uri: &str,
    qualifier: &str,
    prefix: &str,
    items: &mut Vec<CompletionItem>,
) {
    let index = snapshot.generation.index();
    let mut seen: HashSet<String> = HashSet::new();

    for &decl in index.declarations_named(qualifier) {
        let entry = index.node(decl);
        if entry.kind != NodeKind::Class {
            continue;
        }
        for &child in entry.children() {
            let member = index.node(child);
            if !matches!(member.kind, NodeKind::Method | NodeKind::Field) {
                continue;
            }
            if let Some(name) = &member.name {
                if name.starts_with(prefix) && seen.insert(name.clone()) {
                    items.push(CompletionItem {
                        label: name.clone(),
                        kind: Some(completion_kind(member.kind)),
                        detail: Some(node_label(member)),
                        ..Default::default()
                    });
                }
            }
        }
    }

    let class_name = index
        .find_import(uri, qualifier)
        .and_then(|id| index.node(id).qualified_name.clone())
        .unwrap_or_else(|| qualifier.to_string());

    if let Some(class) = snapshot.classpath.lookup(&class_name) {
        for member in &class.members {
            if member.name.starts_with(prefix) && seen.insert(member.name.clone()) {
                items.push(CompletionItem {
                    label: member.name.clone(),
                    kind: Some(member_kind(member.kind)),
                    detail: Some(member.render()),
                    ..Default::default()
                });
            }
        }
    }
}

/// Declarations visible from the cursor: walk outward from the innermost
/// node, collecting each scope's declared children. Inner scopes shadow
/// outer ones.
fn collect_scope_items(
    index: &AstIndex,
    uri: &str,
    position: Position,
    prefix: &str,
    items: &mut Vec<CompletionItem>,
) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |items: &mut Vec<CompletionItem>, entry: &crate::index::NodeEntry| {
        if let Some(name) = &entry.name {
            if name.starts_with(prefix) && seen.insert(name.clone()) {
                items.push(CompletionItem {
                    label: name.clone(),
                    kind: Some(completion_kind(entry.kind)),
                    detail: Some(node_label(entry)),
                    ..Default::default()
                });
            }
        }
    };

    let mut scope = index.find_node_at(uri, position);
    if scope.is_none() {
        // Cursor outside the indexed tree (e.g. trailing blank lines):
        // fall back to every declaration in the file.
        for &id in index.nodes_in_file(uri) {
            let entry = index.node(id);
            if entry.kind.is_declaration() {
                push(items, entry);
            }
        }
        return;
    }

    while let Some(id) = scope {
        let node = index.node(id);
        for &child in node.children() {
            let candidate = index.node(child);
            if candidate.kind.is_declaration() {
                push(items, candidate);
            }
        }
        if node.kind.is_declaration() {
            push(items, node);
        }
        scope = node.parent();
    }

    // Classes declared anywhere in the open set are visible regardless of
    // file; the prefix scan over the symbol table picks them up.
    for (_, ids) in index.declarations_with_prefix(prefix) {
        for &id in ids {
            let entry = index.node(id);
            if entry.kind == NodeKind::Class {
                push(items, entry);
            }
        }
    }
}

fn member_kind(kind: MemberKind) -> CompletionItemKind {
    match kind {
        MemberKind::Method => CompletionItemKind::METHOD,
        MemberKind::Field => CompletionItemKind::FIELD,
        MemberKind::Constructor => CompletionItemKind::CONSTRUCTOR,
    }
}
