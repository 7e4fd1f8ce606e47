//! Integration tests for the query providers, run against a session with
//! two open files and a classpath carrying `pkg.Type`.

mod common;

use common::{pkg_type_class, FixtureFrontEnd};
use loupe_lsp::handlers::completion::handle_completion;
use loupe_lsp::handlers::definition::handle_goto_definition;
use loupe_lsp::handlers::hover::handle_hover;
use loupe_lsp::handlers::references::handle_references;
use loupe_lsp::handlers::rename::handle_rename;
use loupe_lsp::handlers::signature_help::handle_signature_help;
use loupe_lsp::handlers::symbols::handle_document_symbols;
use loupe_lsp::handlers::type_definition::handle_goto_type_definition;
use loupe_lsp::handlers::workspace_symbols::handle_workspace_symbols;
use loupe_lsp::{Config, Session};
use lsp_types::{
    CompletionParams, CompletionResponse, DocumentSymbolParams, DocumentSymbolResponse,
    GotoDefinitionParams, GotoDefinitionResponse, HoverContents, HoverParams, ReferenceContext,
    ReferenceParams, RenameParams, SignatureHelpParams, TextDocumentIdentifier,
    TextDocumentPositionParams, WorkspaceSymbolParams,
};
use std::path::PathBuf;
use std::sync::Arc;

const A: &str = "file:///a.src";
const B: &str = "file:///b.src";

const A_TEXT: &str = "\
import pkg.Type
class Foo
  field count: Int
  method bar(n: Int): Int
    var local: Int
    var other: Foo
    use Type
    call bar(local, count)
  end
end";

const B_TEXT: &str = "\
import pkg.Type
class Baz
  method qux(): Int
    use Type
  end
end";

fn fixture_session() -> Arc<Session> {
    let front_end = Arc::new(FixtureFrontEnd::with_classes(vec![pkg_type_class()]));
    let session = Arc::new(Session::new(front_end, None, Config::default()));
    session.open_document(A, A_TEXT);
    session.open_document(B, B_TEXT);
    session.apply_classpath(vec![PathBuf::from("lib/pkg.jar")]);
    session
}

fn uri(s: &str) -> lsp_types::Uri {
    s.parse().unwrap()
}

fn at(file: &str, line: u32, character: u32) -> TextDocumentPositionParams {
    TextDocumentPositionParams {
        text_document: TextDocumentIdentifier { uri: uri(file) },
        position: lsp_types::Position { line, character },
    }
}

fn completion_params(file: &str, line: u32, character: u32) -> CompletionParams {
    CompletionParams {
        text_document_position: at(file, line, character),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        context: None,
    }
}

fn hover_params(file: &str, line: u32, character: u32) -> HoverParams {
    HoverParams {
        text_document_position_params: at(file, line, character),
        work_done_progress_params: Default::default(),
    }
}

fn definition_params(file: &str, line: u32, character: u32) -> GotoDefinitionParams {
    GotoDefinitionParams {
        text_document_position_params: at(file, line, character),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
    }
}

fn reference_params(
    file: &str,
    line: u32,
    character: u32,
    include_declaration: bool,
) -> ReferenceParams {
    ReferenceParams {
        text_document_position: at(file, line, character),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        context: ReferenceContext {
            include_declaration,
        },
    }
}

fn labels(response: Option<CompletionResponse>) -> Vec<String> {
    match response {
        Some(CompletionResponse::Array(items)) => items.into_iter().map(|i| i.label).collect(),
        Some(CompletionResponse::List(list)) => {
            list.items.into_iter().map(|i| i.label).collect()
        }
        None => Vec::new(),
    }
}

fn hover_text(hover: lsp_types::Hover) -> String {
    match hover.contents {
        HoverContents::Markup(markup) => markup.value,
        other => panic!("unexpected hover contents: {other:?}"),
    }
}

#[test]
fn definition_on_usage_resolves_to_import() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    // `use Type` on line 6 resolves to the import declaration on line 0.
    let response = handle_goto_definition(&definition_params(A, 6, 9), &snapshot)
        .expect("definition should resolve");
    let GotoDefinitionResponse::Scalar(location) = response else {
        panic!("expected a single location");
    };
    assert_eq!(location.uri.as_str(), A);
    assert_eq!(location.range.start.line, 0);
}

#[test]
fn definition_on_local_variable() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    // The `local` argument in `call bar(local, count)` resolves to the
    // declaration on line 4.
    let response = handle_goto_definition(&definition_params(A, 7, 14), &snapshot)
        .expect("definition should resolve");
    let GotoDefinitionResponse::Scalar(location) = response else {
        panic!("expected a single location");
    };
    assert_eq!(location.range.start.line, 4);
}

#[test]
fn qualified_completion_offers_classpath_members() {
    let session = fixture_session();
    // Type a member access after the imported type.
    session.change_document(
        B,
        "import pkg.Type\nclass Baz\n  method qux(): Int\n    use Type.\n  end\nend",
    );
    let snapshot = session.snapshot();

    let found = labels(handle_completion(&completion_params(B, 3, 13), &snapshot));
    assert!(found.contains(&"size".to_string()), "got {found:?}");
    assert!(found.contains(&"of".to_string()));
    assert!(found.contains(&"MAX".to_string()));
}

#[test]
fn unqualified_completion_merges_scopes_and_imports() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let found = labels(handle_completion(&completion_params(A, 4, 8), &snapshot));
    for expected in ["local", "n", "count", "bar", "Foo", "Type"] {
        assert!(found.contains(&expected.to_string()), "missing {expected} in {found:?}");
    }
    // Classes from other open files are visible too.
    assert!(found.contains(&"Baz".to_string()));
}

#[test]
fn completion_prefix_filters() {
    let session = fixture_session();
    session.change_document(
        B,
        "import pkg.Type\nclass Baz\n  method qux(): Int\n    use Type.s\n  end\nend",
    );
    let snapshot = session.snapshot();

    let found = labels(handle_completion(&completion_params(B, 3, 14), &snapshot));
    assert_eq!(found, vec!["size".to_string()]);
}

#[test]
fn hover_shows_method_signature() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let hover = handle_hover(&hover_params(A, 3, 10), &snapshot).expect("hover should hit");
    assert!(hover_text(hover).contains("method bar(n: Int): Int"));
}

#[test]
fn hover_on_import_shows_classpath_type() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let hover = handle_hover(&hover_params(A, 6, 9), &snapshot).expect("hover should hit");
    let text = hover_text(hover);
    assert!(text.contains("import pkg.Type"));
    assert!(text.contains("3 members"));
}

#[test]
fn hover_succeeds_on_clean_file_despite_error_elsewhere() {
    let front_end = Arc::new(FixtureFrontEnd::new());
    let session = Arc::new(Session::new(front_end, None, Config::default()));
    session.open_document(A, "class Foo\n  method bar()\n?\n  end\nend");
    session.open_document(B, B_TEXT);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.generation.diagnostics(A).len(), 1);

    let hover = handle_hover(&hover_params(B, 1, 7), &snapshot).expect("hover should hit");
    assert!(hover_text(hover).contains("class Baz"));
}

#[test]
fn empty_position_yields_empty_results_not_errors() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    // Far beyond the end of the file.
    assert!(handle_hover(&hover_params(A, 90, 0), &snapshot).is_none());
    assert!(handle_goto_definition(&definition_params(A, 90, 0), &snapshot).is_none());
    assert!(handle_references(&reference_params(A, 90, 0, true), &snapshot).is_none());
}

#[test]
fn references_cover_declaration_and_uses() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    // On the `count` field declaration.
    let with_decl = handle_references(&reference_params(A, 2, 9, true), &snapshot)
        .expect("references should be found");
    let lines: Vec<u32> = with_decl.iter().map(|l| l.range.start.line).collect();
    assert_eq!(lines, vec![2, 7]);
    // The declaration edit points at the identifier, not the whole line.
    assert_eq!(with_decl[0].range.start.character, 8);
    assert_eq!(with_decl[0].range.end.character, 13);

    let without_decl = handle_references(&reference_params(A, 2, 9, false), &snapshot)
        .expect("references should be found");
    assert_eq!(without_decl.len(), 1);
    assert_eq!(without_decl[0].range.start.line, 7);
}

#[test]
fn rename_rewrites_declaration_and_references() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let params = RenameParams {
        text_document_position: at(A, 2, 9),
        new_name: "total".to_string(),
        work_done_progress_params: Default::default(),
    };
    let edit = handle_rename(&params, &snapshot).expect("rename should produce edits");
    let changes = edit.changes.expect("changes map");
    let edits = &changes[&uri(A)];

    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0].range.start.line, 2);
    assert_eq!(edits[0].range.start.character, 8);
    assert_eq!(edits[0].new_text, "total");
    assert_eq!(edits[1].range.start.line, 7);
    assert_eq!(edits[1].range.start.character, 20);
}

#[test]
fn rename_to_invalid_identifier_is_rejected() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let params = RenameParams {
        text_document_position: at(A, 2, 9),
        new_name: "not valid!".to_string(),
        work_done_progress_params: Default::default(),
    };
    assert!(handle_rename(&params, &snapshot).is_none());
}

#[test]
fn signature_help_tracks_active_parameter() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let params = SignatureHelpParams {
        context: None,
        text_document_position_params: at(A, 7, 14),
        work_done_progress_params: Default::default(),
    };
    let help = handle_signature_help(&params, &snapshot).expect("signature help");
    assert!(help.signatures[0].label.contains("bar(n: Int): Int"));
    assert_eq!(help.active_parameter, Some(0));

    let params = SignatureHelpParams {
        context: None,
        text_document_position_params: at(A, 7, 21),
        work_done_progress_params: Default::default(),
    };
    let help = handle_signature_help(&params, &snapshot).expect("signature help");
    assert_eq!(help.active_parameter, Some(1));
}

#[test]
fn document_symbols_nest_by_structure() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let params = DocumentSymbolParams {
        text_document: TextDocumentIdentifier { uri: uri(A) },
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
    };
    let Some(DocumentSymbolResponse::Nested(symbols)) =
        handle_document_symbols(&params, &snapshot)
    else {
        panic!("expected nested symbols");
    };

    // Top level: the import and the class, in position order.
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[0].name, "Type");
    assert_eq!(symbols[1].name, "Foo");

    let foo_children = symbols[1].children.as_ref().expect("class members");
    let names: Vec<&str> = foo_children.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["count", "bar"]);

    let bar_children = foo_children[1].children.as_ref().expect("method locals");
    assert!(bar_children.iter().any(|s| s.name == "local"));
}

#[test]
fn workspace_symbols_filter_and_order_by_file() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    let params = WorkspaceSymbolParams {
        query: "ba".to_string(),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
    };
    let symbols = handle_workspace_symbols(&params, &snapshot).expect("symbols");
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["bar", "Baz"]);
    assert_eq!(symbols[0].location.uri.as_str(), A);
    assert_eq!(symbols[1].location.uri.as_str(), B);
}

#[test]
fn type_definition_follows_declared_type() {
    let session = fixture_session();
    let snapshot = session.snapshot();

    // `var other: Foo` jumps to `class Foo`.
    let response = handle_goto_type_definition(&definition_params(A, 5, 8), &snapshot)
        .expect("type definition should resolve");
    let GotoDefinitionResponse::Scalar(location) = response else {
        panic!("expected a single location");
    };
    assert_eq!(location.uri.as_str(), A);
    assert_eq!(location.range.start.line, 1);
}

#[test]
fn degraded_classpath_still_serves_local_completion() {
    let front_end = Arc::new(FixtureFrontEnd::new().failing_scans());
    let session = Arc::new(Session::new(front_end, None, Config::default()));
    session.open_document(A, A_TEXT);
    session.apply_classpath(vec![PathBuf::from("broken.jar")]);

    assert!(!session.take_warnings().is_empty());

    let snapshot = session.snapshot();
    let found = labels(handle_completion(&completion_params(A, 4, 8), &snapshot));
    assert!(found.contains(&"local".to_string()));
    assert!(found.contains(&"count".to_string()));

    // Qualified member completion has nothing to offer without the scan.
    session.change_document(A, "import pkg.Type\nuse Type.");
    let snapshot = session.snapshot();
    assert!(handle_completion(&completion_params(A, 1, 9), &snapshot).is_none());
}
