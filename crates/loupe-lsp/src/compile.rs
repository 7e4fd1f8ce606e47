//! Front-end adapter: batch compilation of the open document set.
//!
//! The adapter is the only place that talks to the external compiler. It
//! compiles exactly the open set (never the whole project tree), isolates
//! per-file failures so one broken file cannot abort the batch, and owns
//! the two boundary normalizations: canonical file identity and the shift
//! from the front end's 1-based positions to the internal 0-based
//! convention.

use crate::classpath::ClasspathSnapshot;
use crate::vfs::canonical_uri;
use loupe_core::{Diagnostic, FrontEnd, NodeKind, Position, Range, SyntaxNode};
use std::collections::BTreeMap;

/// The compiled form of one open file, positions already 0-based.
#[derive(Debug, Clone)]
pub struct CompiledFile {
    /// The text the file was compiled from.
    pub text: String,
    /// Root syntax node. On a fatal front-end failure this is an
    /// empty-but-valid placeholder covering the file.
    pub root: SyntaxNode,
    /// Parse/resolve diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile the open set against a classpath snapshot.
///
/// Output is keyed by canonical URI. Each file compiles independently: a
/// fatal error in one file records a diagnostic for that file and a
/// placeholder tree, and the batch continues.
pub fn compile_open_set(
    front_end: &dyn FrontEnd,
    open_set: &[(String, String)],
    classpath: &ClasspathSnapshot,
) -> BTreeMap<String, CompiledFile> {
    let mut compiled = BTreeMap::new();

    for (uri, text) in open_set {
        let canonical = canonical_uri(uri);
        let file = match front_end.compile_unit(&canonical, text, classpath.entries()) {
            Ok(unit) => CompiledFile {
                text: text.clone(),
                root: ingest_tree(unit.root),
                diagnostics: unit.diagnostics.into_iter().map(ingest_diagnostic).collect(),
            },
            Err(err) => {
                tracing::warn!(uri = %canonical, error = %err, "front end failed, indexing placeholder");
                CompiledFile {
                    text: text.clone(),
                    root: placeholder_unit(text),
                    diagnostics: vec![Diagnostic::error(full_range(text), err.to_string())],
                }
            }
        };
        compiled.insert(canonical, file);
    }

    compiled
}

/// Shift a front-end tree from 1-based to 0-based positions.
///
/// This is the single point where the external convention is normalized;
/// no other module may apply the shift.
fn ingest_tree(mut node: SyntaxNode) -> SyntaxNode {
    node.range = ingest_range(node.range);
    node.children = node.children.into_iter().map(ingest_tree).collect();
    node
}

fn ingest_diagnostic(mut diag: Diagnostic) -> Diagnostic {
    diag.range = ingest_range(diag.range);
    diag
}

fn ingest_range(range: Range) -> Range {
    Range::new(
        Position::from_one_based(range.start.line, range.start.column),
        Position::from_one_based(range.end.line, range.end.column),
    )
}

/// An empty-but-valid unit tree for a file the front end could not
/// compile. It spans the whole text so position queries hit it instead of
/// falling into a hole.
fn placeholder_unit(text: &str) -> SyntaxNode {
    SyntaxNode::new(NodeKind::Unit, full_range(text))
}

/// 0-based range covering all of `text`.
fn full_range(text: &str) -> Range {
    let mut line = 0u32;
    let mut column = 0u32;
    for ch in text.chars() {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    Range::new(Position::new(0, 0), Position::new(line, column))
}
