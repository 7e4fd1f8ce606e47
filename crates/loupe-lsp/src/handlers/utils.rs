//! Shared lookup and formatting logic for the query providers.

use crate::index::{AstIndex, NodeEntry, NodeId};
use loupe_core::{NodeKind, Position, Range};
use lsp_types::{CompletionItemKind, Location, SymbolKind, Uri};

/// Convert an LSP position to the internal 0-based convention.
///
/// Both sides are already 0-based; this pins the conversion to one place
/// in case the conventions ever diverge.
pub fn from_lsp_position(pos: lsp_types::Position) -> Position {
    Position::new(pos.line, pos.character)
}

/// Convert an internal position to LSP.
pub fn to_lsp_position(pos: Position) -> lsp_types::Position {
    lsp_types::Position::new(pos.line, pos.column)
}

/// Convert an internal range to LSP.
pub fn to_lsp_range(range: Range) -> lsp_types::Range {
    lsp_types::Range {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}

/// Parse a canonical URI string into an LSP URI.
pub fn lsp_uri(uri: &str) -> Option<Uri> {
    uri.parse().ok()
}

/// The full-range location of a node.
pub fn node_location(index: &AstIndex, id: NodeId) -> Option<Location> {
    let entry = index.node(id);
    Some(Location {
        uri: lsp_uri(index.file_uri(id))?,
        range: to_lsp_range(entry.range),
    })
}

/// The precise range of a node's name within the file text.
///
/// Declaration nodes span their whole body; rename and references need
/// the identifier itself. Scans the node's range for the first
/// word-bounded occurrence of the name, falling back to the node range if
/// the text does not contain it (synthetic nodes).
pub fn name_range(text: &str, entry: &NodeEntry) -> Range {
    let Some(name) = entry.name.as_deref() else {
        return entry.range;
    };

    let start_line = entry.range.start.line as usize;
    let end_line = entry.range.end.line as usize;

    for (offset, line) in text
        .lines()
        .enumerate()
        .skip(start_line)
        .take_while(|(i, _)| *i <= end_line)
    {
        let chars: Vec<char> = line.chars().collect();
        let min_col = if offset == start_line {
            entry.range.start.column as usize
        } else {
            0
        };
        let max_col = if offset == end_line {
            entry.range.end.column as usize
        } else {
            chars.len()
        };

        let mut col = min_col;
        let name_chars: Vec<char> = name.chars().collect();
        while col + name_chars.len() <= chars.len() && col <= max_col {
            let matches = chars[col..col + name_chars.len()] == name_chars[..];
            let bounded_left = col == 0 || !is_ident_char(chars[col - 1]);
            let bounded_right = col + name_chars.len() >= chars.len()
                || !is_ident_char(chars[col + name_chars.len()]);
            if matches && bounded_left && bounded_right {
                return Range::new(
                    Position::new(offset as u32, col as u32),
                    Position::new(offset as u32, (col + name_chars.len()) as u32),
                );
            }
            col += 1;
        }
    }

    entry.range
}

/// Whether a character can appear in an identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// What the cursor sits on for completion purposes.
#[derive(Debug, PartialEq, Eq)]
pub struct CompletionContext {
    /// Identifier before a `.` immediately preceding the prefix, if any.
    pub qualifier: Option<String>,
    /// Identifier characters between the last boundary and the cursor.
    pub prefix: String,
}

/// Extract qualifier and prefix at a position: `foo.ba|` yields
/// `qualifier = Some("foo")`, `prefix = "ba"`.
pub fn completion_context(text: &str, position: Position) -> CompletionContext {
    let line = text.lines().nth(position.line as usize).unwrap_or("");
    let chars: Vec<char> = line.chars().collect();
    let cursor = (position.column as usize).min(chars.len());

    let mut start = cursor;
    while start > 0 && is_ident_char(chars[start - 1]) {
        start -= 1;
    }
    let prefix: String = chars[start..cursor].iter().collect();

    let mut qualifier = None;
    if start > 0 && chars[start - 1] == '.' {
        let mut qstart = start - 1;
        while qstart > 0 && is_ident_char(chars[qstart - 1]) {
            qstart -= 1;
        }
        if qstart < start - 1 {
            qualifier = Some(chars[qstart..start - 1].iter().collect());
        }
    }

    CompletionContext { qualifier, prefix }
}

/// Resolve the declaration a node refers to.
///
/// A declaration resolves to itself. A reference resolves through the
/// nearest enclosing scope that declares its name, then through the
/// symbol table with same-file declarations preferred.
pub fn resolve_declaration(index: &AstIndex, id: NodeId) -> Option<NodeId> {
    let node = index.node(id);
    if node.kind.is_declaration() {
        return Some(id);
    }
    let name = node.name.as_deref()?;
    let uri = index.file_uri(id);

    let mut scope = node.parent();
    while let Some(parent_id) = scope {
        let parent = index.node(parent_id);
        for &child in parent.children() {
            let candidate = index.node(child);
            if candidate.kind.is_declaration() && candidate.name.as_deref() == Some(name) {
                return Some(child);
            }
        }
        scope = parent.parent();
    }

    let declared = index.declarations_named(name);
    declared
        .iter()
        .copied()
        .find(|&d| index.file_uri(d) == uri)
        .or_else(|| declared.first().copied())
}

/// Map a node kind to an LSP symbol kind.
pub fn symbol_kind(kind: NodeKind) -> SymbolKind {
    match kind {
        NodeKind::Class => SymbolKind::CLASS,
        NodeKind::Method => SymbolKind::METHOD,
        NodeKind::Field => SymbolKind::FIELD,
        NodeKind::Variable | NodeKind::Parameter => SymbolKind::VARIABLE,
        NodeKind::Import => SymbolKind::MODULE,
        _ => SymbolKind::NULL,
    }
}

/// Map a node kind to an LSP completion item kind.
pub fn completion_kind(kind: NodeKind) -> CompletionItemKind {
    match kind {
        NodeKind::Class => CompletionItemKind::CLASS,
        NodeKind::Method => CompletionItemKind::METHOD,
        NodeKind::Field => CompletionItemKind::FIELD,
        NodeKind::Variable | NodeKind::Parameter => CompletionItemKind::VARIABLE,
        NodeKind::Import => CompletionItemKind::MODULE,
        _ => CompletionItemKind::TEXT,
    }
}

/// One-line description of a node, used for hover and completion detail.
pub fn node_label(entry: &NodeEntry) -> String {
    let name = entry.name.as_deref().unwrap_or("<anonymous>");
    let typed = |prefix: &str| match &entry.type_name {
        Some(ty) => format!("{prefix} {name}: {ty}"),
        None => format!("{prefix} {name}"),
    };
    match entry.kind {
        NodeKind::Class => format!("class {name}"),
        NodeKind::Method => {
            let params: Vec<String> = entry.params.iter().map(loupe_core::ParamSig::render).collect();
            let ret = entry
                .type_name
                .as_ref()
                .map(|t| format!(": {t}"))
                .unwrap_or_default();
            format!("method {}({}){}", name, params.join(", "), ret)
        }
        NodeKind::Field => typed("field"),
        NodeKind::Variable => typed("var"),
        NodeKind::Parameter => typed("param"),
        NodeKind::Import => format!(
            "import {}",
            entry.qualified_name.as_deref().unwrap_or(name)
        ),
        NodeKind::Call => format!("{name}(…)"),
        _ => name.to_string(),
    }
}
