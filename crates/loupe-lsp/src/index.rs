//! Generation-scoped AST index.
//!
//! The index flattens every compiled tree into one node table and answers
//! the two lookups every query provider needs: position → innermost node,
//! and name → declarations. Structural links are table indices
//! ([`NodeId`]), never references, so entries cannot alias nodes from any
//! other generation.

use crate::compile::CompiledFile;
use loupe_core::{NodeKind, ParamSig, Position, SyntaxNode};
use std::collections::{BTreeMap, HashMap};

/// Index of a node in its generation's node table.
///
/// Ids are meaningless outside the generation that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position in the node table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A flattened syntax node with structural links as table indices.
#[derive(Debug)]
pub struct NodeEntry {
    /// Node kind.
    pub kind: NodeKind,
    /// Source range (0-based).
    pub range: loupe_core::Range,
    /// Declared or referenced simple name.
    pub name: Option<String>,
    /// Fully qualified name (imports).
    pub qualified_name: Option<String>,
    /// Declared type or return type.
    pub type_name: Option<String>,
    /// Declared parameters (methods).
    pub params: Vec<ParamSig>,
    file: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeEntry {
    /// Structural parent, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Structural children in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Per-file position index: ids sorted by range start, plus a running
/// maximum of range ends so a backward walk can stop as soon as no earlier
/// node can still contain the probe position.
#[derive(Debug, Default)]
struct FileIndex {
    ids: Vec<NodeId>,
    max_end: Vec<Position>,
}

/// The queryable model of one generation.
#[derive(Debug, Default)]
pub struct AstIndex {
    files: Vec<String>,
    file_lookup: HashMap<String, u32>,
    nodes: Vec<NodeEntry>,
    by_file: Vec<FileIndex>,
    /// Declared name -> declaring nodes, in file-then-position order.
    symbols: BTreeMap<String, Vec<NodeId>>,
    /// Import declarations per file.
    imports: Vec<Vec<NodeId>>,
}

impl AstIndex {
    /// Build the index for a compiled file set.
    pub fn build(compiled: &BTreeMap<String, CompiledFile>) -> Self {
        let mut index = Self::default();

        for (uri, file) in compiled {
            let file_idx = index.files.len() as u32;
            index.files.push(uri.clone());
            index.file_lookup.insert(uri.clone(), file_idx);
            index.imports.push(Vec::new());

            let first = index.nodes.len();
            index.flatten(&file.root, file_idx, None);

            // Sort by start; among equal starts, enclosing (larger) ranges
            // first so parents precede their zero-width-offset children.
            let mut ids: Vec<NodeId> =
                (first..index.nodes.len()).map(|i| NodeId(i as u32)).collect();
            ids.sort_by(|a, b| {
                let ra = index.nodes[a.index()].range;
                let rb = index.nodes[b.index()].range;
                ra.start.cmp(&rb.start).then(rb.end.cmp(&ra.end))
            });

            let mut max_end = Vec::with_capacity(ids.len());
            let mut furthest = Position::new(0, 0);
            for id in &ids {
                furthest = furthest.max(index.nodes[id.index()].range.end);
                max_end.push(furthest);
            }

            index.by_file.push(FileIndex { ids, max_end });
        }

        index
    }

    /// Flatten one subtree in pre-order, wiring parent/child indices.
    fn flatten(&mut self, node: &SyntaxNode, file: u32, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeEntry {
            kind: node.kind,
            range: node.range,
            name: node.name.clone(),
            qualified_name: node.qualified_name.clone(),
            type_name: node.type_name.clone(),
            params: node.params.clone(),
            file,
            parent,
            children: Vec::new(),
        });

        if node.kind.is_declaration() {
            if let Some(name) = &node.name {
                self.symbols.entry(name.clone()).or_default().push(id);
            }
        }
        if node.kind == NodeKind::Import {
            self.imports[file as usize].push(id);
        }

        for child in &node.children {
            let child_id = self.flatten(child, file, Some(id));
            self.nodes[id.index()].children.push(child_id);
        }
        id
    }

    /// Look up a node entry.
    pub fn node(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.index()]
    }

    /// The canonical URI of the file owning a node.
    pub fn file_uri(&self, id: NodeId) -> &str {
        &self.files[self.node(id).file as usize]
    }

    /// All indexed files, in URI order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// All node ids of one file, sorted by range start.
    pub fn nodes_in_file(&self, uri: &str) -> &[NodeId] {
        self.file_lookup
            .get(uri)
            .map(|&idx| self.by_file[idx as usize].ids.as_slice())
            .unwrap_or(&[])
    }

    /// The innermost node containing `pos` in `uri`.
    ///
    /// Smallest containing range wins. Identical ranges break toward the
    /// more specific declaration kind, then toward the node latest in the
    /// structural visit order.
    pub fn find_node_at(&self, uri: &str, pos: Position) -> Option<NodeId> {
        let file_idx = *self.file_lookup.get(uri)?;
        let file = &self.by_file[file_idx as usize];

        // First candidate index past the probe: every node at or after it
        // starts after `pos` and cannot contain it.
        let hi = file
            .ids
            .partition_point(|id| self.nodes[id.index()].range.start <= pos);

        let mut best: Option<NodeId> = None;
        for i in (0..hi).rev() {
            if file.max_end[i] < pos {
                // No earlier node reaches this far; done.
                break;
            }
            let id = file.ids[i];
            let node = &self.nodes[id.index()];
            if !node.range.contains(pos) {
                continue;
            }
            best = Some(match best {
                None => id,
                Some(current) => self.tighter(id, current),
            });
        }
        best
    }

    /// Pick the better of two nodes containing the same position.
    fn tighter(&self, a: NodeId, b: NodeId) -> NodeId {
        let na = &self.nodes[a.index()];
        let nb = &self.nodes[b.index()];
        let key_a = (na.range.size_key(), std::cmp::Reverse(na.kind.specificity()), std::cmp::Reverse(a));
        let key_b = (nb.range.size_key(), std::cmp::Reverse(nb.kind.specificity()), std::cmp::Reverse(b));
        if key_a < key_b { a } else { b }
    }

    /// Declarations with exactly this name, in file-then-position order.
    pub fn declarations_named(&self, name: &str) -> &[NodeId] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declarations whose name starts with `prefix`, grouped by name.
    pub fn declarations_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [NodeId])> + 'a {
        self.symbols
            .range(prefix.to_string()..)
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Import declarations of one file.
    pub fn imports_in(&self, uri: &str) -> &[NodeId] {
        self.file_lookup
            .get(uri)
            .map(|&idx| self.imports[idx as usize].as_slice())
            .unwrap_or(&[])
    }

    /// The import in `uri` binding `simple_name`, if any.
    pub fn find_import(&self, uri: &str, simple_name: &str) -> Option<NodeId> {
        self.imports_in(uri)
            .iter()
            .copied()
            .find(|&id| self.node(id).name.as_deref() == Some(simple_name))
    }

    /// Total number of indexed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
