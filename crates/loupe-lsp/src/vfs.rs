//! Document store for open files.
//!
//! The store is the source of truth for "what must be (re)compiled": it
//! tracks the open set and its current text, applies edits in receipt
//! order, and records dirtiness for the session orchestrator. Published
//! generations copy the text they need, so nothing here is referenced by
//! in-flight queries.

use ropey::Rope;
use std::collections::BTreeMap;

/// An open document.
#[derive(Debug)]
pub struct Document {
    /// Document content as a rope for cheap edits.
    content: Rope,
    /// Edit version, bumped on every change.
    version: u64,
}

impl Document {
    /// Create a document at version 1.
    pub fn new(text: &str) -> Self {
        Self {
            content: Rope::from_str(text),
            version: 1,
        }
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    /// Current edit version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the content, bumping the version.
    fn replace(&mut self, text: &str) {
        self.content = Rope::from_str(text);
        self.version += 1;
    }
}

/// Store of open documents, keyed by canonical URI.
///
/// A `BTreeMap` keeps the open set ordered, so [`DocumentStore::open_set`]
/// yields a deterministic compile batch.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: BTreeMap<String, Document>,
    /// Set on every mutation; cleared by the orchestrator when it captures
    /// an open-set snapshot for recompilation.
    dirty: bool,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document. Reopening an already-open URI replaces its text
    /// like an edit, preserving the version counter.
    pub fn open(&mut self, uri: &str, text: &str) {
        match self.documents.get_mut(uri) {
            Some(doc) => doc.replace(text),
            None => {
                self.documents.insert(uri.to_string(), Document::new(text));
            }
        }
        self.dirty = true;
    }

    /// Apply a full-text edit to an open document. Edits to unknown URIs
    /// are dropped; the transport layer only sends changes for open files.
    pub fn change(&mut self, uri: &str, text: &str) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.replace(text);
            self.dirty = true;
        }
    }

    /// Close and drop a document.
    pub fn close(&mut self, uri: &str) {
        if self.documents.remove(uri).is_some() {
            self.dirty = true;
        }
    }

    /// Current text of one document.
    pub fn text(&self, uri: &str) -> Option<String> {
        self.documents.get(uri).map(Document::text)
    }

    /// Current edit version of one document.
    pub fn version(&self, uri: &str) -> Option<u64> {
        self.documents.get(uri).map(Document::version)
    }

    /// Ordered snapshot of the open set as `(uri, text)` pairs.
    pub fn open_set(&self) -> Vec<(String, String)> {
        self.documents
            .iter()
            .map(|(uri, doc)| (uri.clone(), doc.text()))
            .collect()
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether a mutation happened since the last [`Self::clear_dirty`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Called by the orchestrator at the moment it
    /// captures the open set for a recompilation pass.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Normalize a URI to its canonical form: lowercase scheme, forward
/// slashes, no `.` segments, `..` segments resolved.
///
/// The front end and the document store both key by this form, so file
/// identities compare equal regardless of how many path-separator variants
/// the original request used.
pub fn canonical_uri(raw: &str) -> String {
    let raw = raw.replace('\\', "/");
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
        None => ("file".to_string(), raw.as_str()),
    };

    // `file://localhost/...` and `file:///...` are the same authority.
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("{}:///{}", scheme, segments.join("/"))
}
