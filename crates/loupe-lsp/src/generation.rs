//! Immutable generation snapshots.
//!
//! One generation is the complete output of one recompilation pass: the
//! compiled text, diagnostics, and index for every file that was open at
//! the moment the pass started. Generations are published behind `Arc` and
//! never mutated afterward; a query that captured generation N keeps a
//! consistent view even while N+1 is being built and published.

use crate::classpath::Fingerprint;
use crate::compile::CompiledFile;
use crate::index::AstIndex;
use loupe_core::Diagnostic;
use std::collections::BTreeMap;

/// Per-file payload retained by a generation.
///
/// The text is a copy taken at compile time, so closing a document in the
/// store never invalidates a published generation.
#[derive(Debug)]
pub struct FileRecord {
    /// The text the file was compiled from.
    pub text: String,
    /// Parse/resolve diagnostics for the file.
    pub diagnostics: Vec<Diagnostic>,
}

/// One immutable, numbered snapshot of the analyzed project.
#[derive(Debug)]
pub struct Generation {
    id: u64,
    classpath_fingerprint: Fingerprint,
    files: BTreeMap<String, FileRecord>,
    index: AstIndex,
}

impl Generation {
    /// Build a generation from one compilation pass.
    pub fn build(
        id: u64,
        compiled: BTreeMap<String, CompiledFile>,
        classpath_fingerprint: Fingerprint,
    ) -> Self {
        let index = AstIndex::build(&compiled);
        let files = compiled
            .into_iter()
            .map(|(uri, file)| {
                (
                    uri,
                    FileRecord {
                        text: file.text,
                        diagnostics: file.diagnostics,
                    },
                )
            })
            .collect();
        Self {
            id,
            classpath_fingerprint,
            files,
            index,
        }
    }

    /// The initial, empty generation a session starts from.
    pub fn empty() -> Self {
        Self::build(0, BTreeMap::new(), Fingerprint::of(&[]))
    }

    /// Monotonic generation id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Fingerprint of the classpath this generation was built against.
    pub fn classpath_fingerprint(&self) -> &Fingerprint {
        &self.classpath_fingerprint
    }

    /// The queryable index.
    pub fn index(&self) -> &AstIndex {
        &self.index
    }

    /// The text of one file as compiled, if it was part of this pass.
    pub fn text(&self, uri: &str) -> Option<&str> {
        self.files.get(uri).map(|f| f.text.as_str())
    }

    /// Diagnostics of one file.
    pub fn diagnostics(&self, uri: &str) -> &[Diagnostic] {
        self.files
            .get(uri)
            .map(|f| f.diagnostics.as_slice())
            .unwrap_or(&[])
    }

    /// All files with their records, in URI order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.files.iter().map(|(uri, record)| (uri.as_str(), record))
    }

    /// Number of files in this generation.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
