//! Boundary traits for the external collaborators.
//!
//! The analysis core does not implement language semantics or dependency
//! resolution itself. It consumes two externally-provided services:
//!
//! - a [`FrontEnd`] that turns source text plus a classpath into a syntax
//!   tree with diagnostics, and can enumerate the types reachable through
//!   a classpath, and
//! - a [`DependencyResolver`] that discovers a project's classpath entries
//!   from its build configuration.
//!
//! Both are used behind `Arc<dyn ...>` so implementations can be swapped
//! in tests.

use crate::diagnostic::Diagnostic;
use crate::members::ClassInfo;
use crate::node::SyntaxNode;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by a front-end compiler.
///
/// These are the *fatal* per-call failures. Ordinary syntax and resolution
/// problems come back as diagnostics on a successful [`CompiledUnit`].
#[derive(Debug, Error)]
pub enum FrontEndError {
    /// The compiler could not produce any tree for a file.
    #[error("compilation failed for {uri}: {message}")]
    Compile {
        /// Canonical URI of the failed file.
        uri: String,
        /// Compiler-reported reason.
        message: String,
    },

    /// A classpath scan failed.
    #[error("classpath scan failed: {message}")]
    Scan {
        /// Scanner-reported reason.
        message: String,
    },
}

/// The result of compiling one file.
///
/// Node positions in `root` are 1-based line/column, the convention most
/// compiler toolchains report. The adapter shifts them to the internal
/// 0-based convention immediately on ingestion; nothing downstream of the
/// adapter ever sees a 1-based position.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Root syntax node covering the whole file.
    pub root: SyntaxNode,
    /// Parse/resolve diagnostics for the file.
    pub diagnostics: Vec<Diagnostic>,
}

/// An external compiler front end.
pub trait FrontEnd: Send + Sync {
    /// Compile a single file against the given classpath entries.
    ///
    /// `uri` is canonical (scheme + absolute path, `/` separators); the
    /// returned tree must not embed any other spelling of the file
    /// identity.
    fn compile_unit(
        &self,
        uri: &str,
        text: &str,
        classpath: &[PathBuf],
    ) -> Result<CompiledUnit, FrontEndError>;

    /// Enumerate the types reachable through the given classpath entries.
    ///
    /// This is the class-loading facility the classpath cache scans
    /// through. It may be slow; callers bound it with a timeout.
    fn scan_classpath(&self, entries: &[PathBuf]) -> Result<Vec<ClassInfo>, FrontEndError>;
}

/// Errors surfaced by a dependency resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The build tool failed or produced unusable output.
    #[error("dependency discovery failed for {root}: {message}")]
    Discovery {
        /// The project root that was being resolved.
        root: PathBuf,
        /// Tool-reported reason.
        message: String,
    },

    /// IO error reading project files.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// An external build-tool dependency resolver.
pub trait DependencyResolver: Send + Sync {
    /// Discover the ordered classpath entries for a project root.
    fn discover(&self, project_root: &Path) -> Result<Vec<PathBuf>, ResolveError>;
}
