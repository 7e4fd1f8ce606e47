//! Core types for the Loupe analysis engine.
//!
//! This crate defines the data model shared between the analysis core and
//! its external collaborators:
//!
//! - [`Position`] / [`Range`] - 0-based source coordinates
//! - [`SyntaxNode`] / [`NodeKind`] - the tree a front-end compiler produces
//! - [`Diagnostic`] / [`Severity`] - per-file parse/resolve findings
//! - [`ClassInfo`] / [`MemberSignature`] - classpath scan output
//! - [`FrontEnd`] / [`DependencyResolver`] - the boundary traits the
//!   analysis core consumes
//!
//! Everything here is plain, immutable data; the live state machinery
//! (document store, generations, caches) lives in `loupe-lsp`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diagnostic;
pub mod frontend;
pub mod members;
pub mod node;
pub mod span;

pub use diagnostic::{Diagnostic, Severity};
pub use frontend::{CompiledUnit, DependencyResolver, FrontEnd, FrontEndError, ResolveError};
pub use members::{ClassInfo, MemberKind, MemberSignature};
pub use node::{NodeKind, ParamSig, SyntaxNode};
pub use span::{Position, Range};
