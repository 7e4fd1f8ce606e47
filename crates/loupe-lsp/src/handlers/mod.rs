//! Query providers.
//!
//! Each provider is a pure function of an immutable [`crate::session::WorldSnapshot`]
//! plus the request parameters. Providers never mutate the document store,
//! the index, or the classpath cache; an empty result is `None`, never an
//! error.

pub mod utils;

pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod hover;
pub mod references;
pub mod rename;
pub mod signature_help;
pub mod symbols;
pub mod type_definition;
pub mod workspace_symbols;
