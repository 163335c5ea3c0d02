//! Errors reported while resolving and flattening imports.
//!
//! None of these abort an operation. They are turned into
//! [`Issue`](cellml_shared::Issue)s through [`AsIssue`](cellml_shared::AsIssue)
//! and collected in the caller's diagnostics.

mod flatten;
mod import;

pub use flatten::FlattenWarning;
pub use import::ImportError;
