//! Shared diagnostics for the CellML import tools
//!
//! Every recoverable problem found while resolving or flattening a model is
//! reported as an [`Issue`] collected into a caller-owned [`Diagnostics`]
//! sink. Issues may point at the offending part of a model through a
//! [`CellmlElement`].

mod diagnostics;
mod element;
pub mod issue;

pub use diagnostics::Diagnostics;
pub use element::CellmlElement;
pub use issue::{AsIssue, Context, Issue, Level, ReferenceRule};
