//! Reading and writing CellML 2.0 documents.
//!
//! [`parse_model`] turns a document into a [`Model`](cellml_ir::Model),
//! with every `import` element as an import source and its children as
//! placeholders. [`print_model`] writes a model back out.
//!
//! Only the parts of a document the importer works with are modelled:
//! imports, units, components with their variables and math, connections
//! and encapsulation. Math is kept as raw MathML text.

pub mod error;
mod reader;
mod writer;

pub use crate::error::{ParseError, WriteError};
pub use crate::reader::parse_model;
pub use crate::writer::print_model;
