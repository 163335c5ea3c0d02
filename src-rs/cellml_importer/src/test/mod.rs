//! Test utilities for the importer.

mod document_loader;

pub use document_loader::TestDocumentLoader;
