//! File system implementation of the importer's document loader

pub mod file_loader;

pub use crate::file_loader::{FileLoader, LoadingError, base_directory};
