//! Utility types and traits for the importer.

use cellml_ir::{DocumentKey, Model};
use cellml_shared::Diagnostics;

mod import_stack;

pub use import_stack::{ImportFrame, ImportStack};

/// Trait for loading and parsing the documents imports refer to.
///
/// The importer never touches the filesystem itself; every document it
/// needs is requested from a loader.
pub trait DocumentLoader {
    /// The error returned when a document cannot be loaded.
    type Error: std::fmt::Display;

    /// Loads and parses the document stored under `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The library key of the document
    /// * `diagnostics` - Receives the problems found in a document that
    ///   still loads, such as elements with missing attributes
    ///
    /// # Returns
    ///
    /// Returns `Ok(Model)` if the document loads, or `Err(Self::Error)` if it
    /// does not.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the document cannot be read or is not a
    /// usable CellML model.
    fn load_model(
        &self,
        key: &DocumentKey,
        diagnostics: &mut Diagnostics,
    ) -> Result<Model, Self::Error>;
}

impl<L: DocumentLoader> DocumentLoader for &L {
    type Error = L::Error;

    fn load_model(
        &self,
        key: &DocumentKey,
        diagnostics: &mut Diagnostics,
    ) -> Result<Model, Self::Error> {
        (**self).load_model(key, diagnostics)
    }
}

/// A generic stack implementation with circular dependency detection.
#[derive(Debug, Clone)]
pub struct Stack<T: PartialEq + Clone> {
    items: Vec<T>,
}

impl<T: PartialEq + Clone> Stack<T> {
    /// Creates a new empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: vec![] }
    }

    /// Pushes an item onto the top of the stack.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Removes and returns the top item from the stack.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Returns the number of items on the stack.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the stack is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds a circular dependency starting from the given item.
    ///
    /// If the item is already on the stack, returns every item from its
    /// first occurrence to the top of the stack, followed by the item
    /// itself.
    #[must_use]
    pub fn find_circular_dependency(&self, item: &T) -> Option<Vec<T>> {
        let item_index = self.items.iter().position(|i| i == item)?;

        let mut circular_dependency = self.items[item_index..].to_vec();
        circular_dependency.push(item.clone());

        Some(circular_dependency)
    }
}

impl<T: PartialEq + Clone> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
