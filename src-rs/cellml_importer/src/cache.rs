//! The library of documents loaded while resolving imports.

use cellml_ir::{DocumentKey, Model};
use indexmap::IndexMap;

/// Maps normalized document keys to the models loaded from them.
///
/// Documents are kept in the order they were first loaded. Each key is
/// loaded at most once per library; later imports of the same document
/// reuse the stored model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionCache {
    documents: IndexMap<DocumentKey, Model>,
}

impl ResolutionCache {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: IndexMap::new(),
        }
    }

    /// Returns the model stored under `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The normalized location of the document
    ///
    /// # Returns
    ///
    /// Returns `Some(model)` if the document was loaded or added, or `None`
    /// if the library has never seen it.
    #[must_use]
    pub fn get(&self, key: &DocumentKey) -> Option<&Model> {
        self.documents.get(key)
    }

    /// Returns the model stored under `key`, mutably.
    pub fn get_mut(&mut self, key: &DocumentKey) -> Option<&mut Model> {
        self.documents.get_mut(key)
    }

    /// Stores `model` under `key`.
    ///
    /// A key that is already stored keeps its position in the load order.
    ///
    /// # Arguments
    ///
    /// * `key` - The normalized location of the document
    /// * `model` - The parsed document
    ///
    /// # Returns
    ///
    /// Returns the model previously stored under `key`, if any.
    pub fn put(&mut self, key: DocumentKey, model: Model) -> Option<Model> {
        self.documents.insert(key, model)
    }

    /// Returns true if a model is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.documents.contains_key(key)
    }

    /// Returns the number of stored models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the key at `index`, in load order.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<&DocumentKey> {
        self.documents.get_index(index).map(|(key, _)| key)
    }

    /// Returns the key and model at `index`, in load order.
    ///
    /// # Returns
    ///
    /// Returns `None` if `index` is not less than [`ResolutionCache::len`].
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&DocumentKey, &Model)> {
        self.documents.get_index(index)
    }

    /// Iterates over the stored models in load order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, DocumentKey, Model> {
        self.documents.iter()
    }

    /// Removes every stored model.
    pub fn clear(&mut self) {
        self.documents.clear();
    }
}

impl<'a> IntoIterator for &'a ResolutionCache {
    type Item = (&'a DocumentKey, &'a Model);
    type IntoIter = indexmap::map::Iter<'a, DocumentKey, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
