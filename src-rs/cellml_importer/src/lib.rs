//! CellML Import Resolution
//!
//! This crate resolves the imports of CellML models and flattens resolved
//! models into import-free copies.
//!
//! # Overview
//!
//! A model may contain placeholders: components or units that stand for a
//! definition in another document. The [`Importer`] loads those documents
//! through a [`DocumentLoader`], keeps them in a library keyed by their
//! normalized location, and attaches each placeholder's import source to the
//! library document it resolved to. Imported documents are resolved the
//! same way, depth-first.
//!
//! Missing documents, missing items, import loops and overly long import
//! chains are reported as issues in a caller-owned
//! [`Diagnostics`](cellml_shared::Diagnostics) sink. They never stop the
//! resolution of unrelated imports.
//!
//! Once resolved, [`Importer::flatten_model`] produces a copy of the model
//! in which every placeholder is replaced by the definition it imports.
//!
//! # Example
//!
//! ```ignore
//! use cellml_importer::{DocumentLoader, Importer};
//! use cellml_ir::{DocumentKey, Model};
//! use cellml_shared::Diagnostics;
//!
//! struct MyLoader;
//!
//! impl DocumentLoader for MyLoader {
//!     type Error = String;
//!
//!     fn load_model(
//!         &self,
//!         key: &DocumentKey,
//!         diagnostics: &mut Diagnostics,
//!     ) -> Result<Model, Self::Error> {
//!         // Implementation here
//!         todo!()
//!     }
//! }
//!
//! let mut importer = Importer::new(MyLoader);
//! let mut diagnostics = Diagnostics::new();
//!
//! importer.resolve_imports(&mut model, "resources/", &mut diagnostics);
//! let flat = importer.flatten_model(&model, &mut diagnostics);
//! ```

use cellml_ir::{DocumentKey, Model};
use cellml_shared::Diagnostics;

mod cache;
mod dependencies;
pub mod error;
mod flattener;
mod options;
mod resolver;
mod util;

#[cfg(test)]
mod test;

pub use crate::cache::ResolutionCache;
pub use crate::dependencies::{ImportedItem, ModelDependencies, SourceDependencies};
pub use crate::options::{DEFAULT_MAX_DEPTH, ImporterOptions};
pub use crate::util::{DocumentLoader, ImportFrame, ImportStack, Stack};

/// Resolves and flattens the imports of CellML models.
///
/// The importer owns the library of documents it loaded. The library lives
/// as long as the importer, so resolving several models with one importer
/// loads shared documents once.
#[derive(Debug)]
pub struct Importer<L> {
    loader: L,
    library: ResolutionCache,
    options: ImporterOptions,
}

impl<L: DocumentLoader> Importer<L> {
    /// Creates an importer with default options.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self::with_options(loader, ImporterOptions::default())
    }

    /// Creates an importer with the given options.
    #[must_use]
    pub fn with_options(loader: L, options: ImporterOptions) -> Self {
        Self {
            loader,
            library: ResolutionCache::new(),
            options,
        }
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &ImporterOptions {
        &self.options
    }

    /// Returns the loader.
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolves the imports of `model`, reporting problems to `diagnostics`.
    ///
    /// Documents already in the library are not loaded again, so calling
    /// this repeatedly only reports what is still broken. Problems the
    /// loader finds in a document are reported as the document loads.
    ///
    /// # Arguments
    ///
    /// * `model` - The model whose import sources are attached to library
    ///   documents
    /// * `base` - The directory relative urls in `model` start from
    /// * `diagnostics` - Receives every problem found, in the order found
    pub fn resolve_imports(&mut self, model: &mut Model, base: &str, diagnostics: &mut Diagnostics) {
        resolver::resolve_imports(
            model,
            base,
            &self.loader,
            &mut self.library,
            &self.options,
            diagnostics,
        );
    }

    /// Returns a copy of `model` with every resolved placeholder replaced
    /// by the definition it imports.
    ///
    /// Placeholders that are not resolved are copied as imports and
    /// reported to `diagnostics`. Neither `model` nor the library change.
    ///
    /// # Arguments
    ///
    /// * `model` - A model resolved with this importer
    /// * `diagnostics` - Receives the warnings raised while flattening
    ///
    /// # Returns
    ///
    /// The flattened model. It has no import sources unless a placeholder
    /// had to be passed through.
    #[must_use]
    pub fn flatten_model(&self, model: &Model, diagnostics: &mut Diagnostics) -> Model {
        flattener::flatten_model(model, &self.library, &self.options, diagnostics)
    }

    /// Returns the library.
    #[must_use]
    pub const fn library(&self) -> &ResolutionCache {
        &self.library
    }

    /// Returns the number of documents in the library.
    #[must_use]
    pub fn library_count(&self) -> usize {
        self.library.len()
    }

    /// Returns the library model stored for `location`.
    ///
    /// The location is normalized, and includes the base directory the
    /// importing model was resolved against.
    #[must_use]
    pub fn library_model(&self, location: &str) -> Option<&Model> {
        self.library.get(&DocumentKey::new(location))
    }

    /// Returns the library model stored for `location`, mutably.
    pub fn library_model_mut(&mut self, location: &str) -> Option<&mut Model> {
        self.library.get_mut(&DocumentKey::new(location))
    }

    /// Returns the library model at `index`, in load order.
    #[must_use]
    pub fn library_at(&self, index: usize) -> Option<&Model> {
        self.library.get_index(index).map(|(_, model)| model)
    }

    /// Returns the library key at `index`, in load order.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<&DocumentKey> {
        self.library.key(index)
    }

    /// Adds `model` to the library under `location`.
    ///
    /// Imports of `location` then use `model` instead of asking the loader.
    ///
    /// # Arguments
    ///
    /// * `model` - The document to add
    /// * `location` - Where imports find it, normalized before use
    ///
    /// # Returns
    ///
    /// Returns false, leaving the library unchanged, if the location is
    /// taken.
    pub fn add_model(&mut self, model: Model, location: &str) -> bool {
        let key = DocumentKey::new(location);
        if self.library.contains(&key) {
            return false;
        }
        self.library.put(key, model);
        true
    }

    /// Removes every document from the library.
    pub fn remove_all_models(&mut self) {
        self.library.clear();
    }

    /// Detaches the import sources of the library model stored for
    /// `location`, so that it is resolved again on the next pass.
    ///
    /// Returns false if there is no such model.
    pub fn clear_library_imports(&mut self, location: &str) -> bool {
        let Some(model) = self.library_model_mut(location) else {
            return false;
        };
        model.clear_imports();
        true
    }

    /// Lists the library documents `model` depends on, directly or
    /// indirectly, each once.
    #[must_use]
    pub fn requirements<'a>(&'a self, model: &'a Model) -> Vec<(&'a DocumentKey, &'a Model)> {
        dependencies::requirements(model, &self.library)
    }

    /// Describes the imports of `model` and of the documents it uses.
    ///
    /// # Returns
    ///
    /// Returns `None` when the model has no import sources or still has
    /// unresolved imports.
    #[must_use]
    pub fn dependencies(&self, model: &Model) -> Option<ModelDependencies> {
        dependencies::dependencies(model, &self.library)
    }
}

#[cfg(test)]
mod tests {
    use cellml_ir::Component;
    use cellml_shared::ReferenceRule;

    use super::*;
    use crate::test::{
        TestDocumentLoader,
        construct::{concrete_model, gate_model, importing_model},
    };

    fn chained_documents() -> TestDocumentLoader {
        TestDocumentLoader::new([
            (
                "A.cellml",
                importing_model("A", &[("a", "gateEquations", "GateModel.cellml")]),
            ),
            ("GateModel.cellml", gate_model()),
        ])
    }

    #[test]
    fn importer_shares_library_between_models() {
        let mut importer = Importer::new(chained_documents());
        let mut diagnostics = Diagnostics::new();

        let mut first = importing_model("First", &[("gate", "gateEquations", "GateModel.cellml")]);
        let mut second = importing_model("Second", &[("x", "a", "A.cellml")]);
        importer.resolve_imports(&mut first, "", &mut diagnostics);
        importer.resolve_imports(&mut second, "", &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(importer.library_count(), 2);
        assert_eq!(importer.loader().load_count(), 2);
        assert_eq!(
            importer.key(0).map(DocumentKey::as_str),
            Some("GateModel.cellml")
        );
        assert_eq!(importer.library_at(1).map(Model::name), Some("A"));

        let flat = importer.flatten_model(&second, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert!(!flat.has_imports());
    }

    #[test]
    fn importer_uses_models_added_by_hand() {
        let mut importer = Importer::new(TestDocumentLoader::empty());
        assert!(importer.add_model(gate_model(), "lib/GateModel.cellml"));
        assert!(!importer.add_model(gate_model(), "lib/./GateModel.cellml"));

        let mut model = importing_model("M", &[("gate", "gateEquations", "GateModel.cellml")]);
        let mut diagnostics = Diagnostics::new();
        importer.resolve_imports(&mut model, "lib", &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(importer.loader().load_count(), 0);
        assert!(importer.library_model("lib/GateModel.cellml").is_some());

        importer.remove_all_models();
        assert_eq!(importer.library_count(), 0);
    }

    #[test]
    fn importer_resolves_again_after_repair() {
        let loader = TestDocumentLoader::new([
            ("A.cellml", importing_model("A", &[("a", "b", "B.cellml")])),
            ("B.cellml", importing_model("B", &[("b", "a", "A.cellml")])),
            ("C.cellml", concrete_model("C", Component::new("a"))),
        ]);
        let mut importer = Importer::new(loader);
        let mut model = importing_model("M", &[("x", "a", "A.cellml")]);

        // the loop is reported
        let mut diagnostics = Diagnostics::new();
        importer.resolve_imports(&mut model, "", &mut diagnostics);
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(
            diagnostics.get(0).and_then(|issue| issue.reference_rule()),
            Some(ReferenceRule::ImporterCyclicDependency)
        );

        // repair B so that it imports from C instead
        let b = importer
            .library_model_mut("B.cellml")
            .expect("B should be in the library");
        let source = b
            .import_source_ids()
            .next()
            .expect("B should have an import source");
        b.import_source_mut(source)
            .expect("source should exist")
            .set_url("C.cellml");
        assert!(importer.clear_library_imports("A.cellml"));
        assert!(!importer.clear_library_imports("missing.cellml"));
        model.clear_imports();

        // resolving again reports nothing
        let mut diagnostics = Diagnostics::new();
        importer.resolve_imports(&mut model, "", &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(importer.library_count(), 3);

        let flat = importer.flatten_model(&model, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert!(!flat.has_imports());
    }

    #[test]
    fn requirements_lists_each_document_once() {
        let mut importer = Importer::new(chained_documents());
        let mut model = importing_model(
            "M",
            &[
                ("x", "a", "A.cellml"),
                ("gate", "gateEquations", "GateModel.cellml"),
            ],
        );
        let mut diagnostics = Diagnostics::new();
        importer.resolve_imports(&mut model, "", &mut diagnostics);

        let keys: Vec<_> = importer
            .requirements(&model)
            .into_iter()
            .map(|(key, _)| key.as_str())
            .collect();
        assert_eq!(keys, ["A.cellml", "GateModel.cellml"]);
    }

    #[test]
    fn dependencies_describe_nested_imports() {
        let mut importer = Importer::new(chained_documents());
        let mut model = importing_model("M", &[("x", "a", "A.cellml")]);
        let mut diagnostics = Diagnostics::new();
        importer.resolve_imports(&mut model, "", &mut diagnostics);

        let dependencies = importer
            .dependencies(&model)
            .expect("model should have resolved imports");
        assert_eq!(dependencies.name(), "M");

        let source = &dependencies.sources()[0];
        assert_eq!(source.url(), "A.cellml");
        assert!(source.units().is_empty());
        assert_eq!(
            source.components(),
            [ImportedItem {
                name: "x".to_string(),
                reference: "a".to_string(),
            }]
        );

        let nested = source.model().expect("A should be described");
        assert_eq!(nested.name(), "A");
        assert_eq!(nested.sources()[0].url(), "GateModel.cellml");
        assert_eq!(nested.sources()[0].model(), None);
    }

    #[test]
    fn dependencies_need_resolved_imports() {
        let importer = Importer::new(TestDocumentLoader::empty());
        let model = importing_model("M", &[("x", "a", "A.cellml")]);

        assert_eq!(importer.dependencies(&model), None);
        assert_eq!(importer.dependencies(&gate_model()), None);
    }
}
