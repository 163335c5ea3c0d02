//! Recursive resolution of import placeholders.
//!
//! Resolution walks the placeholders of a model, loads each imported
//! document into the library (once), checks that the requested item
//! exists, attaches the document to the import source and then resolves the
//! imported document the same way. Problems are reported as issues and only
//! stop the branch they occur in.
//!
//! Within one pass, a document is walked again each time it is entered for
//! a new item, so that every loop through it is checked against the chain
//! of imports that led there. An import that has been followed to the end
//! is not followed again, and a placeholder that failed is reported once.

use std::collections::HashSet;

use cellml_ir::{DocumentKey, ImportKind, ImportRecord, Model};
use cellml_shared::{Diagnostics, Issue};
use tracing::{debug, trace, warn};

use crate::{
    ImporterOptions, ResolutionCache,
    error::ImportError,
    util::{DocumentLoader, ImportFrame, ImportStack},
};

/// Resolves the imports of `model`, whose relative urls are relative to
/// `base`.
pub fn resolve_imports<L>(
    model: &mut Model,
    base: &str,
    loader: &L,
    library: &mut ResolutionCache,
    options: &ImporterOptions,
    diagnostics: &mut Diagnostics,
) where
    L: DocumentLoader,
{
    let mut resolver = Resolver {
        loader,
        library,
        options,
        diagnostics,
        stack: ImportStack::new(),
        completed: HashSet::new(),
        broken: HashSet::new(),
    };

    let records = model.import_records();
    debug!(
        model = model.name(),
        imports = records.len(),
        "resolving imports"
    );

    for record in records {
        let resolved = resolver.resolve_record(model.name(), None, &record, base);

        if let (Some(key), Some(source)) = (resolved, model.import_source_mut(record.source())) {
            source.attach(key);
        }
    }
}

/// State of one resolution pass.
struct Resolver<'a, L> {
    loader: &'a L,
    library: &'a mut ResolutionCache,
    options: &'a ImporterOptions,
    diagnostics: &'a mut Diagnostics,
    stack: ImportStack,
    /// Imports whose documents were already walked to the end during this
    /// pass, as (document, item).
    completed: HashSet<(DocumentKey, String)>,
    /// Placeholders that failed to resolve during this pass.
    broken: HashSet<Placeholder>,
}

/// A placeholder, identified by the library document it is in (`None` for
/// the model being resolved), its kind and its name.
type Placeholder = (Option<DocumentKey>, ImportKind, String);

impl<L: DocumentLoader> Resolver<'_, L> {
    /// Resolves the imports of the library document stored under `key`.
    fn resolve_document(&mut self, key: &DocumentKey) {
        let Some(model) = self.library.get(key) else {
            return;
        };

        let model_name = model.name().to_string();
        let records = model.import_records();
        trace!(document = %key, imports = records.len(), "resolving document");

        for record in records {
            let resolved = self.resolve_record(&model_name, Some(key), &record, key.directory());

            let source = self
                .library
                .get_mut(key)
                .and_then(|model| model.import_source_mut(record.source()));
            if let (Some(resolved), Some(source)) = (resolved, source) {
                source.attach(resolved);
            }
        }
    }

    /// Resolves one placeholder of the model named `model_name`.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The name of the model the placeholder is in
    /// * `owner` - The library key of that model, `None` for the model
    ///   being resolved
    /// * `record` - The placeholder
    /// * `base` - The directory relative urls in that model start from
    ///
    /// # Returns
    ///
    /// Returns the key of the document the placeholder's source should be
    /// attached to, or `None` if the placeholder stays unresolved.
    fn resolve_record(
        &mut self,
        model_name: &str,
        owner: Option<&DocumentKey>,
        record: &ImportRecord,
        base: &str,
    ) -> Option<DocumentKey> {
        let placeholder: Placeholder = (
            owner.cloned(),
            record.kind(),
            record.name().to_string(),
        );
        if self.broken.contains(&placeholder) {
            return None;
        }

        if record.url().is_empty() {
            self.fail(placeholder, ImportError::EmptyUrl {
                kind: record.kind(),
                name: record.name().to_string(),
            });
            return None;
        }

        let key = DocumentKey::resolve(base, record.url());
        let frame = ImportFrame::new(
            key.clone(),
            record.reference(),
            record.kind(),
            record.name(),
            record.url(),
        );

        // check for circular dependencies
        if let Some(chain) = self.stack.find_cycle(&frame) {
            warn!(model = model_name, document = %key, "cyclic import");
            self.fail(placeholder, ImportError::CyclicDependency {
                model: model_name.to_string(),
                chain,
            });
            return None;
        }

        if self.stack.depth() >= self.options.max_depth() {
            self.fail(placeholder, ImportError::DepthExceeded {
                kind: record.kind(),
                name: record.name().to_string(),
                url: record.url().to_string(),
                max_depth: self.options.max_depth(),
            });
            return None;
        }

        if let Err(error) = self.load_document(&key) {
            self.fail(placeholder, error);
            return None;
        }

        if !self.has_item(&key, record.kind(), record.reference()) {
            self.fail(placeholder, ImportError::MissingReference {
                kind: record.kind(),
                name: record.name().to_string(),
                url: record.url().to_string(),
                reference: record.reference().to_string(),
            });
            return None;
        }

        if !self.stack.push(frame) {
            return None;
        }

        let import = (key.clone(), record.reference().to_string());
        if !self.completed.contains(&import) {
            self.resolve_document(&key);
            self.completed.insert(import);
        }

        self.stack.pop();

        // the walk may have closed a loop back onto this placeholder
        if self.broken.contains(&placeholder) {
            return None;
        }

        Some(key)
    }

    /// Makes sure the document stored under `key` is in the library.
    ///
    /// Problems the loader finds in a document it still loads are added to
    /// the diagnostics as the document loads.
    ///
    /// # Errors
    ///
    /// Returns the missing document error to report if the loader fails.
    fn load_document(&mut self, key: &DocumentKey) -> Result<(), ImportError> {
        if self.library.contains(key) {
            trace!(document = %key, "document found in library");
            return Ok(());
        }

        match self.loader.load_model(key, self.diagnostics) {
            Ok(model) => {
                debug!(document = %key, model = model.name(), "loaded document");
                self.library.put(key.clone(), model);
                Ok(())
            }
            Err(error) => {
                warn!(document = %key, %error, "failed to load document");
                Err(ImportError::MissingDocument {
                    key: key.clone(),
                    reason: error.to_string(),
                    level: self.options.missing_document_level(),
                })
            }
        }
    }

    /// Returns true if the library document under `key` defines the item.
    fn has_item(&self, key: &DocumentKey, kind: ImportKind, reference: &str) -> bool {
        self.library.get(key).is_some_and(|model| match kind {
            ImportKind::Component => model.find_component(reference).is_some(),
            ImportKind::Units => model.units_named(reference).is_some(),
        })
    }

    /// Reports `error` and marks the placeholder as failed for this pass.
    fn fail(&mut self, placeholder: Placeholder, error: ImportError) {
        self.diagnostics.add(Issue::from_error(&error));
        self.broken.insert(placeholder);
    }
}

#[cfg(test)]
mod tests {
    use cellml_ir::{Component, ImportLink, ImportSource, Units};
    use cellml_shared::{Level, ReferenceRule};

    use super::*;
    use crate::test::{
        TestDocumentLoader,
        construct::{concrete_model, gate_equations, gate_model, importing_model},
    };

    fn resolve(
        model: &mut Model,
        base: &str,
        loader: &TestDocumentLoader,
        library: &mut ResolutionCache,
    ) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        resolve_imports(
            model,
            base,
            loader,
            library,
            &ImporterOptions::default(),
            &mut diagnostics,
        );
        diagnostics
    }

    fn source_document(model: &Model, placeholder: &str) -> Option<DocumentKey> {
        let link = model.find_component(placeholder)?.import()?;
        model.import_source(link.source())?.document().cloned()
    }

    #[test]
    fn resolve_imports_success() {
        // create initial context
        let mut model = importing_model(
            "HodgkinHuxley",
            &[("sodiumChannel_h", "gateEquations", "GateModel.cellml")],
        );
        let loader = TestDocumentLoader::new([("GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert!(diagnostics.is_empty());

        // check the library
        assert_eq!(library.len(), 1);
        assert_eq!(
            library.key(0).map(DocumentKey::as_str),
            Some("GateModel.cellml")
        );

        // check the model
        assert_eq!(
            source_document(&model, "sodiumChannel_h"),
            Some(DocumentKey::new("GateModel.cellml"))
        );
        assert!(!model.has_unresolved_imports());
    }

    #[test]
    fn resolve_imports_missing_reference() {
        // create initial context
        let mut model = importing_model(
            "HodgkinHuxley",
            &[("importedGateH", "i_dont_exist", "GateModel.cellml")],
        );
        let loader = TestDocumentLoader::new([("GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("issue should be present");
        assert_eq!(issue.level(), Level::Error);
        assert_eq!(
            issue.description(),
            "Import of component 'importedGateH' from 'GateModel.cellml' requires component named 'i_dont_exist' which cannot be found."
        );
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImporterMissingComponent)
        );

        // check the model
        let placeholder = model
            .find_component("importedGateH")
            .expect("placeholder should be present");
        assert!(placeholder.is_import());
        assert_eq!(source_document(&model, "importedGateH"), None);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn resolve_imports_missing_document() {
        // create initial context
        let mut model = importing_model(
            "HodgkinHuxley",
            &[
                ("gate_h", "gateEquations", "missing.cellml"),
                ("gate_m", "gateEquations", "GateModel.cellml"),
            ],
        );
        let loader = TestDocumentLoader::new([("resources/GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "resources/", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("issue should be present");
        assert_eq!(issue.level(), Level::Error);
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImporterMissingFile)
        );
        assert!(issue.description().contains("'resources/missing.cellml'"));

        // the sibling import still resolves
        assert_eq!(source_document(&model, "gate_h"), None);
        assert_eq!(
            source_document(&model, "gate_m"),
            Some(DocumentKey::new("resources/GateModel.cellml"))
        );
    }

    #[test]
    fn resolve_imports_missing_document_as_warning() {
        // create initial context
        let mut model = importing_model("M", &[("gate", "gateEquations", "missing.cellml")]);
        let loader = TestDocumentLoader::empty();
        let mut library = ResolutionCache::new();
        let options = ImporterOptions::new().with_missing_document_level(Level::Warning);
        let mut diagnostics = Diagnostics::new();

        // resolve the imports
        resolve_imports(
            &mut model,
            "",
            &loader,
            &mut library,
            &options,
            &mut diagnostics,
        );

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(library.is_empty());
    }

    #[test]
    fn resolve_imports_circular_dependency() {
        // create a circular dependency: A.cellml -> B.cellml -> A.cellml
        let mut model = importing_model(
            "M",
            &[
                ("a_imported", "a", "A.cellml"),
                ("gate", "gateEquations", "GateModel.cellml"),
            ],
        );
        let loader = TestDocumentLoader::new([
            ("A.cellml", importing_model("A", &[("a", "b", "B.cellml")])),
            ("B.cellml", importing_model("B", &[("b", "a", "A.cellml")])),
            ("GateModel.cellml", gate_model()),
        ]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("cycle issue should be present");
        assert_eq!(issue.level(), Level::Warning);
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImporterCyclicDependency)
        );
        assert_eq!(
            issue.description(),
            "Cyclic dependencies were found when attempting to resolve components in model 'B'. The dependency loop is:\n \
             - component 'a_imported' is imported from 'a' in 'A.cellml',\n \
             - component 'a' is imported from 'b' in 'B.cellml',\n \
             and\n \
             - component 'b' is imported from 'a' in 'A.cellml'."
        );

        // the unrelated import resolves normally
        assert_eq!(
            source_document(&model, "gate"),
            Some(DocumentKey::new("GateModel.cellml"))
        );

        // the loop is cut where it closes
        let b = library
            .get(&DocumentKey::new("B.cellml"))
            .expect("B should be in the library");
        assert!(b.has_unresolved_imports());
        let a = library
            .get(&DocumentKey::new("A.cellml"))
            .expect("A should be in the library");
        assert!(!a.has_unresolved_imports());
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn resolve_imports_same_document_once() {
        // create initial context: two placeholders, two import sources
        // whose urls point at the same document
        let mut model = Model::new("M");
        let first = model.add_import_source(ImportSource::new("gates/GateModel.cellml"));
        let second = model.add_import_source(ImportSource::new("./gates/x/../GateModel.cellml"));
        model.add_component(
            Component::new("membrane")
                .with_child(
                    Component::new("gate_h").with_import(ImportLink::new(first, "gateEquations")),
                )
                .with_child(
                    Component::new("gate_m").with_import(ImportLink::new(second, "gateEquations")),
                ),
        );
        let loader = TestDocumentLoader::new([("gates/GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert!(diagnostics.is_empty());

        // both placeholders share one library model
        assert_eq!(library.len(), 1);
        assert_eq!(loader.requests(), [DocumentKey::new("gates/GateModel.cellml")]);
        assert_eq!(
            source_document(&model, "gate_h"),
            source_document(&model, "gate_m")
        );
    }

    #[test]
    fn resolve_imports_loop_through_document_entered_earlier() {
        // B.cellml is first entered for b2, which imports nothing; the loop
        // A.a -> B.b -> A.a is only followed afterwards
        let mut model = importing_model("M", &[("x", "b2", "B.cellml"), ("y", "a", "A.cellml")]);
        let mut b = importing_model("B", &[("b", "a", "A.cellml")]);
        b.add_component(Component::new("b2"));
        let loader = TestDocumentLoader::new([
            ("A.cellml", importing_model("A", &[("a", "b", "B.cellml")])),
            ("B.cellml", b),
        ]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("cycle issue should be present");
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImporterCyclicDependency)
        );
        assert_eq!(
            issue.description(),
            "Cyclic dependencies were found when attempting to resolve components in model 'B'. The dependency loop is:\n \
             - component 'b' is imported from 'a' in 'A.cellml',\n \
             - component 'a' is imported from 'b' in 'B.cellml',\n \
             and\n \
             - component 'b' is imported from 'a' in 'A.cellml'."
        );

        // the placeholder closing the loop stays unresolved
        let b = library
            .get(&DocumentKey::new("B.cellml"))
            .expect("B should be in the library");
        assert!(b.has_unresolved_imports());
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn resolve_imports_loop_reported_once_per_pass() {
        // both root placeholders lead into the same loop
        let mut model = importing_model("M", &[("x", "a", "A.cellml"), ("y", "b", "B.cellml")]);
        let loader = TestDocumentLoader::new([
            ("A.cellml", importing_model("A", &[("a", "b", "B.cellml")])),
            ("B.cellml", importing_model("B", &[("b", "a", "A.cellml")])),
        ]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(
            diagnostics.get(0).and_then(Issue::reference_rule),
            Some(ReferenceRule::ImporterCyclicDependency)
        );
    }

    #[test]
    fn resolve_imports_reports_document_issues_as_it_loads() {
        // the imported document loads with a problem of its own
        let mut model = importing_model(
            "M",
            &[
                ("gate", "gateEquations", "GateModel.cellml"),
                ("broken", "i_dont_exist", "GateModel.cellml"),
            ],
        );
        let loader = TestDocumentLoader::new([("GateModel.cellml", gate_model())]).with_issue(
            "GateModel.cellml",
            Issue::new(Level::Warning, "unit 'furlong' is unknown".to_string())
                .with_url("GateModel.cellml"),
        );
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // the document's issue comes first, in the order it was found
        assert_eq!(diagnostics.count(), 2);
        let first = diagnostics.get(0).expect("document issue should be present");
        assert_eq!(first.description(), "unit 'furlong' is unknown");
        assert_eq!(first.url(), Some("GateModel.cellml"));
        assert_eq!(
            diagnostics.get(1).and_then(Issue::reference_rule),
            Some(ReferenceRule::ImporterMissingComponent)
        );
    }

    #[test]
    fn resolve_imports_twice_uses_library() {
        // create initial context
        let mut model = importing_model(
            "M",
            &[
                ("gate_h", "gateEquations", "GateModel.cellml"),
                ("gate_m", "gateEquations", "GateModel.cellml"),
            ],
        );
        let loader = TestDocumentLoader::new([("GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports twice
        let first = resolve(&mut model, "", &loader, &mut library);
        let loads_after_first = loader.load_count();
        let second = resolve(&mut model, "", &loader, &mut library);

        // check that nothing changed
        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(loads_after_first, 1);
        assert_eq!(loader.load_count(), 1);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn resolve_imports_twice_reports_what_is_still_broken() {
        // create initial context
        let mut model = importing_model(
            "M",
            &[
                ("broken", "i_dont_exist", "GateModel.cellml"),
                ("gate", "gateEquations", "GateModel.cellml"),
            ],
        );
        let loader = TestDocumentLoader::new([("GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports twice
        let first = resolve(&mut model, "", &loader, &mut library);
        let second = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(first.count(), 1);
        assert_eq!(second, first);
        assert_eq!(loader.load_count(), 1);
    }

    #[test]
    fn resolve_imports_transitive_relative_to_document() {
        // create initial context: models/A.cellml imports from sub/B.cellml,
        // which is relative to models/
        let mut model = importing_model("M", &[("a", "a", "A.cellml")]);
        let loader = TestDocumentLoader::new([
            (
                "models/A.cellml",
                importing_model("A", &[("a", "gateEquations", "sub/B.cellml")]),
            ),
            ("models/sub/B.cellml", gate_model()),
        ]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "models", &loader, &mut library);

        // check the errors
        assert!(diagnostics.is_empty());

        // check the library, in depth-first order
        let keys: Vec<_> = library.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["models/A.cellml", "models/sub/B.cellml"]);

        let a = library
            .get(&DocumentKey::new("models/A.cellml"))
            .expect("A should be in the library");
        assert_eq!(
            source_document(a, "a"),
            Some(DocumentKey::new("models/sub/B.cellml"))
        );
    }

    #[test]
    fn resolve_imports_nested_reference() {
        // create initial context: the imported component is a child
        let mut model = importing_model("M", &[("gate", "gateEquations", "cell.cellml")]);
        let cell = concrete_model("cell", Component::new("membrane").with_child(gate_equations()));
        let loader = TestDocumentLoader::new([("cell.cellml", cell)]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert!(diagnostics.is_empty());
        assert!(!model.has_unresolved_imports());
    }

    #[test]
    fn resolve_imports_depth_exceeded() {
        // create a chain d1 -> d2 -> d3 -> d4 -> d5
        let mut model = importing_model("M", &[("c", "c", "d1.cellml")]);
        let loader = TestDocumentLoader::new([
            ("d1.cellml", importing_model("d1", &[("c", "c", "d2.cellml")])),
            ("d2.cellml", importing_model("d2", &[("c", "c", "d3.cellml")])),
            ("d3.cellml", importing_model("d3", &[("c", "c", "d4.cellml")])),
            ("d4.cellml", importing_model("d4", &[("c", "c", "d5.cellml")])),
            ("d5.cellml", concrete_model("d5", Component::new("c"))),
        ]);
        let mut library = ResolutionCache::new();
        let options = ImporterOptions::new().with_max_depth(3);
        let mut diagnostics = Diagnostics::new();

        // resolve the imports
        resolve_imports(
            &mut model,
            "",
            &loader,
            &mut library,
            &options,
            &mut diagnostics,
        );

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("depth issue should be present");
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImporterDepthExceeded)
        );
        assert_eq!(
            issue.description(),
            "Import of component 'c' from 'd4.cellml' exceeds the maximum import depth of 3."
        );
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn resolve_imports_units() {
        // create initial context
        let mut model = Model::new("M");
        let source = model.add_import_source(ImportSource::new("GateModel.cellml"));
        model.add_units(Units::new("ms").with_import(ImportLink::new(source, "ms")));
        model.add_units(Units::new("bad").with_import(ImportLink::new(source, "i_dont_exist")));
        let loader = TestDocumentLoader::new([("GateModel.cellml", gate_model())]);
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("issue should be present");
        assert_eq!(
            issue.description(),
            "Import of units 'bad' from 'GateModel.cellml' requires units named 'i_dont_exist' which cannot be found."
        );
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImporterMissingUnits)
        );

        // the shared source was attached by the units that resolved
        assert!(
            model
                .import_source(source)
                .is_some_and(ImportSource::is_resolved)
        );
    }

    #[test]
    fn resolve_imports_empty_url() {
        // create initial context
        let mut model = importing_model("M", &[("gate", "gateEquations", "")]);
        let loader = TestDocumentLoader::empty();
        let mut library = ResolutionCache::new();

        // resolve the imports
        let diagnostics = resolve(&mut model, "", &loader, &mut library);

        // check the errors
        assert_eq!(diagnostics.count(), 1);
        let issue = diagnostics.get(0).expect("issue should be present");
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::ImportSourceEmptyUrl)
        );
        assert_eq!(loader.load_count(), 0);
    }
}
