//! Reports on the documents a resolved model depends on.

use std::collections::HashSet;

use cellml_ir::{DocumentKey, Model};

use crate::ResolutionCache;

/// The imports of one model, with the imports of the documents it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDependencies {
    name: String,
    sources: Vec<SourceDependencies>,
}

impl ModelDependencies {
    /// Returns the name of the model.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the import sources of the model, in document order.
    #[must_use]
    pub fn sources(&self) -> &[SourceDependencies] {
        &self.sources
    }
}

/// The items imported through one import source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDependencies {
    url: String,
    units: Vec<ImportedItem>,
    components: Vec<ImportedItem>,
    model: Option<ModelDependencies>,
}

impl SourceDependencies {
    /// Returns the url of the source as written.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the units imported through the source.
    #[must_use]
    pub fn units(&self) -> &[ImportedItem] {
        &self.units
    }

    /// Returns the components imported through the source.
    #[must_use]
    pub fn components(&self) -> &[ImportedItem] {
        &self.components
    }

    /// Returns the dependencies of the imported document, if it has any and
    /// they are all resolved.
    #[must_use]
    pub const fn model(&self) -> Option<&ModelDependencies> {
        self.model.as_ref()
    }
}

/// A placeholder and the item it imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedItem {
    /// Name of the placeholder.
    pub name: String,
    /// Name of the item in the imported document.
    pub reference: String,
}

/// Builds the dependency report of `model`.
///
/// Returns `None` when the model has no import sources or still has
/// unresolved imports.
pub fn dependencies(model: &Model, library: &ResolutionCache) -> Option<ModelDependencies> {
    let mut path = vec![];
    collect_dependencies(model, library, &mut path)
}

fn collect_dependencies<'a>(
    model: &'a Model,
    library: &'a ResolutionCache,
    path: &mut Vec<&'a DocumentKey>,
) -> Option<ModelDependencies> {
    if model.has_unresolved_imports() || model.import_source_count() == 0 {
        return None;
    }

    let mut sources = vec![];
    for id in model.import_source_ids() {
        let Some(source) = model.import_source(id) else {
            continue;
        };
        let (units, components) = model.placeholders_of(id);

        let units = units
            .into_iter()
            .filter_map(|units| {
                Some(ImportedItem {
                    name: units.name().to_string(),
                    reference: units.import()?.reference().to_string(),
                })
            })
            .collect();
        let components = components
            .into_iter()
            .filter_map(|component| {
                Some(ImportedItem {
                    name: component.name().to_string(),
                    reference: component.import()?.reference().to_string(),
                })
            })
            .collect();

        // a document already on the path would repeat forever
        let imported = source
            .document()
            .filter(|key| !path.contains(key))
            .and_then(|key| Some((key, library.get(key)?)));
        let nested = imported.and_then(|(key, imported)| {
            path.push(key);
            let nested = collect_dependencies(imported, library, path);
            path.pop();
            nested
        });

        sources.push(SourceDependencies {
            url: source.url().to_string(),
            units,
            components,
            model: nested,
        });
    }

    Some(ModelDependencies {
        name: model.name().to_string(),
        sources,
    })
}

/// Lists the library documents `model` depends on, directly or through
/// other documents, each once, depth-first in import source order.
pub fn requirements<'a>(
    model: &'a Model,
    library: &'a ResolutionCache,
) -> Vec<(&'a DocumentKey, &'a Model)> {
    let mut seen = HashSet::new();
    let mut required = vec![];
    collect_requirements(model, library, &mut seen, &mut required);
    required
}

fn collect_requirements<'a>(
    model: &'a Model,
    library: &'a ResolutionCache,
    seen: &mut HashSet<&'a DocumentKey>,
    required: &mut Vec<(&'a DocumentKey, &'a Model)>,
) {
    for source in model.import_sources() {
        let Some(key) = source.document() else {
            continue;
        };
        let Some(imported) = library.get(key) else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }

        required.push((key, imported));
        collect_requirements(imported, library, seen, required);
    }
}
