//! Substitution of import placeholders by the definitions they import.
//!
//! Flattening builds a new model. The input model and the library are only
//! read. Imported definitions are flattened against the document that
//! defines them before they are grafted in, so transitive imports are
//! substituted bottom-up.
//!
//! Equivalences are addressed by component name. Grafted components keep
//! their names unless the name is already used where they land; clashing
//! names get the first free `_N` suffix and every link inside the graft is
//! rewritten to match.

mod units;

use std::collections::{HashMap, HashSet};

use cellml_ir::{
    Component, DocumentKey, ImportKind, ImportLink, ImportSource, ImportSourceId, Model,
    Variable, VariableRef,
};
use cellml_shared::{Diagnostics, Issue};
use tracing::{debug, trace};

use crate::{
    ImporterOptions, ResolutionCache,
    error::FlattenWarning,
    util::{ImportFrame, ImportStack},
};

/// Returns an import-free copy of `model`, taking imported definitions from
/// `library`.
pub fn flatten_model(
    model: &Model,
    library: &ResolutionCache,
    options: &ImporterOptions,
    diagnostics: &mut Diagnostics,
) -> Model {
    debug!(model = model.name(), "flattening model");

    let mut flat = Model::new(model.name());
    flat.set_id(model.id().map(str::to_string));

    let mut flattener = Flattener {
        library,
        options,
        diagnostics,
        flat,
        stack: ImportStack::new(),
        units_in_flat: HashMap::new(),
        units_in_progress: HashSet::new(),
        pending_units: HashSet::new(),
        passthrough_sources: HashMap::new(),
    };

    let root = Scope::root(model);
    flattener.flatten_root_units(root);
    let components = flattener.flatten_scope(root, model.components());

    let mut flat = flattener.flat;
    flat.components_mut().extend(components);
    flat
}

/// A model definitions are taken from, with its library key.
///
/// The root model has no key; its names are the names of the result.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    model: &'a Model,
    key: Option<&'a DocumentKey>,
}

impl<'a> Scope<'a> {
    const fn root(model: &'a Model) -> Self {
        Self { model, key: None }
    }

    /// Returns the url of the import source behind `link`, as written.
    fn url_of(self, link: &ImportLink) -> &'a str {
        self.model
            .import_source(link.source())
            .map_or("", ImportSource::url)
    }
}

/// Names in use while flattening the components of one scope.
struct ScopeNames {
    taken: HashSet<String>,
    /// Links to placeholder variables that no longer exist after grafting.
    dangling: Vec<VariableRef>,
}

struct Flattener<'a, 'd> {
    library: &'a ResolutionCache,
    options: &'a ImporterOptions,
    diagnostics: &'d mut Diagnostics,
    flat: Model,
    stack: ImportStack,
    /// Name in the result of units taken from a library document.
    units_in_flat: HashMap<(DocumentKey, String), String>,
    units_in_progress: HashSet<(DocumentKey, String)>,
    /// Root units placeholders reserved in the result but not yet replaced.
    pending_units: HashSet<String>,
    passthrough_sources: HashMap<String, ImportSourceId>,
}

impl<'a> Flattener<'a, '_> {
    /// Flattens `roots`, which all belong to `scope`.
    fn flatten_scope(&mut self, scope: Scope<'a>, roots: &'a [Component]) -> Vec<Component> {
        let mut names = ScopeNames {
            taken: scope
                .model
                .component_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            dangling: vec![],
        };

        let mut flattened: Vec<Component> = roots
            .iter()
            .map(|component| self.flatten_component(scope, component, &mut names))
            .collect();

        if !names.dangling.is_empty() {
            for component in &mut flattened {
                component.for_each_mut(&mut |component| {
                    for variable in component.variables_mut() {
                        variable.retain_equivalences(|link| !names.dangling.contains(link));
                    }
                });
            }
        }

        flattened
    }

    fn flatten_component(
        &mut self,
        scope: Scope<'a>,
        component: &'a Component,
        names: &mut ScopeNames,
    ) -> Component {
        if let Some(link) = component.import() {
            return self.substitute_component(scope, component, link, names);
        }

        let mut flat = self.copy_local_parts(scope, component);
        for child in component.children() {
            let child = self.flatten_component(scope, child, names);
            flat.children_mut().push(child);
        }
        flat
    }

    /// Copies a component without its children or import link.
    fn copy_local_parts(&mut self, scope: Scope<'a>, component: &'a Component) -> Component {
        let mut flat = Component::new(component.name());
        flat.set_id(component.id().map(str::to_string));
        flat.set_math(component.math().map(str::to_string));

        for variable in component.variables() {
            let variable = self.copy_variable(scope, variable);
            flat.variables_mut().push(variable);
        }

        flat
    }

    /// Copies a variable, moving its units into the result when it comes
    /// from a library document.
    fn copy_variable(&mut self, scope: Scope<'a>, variable: &Variable) -> Variable {
        let mut copy = variable.clone();
        if let Some(units) = variable.units() {
            copy.set_units(Some(self.units_into_flat(scope, units)));
        }
        copy
    }

    /// Replaces a component placeholder by the flattened definition it
    /// imports.
    fn substitute_component(
        &mut self,
        scope: Scope<'a>,
        placeholder: &'a Component,
        link: &ImportLink,
        names: &mut ScopeNames,
    ) -> Component {
        let url = scope.url_of(link);

        let Some(source) = self.target(scope, link) else {
            return self.passthrough_component(scope, placeholder, link, names);
        };
        let Some(definition) = source.model.find_component(link.reference()) else {
            return self.passthrough_component(scope, placeholder, link, names);
        };
        let Some(frame) = self.enter(source, link, ImportKind::Component, placeholder.name(), url)
        else {
            return self.passthrough_component(scope, placeholder, link, names);
        };

        trace!(
            placeholder = placeholder.name(),
            reference = link.reference(),
            url,
            "substituting component"
        );

        let replacement = self
            .flatten_scope(source, std::slice::from_ref(definition))
            .into_iter()
            .next();
        self.leave(&frame);

        let Some(mut replacement) = replacement else {
            return self.passthrough_component(scope, placeholder, link, names);
        };

        // links to components outside the imported subtree stay behind
        let inside: HashSet<String> = replacement
            .descendants()
            .map(|component| component.name().to_string())
            .collect();
        replacement.for_each_mut(&mut |component| {
            for variable in component.variables_mut() {
                variable.retain_equivalences(|link| inside.contains(link.component()));
            }
        });

        graft_names(&mut replacement, placeholder.name(), &mut names.taken);

        if let Some(id) = placeholder.id() {
            replacement.set_id(Some(id.to_string()));
        }

        self.carry_equivalences(placeholder, &mut replacement, link, url, names);

        for child in placeholder.children() {
            let child = self.flatten_component(scope, child, names);
            replacement.children_mut().push(child);
        }

        replacement
    }

    /// Moves the equivalences of the placeholder's variables onto the
    /// variables of the same name in the replacement.
    fn carry_equivalences(
        &mut self,
        placeholder: &Component,
        replacement: &mut Component,
        link: &ImportLink,
        url: &str,
        names: &mut ScopeNames,
    ) {
        for variable in placeholder.variables() {
            if variable.equivalences().is_empty() {
                continue;
            }

            if let Some(target) = replacement.variable_mut(variable.name()) {
                for other in variable.equivalences() {
                    target.add_equivalence(other.clone());
                }
                continue;
            }

            for other in variable.equivalences() {
                self.report(FlattenWarning::DroppedEquivalence {
                    component: placeholder.name().to_string(),
                    variable: variable.name().to_string(),
                    other_component: other.component().to_string(),
                    other_variable: other.variable().to_string(),
                    reference: link.reference().to_string(),
                    url: url.to_string(),
                });
            }
            names
                .dangling
                .push(VariableRef::new(placeholder.name(), variable.name()));
        }
    }

    /// Copies a placeholder that cannot be substituted, keeping it an
    /// import.
    fn passthrough_component(
        &mut self,
        scope: Scope<'a>,
        placeholder: &'a Component,
        link: &ImportLink,
        names: &mut ScopeNames,
    ) -> Component {
        let url = self.passthrough_url(scope, link);
        self.report(FlattenWarning::UnresolvedImport {
            kind: ImportKind::Component,
            name: placeholder.name().to_string(),
            url: url.clone(),
        });

        let source = self.passthrough_source(url);
        let mut flat = self.copy_local_parts(scope, placeholder);
        flat.set_import(Some(ImportLink::new(source, link.reference())));

        for child in placeholder.children() {
            let child = self.flatten_component(scope, child, names);
            flat.children_mut().push(child);
        }
        flat
    }

    /// Returns the library model an import link resolved to.
    fn target(&self, scope: Scope<'a>, link: &ImportLink) -> Option<Scope<'a>> {
        let key = scope.model.import_source(link.source())?.document()?;
        let model = self.library.get(key)?;
        Some(Scope {
            model,
            key: Some(key),
        })
    }

    /// Pushes the import onto the stack, unless it would loop or go too
    /// deep.
    fn enter(
        &mut self,
        source: Scope<'a>,
        link: &ImportLink,
        kind: ImportKind,
        name: &str,
        url: &str,
    ) -> Option<ImportFrame> {
        let key = source.key?.clone();
        let frame = ImportFrame::new(key, link.reference(), kind, name, url);

        if self.stack.depth() >= self.options.max_depth() || !self.stack.push(frame.clone()) {
            return None;
        }
        Some(frame)
    }

    fn leave(&mut self, frame: &ImportFrame) {
        let popped = self.stack.pop();
        debug_assert_eq!(popped.as_ref(), Some(frame));
    }

    /// Returns the url a passed-through placeholder should import from.
    ///
    /// Urls from library documents are replaced by their library key, since
    /// the result no longer lives next to that document.
    fn passthrough_url(&self, scope: Scope<'a>, link: &ImportLink) -> String {
        let url = scope.url_of(link);
        match scope.key {
            Some(key) if !url.is_empty() => DocumentKey::resolve(key.directory(), url).to_string(),
            _ => url.to_string(),
        }
    }

    /// Returns the import source for `url` in the result, adding it once.
    fn passthrough_source(&mut self, url: String) -> ImportSourceId {
        if let Some(id) = self.passthrough_sources.get(&url) {
            return *id;
        }
        let id = self.flat.add_import_source(ImportSource::new(url.clone()));
        self.passthrough_sources.insert(url, id);
        id
    }

    fn report(&mut self, warning: FlattenWarning) {
        self.diagnostics.add(Issue::from_error(&warning));
    }
}

/// Renames a grafted subtree for the scope it lands in.
///
/// The root takes `root_name`. Descendants whose name is already taken get
/// the first free `name_N`. Equivalence links inside the subtree follow the
/// renames.
fn graft_names(replacement: &mut Component, root_name: &str, taken: &mut HashSet<String>) {
    let mut renames: HashMap<String, String> = HashMap::new();
    if replacement.name() != root_name {
        renames.insert(replacement.name().to_string(), root_name.to_string());
    }
    taken.insert(root_name.to_string());

    for component in replacement.descendants().skip(1) {
        let name = component.name();
        if taken.contains(name) {
            let fresh = fresh_name(name, |candidate| taken.contains(candidate));
            taken.insert(fresh.clone());
            renames.insert(name.to_string(), fresh);
        } else {
            taken.insert(name.to_string());
        }
    }

    if renames.is_empty() {
        return;
    }

    replacement.for_each_mut(&mut |component| {
        if let Some(name) = renames.get(component.name()) {
            component.set_name(name.clone());
        }
        for variable in component.variables_mut() {
            for link in variable.equivalences_mut() {
                if let Some(name) = renames.get(link.component()) {
                    link.set_component(name.clone());
                }
            }
        }
    });
}

/// Returns the first `name_N`, N counting from 1, for which `taken` is false.
fn fresh_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    (1_usize..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}
