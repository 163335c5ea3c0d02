//! Units carried into the flattened model.
//!
//! Units used by imported content are copied from the document that
//! defines them, together with the units they are built from. A definition
//! already present under the same name is reused; a different definition
//! under a taken name is renamed.

use cellml_ir::{ImportKind, ImportLink, Units, is_standard_units};
use tracing::trace;

use super::{Flattener, Scope, fresh_name};
use crate::error::FlattenWarning;

#[expect(
    clippy::multiple_inherent_impl,
    reason = "units handling is kept apart from components"
)]
impl<'a> Flattener<'a, '_> {
    /// Copies the units of the root model, substituting placeholders in
    /// place.
    pub(super) fn flatten_root_units(&mut self, root: Scope<'a>) {
        // reserve every root name first so that units pulled in by imports
        // never take one
        for units in root.model.units().values() {
            if units.is_import() {
                self.pending_units.insert(units.name().to_string());
                self.flat.add_units(Units::new(units.name()));
            } else {
                self.flat.add_units(units.clone());
            }
        }

        for units in root.model.units().values() {
            let Some(link) = units.import() else {
                continue;
            };

            let flat = self.substitute_units(root, units, link);
            self.pending_units.remove(units.name());
            self.flat.add_units(flat);
        }
    }

    /// Returns the name in the result of the units `name` as seen from
    /// `scope`, copying the definition over if needed.
    pub(super) fn units_into_flat(&mut self, scope: Scope<'a>, name: &str) -> String {
        let Some(key) = scope.key else {
            return name.to_string();
        };

        let memo_key = (key.clone(), name.to_string());
        if let Some(flat_name) = self.units_in_flat.get(&memo_key) {
            return flat_name.clone();
        }

        let Some(definition) = scope.model.units_named(name) else {
            // built-in units, or a dangling reference left for validation
            return name.to_string();
        };

        if !self.units_in_progress.insert(memo_key.clone()) {
            return name.to_string();
        }

        let flat = match definition.import() {
            Some(link) => self.substitute_units(scope, definition, link),
            None => self.copy_units(scope, definition),
        };

        self.units_in_progress.remove(&memo_key);

        let flat_name = self.place_units(flat);
        trace!(document = %key, units = name, flat_name, "copied units");
        self.units_in_flat.insert(memo_key, flat_name.clone());
        flat_name
    }

    /// Replaces a units placeholder by the flattened definition it imports,
    /// keeping the placeholder's name.
    fn substitute_units(
        &mut self,
        scope: Scope<'a>,
        placeholder: &'a Units,
        link: &ImportLink,
    ) -> Units {
        let url = scope.url_of(link);

        let Some(source) = self.target(scope, link) else {
            return self.passthrough_units(scope, placeholder, link);
        };
        let Some(definition) = source.model.units_named(link.reference()) else {
            return self.passthrough_units(scope, placeholder, link);
        };
        let Some(frame) = self.enter(source, link, ImportKind::Units, placeholder.name(), url)
        else {
            return self.passthrough_units(scope, placeholder, link);
        };

        let mut flat = match definition.import() {
            Some(inner) => self.substitute_units(source, definition, inner),
            None => self.copy_units(source, definition),
        };
        self.leave(&frame);

        flat.set_name(placeholder.name());
        if let Some(id) = placeholder.id() {
            flat.set_id(Some(id.to_string()));
        }
        flat
    }

    /// Copies a units definition, moving the units its terms refer to into
    /// the result.
    fn copy_units(&mut self, scope: Scope<'a>, definition: &'a Units) -> Units {
        let mut flat = definition.clone();
        for unit in flat.units_mut() {
            let reference = self.units_into_flat(scope, unit.reference());
            unit.set_reference(reference);
        }
        flat
    }

    /// Adds units taken from a library document to the result and returns
    /// the name they ended up with.
    fn place_units(&mut self, mut units: Units) -> String {
        let preferred = units.name().to_string();
        if is_standard_units(&preferred) {
            return preferred;
        }

        let reusable = |flattener: &Self, name: &str| {
            !flattener.pending_units.contains(name)
                && flattener
                    .flat
                    .units_named(name)
                    .is_some_and(|existing| existing.same_definition(&units))
        };

        if reusable(self, &preferred) {
            return preferred;
        }
        if self.flat.units_named(&preferred).is_none() {
            self.flat.add_units(units);
            return preferred;
        }

        let name = fresh_name(&preferred, |candidate| {
            self.flat.units_named(candidate).is_some() && !reusable(self, candidate)
        });
        if self.flat.units_named(&name).is_none() {
            units.set_name(name.clone());
            self.flat.add_units(units);
        }
        name
    }

    /// Copies a units placeholder that cannot be substituted, keeping it an
    /// import.
    fn passthrough_units(
        &mut self,
        scope: Scope<'a>,
        placeholder: &'a Units,
        link: &ImportLink,
    ) -> Units {
        let url = self.passthrough_url(scope, link);
        self.report(FlattenWarning::UnresolvedImport {
            kind: ImportKind::Units,
            name: placeholder.name().to_string(),
            url: url.clone(),
        });

        let source = self.passthrough_source(url);
        let mut flat = Units::new(placeholder.name())
            .with_import(ImportLink::new(source, link.reference()));
        flat.set_id(placeholder.id().map(str::to_string));
        flat
    }
}
