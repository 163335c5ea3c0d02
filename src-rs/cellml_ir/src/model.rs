use indexmap::IndexMap;

use crate::{
    Component, Components, ImportKind, ImportRecord, ImportSource, ImportSourceId, Units,
    Variable, VariableRef,
};

/// A CellML model.
///
/// The model owns its units, its component tree and the import sources its
/// placeholders point at.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    id: Option<String>,
    units: IndexMap<String, Units>,
    components: Vec<Component>,
    import_sources: Vec<ImportSource>,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            units: IndexMap::new(),
            components: vec![],
            import_sources: vec![],
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the model.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Sets the identifier.
    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    // units

    /// Returns the units definitions in document order.
    #[must_use]
    pub const fn units(&self) -> &IndexMap<String, Units> {
        &self.units
    }

    /// Returns the units named `name`.
    #[must_use]
    pub fn units_named(&self, name: &str) -> Option<&Units> {
        self.units.get(name)
    }

    /// Returns the units named `name` mutably.
    pub fn units_named_mut(&mut self, name: &str) -> Option<&mut Units> {
        self.units.get_mut(name)
    }

    /// Adds units, replacing and returning any units with the same name.
    ///
    /// A replaced definition keeps its position.
    pub fn add_units(&mut self, units: Units) -> Option<Units> {
        self.units.insert(units.name().to_string(), units)
    }

    /// Removes the units named `name`, keeping the order of the others.
    pub fn remove_units(&mut self, name: &str) -> Option<Units> {
        self.units.shift_remove(name)
    }

    // components

    /// Returns the top-level components.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns the top-level components mutably.
    pub fn components_mut(&mut self) -> &mut Vec<Component> {
        &mut self.components
    }

    /// Appends a top-level component.
    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Iterates over every component in encapsulation pre-order.
    #[must_use]
    pub fn all_components(&self) -> Components<'_> {
        Components::new(&self.components)
    }

    /// Returns the names of every component in encapsulation pre-order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&str> {
        self.all_components().map(Component::name).collect()
    }

    /// Finds the first component named `name` anywhere in the model.
    #[must_use]
    pub fn find_component(&self, name: &str) -> Option<&Component> {
        self.all_components()
            .find(|component| component.name() == name)
    }

    /// Finds the first component named `name` anywhere in the model, mutably.
    pub fn find_component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find_map(|component| component.find_mut(name))
    }

    /// Calls `f` on every component in encapsulation pre-order.
    pub fn for_each_component_mut(&mut self, f: &mut impl FnMut(&mut Component)) {
        for component in &mut self.components {
            component.for_each_mut(f);
        }
    }

    // variables and equivalences

    /// Returns the variable `reference` points at.
    #[must_use]
    pub fn variable(&self, reference: &VariableRef) -> Option<&Variable> {
        self.find_component(reference.component())?
            .variable(reference.variable())
    }

    /// Returns the variable `reference` points at, mutably.
    pub fn variable_mut(&mut self, reference: &VariableRef) -> Option<&mut Variable> {
        self.find_component_mut(reference.component())?
            .variable_mut(reference.variable())
    }

    /// Makes two variables equivalent, on both sides.
    ///
    /// Returns false if either variable does not exist or if `a` and `b`
    /// are the same variable.
    pub fn add_equivalence(&mut self, a: &VariableRef, b: &VariableRef) -> bool {
        if a == b || self.variable(a).is_none() || self.variable(b).is_none() {
            return false;
        }

        if let Some(variable) = self.variable_mut(a) {
            variable.add_equivalence(b.clone());
        }
        if let Some(variable) = self.variable_mut(b) {
            variable.add_equivalence(a.clone());
        }

        true
    }

    /// Removes the equivalence between two variables, on both sides.
    ///
    /// Returns true if a link was removed from either side.
    pub fn remove_equivalence(&mut self, a: &VariableRef, b: &VariableRef) -> bool {
        let removed_a = self
            .variable_mut(a)
            .is_some_and(|variable| variable.remove_equivalence(b));
        let removed_b = self
            .variable_mut(b)
            .is_some_and(|variable| variable.remove_equivalence(a));

        removed_a || removed_b
    }

    // imports

    /// Returns the import sources.
    #[must_use]
    pub fn import_sources(&self) -> &[ImportSource] {
        &self.import_sources
    }

    /// Returns the number of import sources.
    #[must_use]
    pub const fn import_source_count(&self) -> usize {
        self.import_sources.len()
    }

    /// Returns the import source with the given id.
    #[must_use]
    pub fn import_source(&self, id: ImportSourceId) -> Option<&ImportSource> {
        self.import_sources.get(id.index())
    }

    /// Returns the import source with the given id, mutably.
    pub fn import_source_mut(&mut self, id: ImportSourceId) -> Option<&mut ImportSource> {
        self.import_sources.get_mut(id.index())
    }

    /// Adds an import source and returns the id placeholders use to share it.
    pub fn add_import_source(&mut self, source: ImportSource) -> ImportSourceId {
        let id = ImportSourceId::new(self.import_sources.len());
        self.import_sources.push(source);
        id
    }

    /// Iterates over the ids of every import source.
    pub fn import_source_ids(&self) -> impl Iterator<Item = ImportSourceId> + use<> {
        (0..self.import_sources.len()).map(ImportSourceId::new)
    }

    /// Returns true if any component or units is a placeholder.
    #[must_use]
    pub fn has_imports(&self) -> bool {
        self.all_components().any(Component::is_import) || self.units.values().any(Units::is_import)
    }

    /// Returns true if any placeholder's import source has no document
    /// attached.
    #[must_use]
    pub fn has_unresolved_imports(&self) -> bool {
        self.import_records().iter().any(|record| {
            self.import_source(record.source())
                .is_none_or(|source| !source.is_resolved())
        })
    }

    /// Detaches every import source from the document it resolved to.
    pub fn clear_imports(&mut self) {
        for source in &mut self.import_sources {
            source.detach();
        }
    }

    /// Lists the placeholders of the model.
    ///
    /// Component placeholders come first in encapsulation pre-order,
    /// followed by units placeholders in document order.
    #[must_use]
    pub fn import_records(&self) -> Vec<ImportRecord> {
        let components = self.all_components().filter_map(|component| {
            let link = component.import()?;
            Some((ImportKind::Component, component.name(), link))
        });
        let units = self.units.values().filter_map(|units| {
            let link = units.import()?;
            Some((ImportKind::Units, units.name(), link))
        });

        components
            .chain(units)
            .map(|(kind, name, link)| {
                let url = self
                    .import_source(link.source())
                    .map(|source| source.url().to_string())
                    .unwrap_or_default();

                ImportRecord::new(
                    kind,
                    name.to_string(),
                    link.reference().to_string(),
                    link.source(),
                    url,
                )
            })
            .collect()
    }

    /// Returns the units and component placeholders using the given source.
    #[must_use]
    pub fn placeholders_of(&self, source: ImportSourceId) -> (Vec<&Units>, Vec<&Component>) {
        let units = self
            .units
            .values()
            .filter(|units| units.import().is_some_and(|link| link.source() == source))
            .collect();
        let components = self
            .all_components()
            .filter(|component| {
                component
                    .import()
                    .is_some_and(|link| link.source() == source)
            })
            .collect();

        (units, components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImportLink, Unit};

    fn imported_model() -> Model {
        let mut model = Model::new("membrane");
        let gates = model.add_import_source(ImportSource::new("GateModel.cellml"));
        let units = model.add_import_source(ImportSource::new("units.cellml"));

        model.add_units(Units::new("mV").with_unit(Unit::new("volt").with_prefix("milli")));
        model.add_units(Units::new("ms").with_import(ImportLink::new(units, "millisecond")));

        model.add_component(
            Component::new("membrane")
                .with_variable(Variable::new("V").with_units("mV"))
                .with_child(
                    Component::new("gate_h").with_import(ImportLink::new(gates, "gateEquations")),
                )
                .with_child(
                    Component::new("gate_m").with_import(ImportLink::new(gates, "gateEquations")),
                ),
        );
        model.add_component(Component::new("environment").with_variable(Variable::new("t")));

        model
    }

    #[test]
    fn import_records_lists_components_then_units() {
        let model = imported_model();
        let records = model.import_records();

        let names: Vec<_> = records.iter().map(ImportRecord::name).collect();
        assert_eq!(names, ["gate_h", "gate_m", "ms"]);

        assert_eq!(records[0].kind(), ImportKind::Component);
        assert_eq!(records[0].reference(), "gateEquations");
        assert_eq!(records[0].url(), "GateModel.cellml");
        assert_eq!(records[0].source(), records[1].source());
        assert_eq!(records[2].kind(), ImportKind::Units);
        assert_eq!(records[2].url(), "units.cellml");
    }

    #[test]
    fn has_imports_and_unresolved_imports() {
        let mut model = imported_model();
        assert!(model.has_imports());
        assert!(model.has_unresolved_imports());

        let ids: Vec<_> = model.import_source_ids().collect();
        for id in ids {
            let source = model.import_source_mut(id).expect("source should exist");
            let key = crate::DocumentKey::new(source.url());
            source.attach(key);
        }
        assert!(!model.has_unresolved_imports());

        model.clear_imports();
        assert!(model.has_unresolved_imports());
    }

    #[test]
    fn model_without_placeholders_has_no_imports() {
        let mut model = Model::new("plain");
        model.add_component(Component::new("a"));
        model.add_import_source(ImportSource::new("unused.cellml"));

        assert!(!model.has_imports());
        assert!(!model.has_unresolved_imports());
    }

    #[test]
    fn equivalences_are_symmetric() {
        let mut model = imported_model();
        let v = VariableRef::new("membrane", "V");
        let t = VariableRef::new("environment", "t");

        assert!(model.add_equivalence(&v, &t));
        assert!(
            model
                .variable(&v)
                .is_some_and(|variable| variable.is_equivalent_to(&t))
        );
        assert!(
            model
                .variable(&t)
                .is_some_and(|variable| variable.is_equivalent_to(&v))
        );

        assert!(model.remove_equivalence(&t, &v));
        assert!(
            model
                .variable(&v)
                .is_some_and(|variable| variable.equivalences().is_empty())
        );
        assert!(!model.remove_equivalence(&t, &v));
    }

    #[test]
    fn add_equivalence_rejects_missing_variables() {
        let mut model = imported_model();
        let v = VariableRef::new("membrane", "V");

        assert!(!model.add_equivalence(&v, &VariableRef::new("membrane", "missing")));
        assert!(!model.add_equivalence(&v, &v));
    }

    #[test]
    fn find_component_searches_the_whole_tree() {
        let model = imported_model();

        assert!(model.find_component("gate_m").is_some());
        assert_eq!(
            model.component_names(),
            ["membrane", "gate_h", "gate_m", "environment"]
        );
    }

    #[test]
    fn placeholders_of_groups_by_source() {
        let model = imported_model();
        let gates = model.import_records()[0].source();

        let (units, components) = model.placeholders_of(gates);
        assert!(units.is_empty());
        let names: Vec<_> = components.iter().map(|component| component.name()).collect();
        assert_eq!(names, ["gate_h", "gate_m"]);
    }

    #[test]
    fn add_units_keeps_position_on_replace() {
        let mut model = imported_model();
        let replaced = model.add_units(Units::new("mV").with_unit(Unit::new("volt")));

        assert!(replaced.is_some());
        let names: Vec<_> = model.units().keys().map(String::as_str).collect();
        assert_eq!(names, ["mV", "ms"]);
    }
}
