//! Reading CellML 2.0 documents into models.
//!
//! The reader walks the document once, collecting components in a flat
//! list, then builds the encapsulation tree and the variable equivalences
//! once every component is known. Import elements become import sources and
//! placeholders.

use std::collections::{HashMap, HashSet};

use cellml_ir::{
    Component, ImportLink, ImportSource, ImportSourceId, InterfaceType, Model, Unit, Units,
    Variable, VariableRef,
};
use cellml_shared::{Diagnostics, Issue};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::{debug, trace};

use crate::error::ParseError;

/// Reads a CellML document.
///
/// Problems that only affect one element are reported to `diagnostics` and
/// the element is skipped.
///
/// # Errors
///
/// Returns an error if the text is not well-formed XML or its root element
/// is not a CellML `model`.
pub fn parse_model(text: &str, diagnostics: &mut Diagnostics) -> Result<Model, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut parser = Parser {
        reader,
        diagnostics,
        model: Model::new(""),
        components: vec![],
        encapsulation: vec![],
        connections: vec![],
    };

    parser.parse_document()?;
    Ok(parser.finish())
}

/// One `connection` element.
struct Connection {
    component_1: String,
    component_2: String,
    variables: Vec<(String, String)>,
}

struct Parser<'i, 'd> {
    reader: Reader<&'i [u8]>,
    diagnostics: &'d mut Diagnostics,
    model: Model,
    /// Components and placeholders in document order, before encapsulation.
    components: Vec<Component>,
    /// `(parent, child)` pairs.
    encapsulation: Vec<(String, String)>,
    connections: Vec<Connection>,
}

impl<'i> Parser<'i, '_> {
    fn parse_document(&mut self) -> Result<(), ParseError> {
        loop {
            match self.next_event()? {
                Event::Start(start) => {
                    self.parse_model_element(&start)?;
                    return self.parse_model_children();
                }
                Event::Empty(start) => return self.parse_model_element(&start),
                Event::Eof => {
                    return Err(ParseError::Malformed {
                        position: self.reader.buffer_position(),
                        message: "the document has no root element".to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    fn parse_model_element(&mut self, start: &BytesStart<'i>) -> Result<(), ParseError> {
        let name = local_name(start);
        if name != "model" {
            return Err(ParseError::NotCellml { found: name });
        }

        let mut attributes = self.attributes(start)?;
        if let Some(name) = self.required(&mut attributes, "model", "name") {
            self.model.set_name(name);
        }
        self.model.set_id(attributes.remove("id"));

        debug!(model = self.model.name(), "reading model");
        Ok(())
    }

    fn parse_model_children(&mut self) -> Result<(), ParseError> {
        loop {
            let (start, empty) = match self.next_event()? {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.unexpected_eof()),
                _ => continue,
            };

            match local_name(&start).as_str() {
                "import" => self.parse_import(&start, empty)?,
                "units" => self.parse_units(&start, empty)?,
                "component" => self.parse_component(&start, empty)?,
                "connection" => self.parse_connection(&start, empty)?,
                "encapsulation" if !empty => self.parse_encapsulation()?,
                other => {
                    trace!(element = other, "skipping element");
                    self.skip(&start, empty)?;
                }
            }
        }
    }

    fn parse_import(&mut self, start: &BytesStart<'i>, empty: bool) -> Result<(), ParseError> {
        let mut attributes = self.attributes(start)?;
        let url = match attributes
            .remove("xlink:href")
            .or_else(|| attributes.remove("href"))
        {
            Some(url) => url,
            None => {
                self.report(ParseError::MissingAttribute {
                    element: "import",
                    attribute: "xlink:href",
                });
                String::new()
            }
        };

        let mut source = ImportSource::new(url);
        if let Some(id) = attributes.remove("id") {
            source = source.with_id(id);
        }
        let source = self.model.add_import_source(source);

        if empty {
            return Ok(());
        }

        loop {
            let (start, empty) = match self.next_event()? {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.unexpected_eof()),
                _ => continue,
            };

            match local_name(&start).as_str() {
                "component" => self.parse_imported_component(&start, source)?,
                "units" => self.parse_imported_units(&start, source)?,
                _ => {}
            }
            self.skip(&start, empty)?;
        }
    }

    fn parse_imported_component(
        &mut self,
        start: &BytesStart<'i>,
        source: ImportSourceId,
    ) -> Result<(), ParseError> {
        let mut attributes = self.attributes(start)?;
        let Some(name) = self.required(&mut attributes, "component", "name") else {
            return Ok(());
        };
        let Some(reference) = self.required(&mut attributes, "component", "component_ref") else {
            return Ok(());
        };

        let mut placeholder =
            Component::new(name).with_import(ImportLink::new(source, reference));
        placeholder.set_id(attributes.remove("id"));
        self.components.push(placeholder);
        Ok(())
    }

    fn parse_imported_units(
        &mut self,
        start: &BytesStart<'i>,
        source: ImportSourceId,
    ) -> Result<(), ParseError> {
        let mut attributes = self.attributes(start)?;
        let Some(name) = self.required(&mut attributes, "units", "name") else {
            return Ok(());
        };
        let Some(reference) = self.required(&mut attributes, "units", "units_ref") else {
            return Ok(());
        };

        let mut placeholder = Units::new(name).with_import(ImportLink::new(source, reference));
        placeholder.set_id(attributes.remove("id"));
        self.model.add_units(placeholder);
        Ok(())
    }

    fn parse_units(&mut self, start: &BytesStart<'i>, empty: bool) -> Result<(), ParseError> {
        let mut attributes = self.attributes(start)?;
        let name = self.required(&mut attributes, "units", "name");
        let mut units = name.map(Units::new);
        if let Some(units) = &mut units {
            units.set_id(attributes.remove("id"));
        }

        if !empty {
            loop {
                let (start, empty) = match self.next_event()? {
                    Event::Start(start) => (start, false),
                    Event::Empty(start) => (start, true),
                    Event::End(_) => break,
                    Event::Eof => return Err(self.unexpected_eof()),
                    _ => continue,
                };

                if local_name(&start) == "unit"
                    && let Some(unit) = self.parse_unit(&start)?
                    && let Some(units) = &mut units
                {
                    units.units_mut().push(unit);
                }
                self.skip(&start, empty)?;
            }
        }

        if let Some(units) = units {
            self.model.add_units(units);
        }
        Ok(())
    }

    fn parse_unit(&mut self, start: &BytesStart<'i>) -> Result<Option<Unit>, ParseError> {
        let mut attributes = self.attributes(start)?;
        let Some(reference) = self.required(&mut attributes, "unit", "units") else {
            return Ok(None);
        };

        let mut unit = Unit::new(reference);
        if let Some(prefix) = attributes.remove("prefix") {
            unit = unit.with_prefix(prefix);
        }
        if let Some(exponent) = self.number(&mut attributes, "exponent") {
            unit = unit.with_exponent(exponent);
        }
        if let Some(multiplier) = self.number(&mut attributes, "multiplier") {
            unit = unit.with_multiplier(multiplier);
        }
        if let Some(id) = attributes.remove("id") {
            unit = unit.with_id(id);
        }
        Ok(Some(unit))
    }

    fn parse_component(&mut self, start: &BytesStart<'i>, empty: bool) -> Result<(), ParseError> {
        let mut attributes = self.attributes(start)?;
        let Some(name) = self.required(&mut attributes, "component", "name") else {
            return self.skip(start, empty);
        };

        let mut component = Component::new(name);
        component.set_id(attributes.remove("id"));

        if !empty {
            loop {
                let (start, empty) = match self.next_event()? {
                    Event::Start(start) => (start, false),
                    Event::Empty(start) => (start, true),
                    Event::End(_) => break,
                    Event::Eof => return Err(self.unexpected_eof()),
                    _ => continue,
                };

                match local_name(&start).as_str() {
                    "variable" => {
                        if let Some(variable) = self.parse_variable(&start)? {
                            component.variables_mut().push(variable);
                        }
                        self.skip(&start, empty)?;
                    }
                    "math" if !empty => {
                        let math = self.read_math(&start)?;
                        let math = match component.math() {
                            Some(existing) => format!("{existing}\n{math}"),
                            None => math,
                        };
                        component.set_math(Some(math));
                    }
                    other => {
                        trace!(element = other, component = component.name(), "skipping element");
                        self.skip(&start, empty)?;
                    }
                }
            }
        }

        self.components.push(component);
        Ok(())
    }

    fn parse_variable(&mut self, start: &BytesStart<'i>) -> Result<Option<Variable>, ParseError> {
        let mut attributes = self.attributes(start)?;
        let Some(name) = self.required(&mut attributes, "variable", "name") else {
            return Ok(None);
        };

        let mut variable = Variable::new(name);
        if let Some(units) = attributes.remove("units") {
            variable = variable.with_units(units);
        }
        if let Some(value) = attributes.remove("initial_value") {
            variable = variable.with_initial_value(value);
        }
        if let Some(interface) = attributes
            .remove("interface")
            .as_deref()
            .and_then(InterfaceType::from_attribute)
        {
            variable = variable.with_interface(interface);
        }
        if let Some(id) = attributes.remove("id") {
            variable = variable.with_id(id);
        }
        Ok(Some(variable))
    }

    /// Returns the raw MathML inside a `math` element, which is consumed.
    fn read_math(&mut self, start: &BytesStart<'i>) -> Result<String, ParseError> {
        let text = self
            .reader
            .read_text(start.name())
            .map_err(|error| ParseError::malformed(self.reader.error_position(), &error))?;
        Ok(text.trim().to_string())
    }

    fn parse_connection(&mut self, start: &BytesStart<'i>, empty: bool) -> Result<(), ParseError> {
        let mut attributes = self.attributes(start)?;
        let component_1 = self.required(&mut attributes, "connection", "component_1");
        let component_2 = self.required(&mut attributes, "connection", "component_2");

        let mut variables = vec![];
        if !empty {
            loop {
                let (start, empty) = match self.next_event()? {
                    Event::Start(start) => (start, false),
                    Event::Empty(start) => (start, true),
                    Event::End(_) => break,
                    Event::Eof => return Err(self.unexpected_eof()),
                    _ => continue,
                };

                if local_name(&start) == "map_variables" {
                    let mut attributes = self.attributes(&start)?;
                    let variable_1 = self.required(&mut attributes, "map_variables", "variable_1");
                    let variable_2 = self.required(&mut attributes, "map_variables", "variable_2");
                    if let (Some(variable_1), Some(variable_2)) = (variable_1, variable_2) {
                        variables.push((variable_1, variable_2));
                    }
                }
                self.skip(&start, empty)?;
            }
        }

        if let (Some(component_1), Some(component_2)) = (component_1, component_2) {
            self.connections.push(Connection {
                component_1,
                component_2,
                variables,
            });
        }
        Ok(())
    }

    /// Reads the `component_ref` tree of an `encapsulation` element.
    fn parse_encapsulation(&mut self) -> Result<(), ParseError> {
        // open `component_ref` elements; `None` for one without a name
        let mut open: Vec<Option<String>> = vec![];

        loop {
            let (start, empty) = match self.next_event()? {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::End(_) => {
                    if open.pop().is_none() {
                        return Ok(());
                    }
                    continue;
                }
                Event::Eof => return Err(self.unexpected_eof()),
                _ => continue,
            };

            if local_name(&start) != "component_ref" {
                self.skip(&start, empty)?;
                continue;
            }

            let mut attributes = self.attributes(&start)?;
            let name = self.required(&mut attributes, "component_ref", "component");
            if let (Some(Some(parent)), Some(child)) = (open.last(), &name) {
                self.encapsulation.push((parent.clone(), child.clone()));
            }
            if !empty {
                open.push(name);
            }
        }
    }

    /// Builds the model from what was read.
    fn finish(mut self) -> Model {
        let components = std::mem::take(&mut self.components);
        let roots = self.build_tree(components);
        self.model.components_mut().extend(roots);

        for connection in std::mem::take(&mut self.connections) {
            self.connect(&connection);
        }

        self.model
    }

    /// Nests components as the encapsulation pairs say, keeping document
    /// order among siblings.
    fn build_tree(&mut self, components: Vec<Component>) -> Vec<Component> {
        let index: HashMap<String, usize> = components
            .iter()
            .enumerate()
            .map(|(i, component)| (component.name().to_string(), i))
            .collect();

        let mut has_parent: HashSet<usize> = HashSet::new();
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (parent, child) in std::mem::take(&mut self.encapsulation) {
            let Some(&parent) = index.get(&parent) else {
                self.report(ParseError::UnknownComponent {
                    name: parent,
                    context: "encapsulation",
                });
                continue;
            };
            let Some(&child) = index.get(&child) else {
                self.report(ParseError::UnknownComponent {
                    name: child,
                    context: "encapsulation",
                });
                continue;
            };
            if parent != child && has_parent.insert(child) {
                children.entry(parent).or_default().push(child);
            }
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }

        let mut slots: Vec<Option<Component>> = components.into_iter().map(Some).collect();
        let mut roots = vec![];
        for i in 0..slots.len() {
            if !has_parent.contains(&i)
                && let Some(root) = take_subtree(&mut slots, &children, i)
            {
                roots.push(root);
            }
        }

        // components caught in an encapsulation loop have no root above them
        for i in 0..slots.len() {
            if let Some(component) = take_subtree(&mut slots, &children, i) {
                roots.push(component);
            }
        }

        roots
    }

    /// Turns a connection into equivalences.
    ///
    /// Variables named on a placeholder are added to it, since the
    /// placeholder does not define its own variables.
    fn connect(&mut self, connection: &Connection) {
        for name in [&connection.component_1, &connection.component_2] {
            if self.model.find_component(name).is_none() {
                self.report(ParseError::UnknownComponent {
                    name: name.clone(),
                    context: "connection",
                });
                return;
            }
        }

        for (variable_1, variable_2) in &connection.variables {
            let a = VariableRef::new(connection.component_1.as_str(), variable_1.as_str());
            let b = VariableRef::new(connection.component_2.as_str(), variable_2.as_str());

            if self.ensure_variable(&a) && self.ensure_variable(&b) {
                self.model.add_equivalence(&a, &b);
            }
        }
    }

    /// Returns true if the variable exists, adding it first if its
    /// component is a placeholder.
    fn ensure_variable(&mut self, reference: &VariableRef) -> bool {
        let Some(component) = self.model.find_component_mut(reference.component()) else {
            return false;
        };
        if component.variable(reference.variable()).is_some() {
            return true;
        }
        if component.is_import() {
            component
                .variables_mut()
                .push(Variable::new(reference.variable()));
            return true;
        }

        self.report(ParseError::UnknownVariable {
            component: reference.component().to_string(),
            variable: reference.variable().to_string(),
        });
        false
    }

    fn next_event(&mut self) -> Result<Event<'i>, ParseError> {
        self.reader
            .read_event()
            .map_err(|error| ParseError::malformed(self.reader.error_position(), &error))
    }

    /// Skips the content of an element whose start was just read.
    fn skip(&mut self, start: &BytesStart<'i>, empty: bool) -> Result<(), ParseError> {
        if empty {
            return Ok(());
        }
        self.reader
            .read_to_end(start.name())
            .map(|_| ())
            .map_err(|error| ParseError::malformed(self.reader.error_position(), &error))
    }

    fn unexpected_eof(&self) -> ParseError {
        ParseError::Malformed {
            position: self.reader.buffer_position(),
            message: "unexpected end of document".to_string(),
        }
    }

    fn attributes(&self, start: &BytesStart<'i>) -> Result<HashMap<String, String>, ParseError> {
        let mut attributes = HashMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|error| {
                ParseError::malformed(self.reader.error_position(), &error.into())
            })?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|error| ParseError::malformed(self.reader.error_position(), &error))?;
            attributes.insert(key, value.into_owned());
        }
        Ok(attributes)
    }

    /// Takes a required attribute, reporting it if it is missing.
    fn required(
        &mut self,
        attributes: &mut HashMap<String, String>,
        element: &'static str,
        attribute: &'static str,
    ) -> Option<String> {
        let value = attributes.remove(attribute);
        if value.is_none() {
            self.report(ParseError::MissingAttribute { element, attribute });
        }
        value
    }

    /// Takes a numeric `unit` attribute, reporting it if it is not a number.
    fn number(
        &mut self,
        attributes: &mut HashMap<String, String>,
        attribute: &'static str,
    ) -> Option<f64> {
        let value = attributes.remove(attribute)?;
        match value.trim().parse() {
            Ok(number) => Some(number),
            Err(_) => {
                self.report(ParseError::InvalidNumber {
                    element: "unit",
                    attribute,
                    value,
                });
                None
            }
        }
    }

    fn report(&mut self, error: ParseError) {
        self.diagnostics.add(Issue::from_error(&error));
    }
}

fn take_subtree(
    slots: &mut [Option<Component>],
    children: &HashMap<usize, Vec<usize>>,
    index: usize,
) -> Option<Component> {
    let mut component = slots.get_mut(index)?.take()?;
    for &child in children.get(&index).into_iter().flatten() {
        if let Some(child) = take_subtree(slots, children, child) {
            component.children_mut().push(child);
        }
    }
    Some(component)
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}
