//! Writing models as CellML 2.0 documents.

use std::io::Cursor;

use cellml_ir::{Component, ImportSourceId, InterfaceType, Model, Units, Variable};
use indexmap::IndexMap;
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::WriteError;

const CELLML_NAMESPACE: &str = "http://www.cellml.org/cellml/2.0#";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Writes `model` as a CellML document.
///
/// Placeholders are written inside the `import` element of their source.
/// Their variables only exist to carry connections, so only the
/// connections are written.
///
/// # Errors
///
/// Returns an error if the XML writer fails.
pub fn print_model(model: &Model) -> Result<String, WriteError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut start = BytesStart::new("model");
    start.push_attribute(("xmlns", CELLML_NAMESPACE));
    start.push_attribute(("xmlns:cellml", CELLML_NAMESPACE));
    if model.import_source_count() > 0 {
        start.push_attribute(("xmlns:xlink", XLINK_NAMESPACE));
    }
    start.push_attribute(("name", model.name()));
    push_id(&mut start, model.id());
    writer.write_event(Event::Start(start))?;

    for id in model.import_source_ids() {
        write_import(&mut writer, model, id)?;
    }
    for units in model.units().values().filter(|units| !units.is_import()) {
        write_units(&mut writer, units)?;
    }
    for component in model.all_components().filter(|component| !component.is_import()) {
        write_component(&mut writer, component)?;
    }
    write_connections(&mut writer, model)?;
    write_encapsulation(&mut writer, model)?;

    writer.write_event(Event::End(BytesEnd::new("model")))?;

    let mut output = String::from_utf8(buffer.into_inner())?;
    output.push('\n');
    Ok(output)
}

fn write_import<W: std::io::Write>(
    writer: &mut Writer<W>,
    model: &Model,
    id: ImportSourceId,
) -> std::io::Result<()> {
    let Some(source) = model.import_source(id) else {
        return Ok(());
    };

    let mut start = BytesStart::new("import");
    start.push_attribute(("xlink:href", source.url()));
    push_id(&mut start, source.id());

    let (units, components) = model.placeholders_of(id);
    if units.is_empty() && components.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;

    for component in components {
        let Some(link) = component.import() else {
            continue;
        };
        let mut element = BytesStart::new("component");
        element.push_attribute(("name", component.name()));
        element.push_attribute(("component_ref", link.reference()));
        push_id(&mut element, component.id());
        writer.write_event(Event::Empty(element))?;
    }
    for units in units {
        let Some(link) = units.import() else {
            continue;
        };
        let mut element = BytesStart::new("units");
        element.push_attribute(("name", units.name()));
        element.push_attribute(("units_ref", link.reference()));
        push_id(&mut element, units.id());
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("import")))
}

fn write_units<W: std::io::Write>(writer: &mut Writer<W>, units: &Units) -> std::io::Result<()> {
    let mut start = BytesStart::new("units");
    start.push_attribute(("name", units.name()));
    push_id(&mut start, units.id());

    if units.units().is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;

    for unit in units.units() {
        let mut element = BytesStart::new("unit");
        element.push_attribute(("units", unit.reference()));
        if let Some(prefix) = unit.prefix() {
            element.push_attribute(("prefix", prefix));
        }
        if let Some(exponent) = unit.exponent() {
            element.push_attribute(("exponent", exponent.to_string().as_str()));
        }
        if let Some(multiplier) = unit.multiplier() {
            element.push_attribute(("multiplier", multiplier.to_string().as_str()));
        }
        push_id(&mut element, unit.id());
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("units")))
}

fn write_component<W: std::io::Write>(
    writer: &mut Writer<W>,
    component: &Component,
) -> std::io::Result<()> {
    let mut start = BytesStart::new("component");
    start.push_attribute(("name", component.name()));
    push_id(&mut start, component.id());

    if component.variables().is_empty() && component.math().is_none() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;

    for variable in component.variables() {
        write_variable(writer, variable)?;
    }

    if let Some(math) = component.math() {
        let mut start = BytesStart::new("math");
        start.push_attribute(("xmlns", MATHML_NAMESPACE));
        writer.write_event(Event::Start(start))?;
        // the math is kept as written, already escaped
        writer.write_event(Event::Text(BytesText::from_escaped(math)))?;
        writer.write_event(Event::End(BytesEnd::new("math")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("component")))
}

fn write_variable<W: std::io::Write>(
    writer: &mut Writer<W>,
    variable: &Variable,
) -> std::io::Result<()> {
    let mut element = BytesStart::new("variable");
    element.push_attribute(("name", variable.name()));
    if let Some(units) = variable.units() {
        element.push_attribute(("units", units));
    }
    if let Some(value) = variable.initial_value() {
        element.push_attribute(("initial_value", value));
    }
    if variable.interface() != InterfaceType::None {
        element.push_attribute(("interface", variable.interface().as_str()));
    }
    push_id(&mut element, variable.id());
    writer.write_event(Event::Empty(element))
}

/// Writes one `connection` per pair of components with equivalent
/// variables.
fn write_connections<W: std::io::Write>(
    writer: &mut Writer<W>,
    model: &Model,
) -> std::io::Result<()> {
    // each link is stored on both variables; the smaller end writes it
    let mut connections: IndexMap<(&str, &str), Vec<(&str, &str)>> = IndexMap::new();
    for component in model.all_components() {
        for variable in component.variables() {
            for other in variable.equivalences() {
                let this = (component.name(), variable.name());
                let that = (other.component(), other.variable());
                if this < that {
                    connections
                        .entry((this.0, that.0))
                        .or_default()
                        .push((this.1, that.1));
                }
            }
        }
    }

    for ((component_1, component_2), variables) in connections {
        let mut start = BytesStart::new("connection");
        start.push_attribute(("component_1", component_1));
        start.push_attribute(("component_2", component_2));
        writer.write_event(Event::Start(start))?;

        for (variable_1, variable_2) in variables {
            let mut element = BytesStart::new("map_variables");
            element.push_attribute(("variable_1", variable_1));
            element.push_attribute(("variable_2", variable_2));
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new("connection")))?;
    }

    Ok(())
}

fn write_encapsulation<W: std::io::Write>(
    writer: &mut Writer<W>,
    model: &Model,
) -> std::io::Result<()> {
    let parents: Vec<&Component> = model
        .components()
        .iter()
        .filter(|component| !component.children().is_empty())
        .collect();
    if parents.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("encapsulation")))?;
    for parent in parents {
        write_component_ref(writer, parent)?;
    }
    writer.write_event(Event::End(BytesEnd::new("encapsulation")))
}

fn write_component_ref<W: std::io::Write>(
    writer: &mut Writer<W>,
    component: &Component,
) -> std::io::Result<()> {
    let mut start = BytesStart::new("component_ref");
    start.push_attribute(("component", component.name()));

    if component.children().is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;
    for child in component.children() {
        write_component_ref(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("component_ref")))
}

fn push_id(element: &mut BytesStart<'_>, id: Option<&str>) {
    if let Some(id) = id {
        element.push_attribute(("id", id));
    }
}

#[cfg(test)]
mod tests {
    use cellml_ir::{ImportLink, ImportSource, Unit, VariableRef};
    use cellml_shared::Diagnostics;

    use super::*;
    use crate::parse_model;

    fn membrane_model() -> Model {
        let mut model = Model::new("HodgkinHuxley").with_id("hh");
        let source = model.add_import_source(ImportSource::new("GateModel.cellml"));
        model.add_units(Units::new("ms").with_import(ImportLink::new(source, "ms")));
        model.add_units(
            Units::new("mV").with_unit(Unit::new("volt").with_prefix("milli").with_exponent(1.0)),
        );
        model.add_component(
            Component::new("membrane")
                .with_variable(
                    Variable::new("V")
                        .with_units("mV")
                        .with_initial_value("-75")
                        .with_interface(InterfaceType::PublicAndPrivate),
                )
                .with_variable(Variable::new("h").with_units("dimensionless"))
                .with_math("<apply><eq/><ci>V</ci><cn>1</cn></apply>")
                .with_child(
                    Component::new("sodiumChannel_h")
                        .with_import(ImportLink::new(source, "gateEquations"))
                        .with_variable(Variable::new("X")),
                ),
        );
        let h = VariableRef::new("membrane", "h");
        let x = VariableRef::new("sodiumChannel_h", "X");
        assert!(model.add_equivalence(&h, &x));
        model
    }

    #[test]
    fn print_model_writes_placeholders_in_imports() {
        let text = print_model(&membrane_model()).expect("model should print");

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(
            "<component name=\"sodiumChannel_h\" component_ref=\"gateEquations\"/>"
        ));
        assert!(text.contains("<units name=\"ms\" units_ref=\"ms\"/>"));
        assert!(text.contains("<map_variables variable_1=\"h\" variable_2=\"X\"/>"));
        assert!(text.contains("<component_ref component=\"sodiumChannel_h\"/>"));
        assert!(!text.contains("<variable name=\"X\""));
    }

    #[test]
    fn print_model_round_trips() {
        let model = membrane_model();
        let text = print_model(&model).expect("model should print");

        let mut diagnostics = Diagnostics::new();
        let parsed = parse_model(&text, &mut diagnostics).expect("printed model should parse");

        assert!(diagnostics.is_empty());
        assert_eq!(parsed, model);
    }

    #[test]
    fn print_model_keeps_unit_attributes() {
        let mut model = Model::new("units_only");
        model.add_units(
            Units::new("per_ms").with_unit(
                Unit::new("second")
                    .with_prefix("milli")
                    .with_exponent(-1.0)
                    .with_multiplier(2.5),
            ),
        );

        let text = print_model(&model).expect("model should print");

        assert!(text.contains(
            "<unit units=\"second\" prefix=\"milli\" exponent=\"-1\" multiplier=\"2.5\"/>"
        ));
        assert!(!text.contains("xmlns:xlink"));
    }
}
