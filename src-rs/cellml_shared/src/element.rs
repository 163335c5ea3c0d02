use std::fmt;

/// A reference to an element of a CellML model.
///
/// Elements are addressed by name rather than by pointer so that an issue
/// stays meaningful after the model it was found in has changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellmlElement {
    /// A component, by name.
    Component {
        /// Name of the component.
        name: String,
    },
    /// A variable inside a component.
    Variable {
        /// Name of the owning component.
        component: String,
        /// Name of the variable.
        name: String,
    },
    /// A units definition, by name.
    Units {
        /// Name of the units.
        name: String,
    },
    /// A single unit term inside a units definition.
    Unit {
        /// Name of the owning units.
        units: String,
        /// Position of the term inside the units.
        index: usize,
    },
    /// A reset inside a component.
    Reset {
        /// Name of the owning component.
        component: String,
        /// Position of the reset inside the component.
        index: usize,
    },
    /// The reset value of a reset.
    ResetValue {
        /// Name of the owning component.
        component: String,
        /// Position of the reset inside the component.
        index: usize,
    },
    /// The test value of a reset.
    TestValue {
        /// Name of the owning component.
        component: String,
        /// Position of the reset inside the component.
        index: usize,
    },
    /// The connection between two components.
    Connection {
        /// Name of the first component.
        component_1: String,
        /// Name of the second component.
        component_2: String,
    },
    /// A parent/child relation in the encapsulation hierarchy.
    Encapsulation {
        /// Name of the parent component.
        parent: String,
        /// Name of the child component.
        child: String,
    },
    /// An import source, by url.
    ImportSource {
        /// The `href` of the import.
        url: String,
    },
    /// A whole model, by name.
    Model {
        /// Name of the model.
        name: String,
    },
}

impl fmt::Display for CellmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component { name } => write!(f, "component '{name}'"),
            Self::Variable { component, name } => {
                write!(f, "variable '{name}' in component '{component}'")
            }
            Self::Units { name } => write!(f, "units '{name}'"),
            Self::Unit { units, index } => write!(f, "unit {index} of units '{units}'"),
            Self::Reset { component, index } => {
                write!(f, "reset {index} of component '{component}'")
            }
            Self::ResetValue { component, index } => {
                write!(f, "reset value of reset {index} in component '{component}'")
            }
            Self::TestValue { component, index } => {
                write!(f, "test value of reset {index} in component '{component}'")
            }
            Self::Connection {
                component_1,
                component_2,
            } => write!(f, "connection between '{component_1}' and '{component_2}'"),
            Self::Encapsulation { parent, child } => {
                write!(f, "encapsulation of '{child}' in '{parent}'")
            }
            Self::ImportSource { url } => write!(f, "import source '{url}'"),
            Self::Model { name } => write!(f, "model '{name}'"),
        }
    }
}
