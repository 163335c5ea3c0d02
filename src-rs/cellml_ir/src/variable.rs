use std::fmt;

/// Which encapsulation neighbours may connect to a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    /// No interface; the variable cannot be connected.
    #[default]
    None,
    /// Visible to the parent and siblings.
    Public,
    /// Visible to the children.
    Private,
    /// Visible to parent, siblings and children.
    PublicAndPrivate,
}

impl InterfaceType {
    /// Returns the attribute value used in CellML documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Public => "public",
            Self::Private => "private",
            Self::PublicAndPrivate => "public_and_private",
        }
    }

    /// Parses an attribute value used in CellML documents.
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "public_and_private" => Some(Self::PublicAndPrivate),
            _ => None,
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses a variable by the name of its component and its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableRef {
    component: String,
    variable: String,
}

impl VariableRef {
    /// Creates a new reference to `variable` in `component`.
    #[must_use]
    pub fn new(component: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            variable: variable.into(),
        }
    }

    /// Returns the name of the component.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Returns the name of the variable.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Points the reference at a different component.
    pub fn set_component(&mut self, component: impl Into<String>) {
        self.component = component.into();
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.variable)
    }
}

/// A variable of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    id: Option<String>,
    units: Option<String>,
    initial_value: Option<String>,
    interface: InterfaceType,
    equivalences: Vec<VariableRef>,
}

impl Variable {
    /// Creates a variable with no units, initial value or equivalences.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            units: None,
            initial_value: None,
            interface: InterfaceType::None,
            equivalences: vec![],
        }
    }

    /// Sets the units of the variable.
    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Sets the initial value of the variable.
    #[must_use]
    pub fn with_initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Sets the interface type of the variable.
    #[must_use]
    pub const fn with_interface(mut self, interface: InterfaceType) -> Self {
        self.interface = interface;
        self
    }

    /// Adds a one-sided equivalence link.
    #[must_use]
    pub fn with_equivalence(mut self, other: VariableRef) -> Self {
        self.add_equivalence(other);
        self
    }

    /// Sets the identifier of the variable.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the name of the variable.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identifier of the variable.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the name of the units of the variable.
    #[must_use]
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Sets the units of the variable.
    pub fn set_units(&mut self, units: Option<String>) {
        self.units = units;
    }

    /// Returns the initial value, either a number or a variable name.
    #[must_use]
    pub fn initial_value(&self) -> Option<&str> {
        self.initial_value.as_deref()
    }

    /// Sets the initial value.
    pub fn set_initial_value(&mut self, value: Option<String>) {
        self.initial_value = value;
    }

    /// Returns the interface type.
    #[must_use]
    pub const fn interface(&self) -> InterfaceType {
        self.interface
    }

    /// Returns the variables this one is equivalent to.
    #[must_use]
    pub fn equivalences(&self) -> &[VariableRef] {
        &self.equivalences
    }

    /// Returns true when the variable is equivalent to `other`.
    #[must_use]
    pub fn is_equivalent_to(&self, other: &VariableRef) -> bool {
        self.equivalences.contains(other)
    }

    /// Adds a one-sided equivalence link, returning false if it was present.
    ///
    /// Use [`Model::add_equivalence`](crate::Model::add_equivalence) to keep
    /// links symmetric.
    pub fn add_equivalence(&mut self, other: VariableRef) -> bool {
        if self.equivalences.contains(&other) {
            return false;
        }
        self.equivalences.push(other);
        true
    }

    /// Removes a one-sided equivalence link, returning false if it was absent.
    pub fn remove_equivalence(&mut self, other: &VariableRef) -> bool {
        let before = self.equivalences.len();
        self.equivalences.retain(|link| link != other);
        before != self.equivalences.len()
    }

    /// Keeps only the equivalence links for which `keep` returns true.
    pub fn retain_equivalences(&mut self, keep: impl FnMut(&VariableRef) -> bool) {
        self.equivalences.retain(keep);
    }

    /// Returns the equivalence links mutably.
    pub fn equivalences_mut(&mut self) -> &mut Vec<VariableRef> {
        &mut self.equivalences
    }
}
