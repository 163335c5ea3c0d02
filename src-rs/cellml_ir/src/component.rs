use crate::{ImportLink, Variable};

/// A component of a model.
///
/// A component owns its variables, its math and its encapsulated children.
/// When it carries an [`ImportLink`] it is a placeholder for a component
/// defined in another document.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    id: Option<String>,
    variables: Vec<Variable>,
    math: Option<String>,
    children: Vec<Component>,
    import: Option<ImportLink>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            variables: vec![],
            math: None,
            children: vec![],
            import: None,
        }
    }

    /// Appends a variable.
    #[must_use]
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Appends an encapsulated child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the math, kept as the text inside the `math` element.
    #[must_use]
    pub fn with_math(mut self, math: impl Into<String>) -> Self {
        self.math = Some(math.into());
        self
    }

    /// Makes the component a placeholder importing `link`.
    #[must_use]
    pub fn with_import(mut self, link: ImportLink) -> Self {
        self.import = Some(link);
        self
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

    /// Renames the component.
    ///
    /// Equivalence links pointing at the component are not updated.
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

    /// Returns the variables.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the variables mutably.
    pub fn variables_mut(&mut self) -> &mut Vec<Variable> {
        &mut self.variables
    }

    /// Returns the variable named `name`.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name() == name)
    }

    /// Returns the variable named `name` mutably.
    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables
            .iter_mut()
            .find(|variable| variable.name() == name)
    }

    /// Returns the math.
    #[must_use]
    pub fn math(&self) -> Option<&str> {
        self.math.as_deref()
    }

    /// Sets or clears the math.
    pub fn set_math(&mut self, math: Option<String>) {
        self.math = math;
    }

    /// Returns the encapsulated children.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the encapsulated children mutably.
    pub fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }

    /// Returns the import link if the component is a placeholder.
    #[must_use]
    pub const fn import(&self) -> Option<&ImportLink> {
        self.import.as_ref()
    }

    /// Sets or clears the import link.
    pub fn set_import(&mut self, import: Option<ImportLink>) {
        self.import = import;
    }

    /// Returns true if the component is a placeholder.
    #[must_use]
    pub const fn is_import(&self) -> bool {
        self.import.is_some()
    }

    /// Iterates over this component and its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self) -> Components<'_> {
        Components::new(std::slice::from_ref(self))
    }

    /// Finds the first component named `name` in this subtree, in pre-order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.descendants().find(|component| component.name() == name)
    }

    /// Finds the first component named `name` in this subtree, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Self> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// Calls `f` on this component and each descendant, in pre-order.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Self)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }
}

/// Pre-order iterator over a forest of components.
#[derive(Debug, Clone)]
pub struct Components<'a> {
    stack: Vec<&'a Component>,
}

impl<'a> Components<'a> {
    pub(crate) fn new(roots: &'a [Component]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Components<'a> {
    type Item = &'a Component;

    fn next(&mut self) -> Option<Self::Item> {
        let component = self.stack.pop()?;
        self.stack.extend(component.children.iter().rev());
        Some(component)
    }
}
