use crate::ImportLink;

/// Units every CellML model may use without defining them.
const STANDARD_UNITS: [&str; 32] = [
    "ampere",
    "becquerel",
    "candela",
    "coulomb",
    "dimensionless",
    "farad",
    "gram",
    "gray",
    "henry",
    "hertz",
    "joule",
    "katal",
    "kelvin",
    "kilogram",
    "litre",
    "lumen",
    "lux",
    "metre",
    "mole",
    "newton",
    "ohm",
    "pascal",
    "radian",
    "second",
    "siemens",
    "sievert",
    "steradian",
    "tesla",
    "volt",
    "watt",
    "weber",
    "celsius",
];

/// Returns true if `name` is one of the built-in CellML units.
#[must_use]
pub fn is_standard_units(name: &str) -> bool {
    STANDARD_UNITS.contains(&name)
}

/// One term of a units definition.
///
/// The term scales the referenced units as
/// `(multiplier * (prefix * reference)) ^ exponent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    reference: String,
    prefix: Option<String>,
    exponent: Option<f64>,
    multiplier: Option<f64>,
    id: Option<String>,
}

impl Unit {
    /// Creates a term referring to `reference` with no scaling.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            prefix: None,
            exponent: None,
            multiplier: None,
            id: None,
        }
    }

    /// Sets the prefix, such as `milli` or `3`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the exponent.
    #[must_use]
    pub const fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = Some(exponent);
        self
    }

    /// Sets the multiplier.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the name of the referenced units.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Points the term at different units.
    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = reference.into();
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the exponent.
    #[must_use]
    pub const fn exponent(&self) -> Option<f64> {
        self.exponent
    }

    /// Returns the multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> Option<f64> {
        self.multiplier
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns true when both terms scale the same units the same way.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.reference == other.reference
            && self.prefix == other.prefix
            && self.exponent.unwrap_or(1.0).to_bits() == other.exponent.unwrap_or(1.0).to_bits()
            && self.multiplier.unwrap_or(1.0).to_bits()
                == other.multiplier.unwrap_or(1.0).to_bits()
    }
}

/// A named units definition, or a placeholder for one defined elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Units {
    name: String,
    id: Option<String>,
    terms: Vec<Unit>,
    import: Option<ImportLink>,
}

impl Units {
    /// Creates a units definition with no terms.
    ///
    /// Units with no terms and no import are base units.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            terms: vec![],
            import: None,
        }
    }

    /// Appends a term.
    #[must_use]
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.terms.push(unit);
        self
    }

    /// Makes the units a placeholder importing `link`.
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

    /// Returns the name of the units.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the units.
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

    /// Returns the terms.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.terms
    }

    /// Returns the terms mutably.
    pub fn units_mut(&mut self) -> &mut Vec<Unit> {
        &mut self.terms
    }

    /// Returns the import link if the units are a placeholder.
    #[must_use]
    pub const fn import(&self) -> Option<&ImportLink> {
        self.import.as_ref()
    }

    /// Sets or clears the import link.
    pub fn set_import(&mut self, import: Option<ImportLink>) {
        self.import = import;
    }

    /// Returns true if the units are a placeholder.
    #[must_use]
    pub const fn is_import(&self) -> bool {
        self.import.is_some()
    }

    /// Returns true when both definitions have the same terms, ignoring
    /// names and identifiers.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.import.is_none()
            && other.import.is_none()
            && self.terms.len() == other.terms.len()
            && self
                .terms
                .iter()
                .zip(&other.terms)
                .all(|(a, b)| a.same_definition(b))
    }
}
