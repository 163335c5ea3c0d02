//! Errors raised while reading and writing CellML documents.

use cellml_shared::{AsIssue, CellmlElement, Level, ReferenceRule};
use thiserror::Error;

/// A problem found while reading a CellML document.
///
/// [`ParseError::Malformed`] and [`ParseError::NotCellml`] stop the read.
/// The others are reported and the offending element is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text is not well-formed XML.
    #[error("The document is not well-formed XML at position {position}: {message}.")]
    Malformed {
        /// Byte offset of the error.
        position: u64,
        /// What the XML reader reported.
        message: String,
    },

    /// The root element is not a CellML model.
    #[error("The root element is '{found}', not a CellML 'model'.")]
    NotCellml {
        /// Name of the root element found.
        found: String,
    },

    /// An element lacks an attribute it cannot do without.
    #[error("A '{element}' element is missing its '{attribute}' attribute.")]
    MissingAttribute {
        /// Name of the element.
        element: &'static str,
        /// Name of the attribute.
        attribute: &'static str,
    },

    /// A numeric attribute does not hold a number.
    #[error("The '{attribute}' attribute of a '{element}' element is not a number: '{value}'.")]
    InvalidNumber {
        /// Name of the element.
        element: &'static str,
        /// Name of the attribute.
        attribute: &'static str,
        /// The text found.
        value: String,
    },

    /// A connection or encapsulation names a component that is not defined.
    #[error("The {context} refers to component '{name}', which is not defined.")]
    UnknownComponent {
        /// Name of the component.
        name: String,
        /// The element that refers to it.
        context: &'static str,
    },

    /// A connection names a variable that its component does not define.
    #[error(
        "The connection refers to variable '{variable}' in component '{component}', which is not defined."
    )]
    UnknownVariable {
        /// Name of the component.
        component: String,
        /// Name of the variable.
        variable: String,
    },
}

impl ParseError {
    pub(crate) fn malformed(position: u64, error: &quick_xml::Error) -> Self {
        Self::Malformed {
            position,
            message: error.to_string(),
        }
    }
}

impl AsIssue for ParseError {
    fn level(&self) -> Level {
        match self {
            Self::Malformed { .. } | Self::NotCellml { .. } | Self::MissingAttribute { .. } => {
                Level::Error
            }
            Self::InvalidNumber { .. }
            | Self::UnknownComponent { .. }
            | Self::UnknownVariable { .. } => Level::Warning,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn item(&self) -> Option<CellmlElement> {
        match self {
            Self::UnknownComponent { name, .. } => Some(CellmlElement::Component {
                name: name.clone(),
            }),
            Self::UnknownVariable {
                component,
                variable,
            } => Some(CellmlElement::Variable {
                component: component.clone(),
                name: variable.clone(),
            }),
            Self::Malformed { .. }
            | Self::NotCellml { .. }
            | Self::MissingAttribute { .. }
            | Self::InvalidNumber { .. } => None,
        }
    }

    fn reference_rule(&self) -> Option<ReferenceRule> {
        let rule = match self {
            Self::Malformed { .. } => ReferenceRule::XmlMalformed,
            Self::NotCellml { .. } => ReferenceRule::XmlNotCellml,
            Self::MissingAttribute { .. } => ReferenceRule::XmlMissingAttribute,
            Self::InvalidNumber { .. } => ReferenceRule::XmlInvalidNumber,
            Self::UnknownComponent { .. } => ReferenceRule::XmlUnknownComponent,
            Self::UnknownVariable { .. } => ReferenceRule::XmlUnknownVariable,
        };
        Some(rule)
    }
}

/// Failure to write a model as CellML.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The XML writer failed.
    #[error("failed to write XML: {0}")]
    Io(#[from] std::io::Error),
    /// The written bytes are not UTF-8.
    #[error("written XML is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
