use cellml_ir::ImportKind;
use cellml_shared::{AsIssue, CellmlElement, Context, Level, ReferenceRule};
use thiserror::Error;

use super::import::placeholder_element;

/// A problem found while flattening a model.
///
/// Flattening always produces a model; these describe where the result
/// differs from a full substitution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenWarning {
    /// A placeholder could not be substituted and was copied as an import.
    #[error(
        "The {kind} '{name}' imported from '{url}' is not resolved and was copied into the flattened model as an import."
    )]
    UnresolvedImport {
        /// Kind of the placeholder.
        kind: ImportKind,
        /// Name of the placeholder.
        name: String,
        /// Url of the import source.
        url: String,
    },

    /// A placeholder variable's equivalence has no counterpart in the
    /// substituted component.
    #[error(
        "Variable '{variable}' in component '{component}' is equivalent to variable '{other_variable}' in component '{other_component}', but component '{reference}' imported from '{url}' has no variable '{variable}'. The equivalence was dropped."
    )]
    DroppedEquivalence {
        /// Name of the placeholder component.
        component: String,
        /// Name of the placeholder variable.
        variable: String,
        /// Component on the other side of the link.
        other_component: String,
        /// Variable on the other side of the link.
        other_variable: String,
        /// Name of the imported component.
        reference: String,
        /// Url of the import source.
        url: String,
    },
}

impl AsIssue for FlattenWarning {
    fn level(&self) -> Level {
        Level::Warning
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn item(&self) -> Option<CellmlElement> {
        match self {
            Self::UnresolvedImport { kind, name, .. } => Some(placeholder_element(*kind, name)),
            Self::DroppedEquivalence {
                component,
                variable,
                ..
            } => Some(CellmlElement::Variable {
                component: component.clone(),
                name: variable.clone(),
            }),
        }
    }

    fn reference_rule(&self) -> Option<ReferenceRule> {
        match self {
            Self::UnresolvedImport { .. } => Some(ReferenceRule::FlattenerUnresolvedImport),
            Self::DroppedEquivalence { .. } => Some(ReferenceRule::FlattenerDroppedEquivalence),
        }
    }

    fn context(&self) -> Vec<Context> {
        match self {
            Self::UnresolvedImport { .. } => vec![Context::Help(
                "resolve the imports of the model before flattening it".to_string(),
            )],
            Self::DroppedEquivalence { .. } => vec![],
        }
    }
}
