use cellml_ir::{DocumentKey, ImportKind};
use cellml_shared::{AsIssue, CellmlElement, Context, Level, ReferenceRule};
use thiserror::Error;

use crate::util::ImportFrame;

/// A problem found while resolving an import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The placeholder's import source has no url.
    #[error("The import source for {kind} '{name}' has an empty url.")]
    EmptyUrl {
        /// Kind of the placeholder.
        kind: ImportKind,
        /// Name of the placeholder.
        name: String,
    },

    /// The imported document could not be loaded.
    #[error(
        "The attempt to resolve imports with the model at '{key}' failed: the file could not be loaded."
    )]
    MissingDocument {
        /// Library key of the document.
        key: DocumentKey,
        /// Why the loader gave up.
        reason: String,
        /// Level to report the error with.
        level: Level,
    },

    /// The imported document has no item with the requested name.
    #[error(
        "Import of {kind} '{name}' from '{url}' requires {kind} named '{reference}' which cannot be found."
    )]
    MissingReference {
        /// Kind of the placeholder.
        kind: ImportKind,
        /// Name of the placeholder.
        name: String,
        /// Url of the import source.
        url: String,
        /// Name of the item that was requested.
        reference: String,
    },

    /// Following the import would close a loop.
    #[error(
        "Cyclic dependencies were found when attempting to resolve {} in model '{model}'. The dependency loop is:\n{}",
        describe_items(.chain),
        describe_chain(.chain)
    )]
    CyclicDependency {
        /// Name of the model the loop was found in.
        model: String,
        /// The imports forming the loop, closing with the repeated import.
        chain: Vec<ImportFrame>,
    },

    /// The chain of imports is longer than allowed.
    #[error(
        "Import of {kind} '{name}' from '{url}' exceeds the maximum import depth of {max_depth}."
    )]
    DepthExceeded {
        /// Kind of the placeholder.
        kind: ImportKind,
        /// Name of the placeholder.
        name: String,
        /// Url of the import source.
        url: String,
        /// The configured limit.
        max_depth: usize,
    },
}

fn describe_items(chain: &[ImportFrame]) -> &'static str {
    let only_units = chain.iter().all(|frame| frame.kind() == ImportKind::Units);
    if only_units { "units" } else { "components" }
}

fn describe_chain(chain: &[ImportFrame]) -> String {
    let lines: Vec<String> = chain.iter().map(|frame| format!(" - {frame}")).collect();

    match lines.split_last() {
        Some((last, [])) => format!("{last}."),
        Some((last, rest)) => format!("{},\n and\n{last}.", rest.join(",\n")),
        None => String::new(),
    }
}

impl AsIssue for ImportError {
    fn level(&self) -> Level {
        match self {
            Self::MissingDocument { level, .. } => *level,
            Self::CyclicDependency { .. } => Level::Warning,
            Self::EmptyUrl { .. } | Self::MissingReference { .. } | Self::DepthExceeded { .. } => {
                Level::Error
            }
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn item(&self) -> Option<CellmlElement> {
        match self {
            Self::EmptyUrl { kind, name }
            | Self::MissingReference { kind, name, .. }
            | Self::DepthExceeded { kind, name, .. } => Some(placeholder_element(*kind, name)),
            Self::MissingDocument { key, .. } => Some(CellmlElement::ImportSource {
                url: key.to_string(),
            }),
            Self::CyclicDependency { model, .. } => Some(CellmlElement::Model {
                name: model.clone(),
            }),
        }
    }

    fn reference_rule(&self) -> Option<ReferenceRule> {
        let rule = match self {
            Self::EmptyUrl { .. } => ReferenceRule::ImportSourceEmptyUrl,
            Self::MissingDocument { .. } => ReferenceRule::ImporterMissingFile,
            Self::MissingReference {
                kind: ImportKind::Component,
                ..
            } => ReferenceRule::ImporterMissingComponent,
            Self::MissingReference {
                kind: ImportKind::Units,
                ..
            } => ReferenceRule::ImporterMissingUnits,
            Self::CyclicDependency { .. } => ReferenceRule::ImporterCyclicDependency,
            Self::DepthExceeded { .. } => ReferenceRule::ImporterDepthExceeded,
        };
        Some(rule)
    }

    fn context(&self) -> Vec<Context> {
        match self {
            Self::MissingDocument { reason, .. } => vec![Context::Note(reason.clone())],
            Self::CyclicDependency { .. } => vec![Context::Help(
                "change the url or the imported name of one of the imports in the loop"
                    .to_string(),
            )],
            Self::DepthExceeded { .. } => vec![Context::Note(
                "the import chain is not a loop, but it is too long to follow".to_string(),
            )],
            Self::EmptyUrl { .. } | Self::MissingReference { .. } => vec![],
        }
    }
}

pub(crate) fn placeholder_element(kind: ImportKind, name: &str) -> CellmlElement {
    match kind {
        ImportKind::Component => CellmlElement::Component {
            name: name.to_string(),
        },
        ImportKind::Units => CellmlElement::Units {
            name: name.to_string(),
        },
    }
}
