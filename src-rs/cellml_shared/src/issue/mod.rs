//! Issues reported while working with CellML models

mod context;
mod traits;

use std::fmt;

pub use context::Context;
pub use traits::AsIssue;

use crate::CellmlElement;

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// The model cannot be used as is.
    Error,
    /// The model can be used but something is probably wrong.
    Warning,
    /// A suggestion.
    Hint,
    /// Information only.
    Message,
}

impl Level {
    /// Returns the lowercase label used when printing the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an issue, naming the rule it breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceRule {
    /// An import source has an empty `href`.
    ImportSourceEmptyUrl,
    /// The document named by an import source could not be loaded.
    ImporterMissingFile,
    /// The imported component does not exist in the imported document.
    ImporterMissingComponent,
    /// The imported units do not exist in the imported document.
    ImporterMissingUnits,
    /// Imports form a loop.
    ImporterCyclicDependency,
    /// The chain of imports is deeper than allowed.
    ImporterDepthExceeded,
    /// A placeholder was still unresolved when the model was flattened.
    FlattenerUnresolvedImport,
    /// A variable equivalence could not be carried across an import.
    FlattenerDroppedEquivalence,
    /// The document is not well-formed XML.
    XmlMalformed,
    /// The document is not a CellML 2.0 model.
    XmlNotCellml,
    /// An element is missing a required attribute.
    XmlMissingAttribute,
    /// An element refers to a component that does not exist.
    XmlUnknownComponent,
    /// An element refers to a variable that does not exist.
    XmlUnknownVariable,
    /// A numeric attribute does not hold a number.
    XmlInvalidNumber,
}

impl ReferenceRule {
    /// Returns a short identifier for the rule.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImportSourceEmptyUrl => "import-source-empty-url",
            Self::ImporterMissingFile => "importer-missing-file",
            Self::ImporterMissingComponent => "importer-missing-component",
            Self::ImporterMissingUnits => "importer-missing-units",
            Self::ImporterCyclicDependency => "importer-cyclic-dependency",
            Self::ImporterDepthExceeded => "importer-depth-exceeded",
            Self::FlattenerUnresolvedImport => "flattener-unresolved-import",
            Self::FlattenerDroppedEquivalence => "flattener-dropped-equivalence",
            Self::XmlMalformed => "xml-malformed",
            Self::XmlNotCellml => "xml-not-cellml",
            Self::XmlMissingAttribute => "xml-missing-attribute",
            Self::XmlUnknownComponent => "xml-unknown-component",
            Self::XmlUnknownVariable => "xml-unknown-variable",
            Self::XmlInvalidNumber => "xml-invalid-number",
        }
    }
}

impl fmt::Display for ReferenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem found in a model, in a form suitable for display to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    level: Level,
    description: String,
    item: Option<CellmlElement>,
    reference_rule: Option<ReferenceRule>,
    url: Option<String>,
    context: Vec<Context>,
}

impl Issue {
    /// Creates a new issue with the given level and description.
    #[must_use]
    pub const fn new(level: Level, description: String) -> Self {
        Self {
            level,
            description,
            item: None,
            reference_rule: None,
            url: None,
            context: vec![],
        }
    }

    /// Creates an issue from a typed error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cellml_shared::{AsIssue, Issue, Level};
    ///
    /// struct Broken;
    ///
    /// impl AsIssue for Broken {
    ///     fn message(&self) -> String {
    ///         "something is broken".to_string()
    ///     }
    /// }
    ///
    /// let issue = Issue::from_error(&Broken);
    /// assert_eq!(issue.level(), Level::Error);
    /// assert_eq!(issue.description(), "something is broken");
    /// ```
    pub fn from_error(error: &impl AsIssue) -> Self {
        Self {
            level: error.level(),
            description: error.message(),
            item: error.item(),
            reference_rule: error.reference_rule(),
            url: None,
            context: error.context(),
        }
    }

    /// Sets the url of the document the issue was found in.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a note or help message.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context.push(context);
        self
    }

    /// Sets the element the issue is about.
    #[must_use]
    pub fn with_item(mut self, item: CellmlElement) -> Self {
        self.item = Some(item);
        self
    }

    /// Sets the rule the issue is classified under.
    #[must_use]
    pub const fn with_reference_rule(mut self, rule: ReferenceRule) -> Self {
        self.reference_rule = Some(rule);
        self
    }

    /// Returns the severity of the issue.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Returns the description of the issue.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the element the issue is about, if any.
    #[must_use]
    pub const fn item(&self) -> Option<&CellmlElement> {
        self.item.as_ref()
    }

    /// Returns the rule the issue is classified under, if any.
    #[must_use]
    pub const fn reference_rule(&self) -> Option<ReferenceRule> {
        self.reference_rule
    }

    /// Returns the url of the document the issue was found in, if known.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the notes and help attached to the issue.
    #[must_use]
    pub fn context(&self) -> &[Context] {
        &self.context
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.description)
    }
}
