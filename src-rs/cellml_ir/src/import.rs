use std::fmt;

use crate::DocumentKey;

/// Index of an import source inside the model that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportSourceId(usize);

impl ImportSourceId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of the source in
    /// [`Model::import_sources`](crate::Model::import_sources).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The document an import placeholder takes its definition from.
///
/// Once resolved, the source names the library document it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    url: String,
    id: Option<String>,
    document: Option<DocumentKey>,
}

impl ImportSource {
    /// Creates an unresolved import source for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: None,
            document: None,
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the url as written in the importing document.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Changes the url.
    ///
    /// The source is detached from any document it was resolved to.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.document = None;
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the library key of the document this source resolved to.
    #[must_use]
    pub const fn document(&self) -> Option<&DocumentKey> {
        self.document.as_ref()
    }

    /// Returns true once the source has a document attached.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.document.is_some()
    }

    /// Attaches the library document the source resolved to.
    pub fn attach(&mut self, document: DocumentKey) {
        self.document = Some(document);
    }

    /// Detaches the document, leaving the source unresolved.
    pub fn detach(&mut self) {
        self.document = None;
    }
}

/// Links a placeholder to the definition it imports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportLink {
    source: ImportSourceId,
    reference: String,
}

impl ImportLink {
    /// Creates a link to the item named `reference` in `source`.
    #[must_use]
    pub fn new(source: ImportSourceId, reference: impl Into<String>) -> Self {
        Self {
            source,
            reference: reference.into(),
        }
    }

    /// Returns the import source.
    #[must_use]
    pub const fn source(&self) -> ImportSourceId {
        self.source
    }

    /// Returns the name of the item in the imported document.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Changes the name of the item in the imported document.
    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = reference.into();
    }
}

/// The kind of item a placeholder imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// A component, with its encapsulated children.
    Component,
    /// A units definition.
    Units,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => f.write_str("component"),
            Self::Units => f.write_str("units"),
        }
    }
}

/// Describes one import placeholder of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    kind: ImportKind,
    name: String,
    reference: String,
    source: ImportSourceId,
    url: String,
}

impl ImportRecord {
    /// Creates a new record.
    #[must_use]
    pub const fn new(
        kind: ImportKind,
        name: String,
        reference: String,
        source: ImportSourceId,
        url: String,
    ) -> Self {
        Self {
            kind,
            name,
            reference,
            source,
            url,
        }
    }

    /// Returns whether a component or units is imported.
    #[must_use]
    pub const fn kind(&self) -> ImportKind {
        self.kind
    }

    /// Returns the name of the placeholder in the importing model.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the item in the imported document.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the import source of the placeholder.
    #[must_use]
    pub const fn source(&self) -> ImportSourceId {
        self.source
    }

    /// Returns the url of the import source, empty if the source is missing.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}
