use cellml_shared::Level;

/// The default limit on the length of an import chain.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings for an [`Importer`](crate::Importer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImporterOptions {
    max_depth: usize,
    missing_document_level: Level,
}

impl ImporterOptions {
    /// Creates the default options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            missing_document_level: Level::Error,
        }
    }

    /// Sets how many imports may be followed from the root model before the
    /// chain is abandoned.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the level documents that cannot be loaded are reported with.
    #[must_use]
    pub const fn with_missing_document_level(mut self, level: Level) -> Self {
        self.missing_document_level = level;
        self
    }

    /// Returns the maximum import chain length.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the level missing documents are reported with.
    #[must_use]
    pub const fn missing_document_level(&self) -> Level {
        self.missing_document_level
    }
}

impl Default for ImporterOptions {
    fn default() -> Self {
        Self::new()
    }
}
