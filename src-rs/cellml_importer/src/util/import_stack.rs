use std::fmt;

use cellml_ir::{DocumentKey, ImportKind};

use super::Stack;

/// One level of the chain of imports being resolved.
///
/// Two frames are the same import when they ask the same document for the
/// same item; the placeholder that asked does not matter.
#[derive(Debug, Clone, Eq)]
pub struct ImportFrame {
    key: DocumentKey,
    reference: String,
    kind: ImportKind,
    name: String,
    url: String,
}

impl ImportFrame {
    /// Creates a frame for the placeholder `name` importing `reference`
    /// from `url`, which normalizes to `key`.
    #[must_use]
    pub fn new(
        key: DocumentKey,
        reference: impl Into<String>,
        kind: ImportKind,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            key,
            reference: reference.into(),
            kind,
            name: name.into(),
            url: url.into(),
        }
    }

    /// Returns the library key of the imported document.
    #[must_use]
    pub const fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Returns the name of the item in the imported document.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the kind of the imported item.
    #[must_use]
    pub const fn kind(&self) -> ImportKind {
        self.kind
    }

    /// Returns the name of the placeholder.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the url as written in the importing document.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PartialEq for ImportFrame {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.reference == other.reference
    }
}

impl fmt::Display for ImportFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' is imported from '{}' in '{}'",
            self.kind, self.name, self.reference, self.url
        )
    }
}

/// The chain of imports currently being followed.
#[derive(Debug, Clone, Default)]
pub struct ImportStack {
    frames: Stack<ImportFrame>,
}

impl ImportStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: Stack::new(),
        }
    }

    /// Pushes a frame, unless it is already on the stack.
    ///
    /// Returns false, leaving the stack untouched, when pushing would close
    /// a loop.
    pub fn push(&mut self, frame: ImportFrame) -> bool {
        if self.find_cycle(&frame).is_some() {
            return false;
        }
        self.frames.push(frame);
        true
    }

    /// Removes the top frame.
    pub fn pop(&mut self) -> Option<ImportFrame> {
        self.frames.pop()
    }

    /// Returns the number of frames.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the loop `frame` would close, from its first occurrence to
    /// `frame` itself.
    #[must_use]
    pub fn find_cycle(&self, frame: &ImportFrame) -> Option<Vec<ImportFrame>> {
        self.frames.find_circular_dependency(frame)
    }
}
