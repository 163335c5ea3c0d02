use crate::{Issue, Level};

/// An ordered collection of issues.
///
/// Issues are kept in the order they were added. The sink is owned by the
/// caller and passed into each operation that can report problems, so a
/// fresh report only needs a call to [`Diagnostics::remove_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    issues: Vec<Issue>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: vec![] }
    }

    /// Appends an issue.
    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Returns the number of issues.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.issues.len()
    }

    /// Returns true when there are no issues.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the issue at `index`, in discovery order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }

    /// Removes every issue.
    pub fn remove_all(&mut self) {
        self.issues.clear();
    }

    /// Iterates over the issues in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    /// Returns the issues with the given level.
    pub fn with_level(&self, level: Level) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.level() == level)
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.with_level(Level::Error).count()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.with_level(Level::Warning).count()
    }

    /// Returns true when at least one issue is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.with_level(Level::Error).next().is_some()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl Extend<Issue> for Diagnostics {
    fn extend<T: IntoIterator<Item = Issue>>(&mut self, iter: T) {
        self.issues.extend(iter);
    }
}
