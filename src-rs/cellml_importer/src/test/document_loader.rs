use std::{cell::RefCell, collections::HashMap};

use cellml_ir::{DocumentKey, Model};
use cellml_shared::{Diagnostics, Issue};

use crate::DocumentLoader;

/// A test loader that serves predefined models.
///
/// Every request is recorded so tests can check what was loaded and how
/// often.
pub struct TestDocumentLoader {
    models: HashMap<DocumentKey, Model>,
    issues: HashMap<DocumentKey, Vec<Issue>>,
    requests: RefCell<Vec<DocumentKey>>,
}

impl TestDocumentLoader {
    /// Creates a loader serving the given models.
    pub fn new<'a>(models: impl IntoIterator<Item = (&'a str, Model)>) -> Self {
        let models = models
            .into_iter()
            .map(|(location, model)| (DocumentKey::new(location), model))
            .collect();

        Self {
            models,
            issues: HashMap::new(),
            requests: RefCell::new(vec![]),
        }
    }

    /// Creates a loader with no models.
    pub fn empty() -> Self {
        Self::new([])
    }

    /// Makes loading the document at `location` report `issue`.
    pub fn with_issue(mut self, location: &str, issue: Issue) -> Self {
        self.issues
            .entry(DocumentKey::new(location))
            .or_default()
            .push(issue);
        self
    }

    /// Returns the number of load requests.
    pub fn load_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Returns the keys that were requested, in order.
    pub fn requests(&self) -> Vec<DocumentKey> {
        self.requests.borrow().clone()
    }
}

impl DocumentLoader for TestDocumentLoader {
    type Error = String;

    fn load_model(
        &self,
        key: &DocumentKey,
        diagnostics: &mut Diagnostics,
    ) -> Result<Model, Self::Error> {
        self.requests.borrow_mut().push(key.clone());

        let model = self
            .models
            .get(key)
            .cloned()
            .ok_or_else(|| format!("no document at '{key}'"))?;

        if let Some(issues) = self.issues.get(key) {
            diagnostics.extend(issues.iter().cloned());
        }
        Ok(model)
    }
}
