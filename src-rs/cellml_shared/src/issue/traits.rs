use crate::{CellmlElement, Context, Level, ReferenceRule};

/// Trait for typed errors that can be reported as an [`Issue`](crate::Issue).
///
/// Each crate keeps its own error enums; this trait is the seam through which
/// they become user-facing issues.
pub trait AsIssue {
    /// Returns the severity the error is reported with.
    fn level(&self) -> Level {
        Level::Error
    }

    /// Returns the primary message.
    ///
    /// This should be a complete sentence that makes sense without context.
    fn message(&self) -> String;

    /// Returns the model element the error is about, if any.
    fn item(&self) -> Option<CellmlElement> {
        None
    }

    /// Returns the rule that classifies the error, if any.
    fn reference_rule(&self) -> Option<ReferenceRule> {
        None
    }

    /// Returns notes and help attached to the error.
    fn context(&self) -> Vec<Context> {
        vec![]
    }
}
