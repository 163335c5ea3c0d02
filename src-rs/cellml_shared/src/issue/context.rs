/// Extra information attached to an issue.
///
/// # Examples
///
/// ```rust
/// use cellml_shared::Context;
///
/// let note = Context::Note("the file could not be opened".to_string());
/// let help = Context::Help("check the `href` of the import".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Additional information about the issue.
    Note(String),
    /// A suggestion for fixing the issue.
    Help(String),
}
