use owo_colors::Style;

pub const ERROR_COLOR: Style = Style::new().red();
pub const WARNING_COLOR: Style = Style::new().yellow();
pub const INFO_COLOR: Style = Style::new().cyan();
pub const NOTE_COLOR: Style = Style::new().blue();
pub const HELP_COLOR: Style = Style::new().blue();
pub const SOURCE_ANNOTATION: Style = Style::new().blue().bold();
pub const TREE_GUIDE: Style = Style::new().dimmed();
pub const DOCUMENT_KEY: Style = Style::new().green();
pub const IMPORT_REFERENCE: Style = Style::new().cyan();
