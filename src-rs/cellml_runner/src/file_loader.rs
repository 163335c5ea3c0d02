//! An implementation of the `DocumentLoader` trait

use std::path::{Path, PathBuf};

use cellml_importer::DocumentLoader;
use cellml_ir::{DocumentKey, Model};
use cellml_shared::Diagnostics;
use cellml_xml::ParseError;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading a document
#[derive(Debug, Error)]
pub enum LoadingError {
    /// Error occurred while reading the file from disk
    #[error("{0}")]
    InvalidFile(#[from] std::io::Error),
    /// The file was read but is not a CellML document
    #[error("{0}")]
    Parser(#[from] ParseError),
    /// The location names a scheme other than the file system
    #[error("documents at '{0}' cannot be loaded from the file system")]
    UnsupportedScheme(String),
}

/// Loads CellML documents from the file system
///
/// Library keys are used as paths, relative to the working directory unless
/// they are absolute.
#[derive(Debug, Default)]
pub struct FileLoader;

impl FileLoader {
    /// Creates a loader
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reads and parses the file at `path`
    ///
    /// Problems that do not stop the document from loading are added to
    /// `diagnostics`, tagged with the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a CellML
    /// document.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Model, LoadingError> {
        let path = path.as_ref();
        let file_content = std::fs::read_to_string(path)?;

        let mut issues = Diagnostics::new();
        let model = cellml_xml::parse_model(&file_content, &mut issues)?;

        let location = path.display().to_string();
        diagnostics.extend(issues.into_iter().map(|issue| issue.with_url(location.clone())));

        debug!(path = %location, model = model.name(), "loaded file");
        Ok(model)
    }
}

impl DocumentLoader for FileLoader {
    type Error = LoadingError;

    fn load_model(
        &self,
        key: &DocumentKey,
        diagnostics: &mut Diagnostics,
    ) -> Result<Model, Self::Error> {
        let path = key_to_path(key)?;

        let mut issues = Diagnostics::new();
        let model = self.load_file(&path, &mut issues)?;

        if !issues.is_empty() {
            warn!(document = %key, issues = issues.count(), "document loaded with issues");
            diagnostics.extend(issues);
        }
        Ok(model)
    }
}

/// Returns the directory urls in the file at `path` are relative to
#[must_use]
pub fn base_directory(path: &Path) -> String {
    path.parent()
        .map(|parent| parent.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn key_to_path(key: &DocumentKey) -> Result<PathBuf, LoadingError> {
    if let Some(path) = key.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if key.contains("://") {
        return Err(LoadingError::UnsupportedScheme(key.to_string()));
    }
    Ok(PathBuf::from(key.as_str()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cellml_importer::Importer;
    use cellml_shared::ReferenceRule;

    use super::*;

    const GATE_MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.cellml.org/cellml/2.0#" name="GateModel">
  <units name="ms"><unit units="second" prefix="milli"/></units>
  <component name="gateEquations">
    <variable name="X" units="dimensionless" interface="public_and_private"/>
    <variable name="t" units="ms" interface="public_and_private"/>
  </component>
</model>
"#;

    const HODGKIN_HUXLEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.cellml.org/cellml/2.0#" xmlns:xlink="http://www.w3.org/1999/xlink" name="HodgkinHuxley">
  <import xlink:href="gates/GateModel.cellml">
    <component name="sodiumChannel_h" component_ref="gateEquations"/>
  </import>
  <component name="membrane">
    <variable name="h" units="dimensionless"/>
  </component>
  <connection component_1="membrane" component_2="sodiumChannel_h">
    <map_variables variable_1="h" variable_2="X"/>
  </connection>
</model>
"#;

    const GATE_MODEL_UNNAMED_COMPONENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.cellml.org/cellml/2.0#" name="GateModel">
  <component/>
  <component name="gateEquations">
    <variable name="X" units="dimensionless" interface="public_and_private"/>
  </component>
</model>
"#;

    const HODGKIN_HUXLEY_BROKEN_IMPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.cellml.org/cellml/2.0#" xmlns:xlink="http://www.w3.org/1999/xlink" name="HodgkinHuxley">
  <import xlink:href="gates/GateModel.cellml">
    <component name="sodiumChannel_h" component_ref="gateEquations"/>
    <component name="sodiumChannel_m" component_ref="i_dont_exist"/>
  </import>
</model>
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("directory should be created");
        }
        fs::write(&path, content).expect("file should be written");
        path
    }

    #[test]
    fn load_file_reads_model() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = write(dir.path(), "GateModel.cellml", GATE_MODEL);

        let mut diagnostics = Diagnostics::new();
        let model = FileLoader::new()
            .load_file(&path, &mut diagnostics)
            .expect("file should load");

        assert!(diagnostics.is_empty());
        assert_eq!(model.name(), "GateModel");
        assert!(model.find_component("gateEquations").is_some());
    }

    #[test]
    fn load_file_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir should be created");

        let mut diagnostics = Diagnostics::new();
        let result = FileLoader::new().load_file(dir.path().join("missing.cellml"), &mut diagnostics);

        assert!(matches!(result, Err(LoadingError::InvalidFile(_))));
    }

    #[test]
    fn load_file_tags_issues_with_path() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = write(
            dir.path(),
            "broken.cellml",
            r#"<model name="broken"><component/></model>"#,
        );

        let mut diagnostics = Diagnostics::new();
        let model = FileLoader::new()
            .load_file(&path, &mut diagnostics)
            .expect("file should load");

        assert!(model.components().is_empty());
        let issue = diagnostics.get(0).expect("issue should be present");
        assert_eq!(
            issue.reference_rule(),
            Some(ReferenceRule::XmlMissingAttribute)
        );
        assert_eq!(issue.url(), Some(path.display().to_string().as_str()));
    }

    #[test]
    fn load_model_rejects_remote_documents() {
        let key = DocumentKey::new("https://models.example/GateModel.cellml");

        let mut diagnostics = Diagnostics::new();
        let result = FileLoader::new().load_model(&key, &mut diagnostics);

        assert!(matches!(result, Err(LoadingError::UnsupportedScheme(_))));
    }

    #[test]
    fn importer_resolves_files_relative_to_model() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = write(dir.path(), "HodgkinHuxley.cellml", HODGKIN_HUXLEY);
        write(dir.path(), "gates/GateModel.cellml", GATE_MODEL);

        let loader = FileLoader::new();
        let mut diagnostics = Diagnostics::new();
        let mut model = loader
            .load_file(&path, &mut diagnostics)
            .expect("file should load");

        let mut importer = Importer::new(&loader);
        importer.resolve_imports(&mut model, &base_directory(&path), &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(importer.library_count(), 1);

        let flat = importer.flatten_model(&model, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert!(!flat.has_imports());
        let gate = flat
            .find_component("sodiumChannel_h")
            .expect("gate should be present");
        assert!(gate.variable("t").is_some());
        assert!(flat.units_named("ms").is_some());
    }

    #[test]
    fn importer_reports_imported_file_issues_in_order() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = write(dir.path(), "HodgkinHuxley.cellml", HODGKIN_HUXLEY_BROKEN_IMPORT);
        let gate_path = write(dir.path(), "gates/GateModel.cellml", GATE_MODEL_UNNAMED_COMPONENT);

        let loader = FileLoader::new();
        let mut diagnostics = Diagnostics::new();
        let mut model = loader
            .load_file(&path, &mut diagnostics)
            .expect("file should load");

        let mut importer = Importer::new(&loader);
        importer.resolve_imports(&mut model, &base_directory(&path), &mut diagnostics);

        // the gate file's own problem is reported when it loads, before the
        // placeholder that asks it for a missing component
        let rules: Vec<_> = diagnostics.iter().map(|issue| issue.reference_rule()).collect();
        assert_eq!(
            rules,
            [
                Some(ReferenceRule::XmlMissingAttribute),
                Some(ReferenceRule::ImporterMissingComponent),
            ]
        );
        assert_eq!(
            diagnostics.get(0).and_then(|issue| issue.url()),
            Some(gate_path.display().to_string().as_str())
        );
    }

    #[test]
    fn base_directory_is_parent() {
        assert_eq!(base_directory(Path::new("models/hh.cellml")), "models");
        assert_eq!(base_directory(Path::new("hh.cellml")), "");
    }
}
