use std::{fmt, ops::Deref};

/// The normalized location of a document, used as the library key.
///
/// Two urls that point at the same location produce equal keys:
///
/// ```rust
/// use cellml_ir::DocumentKey;
///
/// let a = DocumentKey::resolve("resources/", "importExample3.cellml");
/// let b = DocumentKey::resolve("resources", "sub/../importExample3.cellml");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "resources/importExample3.cellml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Creates a key from a location, normalizing it.
    #[must_use]
    pub fn new(location: &str) -> Self {
        Self(normalize(location))
    }

    /// Resolves `url` against the directory `base`.
    ///
    /// Absolute urls (with a scheme, or starting with `/`) ignore `base`.
    #[must_use]
    pub fn resolve(base: &str, url: &str) -> Self {
        let url = url.replace('\\', "/");

        if is_absolute(&url) || base.is_empty() {
            return Self(normalize(&url));
        }

        let base = base.replace('\\', "/");
        let joined = if base.ends_with('/') {
            format!("{base}{url}")
        } else {
            format!("{base}/{url}")
        };

        Self(normalize(&joined))
    }

    /// Returns the key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the directory part of the key, including the trailing `/`.
    ///
    /// Urls inside the document are resolved against this directory.
    #[must_use]
    pub fn directory(&self) -> &str {
        self.0.rfind('/').map_or("", |index| &self.0[..=index])
    }
}

impl Deref for DocumentKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(location: &str) -> Self {
        Self::new(location)
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with('/') || url.contains("://")
}

/// Removes `.` segments and folds `..` segments lexically.
fn normalize(location: &str) -> String {
    let location = location.replace('\\', "/");

    let (prefix, path) = match location.find("://") {
        Some(index) => location.split_at(index + 3),
        None => ("", location.as_str()),
    };

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = vec![];

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` above the root of an absolute path stays at the root
                _ if rooted || !prefix.is_empty() => {}
                _ => segments.push(".."),
            },
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::from(prefix);
    if rooted {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    normalized
}
