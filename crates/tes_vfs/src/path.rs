//! Normalized lookup keys for virtual paths

use std::fmt;

/// How path keys fold case
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum CaseFolding {
    /// Lowercase ASCII letters only, the way the engines compare paths
    #[default]
    Ascii,
    /// Lowercase every character with a Unicode lowercase mapping
    Unicode,
}

impl CaseFolding {
    pub fn fold(&self, s: &str) -> String {
        match self {
            CaseFolding::Ascii => s.to_ascii_lowercase(),
            CaseFolding::Unicode => s.to_lowercase(),
        }
    }
}

/// A normalized virtual path
///
/// Backslashes become forward slashes, runs of separators collapse into one, leading and trailing
/// separators are dropped and case is folded.
///
/// ```
/// use tes_vfs::{CaseFolding, PathKey};
///
/// let key = PathKey::new("\\Meshes\\\\Clutter/Bucket01.NIF", CaseFolding::Ascii);
/// assert_eq!(key.as_str(), "meshes/clutter/bucket01.nif");
/// assert_eq!(key.extension(), Some("nif"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(path: &str, folding: CaseFolding) -> Self {
        PathKey(normalize(path, folding))
    }

    /// Wraps a string already in normalized form
    pub(crate) fn from_normalized(normalized: String) -> Self {
        PathKey(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key lies under `prefix`, given in the form [`PathKey::prefix`] produces
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Normalizes a prefix, keeping a trailing separator so `meshes/` does not match `meshes2/`
    pub fn prefix(prefix: &str, folding: CaseFolding) -> String {
        let mut normalized = normalize(prefix, folding);
        if !normalized.is_empty() && prefix.ends_with(['/', '\\']) {
            normalized.push('/');
        }
        normalized
    }

    /// Final path component
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Extension of the final component, without the dot
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(dot) => Some(&name[dot + 1..]),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn normalize(path: &str, folding: CaseFolding) -> String {
    let joined = path
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    folding.fold(&joined)
}
