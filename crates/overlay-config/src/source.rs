//! Source descriptors.
//!
//! A descriptor names where a batch of key/value pairs comes from and the
//! prefix its keys are stored under. The location is a tagged variant so a
//! local source never carries a URL and a remote source never carries a path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Where a source's content is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A JSON file on the local filesystem, read synchronously.
    Local(PathBuf),
    /// A JSON document fetched with an HTTP GET.
    Remote(String),
}

impl SourceLocation {
    /// Short label for the kind of source, used in logs and metrics.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Local(_) => SourceKind::Local,
            Self::Remote(_) => SourceKind::Remote,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Kind of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Local file.
    Local,
    /// Remote HTTP endpoint.
    Remote,
}

impl SourceKind {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured source.
///
/// `loaded` starts false and flips to true the first time the source's
/// entries are merged. It never reverts, even if a later reload fails.
#[derive(Debug)]
pub struct SourceDescriptor {
    name: String,
    location: SourceLocation,
    prefix: String,
    loaded: AtomicBool,
}

impl SourceDescriptor {
    /// Create a descriptor for a local JSON file.
    pub fn local(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, SourceLocation::Local(path.into()))
    }

    /// Create a descriptor for a remote JSON endpoint.
    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, SourceLocation::Remote(url.into()))
    }

    /// Create a descriptor from an explicit location.
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            location,
            prefix: String::new(),
            loaded: AtomicBool::new(false),
        }
    }

    /// Set the prefix prepended to every key from this source.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the content comes from.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Local path, if this is a local source.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            SourceLocation::Local(path) => Some(path),
            SourceLocation::Remote(_) => None,
        }
    }

    /// Kind of source.
    pub fn kind(&self) -> SourceKind {
        self.location.kind()
    }

    /// Key prefix, possibly empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Final stored key for a key produced by this source.
    pub fn qualify(&self, key: &str) -> String {
        let mut qualified = String::with_capacity(self.prefix.len() + key.len());
        qualified.push_str(&self.prefix);
        qualified.push_str(key);
        qualified
    }

    /// Whether this source has been merged at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_descriptor() {
        let source = SourceDescriptor::local("defaults", "config/hud.json").with_prefix("hud_");
        assert_eq!(source.name(), "defaults");
        assert_eq!(source.kind(), SourceKind::Local);
        assert_eq!(source.path(), Some(Path::new("config/hud.json")));
        assert_eq!(source.prefix(), "hud_");
        assert!(!source.is_loaded());
    }

    #[test]
    fn test_remote_descriptor_has_no_path() {
        let source = SourceDescriptor::remote("live", "http://localhost:8080/hud.json");
        assert_eq!(source.kind(), SourceKind::Remote);
        assert_eq!(source.path(), None);
        assert_eq!(source.location().to_string(), "http://localhost:8080/hud.json");
        assert_eq!(source.prefix(), "");
    }

    #[test]
    fn test_qualify_prepends_prefix_verbatim() {
        let source = SourceDescriptor::local("a", "a.json").with_prefix("a_");
        assert_eq!(source.qualify("x"), "a_x");
        let bare = SourceDescriptor::local("b", "b.json");
        assert_eq!(bare.qualify("x"), "x");
    }

    #[test]
    fn test_loaded_never_reverts() {
        let source = SourceDescriptor::local("a", "a.json");
        source.mark_loaded();
        source.mark_loaded();
        assert!(source.is_loaded());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SourceKind::Local.to_string(), "local");
        assert_eq!(SourceKind::Remote.as_str(), "remote");
    }
}
