//! Normalized repository paths

use serde::{Deserialize, Serialize};
use std::fmt;

/// An absolute repository path using forward slashes.
///
/// Repository paths are always absolute (`/libs/foo/install/a.jar`), never
/// contain empty segments, and never end with a separator except for the
/// root itself. Ordering follows the string form, so all descendants of a
/// path sort directly after `"<path>/"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any string-like input.
    ///
    /// Converts backslashes to forward slashes, collapses repeated
    /// separators and anchors the result at `/`.
    pub fn new(path: impl AsRef<str>) -> Self {
        let replaced = path.as_ref().replace('\\', "/");
        let segments: Vec<&str> = replaced.split('/').filter(|s| !s.is_empty()).collect();
        Self {
            inner: format!("/{}", segments.join("/")),
        }
    }

    /// The repository root, `/`.
    pub fn root() -> Self {
        Self {
            inner: "/".to_string(),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this is the repository root.
    pub fn is_root(&self) -> bool {
        self.inner == "/"
    }

    /// Join this path with a (possibly multi-segment) relative path.
    pub fn join(&self, segment: &str) -> Self {
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent path. The root has no parent.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the last path segment. The root has no name.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.inner.rsplit('/').next()
    }

    /// Get the extension if present.
    ///
    /// Dot-files such as `.hidden` have no extension.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Segment-wise ancestry check: `/a/b/c` starts with `/a/b` and with
    /// itself, `/a/bc` does not start with `/a/b`.
    pub fn starts_with(&self, prefix: &NormalizedPath) -> bool {
        if prefix.is_root() || self.inner == prefix.inner {
            return true;
        }
        self.inner
            .strip_prefix(prefix.inner.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.inner.matches('/').count()
        }
    }

    /// Iterate over the path segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// The string every descendant of this path starts with.
    pub fn descendant_prefix(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("{}/", self.inner)
        }
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<NormalizedPath> for String {
    fn from(p: NormalizedPath) -> Self {
        p.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent_or_name() {
        let root = NormalizedPath::root();
        assert!(root.parent().is_none());
        assert!(root.file_name().is_none());
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn descendant_prefix_ends_with_separator() {
        assert_eq!(NormalizedPath::new("/libs").descendant_prefix(), "/libs/");
        assert_eq!(NormalizedPath::root().descendant_prefix(), "/");
    }

    #[test]
    fn serializes_as_plain_string() {
        let path = NormalizedPath::new("/apps/install/a.jar");
        let value: String = path.clone().into();
        assert_eq!(value, "/apps/install/a.jar");
        assert_eq!(NormalizedPath::from(value), path);
    }
}
