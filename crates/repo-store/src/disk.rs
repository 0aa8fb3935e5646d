//! Read-only repository view over a local directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, NodeInfo, NodeKind, NormalizedPath, Properties, Repository, Result};

/// Maps repository path `/a/b` to `<root>/a/b`.
///
/// Directories are folders and regular files are file nodes; there are no
/// configuration-typed nodes on disk (configurations are `.cfg` or
/// `.properties` files). No change notifications are produced.
#[derive(Debug, Clone)]
pub struct DiskRepository {
    root: PathBuf,
}

impl DiskRepository {
    /// Open a directory as a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        if !root.is_dir() {
            return Err(Error::Unavailable {
                message: format!("{} is not a directory", root.display()),
            });
        }
        Ok(Self { root })
    }

    /// The directory backing the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Native location of a repository path.
    pub fn native_path(&self, path: &NormalizedPath) -> PathBuf {
        path.segments()
            .fold(self.root.clone(), |native, segment| native.join(segment))
    }

    fn kind_of(native: &Path) -> std::io::Result<Option<NodeKind>> {
        match fs::metadata(native) {
            Ok(meta) if meta.is_dir() => Ok(Some(NodeKind::Folder)),
            Ok(meta) if meta.is_file() => Ok(Some(NodeKind::File)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Kind of a directory entry without descending through links.
    ///
    /// Symlinks to files are followed. Symlinked directories are skipped so
    /// a link pointing back up the tree cannot make a walk recurse forever.
    fn entry_kind(entry: &fs::DirEntry) -> std::io::Result<Option<NodeKind>> {
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if !file_type.is_symlink() {
            return Self::kind_of(&entry.path());
        }
        match Self::kind_of(&entry.path()) {
            Ok(Some(NodeKind::Folder)) => {
                debug!(path = %entry.path().display(), "Skipping symlinked directory");
                Ok(None)
            }
            // Dangling or looping links
            Err(_) => Ok(None),
            other => other,
        }
    }

    /// Repository name of an entry, if it maps to exactly one path segment.
    fn segment_name(entry: &fs::DirEntry) -> Option<String> {
        let raw = entry.file_name();
        match raw.to_str() {
            Some(name) if !name.contains('\\') => Some(name.to_string()),
            _ => {
                warn!(
                    path = %entry.path().display(),
                    "Skipping entry whose name is not a valid repository segment"
                );
                None
            }
        }
    }
}

impl Repository for DiskRepository {
    fn node(&self, path: &NormalizedPath) -> Result<Option<NodeInfo>> {
        let native = self.native_path(path);
        let kind = Self::kind_of(&native).map_err(|e| Error::io(&native, e))?;
        Ok(kind.map(|kind| NodeInfo::new(path.clone(), kind)))
    }

    fn list(&self, path: &NormalizedPath) -> Result<Vec<NodeInfo>> {
        let native = self.native_path(path);
        let entries = match fs::read_dir(&native) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::not_found(path)),
            Err(e) => return Err(Error::io(&native, e)),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let Some(name) = Self::segment_name(&entry) else {
                continue;
            };
            // Entries can vanish between read_dir and metadata
            let Some(kind) = Self::entry_kind(&entry).map_err(|e| Error::io(entry.path(), e))?
            else {
                continue;
            };
            children.push(NodeInfo::new(path.join(&name), kind));
        }
        children.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(children)
    }

    fn read_content(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        let native = self.native_path(path);
        match fs::read(&native) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::not_found(path)),
            Err(_) if native.is_dir() => Err(Error::WrongKind {
                path: path.clone(),
                expected: NodeKind::File,
                actual: NodeKind::Folder,
            }),
            Err(e) => Err(Error::Unreadable {
                path: path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn read_properties(&self, path: &NormalizedPath) -> Result<Properties> {
        let actual = match self.node(path)? {
            Some(info) => info.kind,
            None => return Err(Error::not_found(path)),
        };
        Err(Error::WrongKind {
            path: path.clone(),
            expected: NodeKind::Config,
            actual,
        })
    }
}
