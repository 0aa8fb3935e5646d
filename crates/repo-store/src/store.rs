//! The read API consumed by the installer engine, plus change notifications

use crate::{NodeInfo, NormalizedPath, Properties, Result};

/// Read access to a hierarchical content repository.
///
/// Implementations must be safe to call from a background thread. Reads
/// may block on the underlying store.
pub trait Repository: Send + Sync {
    /// Look up a single node, `Ok(None)` if it does not exist.
    fn node(&self, path: &NormalizedPath) -> Result<Option<NodeInfo>>;

    /// List the direct children of a folder, sorted by path.
    ///
    /// # Errors
    ///
    /// `NotFound` if the folder does not exist, `Unavailable` if the store
    /// cannot be reached.
    fn list(&self, path: &NormalizedPath) -> Result<Vec<NodeInfo>>;

    /// Read the binary content of a file node.
    fn read_content(&self, path: &NormalizedPath) -> Result<Vec<u8>>;

    /// Read the property set of a configuration node.
    fn read_properties(&self, path: &NormalizedPath) -> Result<Properties>;
}

/// What happened at a notified path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// A raw "something changed under this path" signal.
///
/// Notifications are hints only. A subtree removal is reported once for the
/// subtree root, and delivery is not guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: NormalizedPath,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: NormalizedPath, kind: ChangeKind) -> Self {
        Self { path, kind }
    }
}

/// Receiver of repository change notifications.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}
