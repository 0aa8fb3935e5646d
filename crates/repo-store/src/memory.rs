//! Thread-safe in-memory repository

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::{
    ChangeEvent, ChangeKind, ChangeListener, Error, NodeInfo, NodeKind, NormalizedPath,
    Properties, PropertyValue, Repository, Result,
};

#[derive(Debug, Clone)]
enum MemNode {
    Folder,
    File {
        content: Vec<u8>,
        mime_type: Option<String>,
    },
    Config {
        properties: Properties,
    },
}

impl MemNode {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Folder => NodeKind::Folder,
            Self::File { .. } => NodeKind::File,
            Self::Config { .. } => NodeKind::Config,
        }
    }
}

/// An in-memory content repository.
///
/// Nodes are keyed by their path string, so a subtree is a contiguous range
/// of the map. Every mutation notifies the subscribed listeners after the
/// tree lock has been released.
pub struct MemoryRepository {
    nodes: RwLock<BTreeMap<String, MemNode>>,
    unreadable: RwLock<BTreeSet<NormalizedPath>>,
    available: AtomicBool,
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Create a repository containing only the root folder.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), MemNode::Folder);
        Self {
            nodes: RwLock::new(nodes),
            unreadable: RwLock::new(BTreeSet::new()),
            available: AtomicBool::new(true),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener for change notifications.
    pub fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Simulate the store going away (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make content and property reads of `path` fail with `Unreadable`.
    pub fn mark_unreadable(&self, path: impl Into<NormalizedPath>) {
        self.unreadable
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Undo [`MemoryRepository::mark_unreadable`].
    pub fn mark_readable(&self, path: impl Into<NormalizedPath>) {
        self.unreadable
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&path.into());
    }

    /// Create a folder and any missing ancestors.
    pub fn create_folder(&self, path: impl Into<NormalizedPath>) -> Result<()> {
        let path = path.into();
        let created = {
            let mut nodes = self.write_nodes();
            Self::ensure_ancestors(&mut nodes, &path)?;
            match nodes.get(path.as_str()) {
                Some(MemNode::Folder) => false,
                Some(other) => {
                    return Err(Error::WrongKind {
                        path,
                        expected: NodeKind::Folder,
                        actual: other.kind(),
                    });
                }
                None => {
                    nodes.insert(path.as_str().to_string(), MemNode::Folder);
                    true
                }
            }
        };
        if created {
            self.emit(ChangeEvent::new(path, ChangeKind::Added));
        }
        Ok(())
    }

    /// Create or replace a file node, creating missing ancestor folders.
    ///
    /// Replacing a file keeps its MIME type.
    pub fn write_file(&self, path: impl Into<NormalizedPath>, content: &[u8]) -> Result<()> {
        let path = path.into();
        let kind = {
            let mut nodes = self.write_nodes();
            Self::ensure_ancestors(&mut nodes, &path)?;
            let mime_type = match nodes.get(path.as_str()) {
                Some(MemNode::File { mime_type, .. }) => mime_type.clone(),
                Some(MemNode::Folder) => {
                    return Err(Error::WrongKind {
                        path,
                        expected: NodeKind::File,
                        actual: NodeKind::Folder,
                    });
                }
                _ => None,
            };
            let previous = nodes.insert(
                path.as_str().to_string(),
                MemNode::File {
                    content: content.to_vec(),
                    mime_type,
                },
            );
            change_kind(previous.is_some())
        };
        self.emit(ChangeEvent::new(path, kind));
        Ok(())
    }

    /// Change the MIME type of a file. This is metadata, not content.
    pub fn set_mime_type(&self, path: impl Into<NormalizedPath>, mime: &str) -> Result<()> {
        let path = path.into();
        {
            let mut nodes = self.write_nodes();
            match nodes.get_mut(path.as_str()) {
                Some(MemNode::File { mime_type, .. }) => *mime_type = Some(mime.to_string()),
                Some(other) => {
                    return Err(Error::WrongKind {
                        path,
                        expected: NodeKind::File,
                        actual: other.kind(),
                    });
                }
                None => return Err(Error::not_found(&path)),
            }
        }
        self.emit(ChangeEvent::new(path, ChangeKind::Updated));
        Ok(())
    }

    /// MIME type of a file, if one was set.
    pub fn mime_type(&self, path: &NormalizedPath) -> Option<String> {
        match self.read_nodes().get(path.as_str()) {
            Some(MemNode::File { mime_type, .. }) => mime_type.clone(),
            _ => None,
        }
    }

    /// Create or replace a configuration node.
    pub fn write_config(
        &self,
        path: impl Into<NormalizedPath>,
        properties: Properties,
    ) -> Result<()> {
        let path = path.into();
        let kind = {
            let mut nodes = self.write_nodes();
            Self::ensure_ancestors(&mut nodes, &path)?;
            if let Some(MemNode::Folder) = nodes.get(path.as_str()) {
                return Err(Error::WrongKind {
                    path,
                    expected: NodeKind::Config,
                    actual: NodeKind::Folder,
                });
            }
            let previous = nodes.insert(path.as_str().to_string(), MemNode::Config { properties });
            change_kind(previous.is_some())
        };
        self.emit(ChangeEvent::new(path, kind));
        Ok(())
    }

    /// Set one property of an existing configuration node.
    pub fn set_property(
        &self,
        path: impl Into<NormalizedPath>,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let path = path.into();
        {
            let mut nodes = self.write_nodes();
            match nodes.get_mut(path.as_str()) {
                Some(MemNode::Config { properties }) => {
                    properties.insert(name.to_string(), value.into());
                }
                Some(other) => {
                    return Err(Error::WrongKind {
                        path,
                        expected: NodeKind::Config,
                        actual: other.kind(),
                    });
                }
                None => return Err(Error::not_found(&path)),
            }
        }
        self.emit(ChangeEvent::new(path, ChangeKind::Updated));
        Ok(())
    }

    /// Remove a node and its whole subtree.
    ///
    /// Emits a single `Removed` event for `path`.
    pub fn remove(&self, path: impl Into<NormalizedPath>) -> Result<()> {
        let path = path.into();
        if path.is_root() {
            return Err(Error::WrongKind {
                path,
                expected: NodeKind::File,
                actual: NodeKind::Folder,
            });
        }
        let removed = {
            let mut nodes = self.write_nodes();
            if nodes.remove(path.as_str()).is_none() {
                return Err(Error::not_found(&path));
            }
            let prefix = path.descendant_prefix();
            let descendants: Vec<String> = nodes
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .take_while(|(key, _)| key.starts_with(&prefix))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &descendants {
                nodes.remove(key);
            }
            descendants.len() + 1
        };
        debug!(path = %path, removed, "Removed subtree");
        self.emit(ChangeEvent::new(path, ChangeKind::Removed));
        Ok(())
    }

    /// Whether a node exists at `path`.
    pub fn exists(&self, path: &NormalizedPath) -> bool {
        self.read_nodes().contains_key(path.as_str())
    }

    fn ensure_ancestors(nodes: &mut BTreeMap<String, MemNode>, path: &NormalizedPath) -> Result<()> {
        let mut ancestor = NormalizedPath::root();
        let segments: Vec<&str> = path.segments().collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            ancestor = ancestor.join(segment);
            match nodes.get(ancestor.as_str()) {
                Some(MemNode::Folder) => {}
                Some(other) => {
                    return Err(Error::WrongKind {
                        path: ancestor,
                        expected: NodeKind::Folder,
                        actual: other.kind(),
                    });
                }
                None => {
                    nodes.insert(ancestor.as_str().to_string(), MemNode::Folder);
                }
            }
        }
        Ok(())
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unavailable {
                message: "in-memory repository is offline".to_string(),
            })
        }
    }

    fn check_readable(&self, path: &NormalizedPath) -> Result<()> {
        let unreadable = self
            .unreadable
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if unreadable.contains(path) {
            return Err(Error::Unreadable {
                path: path.clone(),
                message: "content is corrupt".to_string(),
            });
        }
        Ok(())
    }

    fn read_nodes(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, MemNode>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_nodes(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, MemNode>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ChangeEvent) {
        let listeners: Vec<Arc<dyn ChangeListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_change(&event);
        }
    }
}

fn change_kind(existed: bool) -> ChangeKind {
    if existed {
        ChangeKind::Updated
    } else {
        ChangeKind::Added
    }
}

impl Repository for MemoryRepository {
    fn node(&self, path: &NormalizedPath) -> Result<Option<NodeInfo>> {
        self.check_available()?;
        Ok(self
            .read_nodes()
            .get(path.as_str())
            .map(|node| NodeInfo::new(path.clone(), node.kind())))
    }

    fn list(&self, path: &NormalizedPath) -> Result<Vec<NodeInfo>> {
        self.check_available()?;
        let nodes = self.read_nodes();
        match nodes.get(path.as_str()) {
            Some(MemNode::Folder) => {}
            Some(other) => {
                return Err(Error::WrongKind {
                    path: path.clone(),
                    expected: NodeKind::Folder,
                    actual: other.kind(),
                });
            }
            None => return Err(Error::not_found(path)),
        }
        let prefix = path.descendant_prefix();
        let child_depth = path.depth() + 1;
        Ok(nodes
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, node)| NodeInfo::new(NormalizedPath::new(key), node.kind()))
            .filter(|info| info.path.depth() == child_depth)
            .collect())
    }

    fn read_content(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        self.check_available()?;
        self.check_readable(path)?;
        match self.read_nodes().get(path.as_str()) {
            Some(MemNode::File { content, .. }) => Ok(content.clone()),
            Some(other) => Err(Error::WrongKind {
                path: path.clone(),
                expected: NodeKind::File,
                actual: other.kind(),
            }),
            None => Err(Error::not_found(path)),
        }
    }

    fn read_properties(&self, path: &NormalizedPath) -> Result<Properties> {
        self.check_available()?;
        self.check_readable(path)?;
        match self.read_nodes().get(path.as_str()) {
            Some(MemNode::Config { properties }) => Ok(properties.clone()),
            Some(other) => Err(Error::WrongKind {
                path: path.clone(),
                expected: NodeKind::Config,
                actual: other.kind(),
            }),
            None => Err(Error::not_found(path)),
        }
    }
}
