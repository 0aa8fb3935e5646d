//! Resource classification
//!
//! Decides, from a path and its node type alone, whether a repository node
//! is an installable resource, which kind it is, and which install folder
//! owns it. Classification never touches the repository.
//!
//! Install folders are folders below a configured root whose path matches
//! the folder pattern (`^.*/install$` by default). The last segment may
//! carry run-mode suffixes, `install.author.dev`, in which case the folder
//! only counts when every suffix is an active run mode, and its priority is
//! raised by one per suffix. A direct numeric child folder of an install
//! folder (`install/15`) assigns that start level to its own children.

use std::collections::BTreeSet;

use regex::Regex;
use repo_store::{NodeKind, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of an installable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bundle,
    Configuration,
}

/// Where a resource sits: owning install folder and derived ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub folder: NormalizedPath,
    pub priority: u32,
    pub start_level: Option<u32>,
}

/// Outcome of classifying a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NotApplicable,
    Bundle(Placement),
    Configuration(Placement),
}

impl Classification {
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::NotApplicable => None,
            Self::Bundle(_) => Some(ResourceKind::Bundle),
            Self::Configuration(_) => Some(ResourceKind::Configuration),
        }
    }

    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Self::NotApplicable => None,
            Self::Bundle(p) | Self::Configuration(p) => Some(p),
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

/// A repository subtree searched for install folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
    pub path: NormalizedPath,
    pub priority: u32,
}

/// Compiled install folder rules.
#[derive(Debug, Clone)]
pub struct InstallRules {
    folder_pattern: Regex,
    roots: Vec<InstallRoot>,
    run_modes: BTreeSet<String>,
}

impl InstallRules {
    /// Compile the rules.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if `folder_pattern` is not a valid regex.
    pub fn new(
        folder_pattern: &str,
        roots: Vec<InstallRoot>,
        run_modes: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let folder_pattern = Regex::new(folder_pattern).map_err(|source| Error::InvalidPattern {
            pattern: folder_pattern.to_string(),
            source,
        })?;
        Ok(Self {
            folder_pattern,
            roots,
            run_modes: run_modes.into_iter().collect(),
        })
    }

    /// Configured roots, in configuration order.
    pub fn roots(&self) -> &[InstallRoot] {
        &self.roots
    }

    /// If `folder` is an active install folder, its priority.
    pub fn install_folder_priority(&self, folder: &NormalizedPath) -> Option<u32> {
        let root = self.owning_root(folder)?;
        let name = folder.file_name()?;
        let mut parts = name.split('.');
        let base = parts.next()?;
        let modes: Vec<&str> = parts.collect();
        if base.is_empty() || modes.iter().any(|m| m.is_empty()) {
            return None;
        }

        let parent = folder.parent()?;
        let candidate = parent.join(base);
        if !self.folder_pattern.is_match(candidate.as_str()) {
            return None;
        }
        if !modes.iter().all(|m| self.run_modes.contains(*m)) {
            return None;
        }
        let bump = u32::try_from(modes.len()).unwrap_or(u32::MAX);
        Some(root.priority.saturating_add(bump))
    }

    /// Classify a node. Pure function of path, node type and the rules.
    pub fn classify(&self, path: &NormalizedPath, node: NodeKind) -> Classification {
        let Some(name) = path.file_name() else {
            return Classification::NotApplicable;
        };
        if node == NodeKind::Folder || name.starts_with('.') {
            return Classification::NotApplicable;
        }
        let Some(placement) = self.placement(path) else {
            return Classification::NotApplicable;
        };

        match node {
            NodeKind::Config => Classification::Configuration(placement),
            NodeKind::File => match path.extension().map(str::to_ascii_lowercase).as_deref() {
                Some("jar") => Classification::Bundle(placement),
                Some("cfg") | Some("properties") => Classification::Configuration(placement),
                _ => Classification::NotApplicable,
            },
            NodeKind::Folder => Classification::NotApplicable,
        }
    }

    fn placement(&self, path: &NormalizedPath) -> Option<Placement> {
        let parent = path.parent()?;
        if let Some(priority) = self.install_folder_priority(&parent) {
            return Some(Placement {
                folder: parent,
                priority,
                start_level: None,
            });
        }

        let level = parent.file_name()?;
        if level.is_empty() || !level.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let start_level = level.parse().ok()?;
        let folder = parent.parent()?;
        let priority = self.install_folder_priority(&folder)?;
        Some(Placement {
            folder,
            priority,
            start_level: Some(start_level),
        })
    }

    // The deepest matching root wins
    fn owning_root(&self, folder: &NormalizedPath) -> Option<&InstallRoot> {
        self.roots
            .iter()
            .filter(|root| folder.starts_with(&root.path) && *folder != root.path)
            .max_by_key(|root| root.path.depth())
    }
}
