//! The per-cycle difference between repository and ledger

use std::fmt;

use repo_store::NormalizedPath;

use crate::classify::{Placement, ResourceKind};
use crate::digest::{Digest, ResourceData};

/// Why a registered path is being withdrawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalReason {
    /// The resource node no longer exists or no longer qualifies
    Deleted,
    /// The owning install folder is gone
    FolderRemoved { folder: NormalizedPath },
    /// The path now holds a different kind of resource
    KindChanged,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::FolderRemoved { folder } => write!(f, "folder {} removed", folder),
            Self::KindChanged => write!(f, "kind changed"),
        }
    }
}

/// A path to withdraw from the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub path: NormalizedPath,
    pub reason: RemovalReason,
}

/// A new or changed resource to hand to the installer
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub path: NormalizedPath,
    pub digest: Digest,
    pub placement: Placement,
    pub data: ResourceData,
}

impl Registration {
    pub fn kind(&self) -> ResourceKind {
        self.data.kind()
    }
}

/// Result of one reconciliation pass. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    /// Paths to withdraw, applied before any registration
    pub to_remove: Vec<Removal>,
    /// Resources to register
    pub to_register: Vec<Registration>,
    /// Resources present but unreadable this cycle, left untouched
    pub skipped: Vec<NormalizedPath>,
}

impl Diff {
    /// No installer call is needed
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_register.is_empty()
    }

    /// Number of installer calls the diff will produce
    pub fn call_count(&self) -> usize {
        self.to_remove.len() + self.to_register.len()
    }

    pub fn removal_paths(&self) -> Vec<&NormalizedPath> {
        self.to_remove.iter().map(|r| &r.path).collect()
    }

    pub fn registration_paths(&self) -> Vec<&NormalizedPath> {
        self.to_register.iter().map(|r| &r.path).collect()
    }
}
