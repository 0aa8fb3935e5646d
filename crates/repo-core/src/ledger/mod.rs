//! Known-state table
//!
//! The ledger maps every resource path the installer currently holds a
//! registration for to the digest that was sent. Paths are kept in an
//! ordered map, so everything below a folder is one contiguous range and a
//! folder removal is a prefix scan rather than a tree walk.
//!
//! The ledger can be persisted as a TOML file; reconciliation converges
//! from an empty ledger as well, so persistence only saves re-registration
//! work after a restart.

mod entry;

pub use entry::KnownEntry;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::path::Path;

use repo_store::{NormalizedPath, io};
use serde::{Deserialize, Serialize};

use crate::Result;

/// The ledger of registered resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    /// Ledger format version for forward compatibility
    version: String,
    /// Registered resources keyed by repository path
    #[serde(default)]
    entries: BTreeMap<String, KnownEntry>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Load a ledger from a TOML file with shared lock
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, locked, or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_locked(path)?;
        let ledger: Ledger = toml::from_str(&content)?;
        Ok(ledger)
    }

    /// Load a ledger, or start empty if the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save the ledger to a TOML file atomically with exclusive lock
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or locked.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        io::write_atomic(path, content.as_bytes())?;
        Ok(())
    }

    /// Get the entry for a path
    pub fn get(&self, path: &NormalizedPath) -> Option<&KnownEntry> {
        self.entries.get(path.as_str())
    }

    /// Insert or replace the entry for a path
    ///
    /// Returns the previous entry if there was one.
    pub fn put(&mut self, path: &NormalizedPath, entry: KnownEntry) -> Option<KnownEntry> {
        self.entries.insert(path.as_str().to_string(), entry)
    }

    /// Remove the entry for a path
    pub fn remove(&mut self, path: &NormalizedPath) -> Option<KnownEntry> {
        self.entries.remove(path.as_str())
    }

    /// Whether a path is registered
    pub fn contains(&self, path: &NormalizedPath) -> bool {
        self.entries.contains_key(path.as_str())
    }

    /// All registered paths, in path order
    pub fn paths(&self) -> BTreeSet<NormalizedPath> {
        self.entries.keys().map(NormalizedPath::new).collect()
    }

    /// Registered paths strictly below `prefix`, in path order
    pub fn paths_under(&self, prefix: &NormalizedPath) -> Vec<NormalizedPath> {
        let start = prefix.descendant_prefix();
        self.entries
            .range::<str, _>((Bound::Included(start.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&start))
            .map(|(key, _)| NormalizedPath::new(key))
            .collect()
    }

    /// Install folders owning at least one registered resource
    pub fn folders(&self) -> BTreeSet<NormalizedPath> {
        self.entries.values().map(|e| e.folder.clone()).collect()
    }

    /// Iterate over `(path, entry)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (NormalizedPath, &KnownEntry)> {
        self.entries
            .iter()
            .map(|(key, entry)| (NormalizedPath::new(key), entry))
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
