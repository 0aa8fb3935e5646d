//! Reconciler implementation
//!
//! The reconciler walks the install roots, compares what it finds against
//! the ledger and produces a [`Diff`]. Applying the diff is left to the
//! [`InstallerBridge`], which commits every accepted call back into the
//! ledger owned here.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use repo_store::{NodeKind, NormalizedPath, Repository, parse_properties};
use tracing::{debug, info, warn};

use crate::classify::{InstallRules, Placement, ResourceKind};
use crate::digest::ResourceData;
use crate::installer::InstallerBridge;
use crate::ledger::Ledger;
use crate::{Error, Result};

use super::diff::{Diff, Registration, Removal, RemovalReason};
use super::report::CycleReport;

/// An installable resource found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedResource {
    pub node: NodeKind,
    pub kind: ResourceKind,
    pub placement: Placement,
}

/// Everything the walk found under the install roots.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Active install folders
    pub folders: BTreeSet<NormalizedPath>,
    /// Installable resources by path
    pub resources: BTreeMap<NormalizedPath, ScannedResource>,
}

/// Engine computing and applying repository/ledger differences
pub struct Reconciler {
    repository: Arc<dyn Repository>,
    rules: InstallRules,
    ledger: Ledger,
    state_file: Option<PathBuf>,
}

impl Reconciler {
    /// Create a reconciler with an empty ledger
    pub fn new(repository: Arc<dyn Repository>, rules: InstallRules) -> Self {
        Self {
            repository,
            rules,
            ledger: Ledger::new(),
            state_file: None,
        }
    }

    /// Persist the ledger to `path`, loading whatever is already there
    ///
    /// # Errors
    ///
    /// Returns an error if the state file exists but cannot be read or parsed.
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        self.ledger = Ledger::load_or_default(&path)?;
        debug!(state_file = %path.display(), entries = self.ledger.len(), "Loaded known state");
        self.state_file = Some(path);
        Ok(self)
    }

    /// Persist the ledger to `path` without loading it
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Replace the ledger, e.g. to resume from a known state
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn rules(&self) -> &InstallRules {
        &self.rules
    }

    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    /// Walk the install roots.
    ///
    /// # Errors
    ///
    /// `RepositoryUnavailable` if any listing fails for a reason other than
    /// the folder having vanished.
    pub fn scan(&self) -> Result<Scan> {
        let mut scan = Scan::default();

        for root in self.rules.roots() {
            match self.repository.node(&root.path).map_err(Error::unavailable)? {
                Some(info) if info.is_folder() => {}
                _ => {
                    debug!(root = %root.path, "Install root not present");
                    continue;
                }
            }

            let mut pending = vec![root.path.clone()];
            while let Some(folder) = pending.pop() {
                if self.rules.install_folder_priority(&folder).is_some() {
                    scan.folders.insert(folder.clone());
                }

                let children = match self.repository.list(&folder) {
                    Ok(children) => children,
                    // Removed while walking
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(Error::unavailable(e)),
                };

                for child in children {
                    if child.is_folder() {
                        if !is_hidden(&child.path) {
                            pending.push(child.path);
                        }
                        continue;
                    }
                    let classification = self.rules.classify(&child.path, child.kind);
                    if let (Some(kind), Some(placement)) =
                        (classification.kind(), classification.placement())
                    {
                        scan.resources.insert(
                            child.path,
                            ScannedResource {
                                node: child.kind,
                                kind,
                                placement: placement.clone(),
                            },
                        );
                    }
                }
            }
        }

        Ok(scan)
    }

    /// Compute the difference between the repository and the ledger.
    ///
    /// Read-only: the ledger is not modified.
    ///
    /// # Errors
    ///
    /// `RepositoryUnavailable` if the repository cannot be walked or read;
    /// nothing is removed on a partial view.
    pub fn reconcile(&self) -> Result<Diff> {
        let scan = self.scan()?;
        let mut diff = Diff::default();
        let mut present = BTreeSet::new();

        for (path, found) in &scan.resources {
            let data = match self.read_data(path, found) {
                Ok(Some(data)) => data,
                Ok(None) => continue,
                Err(e @ Error::MalformedResource { .. }) => {
                    warn!(error = %e, "Skipping malformed resource");
                    diff.skipped.push(path.clone());
                    present.insert(path.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };
            present.insert(path.clone());

            let digest = data.digest();
            let known = self.ledger.get(path);
            if known.is_some_and(|k| k.kind == found.kind && k.digest == digest) {
                continue;
            }
            if known.is_some_and(|k| k.kind != found.kind) {
                diff.to_remove.push(Removal {
                    path: path.clone(),
                    reason: RemovalReason::KindChanged,
                });
            }
            diff.to_register.push(Registration {
                path: path.clone(),
                digest,
                placement: found.placement.clone(),
                data,
            });
        }

        let mut removed = BTreeSet::new();
        for folder in self.ledger.folders() {
            if scan.folders.contains(&folder) {
                continue;
            }
            for path in self.ledger.paths_under(&folder) {
                if !present.contains(&path) && removed.insert(path.clone()) {
                    diff.to_remove.push(Removal {
                        path,
                        reason: RemovalReason::FolderRemoved {
                            folder: folder.clone(),
                        },
                    });
                }
            }
        }
        for path in self.ledger.paths() {
            if !present.contains(&path) && !removed.contains(&path) {
                diff.to_remove.push(Removal {
                    path,
                    reason: RemovalReason::Deleted,
                });
            }
        }

        debug!(
            resources = scan.resources.len(),
            folders = scan.folders.len(),
            register = diff.to_register.len(),
            remove = diff.to_remove.len(),
            skipped = diff.skipped.len(),
            "Reconciled repository against known state"
        );
        Ok(diff)
    }

    /// Reconcile, apply the diff through `bridge`, and persist the ledger if
    /// it changed.
    ///
    /// # Errors
    ///
    /// Returns an error only if reconciliation aborted; installer failures
    /// are reported in the [`CycleReport`].
    pub fn run_cycle(&mut self, bridge: &InstallerBridge) -> Result<CycleReport> {
        let diff = self.reconcile()?;
        if diff.is_empty() {
            return Ok(CycleReport {
                skipped: diff.skipped.len(),
                ..CycleReport::default()
            });
        }

        let mut report = bridge.apply(diff, &mut self.ledger);
        if report.has_changes()
            && let Err(e) = self.save_state()
        {
            warn!(error = %e, "Failed to persist known state");
            report.errors.push(e.to_string());
        }
        info!(
            registered = report.registered,
            removed = report.removed,
            failed = report.failed,
            skipped = report.skipped,
            "Cycle applied"
        );
        Ok(report)
    }

    /// Save the ledger to the state file, if one is configured
    pub fn save_state(&self) -> Result<()> {
        if let Some(path) = &self.state_file {
            self.ledger.save(path)?;
        }
        Ok(())
    }

    // Ok(None) means the node vanished after it was listed
    fn read_data(
        &self,
        path: &NormalizedPath,
        found: &ScannedResource,
    ) -> Result<Option<ResourceData>> {
        let result = match (found.node, found.kind) {
            (NodeKind::Config, _) => self
                .repository
                .read_properties(path)
                .map(ResourceData::Configuration),
            (_, ResourceKind::Bundle) => self.repository.read_content(path).map(ResourceData::Bundle),
            (_, ResourceKind::Configuration) => self
                .repository
                .read_content(path)
                .and_then(|bytes| parse_properties(&bytes))
                .map(ResourceData::Configuration),
        };

        match result {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e @ repo_store::Error::Unavailable { .. }) => Err(Error::unavailable(e)),
            Err(e) => Err(Error::malformed(path, e)),
        }
    }
}

fn is_hidden(path: &NormalizedPath) -> bool {
    path.file_name().is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::InstallRoot;
    use repo_store::MemoryRepository;

    fn rules() -> InstallRules {
        InstallRules::new(
            "^.*/install$",
            vec![InstallRoot {
                path: NormalizedPath::new("/libs"),
                priority: 100,
            }],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn dot_folders_are_not_walked() {
        let repo = MemoryRepository::new();
        repo.write_file("/libs/.hidden/install/a.jar", b"a").unwrap();
        repo.write_file("/libs/x/install/b.jar", b"b").unwrap();

        let reconciler = Reconciler::new(Arc::new(repo), rules());
        let scan = reconciler.scan().unwrap();

        let found: Vec<_> = scan.resources.keys().map(|p| p.as_str()).collect();
        assert_eq!(found, vec!["/libs/x/install/b.jar"]);
    }

    #[test]
    fn missing_root_is_not_an_error() {
        let reconciler = Reconciler::new(Arc::new(MemoryRepository::new()), rules());
        let diff = reconciler.reconcile().unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn unavailable_repository_aborts_reconcile() {
        let repo = MemoryRepository::new();
        repo.write_file("/libs/x/install/b.jar", b"b").unwrap();
        repo.set_available(false);

        let reconciler = Reconciler::new(Arc::new(repo), rules());
        let err = reconciler.reconcile().unwrap_err();
        assert!(matches!(err, Error::RepositoryUnavailable { .. }));
    }
}
