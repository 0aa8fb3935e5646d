//! Installer bridge
//!
//! Turns a [`Diff`] into calls against the external installer. Every call
//! carries the engine's URL scheme so the installer can tell this engine's
//! registrations apart from other producers. The ledger is only updated
//! after the installer accepted a call; a rejected call leaves the ledger
//! as it was and is naturally retried by the next cycle.

use std::collections::BTreeSet;
use std::sync::Arc;

use repo_store::NormalizedPath;
use tracing::{info, warn};

use crate::Error;
use crate::classify::ResourceKind;
use crate::digest::{Digest, ResourceData};
use crate::ledger::{KnownEntry, Ledger};
use crate::sync::{CycleReport, Diff, Registration};

/// A resource handed to the installer.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallableResource {
    /// `<scheme>:<path>`
    pub url: String,
    pub path: NormalizedPath,
    pub kind: ResourceKind,
    pub digest: Digest,
    pub priority: u32,
    pub start_level: Option<u32>,
    pub data: ResourceData,
}

/// Failure reported by the installer for a single call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InstallerError {
    pub message: String,
}

impl InstallerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Registration API of the external installer.
pub trait Installer: Send + Sync {
    /// Register a new resource, or replace the registered content of a path.
    fn register(&self, scheme: &str, resource: InstallableResource)
    -> Result<(), InstallerError>;

    /// Withdraw a registration.
    fn remove(&self, scheme: &str, path: &NormalizedPath) -> Result<(), InstallerError>;
}

/// Scheme-scoped adapter between the reconciliation engine and an installer.
#[derive(Clone)]
pub struct InstallerBridge {
    scheme: String,
    installer: Arc<dyn Installer>,
}

impl InstallerBridge {
    pub fn new(scheme: impl Into<String>, installer: Arc<dyn Installer>) -> Self {
        Self {
            scheme: scheme.into(),
            installer,
        }
    }

    /// The URL scheme identifying this engine to the installer
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// URL of a resource under this engine's scheme
    pub fn url_for(&self, path: &NormalizedPath) -> String {
        format!("{}:{}", self.scheme, path)
    }

    /// Send a diff to the installer, committing each accepted call to the
    /// ledger.
    ///
    /// Removals go first, so a path that is replaced within one diff is
    /// always removed before it is registered again. A registration whose
    /// path failed to be removed in the same pass is held back until the
    /// next cycle.
    pub fn apply(&self, diff: Diff, ledger: &mut Ledger) -> CycleReport {
        let mut report = CycleReport::new();
        report.skipped = diff.skipped.len();
        let mut failed_removals = BTreeSet::new();

        for removal in diff.to_remove {
            match self.installer.remove(&self.scheme, &removal.path) {
                Ok(()) => {
                    ledger.remove(&removal.path);
                    info!(
                        scheme = %self.scheme,
                        path = %removal.path,
                        reason = %removal.reason,
                        "Removed resource"
                    );
                    report.removed += 1;
                    report.actions.push(format!("remove {}", removal.path));
                }
                Err(e) => {
                    self.record_rejection(&mut report, &removal.path, e);
                    failed_removals.insert(removal.path);
                }
            }
        }

        for registration in diff.to_register {
            if failed_removals.contains(&registration.path) {
                report.failed += 1;
                continue;
            }
            let path = registration.path.clone();
            let entry = KnownEntry::new(
                registration.digest.clone(),
                registration.kind(),
                registration.placement.folder.clone(),
            );
            let resource = self.installable(registration);
            match self.installer.register(&self.scheme, resource) {
                Ok(()) => {
                    let previous = ledger.put(&path, entry);
                    info!(
                        scheme = %self.scheme,
                        path = %path,
                        update = previous.is_some(),
                        "Registered resource"
                    );
                    report.registered += 1;
                    report.actions.push(format!("register {}", path));
                }
                Err(e) => self.record_rejection(&mut report, &path, e),
            }
        }

        report
    }

    fn installable(&self, registration: Registration) -> InstallableResource {
        InstallableResource {
            url: self.url_for(&registration.path),
            kind: registration.kind(),
            path: registration.path,
            digest: registration.digest,
            priority: registration.placement.priority,
            start_level: registration.placement.start_level,
            data: registration.data,
        }
    }

    fn record_rejection(&self, report: &mut CycleReport, path: &NormalizedPath, e: InstallerError) {
        let error = Error::InstallerRejected {
            path: path.clone(),
            reason: e.message,
        };
        warn!(scheme = %self.scheme, error = %error, "Installer call failed, retrying next cycle");
        report.failed += 1;
        report.errors.push(error.to_string());
    }
}
