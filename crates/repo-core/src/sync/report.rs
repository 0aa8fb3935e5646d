//! Outcome of a reconciliation cycle

use serde::{Deserialize, Serialize};

/// Report from a single reconcile-and-apply cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Registrations accepted by the installer
    pub registered: usize,
    /// Removals accepted by the installer
    pub removed: usize,
    /// Installer calls that failed or were held back
    pub failed: usize,
    /// Resources skipped because they could not be read
    pub skipped: usize,
    /// Actions taken during the cycle
    pub actions: Vec<String>,
    /// Errors encountered during the cycle
    pub errors: Vec<String>,
}

impl CycleReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the ledger changed during the cycle
    pub fn has_changes(&self) -> bool {
        self.registered > 0 || self.removed > 0
    }

    /// Whether everything the cycle attempted succeeded
    ///
    /// A cycle that is not clean leaves work for the next one.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.errors.is_empty()
    }
}
