//! Reconciliation between the repository and the known-state ledger
//!
//! This module provides:
//! - **diff**: The per-cycle register/remove sets
//! - **engine**: The [`Reconciler`] walking install roots and computing diffs
//! - **report**: The [`CycleReport`] summarizing an applied cycle

mod diff;
mod engine;
mod report;

pub use diff::{Diff, Registration, Removal, RemovalReason};
pub use engine::{Reconciler, Scan, ScannedResource};
pub use report::CycleReport;
