//! Install-folder resource detection engine
//!
//! Watches install folders in a content repository and keeps an external
//! installer's registry in step with them:
//!
//! - **Classification**: Which nodes are bundles or configurations, and which
//!   install folder owns them
//! - **Ledger**: The known-state table of everything registered so far
//! - **Reconciliation**: Diffing the repository against the ledger
//! - **Installer bridge**: Scheme-scoped register/remove calls that commit
//!   to the ledger on success
//! - **Run loop**: A background thread reconciling on change notifications
//!   and on periodic rescans
//!
//! # Architecture
//!
//! ```text
//!        repository ──notifications──> RunLoop
//!            |                            |
//!            |                       Reconciler ── Ledger
//!            |                            |
//!            +──────── reads ─────────────+
//!                                         |
//!                                  InstallerBridge ──> Installer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use repo_core::{EngineConfig, RunLoop};
//! use repo_store::MemoryRepository;
//!
//! let repository = Arc::new(MemoryRepository::new());
//! let engine = RunLoop::new(repository.clone(), installer, &EngineConfig::default())?;
//! repository.subscribe(engine.listener());
//! engine.activate()?;
//! ```

pub mod classify;
pub mod config;
pub mod digest;
pub mod error;
pub mod installer;
pub mod ledger;
pub mod logging;
pub mod run_loop;
pub mod sync;

pub use classify::{Classification, InstallRoot, InstallRules, Placement, ResourceKind};
pub use config::{EngineConfig, RootConfig};
pub use digest::{Digest, ResourceData, digest_bytes, digest_properties};
pub use error::{Error, Result};
pub use installer::{InstallableResource, Installer, InstallerBridge, InstallerError};
pub use ledger::{KnownEntry, Ledger};
pub use run_loop::RunLoop;
pub use sync::{CycleReport, Diff, Reconciler, Registration, Removal, RemovalReason};
