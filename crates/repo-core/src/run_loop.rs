//! Background run loop
//!
//! A single worker thread drives reconciliation. Repository notifications
//! only mark the engine dirty through a coalescing queue; the worker drains
//! it once per cycle, so a burst of events becomes a single reconciliation.
//! Reconciliation also runs on the first cycle after activation, after any
//! cycle that left work behind, and periodically to recover notifications
//! that were never delivered.
//!
//! The worker thread owns the [`Reconciler`] while active and hands it back
//! when joined, so the known-state table survives a deactivate/activate
//! round trip.

use std::collections::BTreeSet;
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use repo_store::{ChangeEvent, ChangeListener, NormalizedPath, Repository};
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::classify::InstallRules;
use crate::config::EngineConfig;
use crate::installer::{Installer, InstallerBridge};
use crate::ledger::Ledger;
use crate::sync::Reconciler;

/// State shared between the run loop handle, the worker and listeners.
struct Shared {
    pending: Mutex<BTreeSet<NormalizedPath>>,
    accepting: AtomicBool,
    cycles: Mutex<u64>,
    cycle_done: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            pending: Mutex::new(BTreeSet::new()),
            accepting: AtomicBool::new(false),
            cycles: Mutex::new(0),
            cycle_done: Condvar::new(),
        }
    }

    fn push(&self, path: NormalizedPath) {
        if !self.accepting.load(Ordering::SeqCst) {
            return;
        }
        self.lock_pending().insert(path);
    }

    fn drain(&self) -> BTreeSet<NormalizedPath> {
        mem::take(&mut *self.lock_pending())
    }

    fn clear(&self) {
        self.lock_pending().clear();
    }

    fn finish_cycle(&self) {
        let mut cycles = self.lock_cycles();
        *cycles += 1;
        self.cycle_done.notify_all();
    }

    fn lock_pending(&self) -> MutexGuard<'_, BTreeSet<NormalizedPath>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cycles(&self) -> MutexGuard<'_, u64> {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChangeListener for Shared {
    fn on_change(&self, event: &ChangeEvent) {
        self.push(event.path.clone());
    }
}

/// Drop paths whose ancestor is also pending.
fn coalesce(paths: &BTreeSet<NormalizedPath>) -> Vec<&NormalizedPath> {
    let mut roots: Vec<&NormalizedPath> = Vec::new();
    for path in paths {
        if !roots.iter().any(|root| path.starts_with(root)) {
            roots.push(path);
        }
    }
    roots
}

enum LoopState {
    Stopped(Box<Reconciler>),
    Active {
        stop: mpsc::Sender<()>,
        handle: JoinHandle<Reconciler>,
    },
    /// The worker died; the next activation rebuilds the reconciler
    Failed,
}

struct Worker {
    reconciler: Reconciler,
    bridge: InstallerBridge,
    shared: Arc<Shared>,
    stop: mpsc::Receiver<()>,
    interval: Duration,
    rescan_cycles: u64,
}

impl Worker {
    fn run(mut self) -> Reconciler {
        info!(scheme = %self.bridge.scheme(), "Run loop started");
        let mut needs_reconcile = true;
        let mut idle_cycles = 0u64;

        loop {
            let changes = self.shared.drain();
            if !changes.is_empty() {
                debug!(
                    notifications = changes.len(),
                    roots = ?coalesce(&changes),
                    "Draining change notifications"
                );
            }

            let rescan_due = self.rescan_cycles > 0 && idle_cycles >= self.rescan_cycles;
            if needs_reconcile || !changes.is_empty() || rescan_due {
                idle_cycles = 0;
                needs_reconcile = match self.reconciler.run_cycle(&self.bridge) {
                    Ok(report) => !report.is_clean(),
                    Err(e) => {
                        error!(error = %e, "Reconciliation cycle aborted");
                        true
                    }
                };
            } else {
                idle_cycles += 1;
            }

            self.shared.finish_cycle();
            match self.stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!(scheme = %self.bridge.scheme(), "Run loop stopped");
        self.reconciler
    }
}

/// Lifecycle handle of the detection engine.
pub struct RunLoop {
    shared: Arc<Shared>,
    bridge: InstallerBridge,
    repository: Arc<dyn Repository>,
    rules: InstallRules,
    state_file: Option<PathBuf>,
    interval: Duration,
    rescan_cycles: u64,
    state: Mutex<LoopState>,
}

impl RunLoop {
    /// Build a stopped engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the configured folder pattern does not
    /// compile.
    pub fn new(
        repository: Arc<dyn Repository>,
        installer: Arc<dyn Installer>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let rules = config.rules()?;
        let mut run_loop = Self {
            shared: Arc::new(Shared::new()),
            bridge: InstallerBridge::new(config.url_scheme.clone(), installer),
            repository,
            rules,
            state_file: config.state_file.clone(),
            interval: config.cycle_interval(),
            rescan_cycles: config.rescan_cycles,
            state: Mutex::new(LoopState::Failed),
        };
        let reconciler = run_loop.build_reconciler(true);
        *run_loop.state.get_mut().unwrap_or_else(PoisonError::into_inner) =
            LoopState::Stopped(Box::new(reconciler));
        Ok(run_loop)
    }

    /// Start the worker thread. Does nothing if already active.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn activate(&self) -> Result<()> {
        let mut state = self.lock_state();
        let reconciler = match mem::replace(&mut *state, LoopState::Failed) {
            LoopState::Active { stop, handle } if !handle.is_finished() => {
                *state = LoopState::Active { stop, handle };
                return Ok(());
            }
            // The worker only exits on its own by panicking
            LoopState::Active { handle, .. } => match handle.join() {
                Ok(reconciler) => reconciler,
                Err(_) => {
                    error!("Run loop thread panicked, rebuilding engine with empty known state");
                    self.build_reconciler(false)
                }
            },
            LoopState::Stopped(reconciler) => *reconciler,
            LoopState::Failed => {
                error!("Previous run loop failed, rebuilding engine with empty known state");
                self.build_reconciler(false)
            }
        };

        self.shared.clear();
        self.shared.accepting.store(true, Ordering::SeqCst);

        let (stop, stop_rx) = mpsc::channel();
        let worker = Worker {
            reconciler,
            bridge: self.bridge.clone(),
            shared: Arc::clone(&self.shared),
            stop: stop_rx,
            interval: self.interval,
            rescan_cycles: self.rescan_cycles,
        };
        let spawned = thread::Builder::new()
            .name(format!("{}-loop", self.bridge.scheme()))
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                *state = LoopState::Active { stop, handle };
                Ok(())
            }
            Err(e) => {
                self.shared.accepting.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop the worker thread and wait for it. Does nothing if not active.
    ///
    /// A cycle in progress completes before this returns.
    pub fn deactivate(&self) {
        let mut state = self.lock_state();
        self.shared.accepting.store(false, Ordering::SeqCst);
        self.shared.clear();

        match mem::replace(&mut *state, LoopState::Failed) {
            LoopState::Active { stop, handle } => {
                // The worker may already be gone; join tells us either way
                let _ = stop.send(());
                match handle.join() {
                    Ok(reconciler) => {
                        if let Err(e) = reconciler.save_state() {
                            warn!(error = %e, "Failed to persist known state");
                        }
                        *state = LoopState::Stopped(Box::new(reconciler));
                    }
                    Err(_) => error!("Run loop thread panicked"),
                }
            }
            other => *state = other,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.lock_state(), LoopState::Active { .. })
    }

    /// Number of cycles completed since construction
    pub fn cycle_count(&self) -> u64 {
        *self.shared.lock_cycles()
    }

    /// Block until `n` more cycles have completed, or `timeout` elapses.
    ///
    /// Returns whether the cycles completed in time.
    pub fn wait_for_cycles(&self, n: u64, timeout: Duration) -> bool {
        let cycles = self.shared.lock_cycles();
        let target = *cycles + n;
        let (cycles, _) = self
            .shared
            .cycle_done
            .wait_timeout_while(cycles, timeout, |count| *count < target)
            .unwrap_or_else(PoisonError::into_inner);
        *cycles >= target
    }

    /// Listener to subscribe to the repository's change notifications
    pub fn listener(&self) -> Arc<dyn ChangeListener> {
        Arc::clone(&self.shared) as Arc<dyn ChangeListener>
    }

    /// Mark a path as changed. Ignored while inactive.
    pub fn notify(&self, path: impl Into<NormalizedPath>) {
        self.shared.push(path.into());
    }

    /// Snapshot of the known-state table, available while stopped.
    pub fn ledger(&self) -> Option<Ledger> {
        match &*self.lock_state() {
            LoopState::Stopped(reconciler) => Some(reconciler.ledger().clone()),
            _ => None,
        }
    }

    // After a worker failure the table starts empty; reconciliation
    // converges from there.
    fn build_reconciler(&self, load_state: bool) -> Reconciler {
        let fresh = || Reconciler::new(Arc::clone(&self.repository), self.rules.clone());
        let Some(path) = &self.state_file else {
            return fresh();
        };
        if !load_state {
            return fresh().with_state_path(path.clone());
        }
        match fresh().with_state_file(path.clone()) {
            Ok(reconciler) => reconciler,
            Err(e) => {
                warn!(
                    state_file = %path.display(),
                    error = %e,
                    "Known state unreadable, starting empty"
                );
                fresh().with_state_path(path.clone())
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RunLoop {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_keeps_only_topmost_paths() {
        let paths: BTreeSet<NormalizedPath> = ["/libs/a", "/libs/a/install/x.jar", "/apps/b"]
            .into_iter()
            .map(NormalizedPath::new)
            .collect();
        let roots: Vec<&str> = coalesce(&paths).into_iter().map(|p| p.as_str()).collect();
        assert_eq!(roots, vec!["/apps/b", "/libs/a"]);
    }

    #[test]
    fn notifications_are_ignored_while_inactive() {
        let shared = Shared::new();
        shared.push(NormalizedPath::new("/libs/a"));
        assert!(shared.drain().is_empty());

        shared.accepting.store(true, Ordering::SeqCst);
        shared.push(NormalizedPath::new("/libs/a"));
        shared.push(NormalizedPath::new("/libs/a"));
        assert_eq!(shared.drain().len(), 1);
    }
}
