//! [`MockInstaller`], an in-memory installer recording every call.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use repo_core::{InstallableResource, Installer, InstallerError};
use repo_store::NormalizedPath;

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    registered: BTreeMap<(String, String), InstallableResource>,
    rejected: BTreeSet<String>,
}

/// Installer double.
///
/// Every call is recorded as `register:<scheme>:<path>` or
/// `remove:<scheme>:<path>`, including calls it was told to reject.
///
/// # Example
///
/// ```rust,ignore
/// let installer = Arc::new(MockInstaller::new());
/// // ... run the engine ...
/// assert!(installer.is_registered("repoinstall", "/libs/foo/bar/install/bundle1.jar"));
/// ```
#[derive(Default)]
pub struct MockInstaller {
    state: Mutex<MockState>,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in the order they were made.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_recorded_calls(&self) {
        self.lock().calls.clear();
    }

    /// Whether any recorded call starts with `<action>:<scheme>:<path>`.
    pub fn has_call(&self, action: &str, scheme: &str, path: &str) -> bool {
        let call = format!("{action}:{scheme}:{path}");
        self.lock().calls.iter().any(|c| c.starts_with(&call))
    }

    pub fn is_registered(&self, scheme: &str, path: &str) -> bool {
        self.lock()
            .registered
            .contains_key(&(scheme.to_string(), path.to_string()))
    }

    /// The resource currently registered for `path`, if any.
    pub fn registered(&self, scheme: &str, path: &str) -> Option<InstallableResource> {
        self.lock()
            .registered
            .get(&(scheme.to_string(), path.to_string()))
            .cloned()
    }

    /// Paths registered under `scheme`, sorted.
    pub fn registered_paths(&self, scheme: &str) -> Vec<String> {
        self.lock()
            .registered
            .keys()
            .filter(|(s, _)| s == scheme)
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Fail every call for `path` until [`MockInstaller::accept`] is called.
    pub fn reject(&self, path: &str) {
        self.lock().rejected.insert(path.to_string());
    }

    pub fn accept(&self, path: &str) {
        self.lock().rejected.remove(path);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Installer for MockInstaller {
    fn register(
        &self,
        scheme: &str,
        resource: InstallableResource,
    ) -> Result<(), InstallerError> {
        let mut state = self.lock();
        let path = resource.path.as_str().to_string();
        state.calls.push(format!("register:{scheme}:{path}"));
        if state.rejected.contains(&path) {
            return Err(InstallerError::new(format!("rejected register of {path}")));
        }
        state.registered.insert((scheme.to_string(), path), resource);
        Ok(())
    }

    fn remove(&self, scheme: &str, path: &NormalizedPath) -> Result<(), InstallerError> {
        let mut state = self.lock();
        let path = path.as_str().to_string();
        state.calls.push(format!("remove:{scheme}:{path}"));
        if state.rejected.contains(&path) {
            return Err(InstallerError::new(format!("rejected remove of {path}")));
        }
        state.registered.remove(&(scheme.to_string(), path));
        Ok(())
    }
}
