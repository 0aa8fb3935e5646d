//! Seeded repository content for engine scenarios.
//!
//! [`TestContent`] wraps a [`MemoryRepository`] holding install folders
//! under `/libs` and `/apps`. [`TestDisk`] builds the same kind of tree in a
//! temporary directory for [`DiskRepository`] tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use repo_core::logging;
use repo_store::{DiskRepository, MemoryRepository, Properties, PropertyValue};
use tempfile::TempDir;

/// Bundles created by [`TestContent::seeded`].
pub const FAKE_RESOURCES: &[&str] = &[
    "/libs/foo/bar/install/bundle1.jar",
    "/libs/foo/bar/install/bundle2.jar",
    "/libs/foo/wii/install/bundle3.jar",
    "/apps/foo/bar/install/bundle4.jar",
    "/apps/foo/wii/install/bundle5.jar",
];

/// Configuration nodes created by [`TestContent::seeded`].
pub const FAKE_CONFIGS: &[&str] = &[
    "/libs/foo/bar/install/config1",
    "/libs/foo/wii/install/config2",
    "/apps/foo/bar/install/config3",
    "/apps/foo/wii/install/config4",
];

/// Content written by [`TestContent::create_or_update_file`].
pub const DEFAULT_FILE_CONTENT: &[u8] = b"Some content";

/// A memory repository with helpers mirroring what a content author does.
///
/// Helpers panic on failure; they are for tests only.
pub struct TestContent {
    repository: Arc<MemoryRepository>,
}

impl Default for TestContent {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContent {
    /// An empty repository.
    pub fn new() -> Self {
        logging::init_for_tests();
        Self {
            repository: Arc::new(MemoryRepository::new()),
        }
    }

    /// A repository holding [`FAKE_RESOURCES`] and [`FAKE_CONFIGS`].
    pub fn seeded() -> Self {
        let content = Self::new();
        content.setup_content();
        content
    }

    pub fn repository(&self) -> Arc<MemoryRepository> {
        Arc::clone(&self.repository)
    }

    /// Create every fake bundle and configuration.
    pub fn setup_content(&self) {
        for path in FAKE_RESOURCES {
            self.create_or_update_file(path);
        }
        for path in FAKE_CONFIGS {
            self.create_config(path, None);
        }
    }

    /// Write [`DEFAULT_FILE_CONTENT`] at `path`.
    pub fn create_or_update_file(&self, path: &str) {
        self.create_or_update_file_with(path, DEFAULT_FILE_CONTENT);
    }

    pub fn create_or_update_file_with(&self, path: &str, content: &[u8]) {
        self.repository
            .write_file(path, content)
            .unwrap_or_else(|e| panic!("failed to write {path}: {e}"));
    }

    /// Create a configuration node, with `foo = bar` if no properties are given.
    pub fn create_config(&self, path: &str, properties: Option<Properties>) {
        let properties = properties.unwrap_or_else(|| {
            let mut defaults = Properties::new();
            defaults.insert("foo".to_string(), PropertyValue::from("bar"));
            defaults
        });
        self.repository
            .write_config(path, properties)
            .unwrap_or_else(|e| panic!("failed to create config {path}: {e}"));
    }

    pub fn set_property(&self, path: &str, name: &str, value: &str) {
        self.repository
            .set_property(path, name, value)
            .unwrap_or_else(|e| panic!("failed to set {name} on {path}: {e}"));
    }

    pub fn set_mime_type(&self, path: &str, mime: &str) {
        self.repository
            .set_mime_type(path, mime)
            .unwrap_or_else(|e| panic!("failed to set MIME type of {path}: {e}"));
    }

    /// Delete a node and its subtree.
    pub fn delete(&self, path: &str) {
        self.repository
            .remove(path)
            .unwrap_or_else(|e| panic!("failed to delete {path}: {e}"));
    }
}

/// A temporary directory laid out as a repository.
pub struct TestDisk {
    temp_dir: TempDir,
}

impl Default for TestDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDisk {
    pub fn new() -> Self {
        logging::init_for_tests();
        Self {
            temp_dir: TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}")),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file at repository path `path`, creating parent directories.
    pub fn write(&self, path: &str, content: &[u8]) -> PathBuf {
        let native = self.root().join(path.trim_start_matches('/'));
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("failed to create {path}: {e}"));
        }
        fs::write(&native, content).unwrap_or_else(|e| panic!("failed to write {path}: {e}"));
        native
    }

    pub fn delete(&self, path: &str) {
        let native = self.root().join(path.trim_start_matches('/'));
        let result = if native.is_dir() {
            fs::remove_dir_all(&native)
        } else {
            fs::remove_file(&native)
        };
        result.unwrap_or_else(|e| panic!("failed to delete {path}: {e}"));
    }

    pub fn repository(&self) -> Arc<DiskRepository> {
        Arc::new(
            DiskRepository::open(self.root())
                .unwrap_or_else(|e| panic!("failed to open disk repository: {e}")),
        )
    }
}
