//! Engine configuration
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working engine watching `/libs` and `/apps`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use repo_store::{NormalizedPath, io};
use serde::{Deserialize, Serialize};

use crate::classify::{InstallRoot, InstallRules};
use crate::{Error, Result};

/// Default URL scheme identifying this engine's registrations
pub const DEFAULT_URL_SCHEME: &str = "repoinstall";

/// Default install folder pattern
pub const DEFAULT_FOLDER_PATTERN: &str = "^.*/install$";

/// A configured install root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub path: String,
    pub priority: u32,
}

/// Configuration for the detection engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace passed with every installer call
    pub url_scheme: String,
    /// Pause between run-loop cycles
    pub cycle_interval_ms: u64,
    /// Idle cycles before a full rescan, 0 disables periodic rescans
    pub rescan_cycles: u64,
    /// Regex matched against candidate install folder paths
    pub folder_pattern: String,
    /// Subtrees searched for install folders
    pub roots: Vec<RootConfig>,
    /// Active run modes
    pub run_modes: Vec<String>,
    /// Where to persist the known-state table
    pub state_file: Option<PathBuf>,
    /// Tracing filter directives, `RUST_LOG` takes precedence
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url_scheme: DEFAULT_URL_SCHEME.to_string(),
            cycle_interval_ms: 500,
            rescan_cycles: 20,
            folder_pattern: DEFAULT_FOLDER_PATTERN.to_string(),
            roots: vec![
                RootConfig {
                    path: "/libs".to_string(),
                    priority: 100,
                },
                RootConfig {
                    path: "/apps".to_string(),
                    priority: 200,
                },
            ],
            run_modes: Vec::new(),
            state_file: None,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML configuration string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: PathBuf::new(),
            format: "TOML".into(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_locked(path)?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "TOML".into(),
                message: e.to_string(),
            }),
            "json" => serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "JSON".into(),
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "YAML".into(),
                message: e.to_string(),
            }),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// Compile the install folder rules.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if `folder_pattern` is not a valid regex.
    pub fn rules(&self) -> Result<InstallRules> {
        let roots = self
            .roots
            .iter()
            .map(|root| InstallRoot {
                path: NormalizedPath::new(&root.path),
                priority: root.priority,
            })
            .collect();
        InstallRules::new(&self.folder_pattern, roots, self.run_modes.iter().cloned())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}
