//! Error types for repo-core

use std::path::PathBuf;

use repo_store::NormalizedPath;

/// Result type for repo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-core operations
///
/// None of these are fatal to the engine: a failed cycle is retried on the
/// next tick.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Listing the repository failed, the cycle was aborted
    #[error("Repository unavailable: {source}")]
    RepositoryUnavailable {
        #[source]
        source: repo_store::Error,
    },

    /// A resource could not be read or digested
    #[error("Malformed resource {path}: {reason}")]
    MalformedResource { path: NormalizedPath, reason: String },

    /// The installer refused a register or remove call
    #[error("Installer rejected {path}: {reason}")]
    InstallerRejected { path: NormalizedPath, reason: String },

    /// The install folder pattern is not a valid regex
    #[error("Invalid install folder pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Failed to parse an engine configuration file
    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// The tracing subscriber could not be installed
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },

    /// Configuration file extension is not supported
    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    // Transparent wrappers for underlying crate errors
    /// Repository store error from repo-store
    #[error(transparent)]
    Store(#[from] repo_store::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn unavailable(source: repo_store::Error) -> Self {
        Self::RepositoryUnavailable { source }
    }

    pub fn malformed(path: &NormalizedPath, reason: impl std::fmt::Display) -> Self {
        Self::MalformedResource {
            path: path.clone(),
            reason: reason.to_string(),
        }
    }
}
