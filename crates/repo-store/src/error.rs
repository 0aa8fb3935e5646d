//! Error types for repo-store

use std::path::PathBuf;

use crate::{NodeKind, NormalizedPath};

/// Result type for repo-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Node not found: {path}")]
    NotFound { path: NormalizedPath },

    #[error("Repository unavailable: {message}")]
    Unavailable { message: String },

    #[error("Content of {path} cannot be read: {message}")]
    Unreadable {
        path: NormalizedPath,
        message: String,
    },

    #[error("Node {path} is a {actual:?} node, expected {expected:?}")]
    WrongKind {
        path: NormalizedPath,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("Invalid properties text at line {line}: {message}")]
    PropertiesParse { line: usize, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(path: &NormalizedPath) -> Self {
        Self::NotFound { path: path.clone() }
    }

    /// Whether the error means the node is simply gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
