//! Known-state entries
//!
//! An entry records what was last successfully announced to the installer
//! for one resource path.

use chrono::{DateTime, Utc};
use repo_store::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::classify::ResourceKind;
use crate::digest::Digest;

/// Last-sent state of a registered resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnownEntry {
    /// Digest of the content the installer was given
    pub digest: Digest,
    /// Kind of the resource when it was registered
    pub kind: ResourceKind,
    /// Install folder that owned the resource
    pub folder: NormalizedPath,
    /// When the registration was acknowledged
    pub registered_at: DateTime<Utc>,
}

impl KnownEntry {
    /// Create an entry stamped with the current time
    pub fn new(digest: Digest, kind: ResourceKind, folder: NormalizedPath) -> Self {
        Self {
            digest,
            kind,
            folder,
            registered_at: Utc::now(),
        }
    }
}
