//! Content repository abstraction for the repository installer
//!
//! Provides normalized repository paths, the node model, the read API the
//! installer engine consumes, change notifications, and two stores: an
//! in-memory tree and a read-only view over a local directory.

pub mod disk;
pub mod error;
pub mod io;
pub mod memory;
pub mod node;
pub mod path;
pub mod properties;
pub mod store;

pub use disk::DiskRepository;
pub use error::{Error, Result};
pub use memory::MemoryRepository;
pub use node::{NodeInfo, NodeKind, Properties, PropertyValue};
pub use path::NormalizedPath;
pub use properties::parse_properties;
pub use store::{ChangeEvent, ChangeKind, ChangeListener, Repository};
