//! Repository node model

use std::collections::BTreeMap;
use std::fmt;

use crate::NormalizedPath;

/// The type of a repository node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A container of other nodes
    Folder,
    /// A node holding binary content plus non-content metadata
    File,
    /// A configuration-typed node whose data is its property set
    Config,
}

/// A node reference returned by repository listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub path: NormalizedPath,
    pub kind: NodeKind,
}

impl NodeInfo {
    pub fn new(path: NormalizedPath, kind: NodeKind) -> Self {
        Self { path, kind }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// A single property value of a configuration node.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Strings(Vec<String>),
}

impl PropertyValue {
    /// Short type tag, stable across releases.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::Strings(_) => "strings",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Strings(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// Property set of a configuration, ordered by name.
pub type Properties = BTreeMap<String, PropertyValue>;
