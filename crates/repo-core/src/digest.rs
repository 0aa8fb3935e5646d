//! Content digests used to tell real changes from no-op edits
//!
//! A bundle is fingerprinted by its bytes only, so metadata edits such as a
//! MIME type change never re-register it. A configuration is fingerprinted
//! by its full property set in name order. Both use the canonical
//! `sha256:<hex>` form.

use std::fmt;

use repo_store::{Properties, PropertyValue};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::classify::ResourceKind;

/// Prefix for all digests produced by this module
const PREFIX: &str = "sha256:";

/// An opaque content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn finish(hasher: Sha256) -> Self {
        Self(format!("{}{:x}", PREFIX, hasher.finalize()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Installation-relevant data of a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceData {
    Bundle(Vec<u8>),
    Configuration(Properties),
}

impl ResourceData {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Bundle(_) => ResourceKind::Bundle,
            Self::Configuration(_) => ResourceKind::Configuration,
        }
    }

    pub fn digest(&self) -> Digest {
        match self {
            Self::Bundle(bytes) => digest_bytes(bytes),
            Self::Configuration(properties) => digest_properties(properties),
        }
    }
}

/// Digest of bundle content.
pub fn digest_bytes(content: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"bundle\0");
    hasher.update(content);
    Digest::finish(hasher)
}

/// Digest of a configuration property set.
///
/// Every component is length-prefixed so distinct property sets never share
/// an encoding.
pub fn digest_properties(properties: &Properties) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"config\0");
    for (name, value) in properties {
        update_field(&mut hasher, name.as_bytes());
        update_field(&mut hasher, value.type_tag().as_bytes());
        match value {
            PropertyValue::Strings(values) => {
                hasher.update((values.len() as u64).to_le_bytes());
                for v in values {
                    update_field(&mut hasher, v.as_bytes());
                }
            }
            PropertyValue::Double(v) => update_field(&mut hasher, &v.to_bits().to_le_bytes()),
            other => update_field(&mut hasher, other.to_string().as_bytes()),
        }
    }
    Digest::finish(hasher)
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
            .collect()
    }

    #[test]
    fn digest_has_prefix() {
        assert!(digest_bytes(b"hello").as_str().starts_with("sha256:"));
    }

    #[test]
    fn bytes_digest_is_deterministic() {
        assert_eq!(digest_bytes(b"test"), digest_bytes(b"test"));
        assert_ne!(digest_bytes(b"aaa"), digest_bytes(b"bbb"));
    }

    #[test]
    fn changed_value_changes_digest() {
        let a = digest_properties(&props(&[("foo", "value")]));
        let b = digest_properties(&props(&[("foo", "value-changed")]));
        assert_ne!(a, b);
    }

    #[test]
    fn property_boundaries_are_unambiguous() {
        let a = digest_properties(&props(&[("ab", "c")]));
        let b = digest_properties(&props(&[("a", "bc")]));
        assert_ne!(a, b);
    }

    #[test]
    fn value_type_is_part_of_digest() {
        let mut as_long = Properties::new();
        as_long.insert("port".into(), PropertyValue::Long(8080));
        let as_string = props(&[("port", "8080")]);
        assert_ne!(digest_properties(&as_long), digest_properties(&as_string));
    }

    #[test]
    fn kinds_never_share_a_digest() {
        assert_ne!(digest_bytes(b""), digest_properties(&Properties::new()));
    }
}
