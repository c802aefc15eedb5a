//! Cache key composition.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::KeyBitResult;
use crate::fragment::Fragment;

/// A cache key uniquely identifying a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct CacheKey {
    /// The computed key string.
    key: String,
    /// Components that make up the key (for debugging).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<String>,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            components: Vec::new(),
        }
    }

    /// Create a cache key with its component descriptions.
    pub fn with_components(key: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            key: key.into(),
            components,
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Fragments gathered from a constructor's bits, by bit name.
///
/// Only bits that produced a fragment are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyData {
    entries: Vec<(String, Fragment)>,
}

impl KeyData {
    /// Create empty key data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fragment of a bit.
    pub fn insert(&mut self, name: impl Into<String>, fragment: Fragment) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = fragment,
            None => self.entries.push((name, fragment)),
        }
    }

    /// Get the fragment of a bit.
    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Number of contributing bits.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no bit contributed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in bit order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fragment)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Canonical JSON: object keys sorted at every level.
    pub fn to_canonical_json(&self) -> KeyBitResult<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }
}

impl Serialize for KeyData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, fragment) in &self.entries {
            map.serialize_entry(name, fragment)?;
        }
        map.end()
    }
}

/// Digest key data into a fixed-length key.
pub fn prepare_key(data: &KeyData) -> KeyBitResult<String> {
    let json = data.to_canonical_json()?;
    Ok(format!("{:x}", md5::compute(json.as_bytes())))
}
