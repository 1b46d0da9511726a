//! Common types for recommendation sources

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Name used in place of an artifact name to cover a whole group
pub const WILDCARD: &str = "*";

/// Kind of recommendation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Dependency descriptor (ivy.xml)
    Manifest,
    /// Bill of materials (Maven BOM)
    Bom,
    /// Plain key/value property set
    Properties,
}

impl SourceKind {
    /// Returns the string representation of the source kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Manifest => "manifest",
            SourceKind::Bom => "bom",
            SourceKind::Properties => "properties",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manifest" => Ok(SourceKind::Manifest),
            "bom" => Ok(SourceKind::Bom),
            "properties" => Ok(SourceKind::Properties),
            _ => Err(()),
        }
    }
}

/// Coordinates of an artifact whose version is recommended (`group:name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub group: String,
    pub name: String,
}

impl ArtifactKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Key matching every artifact of `group`
    pub fn wildcard(group: impl Into<String>) -> Self {
        Self::new(group, WILDCARD)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl std::str::FromStr for ArtifactKey {
    type Err = InvalidArtifactKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, name) = s
            .split_once(':')
            .ok_or_else(|| InvalidArtifactKey(s.to_string()))?;
        let (group, name) = (group.trim(), name.trim());

        if group.is_empty() || name.is_empty() || name.contains(':') {
            return Err(InvalidArtifactKey(s.to_string()));
        }

        Ok(Self::new(group, name))
    }
}

/// Error for strings that are not `group:name`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid artifact key '{0}': expected group:name")]
pub struct InvalidArtifactKey(pub String);

/// Recommended versions keyed by artifact, ordered by key
pub type Recommendations = BTreeMap<ArtifactKey, String>;

/// Look up `key` in `recommendations`, falling back to a `group:*` entry
///
/// Exact entries always win over the group wildcard.
pub fn lookup_in<'a>(recommendations: &'a Recommendations, key: &ArtifactKey) -> Option<&'a str> {
    recommendations
        .get(key)
        .or_else(|| recommendations.get(&ArtifactKey::wildcard(key.group.as_str())))
        .map(String::as_str)
}
