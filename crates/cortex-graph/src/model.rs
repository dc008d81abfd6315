//! Core data structures for the file relationship graph

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Row id of a file node in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct FileId(pub i64);

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// File A imports file B. Queried directionally.
    Imports,
    /// Files changed in the same commit. Queried bidirectionally.
    CoChanges,
    /// File A depends on file B (manual annotation).
    DependsOn,
    /// Any other tag written by an external producer.
    Other(String),
}

impl Relationship {
    pub fn as_str(&self) -> &str {
        match self {
            Relationship::Imports => "imports",
            Relationship::CoChanges => "co_changes",
            Relationship::DependsOn => "depends_on",
            Relationship::Other(tag) => tag,
        }
    }
}

impl From<&str> for Relationship {
    fn from(tag: &str) -> Self {
        match tag {
            "imports" => Relationship::Imports,
            "co_changes" => Relationship::CoChanges,
            "depends_on" => Relationship::DependsOn,
            other => Relationship::Other(other.to_string()),
        }
    }
}

impl From<String> for Relationship {
    fn from(tag: String) -> Self {
        Relationship::from(tag.as_str())
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Relationship::from(tag))
    }
}

/// A file node in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileNode {
    pub id: FileId,
    pub path: String,
    /// Short type label, usually the file extension.
    pub file_type: Option<String>,
    pub last_seen: String,
}

/// Derive the type label the store records for a path (its extension).
pub fn file_type_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// A stored edge, with endpoints resolved to paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relationship: Relationship,
    /// Accumulated weight; every upsert of the same triple adds to it.
    pub weight: i64,
    /// Opaque payload, typically serialized JSON.
    pub metadata: Option<String>,
    pub created_at: String,
}

/// A neighbour returned by a related-files query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedFile {
    pub path: String,
    pub relationship: Relationship,
    pub weight: i64,
    pub metadata: Option<String>,
}

/// Size summary of the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GraphStats {
    pub file_count: usize,
    pub edge_count: usize,
    pub edge_count_by_relationship: BTreeMap<String, usize>,
    /// On-disk size of the database file; 0 for in-memory stores.
    pub storage_size_bytes: u64,
}
