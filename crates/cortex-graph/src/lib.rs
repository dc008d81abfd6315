//! Cortex Graph — file relationship store, co-change builder, and commit log model

pub mod graph;
pub mod model;
pub mod error;
pub mod cochange;
pub mod commits;
pub mod config;


#[cfg(test)]
pub mod test_utils;

pub use model::{FileId, Relationship, FileNode, Edge, RelatedFile, GraphStats, file_type_of};
pub use graph::{GraphStore, DEFAULT_RELATED_LIMIT};
pub use error::{GraphError, ValidationError, ConfigError, Result};
pub use cochange::{CoChangeBuilder, register_edge};
pub use commits::{CommitRecord, read_commits, parse_timestamp};
pub use config::{CortexConfig, GraphConfig, ImpactConfig, PatternsConfig, cortex_home};
