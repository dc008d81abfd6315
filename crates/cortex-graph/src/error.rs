//! Error types for graph storage and configuration

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Failure of a graph operation. Not retried by the store.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// SQLite failure (I/O, corruption, schema)
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the database location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected at the write boundary
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Input that the store refuses to coerce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file path must not be empty")]
    EmptyPath,

    #[error("edge weight must be positive, got {0}")]
    NonPositiveWeight(i64),

    #[error("relationship tag must not be empty")]
    EmptyRelationship,
}

/// Failure while loading `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config value {key} = {value} is out of range")]
    OutOfRange { key: &'static str, value: i64 },
}
