//! Configuration loaded from `<cortex home>/config.toml`

use crate::error::ConfigError;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the cortex home directory.
pub const CORTEX_HOME_ENV: &str = "CORTEX_HOME";

/// Home directory name under the user's home: ~/.cortex
pub const CORTEX_DIR: &str = ".cortex";

/// Config file inside the cortex home.
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration. Every section and key is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexConfig {
    pub graph: GraphConfig,
    pub impact: ImpactConfig,
    pub patterns: PatternsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Database file; relative paths resolve against the cortex home.
    pub db_path: PathBuf,
    /// Commits touching more files than this get no co-change edges.
    pub co_change_max_files: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("graph.db"),
            co_change_max_files: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub max_depth: usize,
    pub co_change_limit: usize,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            co_change_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    pub hotspot_top_n: usize,
    pub isolation_min_changes: usize,
    /// A gap longer than this between commits starts a new feature cycle.
    pub cycle_gap_days: i64,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            hotspot_top_n: 10,
            isolation_min_changes: 3,
            cycle_gap_days: 3,
        }
    }
}

/// Resolve the cortex home: explicit value, then `$CORTEX_HOME`, then ~/.cortex.
pub fn cortex_home(explicit: Option<&Path>) -> PathBuf {
    if let Some(home) = explicit {
        return home.to_path_buf();
    }
    if let Some(home) = std::env::var_os(CORTEX_HOME_ENV) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CORTEX_DIR)
}

impl CortexConfig {
    /// Load `config.toml` from `home`. A missing file yields the defaults.
    ///
    /// Values that parse but cannot be used are rejected, see [`validate`](Self::validate).
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges the type system does not: `cycle_gap_days` must lie in
    /// `0..=TimeDelta::MAX.num_days()`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gap = self.patterns.cycle_gap_days;
        if !(0..=TimeDelta::MAX.num_days()).contains(&gap) {
            return Err(ConfigError::OutOfRange {
                key: "patterns.cycle_gap_days",
                value: gap,
            });
        }
        Ok(())
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// The database path, resolved against `home` when relative.
    pub fn db_path(&self, home: &Path) -> PathBuf {
        if self.graph.db_path.is_absolute() {
            self.graph.db_path.clone()
        } else {
            home.join(&self.graph.db_path)
        }
    }
}
