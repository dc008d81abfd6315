//! Commit records read from `commits.jsonl`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// One enriched commit as written by the post-commit hook.
///
/// The log uses one-letter keys: `h` hash, `m` message, `f` comma-joined
/// files, `i`/`d` insertions/deletions, `b` branch, `p` project, `t` timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(rename = "h")]
    pub hash: String,
    #[serde(rename = "m", default)]
    pub message: String,
    #[serde(rename = "f", default)]
    pub files: String,
    #[serde(rename = "i", default, deserialize_with = "lenient_count")]
    pub insertions: u64,
    #[serde(rename = "d", default, deserialize_with = "lenient_count")]
    pub deletions: u64,
    #[serde(rename = "b", default)]
    pub branch: String,
    #[serde(rename = "p", default, deserialize_with = "lenient_string")]
    pub project: String,
    #[serde(rename = "t", default)]
    pub timestamp: String,
}

impl CommitRecord {
    /// The touched files, trimmed, without empty entries.
    pub fn files(&self) -> Vec<String> {
        self.files
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect()
    }

    /// The commit time, if the timestamp is parseable.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Read commit records, skipping blank and corrupted lines.
///
/// With `since`, records whose timestamp sorts before it are dropped. A
/// missing file reads as an empty history.
pub fn read_commits(path: impl AsRef<Path>, since: Option<&str>) -> std::io::Result<Vec<CommitRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let mut commits = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: CommitRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Skipping corrupted line {} in {}: {}", lineno + 1, path.display(), e);
                continue;
            }
        };
        if let Some(since) = since {
            if !record.timestamp.is_empty() && record.timestamp.as_str() < since {
                continue;
            }
        }
        commits.push(record);
    }
    Ok(commits)
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
