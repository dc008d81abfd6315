//! SQLite-backed file relationship graph

use crate::error::{Result, ValidationError};
use crate::model::*;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default row limit for [`GraphStore::related_files`].
pub const DEFAULT_RELATED_LIMIT: usize = 20;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT UNIQUE NOT NULL,
        type TEXT,
        last_seen TEXT
    );

    CREATE TABLE IF NOT EXISTS edges (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_file_id INTEGER NOT NULL,
        to_file_id INTEGER NOT NULL,
        relationship TEXT NOT NULL,
        weight INTEGER DEFAULT 1,
        metadata TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (from_file_id) REFERENCES files (id),
        FOREIGN KEY (to_file_id) REFERENCES files (id),
        UNIQUE (from_file_id, to_file_id, relationship)
    );

    CREATE INDEX IF NOT EXISTS idx_edges_from ON edges (from_file_id);
    CREATE INDEX IF NOT EXISTS idx_edges_to ON edges (to_file_id);
    CREATE INDEX IF NOT EXISTS idx_edges_relationship ON edges (relationship);
"#;

/// The file graph: file nodes plus labeled, weighted edges.
///
/// Owns its connection for its whole lifetime; dropping the store closes it.
/// There is no locking, so only one writer may use a database at a time.
pub struct GraphStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl GraphStore {
    /// Open (or create) the graph database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let store = GraphStore {
            conn,
            db_path: Some(db_path),
        };
        store.init_schema()?;
        tracing::debug!("Opened file graph at {:?}", store.db_path);
        Ok(store)
    }

    /// Open a store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        let store = GraphStore {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Location of the database file, `None` when in memory.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Close the connection, reporting any error the drop path would swallow.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    /// Run `f` inside one transaction. Everything written by `f` is rolled
    /// back if it returns an error.
    ///
    /// Nested calls join the outermost transaction, which alone commits or
    /// rolls back.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        if !self.conn.is_autocommit() {
            return f(self);
        }

        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ── Writes ──────────────────────────────────────────────

    /// Register a file, or refresh `last_seen` on a known one.
    ///
    /// `file_type` only fills in a type that was previously unknown.
    pub fn upsert_file(&self, path: &str, file_type: Option<&str>) -> Result<FileId> {
        validate_path(path)?;
        let now = now_timestamp();

        self.conn.execute(
            r#"
            INSERT INTO files (path, type, last_seen)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(path) DO UPDATE SET
                last_seen = excluded.last_seen,
                type = COALESCE(files.type, excluded.type)
            "#,
            params![path, file_type, now],
        )?;

        let id: i64 = self
            .conn
            .query_row("SELECT id FROM files WHERE path = ?1", params![path], |row| {
                row.get(0)
            })?;
        Ok(FileId(id))
    }

    /// Insert an edge, or add `weight` to the existing edge with the same
    /// `(from, to, relationship)` triple. Both endpoints are registered first.
    ///
    /// A `None` metadata keeps whatever was stored before.
    pub fn upsert_edge(
        &self,
        from: &str,
        to: &str,
        relationship: &Relationship,
        weight: i64,
        metadata: Option<&str>,
    ) -> Result<()> {
        validate_path(from)?;
        validate_path(to)?;
        if relationship.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyRelationship.into());
        }
        if weight <= 0 {
            return Err(ValidationError::NonPositiveWeight(weight).into());
        }

        let from_id = self.upsert_file(from, file_type_of(from).as_deref())?;
        let to_id = self.upsert_file(to, file_type_of(to).as_deref())?;
        let now = now_timestamp();

        self.conn.execute(
            r#"
            INSERT INTO edges (from_file_id, to_file_id, relationship, weight, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(from_file_id, to_file_id, relationship) DO UPDATE SET
                weight = edges.weight + excluded.weight,
                metadata = COALESCE(excluded.metadata, edges.metadata)
            "#,
            params![from_id.0, to_id.0, relationship.as_str(), weight, metadata, now],
        )?;

        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────

    /// Look up a file id by path.
    pub fn file_id(&self, path: &str) -> Result<Option<FileId>> {
        let id = self
            .conn
            .query_row("SELECT id FROM files WHERE path = ?1", params![path], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(id.map(FileId))
    }

    /// Look up a file node by path.
    pub fn file(&self, path: &str) -> Result<Option<FileNode>> {
        let node = self
            .conn
            .query_row(
                "SELECT id, path, type, last_seen FROM files WHERE path = ?1",
                params![path],
                |row| {
                    Ok(FileNode {
                        id: FileId(row.get(0)?),
                        path: row.get(1)?,
                        file_type: row.get(2)?,
                        last_seen: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(node)
    }

    /// All file nodes, ordered by path.
    pub fn files(&self) -> Result<Vec<FileNode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, type, last_seen FROM files ORDER BY path")?;

        let files = stmt
            .query_map([], |row| {
                Ok(FileNode {
                    id: FileId(row.get(0)?),
                    path: row.get(1)?,
                    file_type: row.get(2)?,
                    last_seen: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(files)
    }

    /// All edges, optionally restricted to one relationship, heaviest first.
    pub fn edges(&self, relationship: Option<&Relationship>) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT ff.path, tf.path, e.relationship, e.weight, e.metadata, e.created_at
            FROM edges e
            JOIN files ff ON ff.id = e.from_file_id
            JOIN files tf ON tf.id = e.to_file_id
            WHERE (?1 IS NULL OR e.relationship = ?1)
            ORDER BY e.weight DESC, e.id
            "#,
        )?;

        let edges = stmt
            .query_map(params![relationship.map(|r| r.as_str())], |row| {
                Ok(Edge {
                    from: row.get(0)?,
                    to: row.get(1)?,
                    relationship: Relationship::from(row.get::<_, String>(2)?),
                    weight: row.get(3)?,
                    metadata: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    /// Files connected to `path` in either direction, heaviest first.
    ///
    /// An unknown path yields an empty list.
    pub fn related_files(
        &self,
        path: &str,
        relationship: Option<&Relationship>,
        limit: usize,
    ) -> Result<Vec<RelatedFile>> {
        let Some(file_id) = self.file_id(path)? else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT f.path, e.relationship, e.weight, e.metadata
            FROM edges e
            JOIN files f ON (
                (e.from_file_id = ?1 AND f.id = e.to_file_id) OR
                (e.to_file_id = ?1 AND f.id = e.from_file_id)
            )
            WHERE (?2 IS NULL OR e.relationship = ?2)
            ORDER BY e.weight DESC, e.id
            LIMIT ?3
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let related = stmt
            .query_map(
                params![file_id.0, relationship.map(|r| r.as_str()), limit],
                |row| {
                    Ok(RelatedFile {
                        path: row.get(0)?,
                        relationship: Relationship::from(row.get::<_, String>(1)?),
                        weight: row.get(2)?,
                        metadata: row.get(3)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(related)
    }

    /// Files `path` depends on, via `imports` edges.
    ///
    /// Built on [`related_files`](Self::related_files), so it matches
    /// `imports` edges in both directions: a file importing `path` is listed
    /// too. Use [`imports_of`](Self::imports_of) for the outgoing side only.
    pub fn dependencies(&self, path: &str) -> Result<Vec<String>> {
        let related = self.related_files(path, Some(&Relationship::Imports), DEFAULT_RELATED_LIMIT)?;
        Ok(related.into_iter().map(|r| r.path).collect())
    }

    /// Targets of `imports` edges leaving `path`, heaviest first.
    pub fn imports_of(&self, path: &str) -> Result<Vec<String>> {
        self.directed_imports(
            path,
            r#"
            SELECT f.path
            FROM edges e
            JOIN files f ON f.id = e.to_file_id
            WHERE e.from_file_id = ?1 AND e.relationship = 'imports'
            ORDER BY e.weight DESC, e.id
            "#,
        )
    }

    /// Files that import `path`, heaviest first.
    pub fn dependents(&self, path: &str) -> Result<Vec<String>> {
        self.directed_imports(
            path,
            r#"
            SELECT f.path
            FROM edges e
            JOIN files f ON f.id = e.from_file_id
            WHERE e.to_file_id = ?1 AND e.relationship = 'imports'
            ORDER BY e.weight DESC, e.id
            "#,
        )
    }

    fn directed_imports(&self, path: &str, sql: &str) -> Result<Vec<String>> {
        let Some(file_id) = self.file_id(path)? else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(sql)?;
        let paths = stmt
            .query_map(params![file_id.0], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    /// Files most often changed in the same commit as `path`.
    pub fn co_changed_with(&self, path: &str, limit: usize) -> Result<Vec<RelatedFile>> {
        self.related_files(path, Some(&Relationship::CoChanges), limit)
    }

    /// Node and edge counts plus the database size.
    pub fn stats(&self) -> Result<GraphStats> {
        let file_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        let edge_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT relationship, COUNT(*) FROM edges GROUP BY relationship")?;
        let edge_count_by_relationship = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

        let storage_size_bytes = match &self.db_path {
            Some(path) if path.exists() => std::fs::metadata(path)?.len(),
            _ => 0,
        };

        Ok(GraphStats {
            file_count: file_count as usize,
            edge_count: edge_count as usize,
            edge_count_by_relationship,
            storage_size_bytes,
        })
    }
}

fn validate_path(path: &str) -> std::result::Result<(), ValidationError> {
    if path.trim().is_empty() {
        Err(ValidationError::EmptyPath)
    } else {
        Ok(())
    }
}

fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
