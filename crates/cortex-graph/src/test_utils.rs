//! Test utilities for cortex-graph

use crate::commits::CommitRecord;
use crate::graph::GraphStore;
use crate::model::Relationship;
use tempfile::TempDir;

/// Create an on-disk store inside a fresh temp directory.
/// Keep the `TempDir` alive for as long as the store is used.
pub fn create_disk_store() -> (TempDir, GraphStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = GraphStore::open(temp_dir.path().join("cortex").join("graph.db")).unwrap();
    (temp_dir, store)
}

/// Create an in-memory store with `imports` edges given as (importer, imported).
pub fn create_import_graph(edges: &[(&str, &str)]) -> GraphStore {
    let store = GraphStore::open_in_memory().unwrap();
    for (from, to) in edges {
        store.upsert_edge(from, to, &Relationship::Imports, 1, None).unwrap();
    }
    store
}

/// Build a commit touching the given comma-joined files.
pub fn commit(hash: &str, files: &str) -> CommitRecord {
    CommitRecord {
        hash: hash.to_string(),
        message: format!("commit {}", hash),
        files: files.to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_disk_store() {
        let (temp_dir, store) = create_disk_store();
        assert!(temp_dir.path().join("cortex/graph.db").exists());
        assert_eq!(store.stats().unwrap().file_count, 0);
    }
}
