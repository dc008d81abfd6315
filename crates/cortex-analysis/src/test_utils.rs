//! Test utilities for cortex-analysis

use cortex_graph::{CommitRecord, GraphStore, Relationship};

/// In-memory store where each `(importer, imported)` pair is an `imports` edge.
pub fn import_graph(edges: &[(&str, &str)]) -> GraphStore {
    let store = GraphStore::open_in_memory().unwrap();
    for (from, to) in edges {
        store.upsert_edge(from, to, &Relationship::Imports, 1, None).unwrap();
    }
    store
}

/// A linear import chain: every file imports the one before it, so each file
/// is the single dependent of its predecessor.
pub fn dependent_chain(files: &[&str]) -> GraphStore {
    let edges: Vec<(&str, &str)> = files.windows(2).map(|w| (w[1], w[0])).collect();
    import_graph(&edges)
}

/// Commits touching the given comma-joined file lists, undated.
pub fn commits(file_lists: &[&str]) -> Vec<CommitRecord> {
    file_lists
        .iter()
        .enumerate()
        .map(|(i, files)| CommitRecord {
            hash: format!("c{}", i),
            message: String::new(),
            files: files.to_string(),
            ..Default::default()
        })
        .collect()
}

/// A commit with a message and timestamp, for cycle detection.
pub fn dated_commit(timestamp: &str, message: &str, files: &str) -> CommitRecord {
    CommitRecord {
        hash: format!("{}-{}", timestamp, message),
        message: message.to_string(),
        files: files.to_string(),
        timestamp: timestamp.to_string(),
        ..Default::default()
    }
}
