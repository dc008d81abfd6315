//! Co-change edges derived from commits, and the graph write entry points

use crate::commits::CommitRecord;
use crate::error::Result;
use crate::graph::GraphStore;
use crate::model::Relationship;

/// Turns the file list of one commit into pairwise `co_changes` edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoChangeBuilder {
    /// Commits touching more files than this are skipped entirely.
    max_files: Option<usize>,
}

impl CoChangeBuilder {
    /// A builder with no cap on commit size.
    pub fn new() -> Self {
        CoChangeBuilder { max_files: None }
    }

    /// A builder that ignores commits touching more than `max_files` files.
    pub fn with_max_files(max_files: Option<usize>) -> Self {
        CoChangeBuilder { max_files }
    }

    pub fn max_files(&self) -> Option<usize> {
        self.max_files
    }

    /// Upsert a weight-1 `co_changes` edge for every pair `(files[i], files[j])`
    /// with `i < j`. Returns the number of pairs written.
    ///
    /// A commit with N files costs N·(N-1)/2 upserts. All of them share one
    /// transaction, so a failure leaves none of this commit's edges behind.
    pub fn add_co_changes<S: AsRef<str>>(&self, store: &GraphStore, files: &[S]) -> Result<usize> {
        if let Some(cap) = self.max_files() {
            if files.len() > cap {
                tracing::warn!(
                    "Skipping co-changes for commit with {} files (cap is {})",
                    files.len(),
                    cap
                );
                return Ok(0);
            }
        }

        store.transaction(|store| {
            let mut pairs = 0;
            for (i, file_a) in files.iter().enumerate() {
                for file_b in &files[i + 1..] {
                    store.upsert_edge(
                        file_a.as_ref(),
                        file_b.as_ref(),
                        &Relationship::CoChanges,
                        1,
                        None,
                    )?;
                    pairs += 1;
                }
            }
            Ok(pairs)
        })
    }

    /// Record the co-changes of one commit. Commits touching fewer than two
    /// files write nothing.
    pub fn register_commit(&self, store: &GraphStore, commit: &CommitRecord) -> Result<usize> {
        let files = commit.files();
        if files.len() < 2 {
            return Ok(0);
        }
        self.add_co_changes(store, &files)
    }

    /// Record a batch of commits, stopping at the first failing one.
    pub fn register_commits(&self, store: &GraphStore, commits: &[CommitRecord]) -> Result<usize> {
        let mut pairs = 0;
        for commit in commits {
            pairs += self.register_commit(store, commit)?;
        }
        tracing::info!(
            "Registered {} co-change pairs from {} commits",
            pairs,
            commits.len()
        );
        Ok(pairs)
    }
}

/// Write entry point for external edge producers such as the import heuristic.
pub fn register_edge(
    store: &GraphStore,
    from: &str,
    to: &str,
    relationship: &Relationship,
    weight: Option<i64>,
    metadata: Option<&str>,
) -> Result<()> {
    store.upsert_edge(from, to, relationship, weight.unwrap_or(1), metadata)
}
