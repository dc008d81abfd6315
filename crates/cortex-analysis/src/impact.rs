//! Change-impact analysis over the file graph

use cortex_graph::{GraphStore, Relationship, Result};
use petgraph::graph::DiGraph;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Default traversal depth for impact queries.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// How many co-changed files count towards the impact score.
pub const CO_CHANGE_LIMIT: usize = 10;

/// Risk classification derived from the impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// `high` above 50, `medium` above 20, `low` otherwise.
    pub fn from_score(score: usize) -> Self {
        match score {
            s if s > 50 => ImpactLevel::High,
            s if s > 20 => ImpactLevel::Medium,
            _ => ImpactLevel::Low,
        }
    }
}

/// Files affected by a change, split by how they were reached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AffectedFiles {
    pub direct: Vec<String>,
    /// Transitive dependents that are not already direct dependents.
    pub transitive: Vec<String>,
    pub co_changed: Vec<String>,
}

/// Impact of changing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub file: String,
    pub level: ImpactLevel,
    pub score: usize,
    pub direct_dependents: usize,
    /// Size of the full transitive set, direct dependents included.
    pub transitive_dependents: usize,
    pub co_changed_files: usize,
    pub affected: AffectedFiles,
}

/// Dependents of a file grouped by hop distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastRadius {
    pub file: String,
    pub max_depth: usize,
    pub total_affected: usize,
    pub layers: BTreeMap<usize, Vec<String>>,
}

/// A file many others import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalFile {
    pub file: String,
    pub dependents: usize,
    pub level: ImpactLevel,
}

/// Breadth-first impact queries. Holds no state of its own; every call reads
/// the store afresh, one `dependents` lookup per expanded node.
#[derive(Debug, Clone, Copy)]
pub struct ImpactAnalyzer<'a> {
    store: &'a GraphStore,
    co_change_limit: usize,
}

impl<'a> ImpactAnalyzer<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self {
            store,
            co_change_limit: CO_CHANGE_LIMIT,
        }
    }

    /// Override how many co-changed files feed the score.
    pub fn with_co_change_limit(mut self, limit: usize) -> Self {
        self.co_change_limit = limit;
        self
    }

    /// Score the impact of changing `path`.
    ///
    /// `score = 10·direct + 3·transitive + co_changed`, where `transitive`
    /// counts the whole transitive set even though the listed files omit the
    /// direct ones.
    pub fn analyze_file(&self, path: &str, max_depth: usize) -> Result<ImpactReport> {
        let direct = self.store.dependents(path)?;
        let transitive = self.transitive_dependents(path, max_depth)?;
        let co_changed = self.store.co_changed_with(path, self.co_change_limit)?;

        let score = direct.len() * 10 + transitive.len() * 3 + co_changed.len();

        let direct_set: HashSet<&str> = direct.iter().map(String::as_str).collect();
        let indirect = transitive
            .iter()
            .filter(|file| !direct_set.contains(file.as_str()))
            .cloned()
            .collect();

        Ok(ImpactReport {
            file: path.to_string(),
            level: ImpactLevel::from_score(score),
            score,
            direct_dependents: direct.len(),
            transitive_dependents: transitive.len(),
            co_changed_files: co_changed.len(),
            affected: AffectedFiles {
                direct,
                transitive: indirect,
                co_changed: co_changed.into_iter().map(|r| r.path).collect(),
            },
        })
    }

    /// Every file that reaches `path` through `imports` edges in fewer than
    /// `max_depth` hops, in visit order.
    ///
    /// Queue entries are dropped once `depth >= max_depth`, before they are
    /// marked visited, so files exactly `max_depth` hops away never appear.
    /// [`blast_radius`](Self::blast_radius) uses `depth > max_depth` and does
    /// include them. The two boundaries are inconsistent with each other and
    /// callers rely on both.
    pub fn transitive_dependents(&self, path: &str, max_depth: usize) -> Result<Vec<String>> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([(path.to_string(), 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.insert(current.clone());

            for dependent in self.store.dependents(&current)? {
                if !visited.contains(&dependent) {
                    queue.push_back((dependent, depth + 1));
                }
            }
            if current != path {
                order.push(current);
            }
        }

        Ok(order)
    }

    /// Dependents of `path` layered by hop distance, up to and including
    /// `max_depth` hops.
    pub fn blast_radius(&self, path: &str, max_depth: usize) -> Result<BlastRadius> {
        let mut layers: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([(path.to_string(), 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth {
                continue;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.insert(current.clone());

            for dependent in self.store.dependents(&current)? {
                if !visited.contains(&dependent) {
                    queue.push_back((dependent, depth + 1));
                }
            }
            // the source file itself is layer 0 and not reported
            if depth > 0 {
                layers.entry(depth).or_default().push(current);
            }
        }

        let total_affected = layers.values().map(Vec::len).sum();
        Ok(BlastRadius {
            file: path.to_string(),
            max_depth,
            total_affected,
            layers,
        })
    }

    /// Analyze several files, highest score first. Files whose analysis
    /// fails are logged and left out.
    pub fn compare_impact<S: AsRef<str>>(&self, paths: &[S], max_depth: usize) -> Vec<ImpactReport> {
        let mut reports: Vec<ImpactReport> = paths
            .iter()
            .filter_map(|path| match self.analyze_file(path.as_ref(), max_depth) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!("Failed to analyze {}: {}", path.as_ref(), e);
                    None
                }
            })
            .collect();

        // stable: equal scores keep input order
        reports.sort_by(|a, b| b.score.cmp(&a.score));
        reports
    }

    /// Files with at least `min_dependents` direct importers, most imported
    /// first (ties by path), at most `limit` of them.
    pub fn find_critical_files(&self, min_dependents: usize, limit: usize) -> Result<Vec<CriticalFile>> {
        let edges = self.store.edges(Some(&Relationship::Imports))?;

        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes = HashMap::new();
        for edge in &edges {
            let from = *nodes
                .entry(edge.from.clone())
                .or_insert_with(|| graph.add_node(edge.from.clone()));
            let to = *nodes
                .entry(edge.to.clone())
                .or_insert_with(|| graph.add_node(edge.to.clone()));
            graph.add_edge(from, to, ());
        }

        let mut critical: Vec<CriticalFile> = graph
            .node_indices()
            .filter_map(|idx| {
                let dependents = graph.neighbors_directed(idx, Direction::Incoming).count();
                (dependents >= min_dependents).then(|| CriticalFile {
                    file: graph[idx].clone(),
                    dependents,
                    level: ImpactLevel::from_score(dependents * 10),
                })
            })
            .collect();

        critical.sort_by(|a, b| b.dependents.cmp(&a.dependents).then_with(|| a.file.cmp(&b.file)));
        critical.truncate(limit);
        Ok(critical)
    }
}
