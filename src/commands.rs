//! CLI command implementations

use anyhow::Context as _;
use cortex_analysis::{ImpactAnalyzer, PatternDetector};
use cortex_graph::{
    cortex_home, read_commits, register_edge, CoChangeBuilder, CortexConfig, GraphStore,
    Relationship,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolved home, config and database location for one invocation.
pub struct Context {
    pub home: PathBuf,
    pub config: CortexConfig,
    pub db_path: PathBuf,
}

impl Context {
    pub fn load(home: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<Self> {
        let home = cortex_home(home);
        let config = CortexConfig::load(&home)?;
        let db_path = db.unwrap_or_else(|| config.db_path(&home));
        Ok(Self {
            home,
            config,
            db_path,
        })
    }

    fn open_store(&self) -> anyhow::Result<GraphStore> {
        GraphStore::open(&self.db_path)
            .with_context(|| format!("Cannot open graph at {}", self.db_path.display()))
    }

    fn analyzer<'a>(&self, store: &'a GraphStore) -> ImpactAnalyzer<'a> {
        ImpactAnalyzer::new(store).with_co_change_limit(self.config.impact.co_change_limit)
    }

    fn max_depth(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.config.impact.max_depth)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct IngestSummary {
    commits: usize,
    pairs: usize,
}

pub fn ingest(ctx: &Context, log: &Path, since: Option<&str>) -> anyhow::Result<()> {
    tracing::info!("Ingesting commits from {}", log.display());

    let commits = read_commits(log, since)
        .with_context(|| format!("Cannot read commit log {}", log.display()))?;
    let store = ctx.open_store()?;
    let builder = CoChangeBuilder::with_max_files(ctx.config.graph.co_change_max_files);
    if let Some(cap) = builder.max_files() {
        tracing::debug!("Skipping commits with more than {} files", cap);
    }
    let pairs = builder.register_commits(&store, &commits)?;

    print_json(&IngestSummary {
        commits: commits.len(),
        pairs,
    })
}

pub fn edge(
    ctx: &Context,
    from: &str,
    to: &str,
    relationship: &str,
    weight: Option<i64>,
    metadata: Option<&str>,
) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let relationship = Relationship::from(relationship);
    register_edge(&store, from, to, &relationship, weight, metadata)?;
    tracing::info!("Recorded {} -> {} ({})", from, to, relationship);
    Ok(())
}

pub fn stats(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    print_json(&store.stats()?)
}

pub fn related(
    ctx: &Context,
    file: &str,
    relationship: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let relationship = relationship.map(Relationship::from);
    print_json(&store.related_files(file, relationship.as_ref(), limit)?)
}

pub fn dependencies(ctx: &Context, file: &str) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    print_json(&store.dependencies(file)?)
}

pub fn dependents(ctx: &Context, file: &str) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    print_json(&store.dependents(file)?)
}

pub fn impact(ctx: &Context, file: &str, max_depth: Option<usize>) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let report = ctx.analyzer(&store).analyze_file(file, ctx.max_depth(max_depth))?;
    print_json(&report)
}

pub fn blast(ctx: &Context, file: &str, max_depth: Option<usize>) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let blast = ctx.analyzer(&store).blast_radius(file, ctx.max_depth(max_depth))?;
    print_json(&blast)
}

pub fn compare(ctx: &Context, files: &[String], max_depth: Option<usize>) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let reports = ctx.analyzer(&store).compare_impact(files, ctx.max_depth(max_depth));
    print_json(&reports)
}

pub fn critical(ctx: &Context, min_dependents: usize, limit: usize) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    print_json(&ctx.analyzer(&store).find_critical_files(min_dependents, limit)?)
}

pub fn patterns(ctx: &Context, log: &Path) -> anyhow::Result<()> {
    let commits = read_commits(log, None)
        .with_context(|| format!("Cannot read commit log {}", log.display()))?;
    // critical files are only reported when a graph already exists
    let store = if ctx.db_path.is_file() {
        Some(ctx.open_store()?)
    } else {
        None
    };

    let mut detector = PatternDetector::new(&commits).with_config(ctx.config.patterns.clone());
    tracing::info!("Analyzing {} commits", detector.total_commits());
    if let Some(store) = &store {
        detector = detector.with_store(store);
    }
    print_json(&detector.summarize())
}
