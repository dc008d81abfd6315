//! Pattern detection over commit history

use crate::impact::{CriticalFile, ImpactAnalyzer};
use chrono::{DateTime, TimeDelta, Utc};
use cortex_graph::{CommitRecord, GraphStore, PatternsConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How strongly a hotspot stands out, by share of all commits touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotCategory {
    Critical,
    High,
    Medium,
    Low,
}

impl HotspotCategory {
    /// `> 0.2` critical, `> 0.1` high, `> 0.05` medium, otherwise low.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.2 {
            HotspotCategory::Critical
        } else if ratio > 0.1 {
            HotspotCategory::High
        } else if ratio > 0.05 {
            HotspotCategory::Medium
        } else {
            HotspotCategory::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotEntry {
    pub file: String,
    pub changes: usize,
    pub category: HotspotCategory,
}

/// Change activity of one top-level directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStats {
    pub module: String,
    /// Distinct files touched.
    pub files: usize,
    /// Total file touches across all commits.
    pub changes: usize,
    /// `changes / total commits`
    pub activity: f64,
}

/// A file that mostly changes on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolatedFile {
    pub file: String,
    pub total_changes: usize,
    pub solo_changes: usize,
    pub solo_ratio: f64,
}

/// A burst of commits with no gap longer than the cycle gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub start_date: String,
    pub end_date: String,
    pub commits: usize,
    pub features: usize,
    pub fixes: usize,
    pub refactors: usize,
    pub files_affected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageLevel {
    High,
    Moderate,
    Low,
}

impl CoverageLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.5 {
            CoverageLevel::High
        } else if ratio > 0.25 {
            CoverageLevel::Moderate
        } else {
            CoverageLevel::Low
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CoverageLevel::High => "test-driven / high coverage",
            CoverageLevel::Moderate => "moderate testing",
            CoverageLevel::Low => "low test coverage",
        }
    }
}

/// How often commits touch test files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCoverage {
    pub level: CoverageLevel,
    pub description: String,
    pub test_commits: usize,
    pub test_commit_ratio: f64,
    pub total_test_files: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchitecturalStyle {
    Unknown,
    Monolithic,
    Modular,
    Layered,
    Minimal,
}

impl ArchitecturalStyle {
    pub fn description(&self) -> &'static str {
        match self {
            ArchitecturalStyle::Unknown => "unknown",
            ArchitecturalStyle::Monolithic => "monolithic",
            ArchitecturalStyle::Modular => "microservices / modular",
            ArchitecturalStyle::Layered => "layered / modular",
            ArchitecturalStyle::Minimal => "simple / minimal",
        }
    }
}

/// Every pattern report in one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub hotspots: Vec<HotspotEntry>,
    pub modules: Vec<ModuleStats>,
    pub architecture: ArchitecturalStyle,
    pub isolated_files: Vec<IsolatedFile>,
    pub feature_cycles: Vec<CycleSummary>,
    pub test_coverage: TestCoverage,
    /// Only filled when the detector has a graph store.
    pub critical_files: Vec<CriticalFile>,
}

const SUMMARY_LIMIT: usize = 10;
const SUMMARY_CYCLES: usize = 5;
const SUMMARY_MIN_DEPENDENTS: usize = 5;

/// Aggregates a batch of commits into change statistics.
pub struct PatternDetector<'a> {
    commits: &'a [CommitRecord],
    store: Option<&'a GraphStore>,
    config: PatternsConfig,
}

impl<'a> PatternDetector<'a> {
    pub fn new(commits: &'a [CommitRecord]) -> Self {
        Self {
            commits,
            store: None,
            config: PatternsConfig::default(),
        }
    }

    /// Attach a graph store, used for the critical files in [`summarize`](Self::summarize).
    pub fn with_store(mut self, store: &'a GraphStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: PatternsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn total_commits(&self) -> usize {
        self.commits.len()
    }

    /// Most frequently changed files. Ties keep first-seen order.
    pub fn hotspots(&self, top_n: usize) -> Vec<HotspotEntry> {
        let total = self.commits.len();
        let mut counts = FirstSeenCounter::default();
        for commit in self.commits {
            for file in commit.files() {
                counts.add(file, 1);
            }
        }

        counts
            .into_sorted()
            .into_iter()
            .take(top_n)
            .map(|(file, changes)| HotspotEntry {
                file,
                changes,
                category: HotspotCategory::from_ratio(ratio(changes, total)),
            })
            .collect()
    }

    /// Activity per top-level directory, busiest first. Files at the
    /// repository root belong to no module.
    pub fn modules(&self) -> Vec<ModuleStats> {
        let total = self.commits.len();
        let mut order: Vec<String> = Vec::new();
        let mut touched: HashMap<String, (HashSet<String>, usize)> = HashMap::new();

        for commit in self.commits {
            for file in commit.files() {
                let Some((module, _)) = file.split_once('/') else {
                    continue;
                };
                let module = module.to_string();
                let entry = touched.entry(module.clone()).or_insert_with(|| {
                    order.push(module);
                    (HashSet::new(), 0)
                });
                entry.0.insert(file.clone());
                entry.1 += 1;
            }
        }

        let mut modules: Vec<ModuleStats> = order
            .into_iter()
            .filter_map(|module| {
                let (files, changes) = touched.remove(&module)?;
                Some(ModuleStats {
                    module,
                    files: files.len(),
                    changes,
                    activity: ratio(changes, total),
                })
            })
            .collect();
        modules.sort_by(|a, b| b.changes.cmp(&a.changes));
        modules
    }

    /// Files with at least `min_changes` changes, more than 70% of them in
    /// single-file commits. Most changed first.
    pub fn isolated_files(&self, min_changes: usize) -> Vec<IsolatedFile> {
        let mut totals = FirstSeenCounter::default();
        let mut solos: HashMap<String, usize> = HashMap::new();

        for commit in self.commits {
            let files = commit.files();
            let solo = files.len() == 1;
            for file in files {
                if solo {
                    *solos.entry(file.clone()).or_default() += 1;
                }
                totals.add(file, 1);
            }
        }

        let mut isolated: Vec<IsolatedFile> = totals
            .into_entries()
            .into_iter()
            .filter(|(_, total)| *total >= min_changes)
            .filter_map(|(file, total)| {
                let solo = solos.get(&file).copied().unwrap_or(0);
                let solo_ratio = ratio(solo, total);
                (solo_ratio > 0.7).then(|| IsolatedFile {
                    file,
                    total_changes: total,
                    solo_changes: solo,
                    solo_ratio: round2(solo_ratio),
                })
            })
            .collect();
        isolated.sort_by(|a, b| b.total_changes.cmp(&a.total_changes));
        isolated
    }

    /// Split the history into cycles wherever two consecutive commits are
    /// more than `cycle_gap_days` apart. Commits without a parseable
    /// timestamp are ignored.
    ///
    /// A gap outside `0..=TimeDelta::MAX.num_days()` falls back to the default.
    pub fn feature_cycles(&self) -> Vec<CycleSummary> {
        let gap = cycle_gap(self.config.cycle_gap_days);

        let mut dated: Vec<(DateTime<Utc>, &CommitRecord)> = self
            .commits
            .iter()
            .filter_map(|commit| commit.time().map(|time| (time, commit)))
            .collect();
        dated.sort_by_key(|(time, _)| *time);

        let mut cycles = Vec::new();
        let mut current: Vec<&CommitRecord> = Vec::new();
        let mut last: Option<DateTime<Utc>> = None;

        for (time, commit) in dated {
            if let Some(last) = last {
                if time - last > gap && !current.is_empty() {
                    cycles.push(summarize_cycle(&current));
                    current.clear();
                }
            }
            current.push(commit);
            last = Some(time);
        }
        if !current.is_empty() {
            cycles.push(summarize_cycle(&current));
        }

        cycles
    }

    pub fn test_coverage(&self) -> TestCoverage {
        test_coverage(self.commits)
    }

    /// All reports with the configured limits.
    pub fn summarize(&self) -> PatternSummary {
        let mut modules = self.modules();
        let architecture = architectural_style(&modules);
        modules.truncate(SUMMARY_LIMIT);

        let mut isolated_files = self.isolated_files(self.config.isolation_min_changes);
        isolated_files.truncate(SUMMARY_LIMIT);

        let mut feature_cycles = self.feature_cycles();
        let skip = feature_cycles.len().saturating_sub(SUMMARY_CYCLES);
        feature_cycles.drain(..skip);

        let critical_files = match self.store {
            Some(store) => ImpactAnalyzer::new(store)
                .find_critical_files(SUMMARY_MIN_DEPENDENTS, SUMMARY_LIMIT)
                .unwrap_or_else(|e| {
                    tracing::warn!("Critical file scan failed: {}", e);
                    Vec::new()
                }),
            None => Vec::new(),
        };

        PatternSummary {
            hotspots: self.hotspots(self.config.hotspot_top_n),
            modules,
            architecture,
            isolated_files,
            feature_cycles,
            test_coverage: self.test_coverage(),
            critical_files,
        }
    }
}

/// Share of commits touching a test or spec file.
pub fn test_coverage(commits: &[CommitRecord]) -> TestCoverage {
    let mut test_commits = 0;
    let mut total_test_files = 0;

    for commit in commits {
        let test_files = commit
            .files()
            .iter()
            .filter(|file| {
                let lower = file.to_lowercase();
                lower.contains("test") || lower.contains("spec")
            })
            .count();
        if test_files > 0 {
            test_commits += 1;
            total_test_files += test_files;
        }
    }

    let test_ratio = ratio(test_commits, commits.len());
    let level = CoverageLevel::from_ratio(test_ratio);
    TestCoverage {
        level,
        description: level.description().to_string(),
        test_commits,
        test_commit_ratio: round2(test_ratio),
        total_test_files,
    }
}

/// Guess the overall layout from module statistics.
pub fn architectural_style(modules: &[ModuleStats]) -> ArchitecturalStyle {
    if modules.is_empty() {
        return ArchitecturalStyle::Unknown;
    }

    let total_files: usize = modules.iter().map(|m| m.files).sum();
    match modules.len() {
        1 => ArchitecturalStyle::Monolithic,
        n if n > 10 && total_files > 100 => ArchitecturalStyle::Modular,
        n if n > 5 => ArchitecturalStyle::Layered,
        _ => ArchitecturalStyle::Minimal,
    }
}

fn cycle_gap(days: i64) -> TimeDelta {
    match TimeDelta::try_days(days) {
        Some(gap) if days >= 0 => gap,
        _ => {
            let fallback = PatternsConfig::default().cycle_gap_days;
            tracing::warn!(
                "Cycle gap of {} days is out of range, using {}",
                days,
                fallback
            );
            TimeDelta::days(fallback)
        }
    }
}

fn summarize_cycle(commits: &[&CommitRecord]) -> CycleSummary {
    let count_matching = |needle: &str| {
        commits
            .iter()
            .filter(|c| c.message.to_lowercase().contains(needle))
            .count()
    };

    let files: HashSet<String> = commits.iter().flat_map(|c| c.files()).collect();
    let date_of = |commit: Option<&&CommitRecord>| {
        commit
            .map(|c| c.timestamp.chars().take(10).collect::<String>())
            .unwrap_or_default()
    };

    CycleSummary {
        start_date: date_of(commits.first()),
        end_date: date_of(commits.last()),
        commits: commits.len(),
        features: count_matching("feat"),
        fixes: count_matching("fix"),
        refactors: count_matching("refactor"),
        files_affected: files.len(),
    }
}

/// Counts keyed by string, remembering the order keys first appeared in.
#[derive(Default)]
struct FirstSeenCounter {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl FirstSeenCounter {
    fn add(&mut self, key: String, n: usize) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += n,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, n));
            }
        }
    }

    fn into_entries(self) -> Vec<(String, usize)> {
        self.entries
    }

    /// Highest count first; equal counts stay in first-seen order.
    fn into_sorted(self) -> Vec<(String, usize)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
