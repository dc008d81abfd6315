//! Cortex Analysis — change-impact traversal and commit pattern detection
//!
//! Both analyzers only read: impact queries walk a [`cortex_graph::GraphStore`],
//! pattern detection aggregates [`cortex_graph::CommitRecord`]s.

pub mod impact;
pub mod patterns;


#[cfg(test)]
pub mod test_utils;

pub use impact::{ImpactAnalyzer, ImpactReport, ImpactLevel, AffectedFiles, BlastRadius, CriticalFile, DEFAULT_MAX_DEPTH, CO_CHANGE_LIMIT};
pub use patterns::{
    PatternDetector, PatternSummary, HotspotEntry, HotspotCategory, ModuleStats, IsolatedFile,
    CycleSummary, TestCoverage, CoverageLevel, ArchitecturalStyle, test_coverage, architectural_style,
};
