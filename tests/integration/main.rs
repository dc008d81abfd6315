//! Integration tests for Cortex
//!
//! These tests drive the graph store, the analyzers and the CLI together.

use cortex_analysis::{ImpactAnalyzer, ImpactLevel, PatternDetector};
use cortex_graph::{
    read_commits, register_edge, CoChangeBuilder, CortexConfig, GraphStore, Relationship,
};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const COMMIT_LOG: &str = r#"{"h":"a1","m":"feat: parser","f":"src/parser.rs,src/lexer.rs","i":40,"d":2,"b":"main","p":"demo","t":"2024-05-01T10:00:00Z"}
{"h":"a2","m":"fix lexer","f":"src/lexer.rs,src/parser.rs,tests/lexer_test.rs","i":"7","d":"1","b":"main","p":null,"t":"2024-05-02T10:00:00Z"}
this line is not json

{"h":"a3","m":"docs","f":"README.md","t":"2024-05-10T09:00:00Z"}
{"h":"a4","m":"refactor lexer","f":"src/lexer.rs","t":"2024-05-11T09:00:00Z"}
"#;

fn write_log(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("commits.jsonl");
    std::fs::write(&path, COMMIT_LOG).unwrap();
    path
}

/// Commit log to co-change graph to impact report, through a database on disk
#[test]
fn test_ingest_and_analyze() {
    let temp_dir = TempDir::new().unwrap();
    let log = write_log(temp_dir.path());

    let commits = read_commits(&log, None).unwrap();
    assert_eq!(commits.len(), 4);
    assert_eq!(commits[1].insertions, 7);

    let db_path = temp_dir.path().join("graph.db");
    {
        let store = GraphStore::open(&db_path).unwrap();
        let pairs = CoChangeBuilder::new().register_commits(&store, &commits).unwrap();
        assert_eq!(pairs, 1 + 3);

        register_edge(&store, "src/main.rs", "src/parser.rs", &Relationship::Imports, None, None)
            .unwrap();
        register_edge(&store, "src/cli.rs", "src/main.rs", &Relationship::Imports, None, None)
            .unwrap();
        store.close().unwrap();
    }

    let store = GraphStore::open(&db_path).unwrap();
    let stats = store.stats().unwrap();
    // parser->lexer and lexer->parser are stored as two edges
    assert_eq!(stats.edge_count_by_relationship["co_changes"], 4);
    assert_eq!(stats.edge_count_by_relationship["imports"], 2);
    assert!(stats.storage_size_bytes > 0);

    let co_changed = store.co_changed_with("src/parser.rs", 10).unwrap();
    let paths: Vec<_> = co_changed.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["src/lexer.rs", "src/lexer.rs", "tests/lexer_test.rs"]);

    let report = ImpactAnalyzer::new(&store)
        .analyze_file("src/parser.rs", 3)
        .unwrap();
    assert_eq!(report.direct_dependents, 1);
    assert_eq!(report.transitive_dependents, 2);
    assert_eq!(report.co_changed_files, 3);
    assert_eq!(report.score, 10 + 6 + 3);
    assert_eq!(report.level, ImpactLevel::Low);
    assert_eq!(report.affected.transitive, vec!["src/cli.rs"]);
}

#[test]
fn test_since_filter_and_patterns() {
    let temp_dir = TempDir::new().unwrap();
    let log = write_log(temp_dir.path());

    let recent = read_commits(&log, Some("2024-05-05T00:00:00Z")).unwrap();
    let hashes: Vec<_> = recent.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(hashes, vec!["a3", "a4"]);

    let commits = read_commits(&log, None).unwrap();
    let summary = PatternDetector::new(&commits).summarize();
    assert_eq!(summary.hotspots[0].file, "src/lexer.rs");
    assert_eq!(summary.hotspots[0].changes, 3);
    assert_eq!(summary.feature_cycles.len(), 2);
    assert_eq!(summary.feature_cycles[0].features, 1);
    assert_eq!(summary.test_coverage.test_commits, 1);
}

#[test]
fn test_config_controls_db_location() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[graph]\ndb_path = \"data/cortex.db\"\nco_change_max_files = 2\n",
    )
    .unwrap();

    let config = CortexConfig::load(temp_dir.path()).unwrap();
    let db_path = config.db_path(temp_dir.path());
    assert_eq!(db_path, temp_dir.path().join("data/cortex.db"));

    let store = GraphStore::open(&db_path).unwrap();
    let builder = CoChangeBuilder::with_max_files(config.graph.co_change_max_files);
    let commits = read_commits(write_log(temp_dir.path()), None).unwrap();
    assert_eq!(builder.register_commits(&store, &commits).unwrap(), 1);
    assert!(db_path.exists());
}

fn cortex(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cortex"))
        .arg("--home")
        .arg(home)
        .args(args)
        .output()
        .expect("Failed to execute cortex")
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = Command::new(env!("CARGO_BIN_EXE_cortex"))
        .arg("--help")
        .output()
        .expect("Failed to execute cortex");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("File relationship graph"));
}

#[test]
fn test_cli_ingest_and_impact() {
    let temp_dir = TempDir::new().unwrap();
    let home = temp_dir.path();
    let log = write_log(home);

    let output = cortex(home, &["ingest", log.to_str().unwrap()]);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["commits"], 4);
    assert_eq!(summary["pairs"], 4);

    let output = cortex(home, &["edge", "src/main.rs", "src/parser.rs"]);
    assert!(output.status.success());

    let output = cortex(home, &["impact", "src/parser.rs"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["file"], "src/parser.rs");
    assert_eq!(report["direct_dependents"], 1);
    assert_eq!(report["level"], "low");

    let output = cortex(home, &["dependents", "src/parser.rs"]);
    let dependents: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(dependents, vec!["src/main.rs"]);

    assert!(home.join("graph.db").exists());
}

#[test]
fn test_cli_rejects_invalid_edge() {
    let temp_dir = TempDir::new().unwrap();
    let output = cortex(temp_dir.path(), &["edge", "a.rs", "b.rs", "--weight", "0"]);
    assert!(!output.status.success());
}
