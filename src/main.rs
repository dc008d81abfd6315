//! Cortex CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cortex")]
#[command(about = "File relationship graph with change-impact and history analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cortex home directory (defaults to $CORTEX_HOME, then ~/.cortex)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Graph database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record co-changes from a commit log (one JSON object per line)
    Ingest {
        log: PathBuf,

        /// Only commits at or after this timestamp
        #[arg(long)]
        since: Option<String>,
    },
    /// Add or reinforce a single edge
    Edge {
        from: String,
        to: String,

        #[arg(short, long, default_value = "imports")]
        relationship: String,

        #[arg(short, long)]
        weight: Option<i64>,

        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Show graph statistics
    Stats,
    /// Files connected to a file in either direction
    Related {
        file: String,

        #[arg(short, long)]
        relationship: Option<String>,

        #[arg(short, long, default_value_t = cortex_graph::DEFAULT_RELATED_LIMIT)]
        limit: usize,
    },
    /// Files a file imports
    Dependencies { file: String },
    /// Files importing a file
    Dependents { file: String },
    /// Score the impact of changing a file
    Impact {
        file: String,

        #[arg(short = 'd', long)]
        max_depth: Option<usize>,
    },
    /// Dependents of a file layered by distance
    Blast {
        file: String,

        #[arg(short = 'd', long)]
        max_depth: Option<usize>,
    },
    /// Rank several files by impact
    Compare {
        #[arg(required = true)]
        files: Vec<String>,

        #[arg(short = 'd', long)]
        max_depth: Option<usize>,
    },
    /// Most imported files
    Critical {
        #[arg(long, default_value = "5")]
        min_dependents: usize,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Hotspots, modules and cycles from a commit log
    Patterns { log: PathBuf },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for JSON output
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "cortex={level},cortex_graph={level},cortex_analysis={level}",
            level = log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("Cortex v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let ctx = commands::Context::load(cli.home.as_deref(), cli.db)?;
    tracing::debug!("Cortex home: {}", ctx.home.display());

    match cli.command {
        Commands::Ingest { log, since } => commands::ingest(&ctx, &log, since.as_deref()),
        Commands::Edge {
            from,
            to,
            relationship,
            weight,
            metadata,
        } => commands::edge(&ctx, &from, &to, &relationship, weight, metadata.as_deref()),
        Commands::Stats => commands::stats(&ctx),
        Commands::Related {
            file,
            relationship,
            limit,
        } => commands::related(&ctx, &file, relationship.as_deref(), limit),
        Commands::Dependencies { file } => commands::dependencies(&ctx, &file),
        Commands::Dependents { file } => commands::dependents(&ctx, &file),
        Commands::Impact { file, max_depth } => commands::impact(&ctx, &file, max_depth),
        Commands::Blast { file, max_depth } => commands::blast(&ctx, &file, max_depth),
        Commands::Compare { files, max_depth } => commands::compare(&ctx, &files, max_depth),
        Commands::Critical {
            min_dependents,
            limit,
        } => commands::critical(&ctx, min_dependents, limit),
        Commands::Patterns { log } => commands::patterns(&ctx, &log),
        Commands::Version => Ok(()),
    }
}
