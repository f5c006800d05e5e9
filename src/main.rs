use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use leakhound::pipeline::{InspectionJob, Inspector, LogSink};
use leakhound::scan::{patterns, RegexEngine};

/// Offline driver: replays captured response bodies through the inspection
/// pipeline. Inside a live proxy the interception hook submits jobs instead.
#[derive(Parser)]
#[command(name = "leakhound")]
#[command(about = "Scan captured proxy response bodies for embedded secrets")]
#[command(version)]
struct Cli {
    /// Response body files to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Extra pattern file, one regex per line ('#' lines are comments)
    #[arg(short, long)]
    patterns: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let engine = Arc::new(RegexEngine::new());
    for pattern in patterns::SECRET_PATTERNS {
        if let Err(e) = engine.add_pattern(pattern).await {
            error!("Failed to add pattern {pattern:?}: {e}");
        }
    }
    if let Some(path) = &cli.patterns {
        let extra = std::fs::read_to_string(path)
            .with_context(|| format!("reading pattern file {}", path.display()))?;
        for line in extra.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(e) = engine.add_pattern(line).await {
                error!("Failed to add pattern {line:?}: {e}");
            }
        }
    }
    info!("Loaded {} patterns", engine.pattern_count().await);

    let inspector = Inspector::new(engine, Arc::new(LogSink));
    for file in &cli.files {
        let body = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        inspector.submit(InspectionJob {
            method: "GET".to_string(),
            url: format!("file://{}", file.display()),
            status_code: 200,
            body: Arc::from(body),
        });
    }
    inspector.shutdown().await;

    Ok(())
}
