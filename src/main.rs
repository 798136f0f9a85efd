use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use newsbrief::config::Config;
use newsbrief::ingest;
use newsbrief::storage::Database;

/// Get the config directory path (~/.config/newsbrief/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsbrief"))
}

#[derive(Parser, Debug)]
#[command(
    name = "newsbrief",
    about = "RSS news ingester with extractive summaries and spoken audio"
)]
struct Args {
    /// Config file path (default: ~/.config/newsbrief/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file path (default: ~/.config/newsbrief/newsbrief.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Run a single ingestion pass even when an interval is configured
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)?;

    let db_path = args.db.unwrap_or_else(|| config_dir.join("newsbrief.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db = Database::open(&db_path.to_string_lossy()).await?;

    let client = ingest::build_client().context("Failed to build HTTP client")?;

    loop {
        let started = Instant::now();
        let created = ingest::ingest_feeds(&db, &client, &config).await;
        info!(
            created = created.len(),
            elapsed_secs = started.elapsed().as_secs(),
            "ingestion pass finished"
        );

        if args.once || config.interval_minutes == 0 {
            break;
        }
        info!(minutes = config.interval_minutes, "sleeping until next run");
        tokio::time::sleep(Duration::from_secs(config.interval_minutes * 60)).await;
    }

    Ok(())
}
