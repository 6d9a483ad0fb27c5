//! trendmix - print a balanced trending chart from per-language song pools

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use trendmix::config::Paths;
use trendmix::sources::JsonDirSource;
use trendmix::stores::JsonDirStorage;
use trendmix::{format_delta, TrendingConfig, TrendingQuery, TrendingService};

/// trendmix - trending chart builder
#[derive(Parser, Debug)]
#[command(name = "trendmix")]
#[command(version)]
#[command(about = "Rank and balance trending songs across languages")]
struct Args {
    /// Directory containing <language>.json pool files
    #[arg(long, default_value = "pools")]
    pools: PathBuf,

    /// Directory for the cache and history
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to a trending config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of songs to return
    #[arg(long, default_value_t = 25)]
    limit: usize,

    /// Only show these languages (comma separated names or codes)
    #[arg(long, value_delimiter = ',')]
    languages: Vec<String>,

    /// Ignore the cache and refresh
    #[arg(long)]
    force: bool,

    /// Clear the cache and history, then exit
    #[arg(long)]
    clear_cache: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let paths = Paths::new(args.data_dir.clone())?;
    info!("Data directory: {:?}", paths.data_dir());

    let config_path = args.config.clone().unwrap_or_else(|| paths.config_path());
    let config = TrendingConfig::load(&config_path)?;

    let storage = Arc::new(JsonDirStorage::new(paths.store_dir())?);
    let source = Arc::new(JsonDirSource::new(&args.pools));
    let service = TrendingService::new(source, storage, config);

    if args.clear_cache {
        service.clear_cache()?;
        println!("Cache cleared");
        return Ok(());
    }

    let mut query = TrendingQuery::with_limit(args.limit);
    if args.force {
        query = query.force();
    }
    if !args.languages.is_empty() {
        query = query.languages(args.languages.clone());
    }

    let songs = service.get_trending_songs(query).await?;

    if let Some(updated) = service.last_update_human() {
        println!("Updated {}\n", updated);
    }

    for song in &songs {
        let delta = format_delta(song.delta);
        let badges: Vec<&str> = song.badges.iter().map(|b| b.as_str()).collect();
        println!(
            "{:>3}. {} {:>3}  {:<40} {:<10} {:>7.2}  {}",
            song.rank,
            delta.icon,
            delta.text,
            song.song.name,
            song.song.language.as_deref().unwrap_or("-"),
            song.score,
            badges.join(" ")
        );
    }

    Ok(())
}
