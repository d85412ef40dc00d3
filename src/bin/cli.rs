//! Shinsho Feed CLI
//!
//! Local execution entry point, suitable for a scheduled job.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shinsho_feed::{
    error::Result,
    models::Config,
    pipeline,
    services::OpenBdClient,
    storage::{LocalStorage, StateStore},
    utils::date::format_japanese,
};

/// Number of history entries `info` lists.
const INFO_RECENT: usize = 5;

/// shinsho-feed - openBD new shinsho RSS generator
#[derive(Parser, Debug)]
#[command(
    name = "shinsho-feed",
    version,
    about = "Differential RSS feed of newly registered shinsho"
)]
struct Cli {
    /// Path to storage directory holding state files and the feed
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Path to config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diff the catalog against the baseline and publish new matches
    Run {
        /// Compute and log everything without writing state
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-render the feed from stored history
    Render,

    /// Validate configuration
    Validate,

    /// Show stored state info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let config = Config::load_from(cli.config.as_deref(), &config_path)?;
    let storage = LocalStorage::new(&cli.storage_dir, config.paths.clone());

    match cli.command {
        Command::Run { dry_run } => {
            config.validate()?;
            let client = OpenBdClient::new(&config.catalog)?;
            let stats = pipeline::run_feed(&config, &client, &storage, dry_run).await?;

            if !dry_run {
                log::info!(
                    "Feed written to {} ({} items)",
                    config.paths.feed_path(&cli.storage_dir).display(),
                    stats.feed_items
                );
            }
        }

        Command::Render => {
            config.validate()?;
            let items = pipeline::render_stored(&config, &storage).await?;
            log::info!(
                "Feed written to {} ({} items)",
                config.paths.feed_path(&cli.storage_dir).display(),
                items
            );
        }

        Command::Validate => {
            log::info!("Validating {}...", config_path.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (classifier: {})", config.classifier.build().name());
        }

        Command::Info => {
            log::info!("Storage directory: {}", storage.root_dir().display());

            let baseline = storage.load_baseline().await?;
            let history = storage.load_history().await?;
            log::info!("Baseline identifiers: {}", baseline.len());
            log::info!("History entries: {}", history.len());

            for book in history.iter().take(INFO_RECENT) {
                let date = book
                    .published
                    .as_ref()
                    .map(format_japanese)
                    .unwrap_or_else(|| "-".to_string());
                log::info!("  {} {} ({})", book.isbn, book.full_title(), date);
            }
        }
    }

    Ok(())
}
