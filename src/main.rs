//! price-watcher - Single-product price tracking daemon
//!
//! Watches one product page, records every observed price, and alerts
//! a Telegram chat when the price drops.

use anyhow::Result;
use clap::Parser;
use price_watcher::config::Config;
use price_watcher::history::SqlxHistoryStore;
use price_watcher::notify::TelegramNotifier;
use price_watcher::page::HttpFetcher;
use price_watcher::watch::Watcher;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "price-watcher",
    version,
    about = "Single-product price tracking daemon",
    long_about = "Periodically fetches a product page, records the extracted price, and \
                  sends a Telegram alert with a trend chart when the price drops."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Run a single cycle and exit instead of looping
    #[arg(long)]
    once: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let settings = Config::load(cli.config.as_deref())?.with_env().validate()?;

    let store = SqlxHistoryStore::connect(&settings.db).await?;
    let fetcher = HttpFetcher::new(settings.fetch_timeout)?;
    let notifier = TelegramNotifier::new(&settings.telegram.token, &settings.telegram.chat_id)?;

    let watcher =
        Watcher::new(settings.target, fetcher, store, notifier, settings.notify_on_first);

    if cli.once {
        let delta = watcher.run_cycle().await?;
        info!(
            change = ?delta.change,
            price = delta.current.price,
            product = %delta.current.product_name,
            "cycle complete"
        );
        return Ok(());
    }

    watcher.run().await;
    Ok(())
}
