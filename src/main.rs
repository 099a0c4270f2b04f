// src/main.rs

//! kitjar CLI
//!
//! `collect` runs one batch over the configured feeds; `serve` runs the
//! live submission endpoint with its queue workers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use kitjar::collector::{Collector, scheduler};
use kitjar::error::Result;
use kitjar::feeds::FeedIngestor;
use kitjar::models::Config;
use kitjar::server;
use kitjar::store::{KitStore, LocalStore, SampleIndex};
use kitjar::utils::http;

/// kitjar - phishing kit collector
#[derive(Parser, Debug)]
#[command(name = "kitjar", version, about = "Phishing sample and kit collector")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest all configured feeds and process the batch
    Collect,

    /// Run the live submission endpoint and its queue workers
    Serve,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Collect => run_collect(Arc::new(config)).await?,
        Command::Serve => run_serve(Arc::new(config)).await?,
        Command::Validate => {
            config.validate()?;
            log::info!("Config OK");
        }
    }

    Ok(())
}

/// Open the store and build the shared collector around it.
async fn build_collector(config: &Arc<Config>) -> Result<(Arc<Collector>, Arc<LocalStore>)> {
    let store = Arc::new(LocalStore::open(&config.storage.data_dir).await?);
    let index: Arc<dyn SampleIndex> = store.clone();
    let kits: Arc<dyn KitStore> = store.clone();
    let client = http::create_client(&config.collector)?;
    let collector = Arc::new(Collector::new(Arc::clone(config), client, index, kits));
    Ok((collector, store))
}

/// One synchronous end-to-end collection run over the configured feeds.
async fn run_collect(config: Arc<Config>) -> Result<()> {
    config.validate()?;
    let (collector, store) = build_collector(&config).await?;

    log::info!("---------------------------------------");
    log::info!("Collection run starting");
    log::info!("---------------------------------------");

    let client = http::create_client(&config.collector)?;
    let index: Arc<dyn SampleIndex> = store;
    let ingestor = FeedIngestor::from_config(&config, client, index);
    let outcome = ingestor.fetch_all().await;

    log::info!(
        "Ingested {} samples ({} feed failures)",
        outcome.samples.len(),
        outcome.feed_failures
    );

    let report =
        scheduler::run_batch(collector, outcome.samples, config.collector.workers).await;
    log::info!("Processed {} samples", report.processed);

    Ok(())
}

/// Run the persistent submission service.
async fn run_serve(config: Arc<Config>) -> Result<()> {
    config.validate()?;
    let (collector, _store) = build_collector(&config).await?;

    let queue = scheduler::spawn_workers(collector, config.server.workers);
    server::serve(&config.server, queue).await
}
