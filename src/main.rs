//! OpenActive RPDE main entry point
//!
//! This is the command-line interface for consuming OpenActive feeds.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use openactive_rpde::config::{load_or_default, Config};
use openactive_rpde::correlate::{find_superevents, partner_feed_url};
use openactive_rpde::discovery::{flatten, Discoverer};
use openactive_rpde::feed::{consume_many, ConsumeOutcome, Consumer, ConsumerSeed};
use openactive_rpde::output::{
    print_outcome, print_statistics, read_state_file, snapshot_statistics, write_state_file,
};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// OpenActive RPDE: a resumable consumer for OpenActive opportunity feeds
///
/// Walks RPDE feeds to their live edge, keeping a deduplicated snapshot of
/// items that can be saved and resumed later.
#[derive(Parser, Debug)]
#[command(name = "openactive-rpde")]
#[command(version)]
#[command(about = "A resumable consumer for OpenActive RPDE feeds", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consume one or more feeds from their first page
    Consume {
        /// Feed URLs
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        /// State file (one feed) or directory of state files (several feeds)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Resume a feed from a saved state file
    Resume {
        /// State file written by an earlier run
        state: PathBuf,

        /// Where to write the new state (defaults to overwriting the input)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show item statistics for a saved state file
    Stats {
        /// State file written by an earlier run
        state: PathBuf,
    },

    /// Guess the sibling feed of a feed URL among known feed URLs
    Partner {
        /// Feed URL to find the sibling of
        url: String,

        /// Known feed URLs
        #[arg(long = "known", value_name = "URL", required = true)]
        known: Vec<String>,
    },

    /// Link each child item to its parent items across two saved states
    Superevents {
        /// State file of the child feed (e.g. scheduled sessions)
        children: PathBuf,

        /// State file of the parent feed (e.g. session series)
        parents: PathBuf,
    },

    /// Walk the OpenActive catalogues and list published feeds
    Discover {
        /// Catalogue collection URL (defaults to the configured one)
        #[arg(long, value_name = "URL")]
        collection: Option<String>,

        /// Print a flat list instead of grouping by dataset page
        #[arg(long)]
        flat: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    match cli.command {
        Command::Consume { urls, output } => handle_consume(&config, urls, output).await,
        Command::Resume { state, output } => handle_resume(&config, &state, output).await,
        Command::Stats { state } => handle_stats(&state),
        Command::Partner { url, known } => handle_partner(&url, known),
        Command::Superevents { children, parents } => handle_superevents(&children, &parents),
        Command::Discover { collection, flat } => {
            handle_discover(&config, collection.as_deref(), flat).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("openactive_rpde=info,warn"),
            1 => EnvFilter::new("openactive_rpde=debug,info"),
            2 => EnvFilter::new("openactive_rpde=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancels the returned token on Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping at the next page boundary");
            trigger.cancel();
        }
    });
    cancel
}

/// Handles `consume`: walks every feed and saves the resulting states
async fn handle_consume(
    config: &Config,
    urls: Vec<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let consumer = Consumer::from_config(config)?;
    let cancel = cancel_on_ctrl_c();

    if urls.len() == 1 {
        let outcome = consumer
            .consume_with_cancel(urls[0].as_str(), &cancel)
            .await?;
        print_outcome(&urls[0], &outcome);
        if let Some(path) = output {
            write_state_file(&path, &outcome)?;
        }
        return Ok(());
    }

    if let Some(dir) = &output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let seeds = urls.into_iter().map(ConsumerSeed::from).collect();
    let runs = consume_many(
        &consumer,
        seeds,
        config.consumer.max_concurrent_feeds,
        &cancel,
    )
    .await;

    let mut failures = 0;
    for (index, run) in runs.iter().enumerate() {
        match &run.result {
            Ok(outcome) => {
                print_outcome(&run.label, outcome);
                if let Some(dir) = &output {
                    write_state_file(&dir.join(format!("feed-{}.json", index)), outcome)?;
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!("{}: {}", run.label, e);
            }
        }
    }

    if failures == runs.len() {
        bail!("No feed could be consumed");
    }
    Ok(())
}

/// Handles `resume`: continues a saved walk and saves the new state
async fn handle_resume(
    config: &Config,
    state_path: &Path,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (state, previous) = read_state_file(state_path)
        .with_context(|| format!("Failed to read state file {}", state_path.display()))?;
    if let Some(status) = previous {
        tracing::info!("Previous run ended {}", status);
    }

    let consumer = Consumer::from_config(config)?;
    let cancel = cancel_on_ctrl_c();
    let outcome: ConsumeOutcome = consumer.consume_with_cancel(state, &cancel).await?;

    print_outcome(&outcome.state.next_url, &outcome);
    let path = output.unwrap_or_else(|| state_path.to_path_buf());
    write_state_file(&path, &outcome)?;
    Ok(())
}

/// Handles `stats`: prints snapshot statistics
fn handle_stats(state_path: &Path) -> anyhow::Result<()> {
    let (state, status) = read_state_file(state_path)
        .with_context(|| format!("Failed to read state file {}", state_path.display()))?;

    println!("State file: {}", state_path.display());
    if let Some(status) = status {
        println!("Last run: {}", status);
    }
    println!("Next page: {}\n", state.next_url);

    print_statistics(&snapshot_statistics(&state));
    Ok(())
}

/// Handles `partner`: prints the guessed sibling feed URL
fn handle_partner(url: &str, known: Vec<String>) -> anyhow::Result<()> {
    let known: HashSet<String> = known.into_iter().collect();
    match partner_feed_url(url, &known) {
        Some(partner) => {
            println!("{}", partner);
            Ok(())
        }
        None => bail!("No sibling feed found for {}", url),
    }
}

/// Handles `superevents`: prints child id -> parent ids as JSON
fn handle_superevents(children_path: &Path, parents_path: &Path) -> anyhow::Result<()> {
    let (children, _) = read_state_file(children_path)
        .with_context(|| format!("Failed to read state file {}", children_path.display()))?;
    let (parents, _) = read_state_file(parents_path)
        .with_context(|| format!("Failed to read state file {}", parents_path.display()))?;

    let links: BTreeMap<String, Vec<String>> = children
        .items()
        .map(|child| {
            let parent_keys = find_superevents(child, &parents)
                .iter()
                .map(|parent| parent.key())
                .collect();
            (child.key(), parent_keys)
        })
        .collect();

    let unmatched = links.values().filter(|p| p.is_empty()).count();
    tracing::info!(
        "Linked {} of {} child items",
        links.len() - unmatched,
        links.len()
    );

    println!("{}", serde_json::to_string_pretty(&links)?);
    Ok(())
}

/// Handles `discover`: prints feed descriptors as JSON
async fn handle_discover(
    config: &Config,
    collection: Option<&str>,
    flat: bool,
) -> anyhow::Result<()> {
    let discoverer = Discoverer::from_config(config)?;
    let collection_url = collection.unwrap_or(&config.discovery.collection_url);
    let feeds = discoverer.discover(collection_url).await;

    let json = if flat {
        serde_json::to_string_pretty(&flatten(feeds))?
    } else {
        let datasets: Vec<serde_json::Value> = feeds
            .into_iter()
            .map(|(dataset_url, feeds)| serde_json::json!({"dataset": dataset_url, "feeds": feeds}))
            .collect();
        serde_json::to_string_pretty(&datasets)?
    };
    println!("{}", json);
    Ok(())
}
