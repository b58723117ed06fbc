//! quakemap - Interactive earthquake map.
//!
//! Fetches recent events from the USGS summary feeds and shows them as
//! magnitude-scaled markers and a heat layer on a Leaflet map, with
//! magnitude, depth and time-window filters and summary statistics.
//! The same filters are available from the terminal.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod dashboard;
mod errors;
mod filters;
mod models;
mod output;
mod render;
mod server;
mod stats;

use cli::{Cli, Command, FilterArgs};
use client::{FeedSource, UsgsClient};
use filters::{FilterState, MagnitudeRange};
use models::Quake;
use stats::Statistics;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let client = UsgsClient::with_base_url(&cli.feed_url).context("failed to create feed client")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;

    match cli.command {
        Command::Serve(args) => runtime.block_on(cmd_serve(args, client)),
        Command::List(args) => runtime.block_on(cmd_list(args, &client)),
        Command::Stats(args) => runtime.block_on(cmd_stats(args, &client)),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Build the filter state from command-line controls.
fn build_filter(args: &FilterArgs) -> Result<FilterState> {
    Ok(FilterState {
        magnitude: MagnitudeRange::new(args.min_magnitude, args.max_magnitude)
            .context("invalid magnitude range")?,
        depth: args.depth,
    })
}

/// Fetch the window and build the filter to apply to it.
///
/// Fetch failures are logged by the client and leave an empty collection.
async fn fetch_filtered(client: &UsgsClient, args: &FilterArgs) -> Result<(Vec<Quake>, FilterState)> {
    let filter = build_filter(args)?;
    let events = client.fetch(args.window).await;
    if events.is_empty() {
        tracing::warn!("no earthquake data received for {} window", args.window);
    }
    Ok((events, filter))
}

/// Execute the `list` command - one-shot fetch of matching earthquakes.
async fn cmd_list(args: cli::ListArgs, client: &UsgsClient) -> Result<()> {
    let (events, filter) = fetch_filtered(client, &args.filter).await?;

    let mut selected = filter.apply(&events);

    // Most recent first
    selected.sort_by(|a, b| b.time_ms.cmp(&a.time_ms));
    selected.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &selected, args.format)?;

    Ok(())
}

/// Execute the `stats` command - summary panel for matching earthquakes.
async fn cmd_stats(args: cli::StatsArgs, client: &UsgsClient) -> Result<()> {
    let (events, filter) = fetch_filtered(client, &args.filter).await?;

    let selected = filter.apply(&events);
    let stats = Statistics::compute(&selected, Utc::now());
    tracing::debug!("{} of {} events selected", stats.count(), events.len());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_statistics(&mut handle, &stats, args.format)?;

    Ok(())
}

/// Execute the `serve` command - start the map server.
async fn cmd_serve(args: cli::ServeArgs, client: UsgsClient) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        window: args.window,
        ..Default::default()
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 quakemap\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Window:  {}", args.window);
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    server::run_server(config, Arc::new(client)).await
}
