//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::client::{TimeWindow, USGS_BASE_URL};
use crate::filters::{DepthBucket, MAGNITUDE_CEILING, MAGNITUDE_FLOOR};
use crate::output::Format;

/// Interactive earthquake map and feed explorer.
#[derive(Parser, Debug)]
#[command(name = "quakemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Base URL of the earthquake feed host
    #[arg(long, global = true, env = "QUAKEMAP_FEED_URL", default_value = USGS_BASE_URL)]
    pub feed_url: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the interactive map server
    Serve(ServeArgs),

    /// List earthquakes matching the filters (one-shot fetch and exit)
    List(ListArgs),

    /// Show summary statistics for earthquakes matching the filters
    Stats(StatsArgs),
}

/// Filter controls shared by the one-shot commands.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Time window to fetch: hour, day, week, month
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: TimeWindow,

    /// Minimum magnitude to show
    #[arg(long, default_value_t = MAGNITUDE_FLOOR, allow_negative_numbers = true)]
    pub min_magnitude: f64,

    /// Maximum magnitude to show
    #[arg(long, default_value_t = MAGNITUDE_CEILING, allow_negative_numbers = true)]
    pub max_magnitude: f64,

    /// Depth bucket: any, shallow, intermediate, deep
    #[arg(long, default_value = "any", value_parser = parse_depth)]
    pub depth: DepthBucket,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `stats` command.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Initial time window: hour, day, week, month
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: TimeWindow,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse a time window from string.
fn parse_window(s: &str) -> Result<TimeWindow, String> {
    s.parse()
}

/// Parse a depth bucket from string.
fn parse_depth(s: &str) -> Result<DepthBucket, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["quakemap", "list"]).unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filter.window, TimeWindow::Day);
        assert_eq!(args.filter.depth, DepthBucket::Any);
        assert_eq!(args.limit, 50);
        assert!((args.filter.min_magnitude - MAGNITUDE_FLOOR).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_min_magnitude() {
        let cli = Cli::try_parse_from(["quakemap", "list", "--min-magnitude", "-1.5"]).unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert!((args.filter.min_magnitude + 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_with_filters() {
        let cli = Cli::try_parse_from([
            "quakemap",
            "stats",
            "--window",
            "week",
            "--min-magnitude",
            "4.5",
            "--depth",
            "deep",
            "-f",
            "json",
        ])
        .unwrap();
        let Command::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(args.filter.window, TimeWindow::Week);
        assert!((args.filter.min_magnitude - 4.5).abs() < f64::EPSILON);
        assert_eq!(args.filter.depth, DepthBucket::Deep);
        assert_eq!(args.format, Format::Json);
    }
}
