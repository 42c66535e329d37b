//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::feed::{FeedConfig, FeedWindow, REQUEST_TIMEOUT_SECS, USGS_BASE_URL};
use crate::output::Format;
use crate::state::{FilterState, MIN_MAGNITUDE_CEIL, MIN_MAGNITUDE_FLOOR};

/// Map recent earthquakes from the USGS summary feeds.
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
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show recent earthquakes (one-shot fetch and exit)
    Tail(TailArgs),

    /// Start the web map UI
    Ui(UiArgs),

    /// Print the magnitude color scale
    Legend,
}

/// Feed connection options shared by commands that fetch.
#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// Base URL of the feed server
    #[arg(long, default_value = USGS_BASE_URL)]
    pub feed_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = parse_timeout)]
    pub timeout: u64,
}

impl FeedArgs {
    #[must_use]
    pub fn config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.feed_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Filter options shared by `tail` and `ui`.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Time window: day, week or month
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: FeedWindow,

    /// Minimum magnitude to show (0-10)
    #[arg(long, default_value = "0", value_parser = parse_magnitude)]
    pub min_magnitude: f64,
}

impl FilterArgs {
    #[must_use]
    pub fn filter(&self) -> FilterState {
        FilterState {
            window: self.window,
            min_magnitude: self.min_magnitude,
        }
    }
}

/// Arguments for the `tail` command.
#[derive(Parser, Debug)]
pub struct TailArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub feed: FeedArgs,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub feed: FeedArgs,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse a time window from string.
fn parse_window(s: &str) -> Result<FeedWindow, String> {
    s.parse().map_err(|e: crate::errors::QuakeError| e.to_string())
}

/// Parse a magnitude threshold, limited to the slider range.
fn parse_timeout(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid timeout {s}: {e}"))?;
    if secs == 0 {
        return Err("timeout must be at least 1 second".to_string());
    }
    Ok(secs)
}

fn parse_magnitude(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid magnitude {s}: {e}"))?;
    if !(MIN_MAGNITUDE_FLOOR..=MIN_MAGNITUDE_CEIL).contains(&value) {
        return Err(format!(
            "magnitude {value} out of range [{MIN_MAGNITUDE_FLOOR}, {MIN_MAGNITUDE_CEIL}]"
        ));
    }
    Ok(value)
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
