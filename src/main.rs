//! quakemap - recent earthquakes on a world map.
//!
//! A terminal one-shot and a browser map over the USGS summary feeds.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use quakemap::cli::{self, Cli, Command};
use quakemap::feed::FeedClient;
use quakemap::ingest;
use quakemap::output::{self, Format};
use quakemap::presentation::Statistics;
use quakemap::server;

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

    match cli.command {
        Command::Tail(args) => cmd_tail(args),
        Command::Ui(args) => cmd_ui(args),
        Command::Legend => cmd_legend(),
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

/// Execute the `tail` command - one ingestion cycle printed to stdout.
fn cmd_tail(args: cli::TailArgs) -> Result<()> {
    let client = FeedClient::new(&args.feed.config()).context("failed to create feed client")?;
    let filter = args.filter.filter();

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    let collection = runtime
        .block_on(ingest::ingest(&client, filter.window, filter.min_magnitude))
        .context("failed to fetch earthquake feed")?;

    tracing::info!(
        "{} earthquakes in the past {} at M{:.1}+",
        collection.len(),
        filter.window,
        filter.min_magnitude
    );

    let events = &collection.events()[..collection.len().min(args.limit)];

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, events, args.format)?;
    if args.format == Format::Human {
        output::write_summary(&mut handle, &Statistics::of(collection.events()))?;
    }

    Ok(())
}

/// Execute the `ui` command - start web server.
fn cmd_ui(args: cli::UiArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        feed: args.feed.config(),
        filter: args.filter.filter(),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 quakemap\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Window:  {}", config.filter.window.label());
    println!("  Min mag: {:.1}", config.filter.min_magnitude);
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

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}

/// Execute the `legend` command - print the magnitude scale.
fn cmd_legend() -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_legend(&mut handle)?;
    Ok(())
}
