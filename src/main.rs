//! tidecast - NOAA tide predictions from your terminal.
//!
//! Parses NOAA CO-OPS prediction exports, summarizes highs and lows, and
//! serves the results over a small JSON API.

use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use tidecast::analysis::{self, parse_iso_date};
use tidecast::cli::{self, Cli, Command, StationSelect, StationSource};
use tidecast::client::NoaaClient;
use tidecast::models::TideTable;
use tidecast::output;
use tidecast::parser::parse_tide_file;
use tidecast::server;
use tidecast::stations::StationRegistry;

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
        Command::Day(args) => cmd_day(args),
        Command::Series(args) => cmd_series(args),
        Command::Stats(args) => cmd_stats(args),
        Command::Range(args) => cmd_range(args),
        Command::RangeStats(args) => cmd_range_stats(args),
        Command::Stations(args) => cmd_stations(args),
        Command::Serve(args) => cmd_serve(args),
        Command::Fetch(args) => cmd_fetch(args),
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

fn build_registry(source: &StationSource) -> StationRegistry {
    let mut registry = StationRegistry::with_builtins(&source.data_dir);
    for spec in &source.register {
        registry.register(spec.clone());
    }
    registry
}

/// Load the table named by `--file` or `--station`.
fn load_table(select: &StationSelect) -> Result<(String, TideTable)> {
    if let Some(path) = &select.file {
        let table = parse_tide_file(path)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        return Ok((path.display().to_string(), table));
    }

    let registry = build_registry(&select.source);
    let table = registry
        .load(&select.station)
        .with_context(|| format!("failed to load station {}", select.station))?;
    Ok((select.station.clone(), table))
}

/// Execute the `day` command.
fn cmd_day(args: cli::DayArgs) -> Result<()> {
    let date = parse_iso_date(&args.date)?;
    let (label, table) = load_table(&args.select)?;

    let day = analysis::predictions_for_date(&table, date);
    if day.is_empty() {
        anyhow::bail!("no tide data for {label} on {date}");
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_predictions(&mut handle, &day, args.format)?;
    Ok(())
}

/// Execute the `series` command.
fn cmd_series(args: cli::SeriesArgs) -> Result<()> {
    let date = parse_iso_date(&args.date)?;
    let (label, table) = load_table(&args.select)?;

    let series = analysis::hourly_series(&table, date, args.mode)
        .with_context(|| format!("no tide data for {label} on {date}"))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_series(&mut handle, &series, args.format)?;
    Ok(())
}

/// Execute the `stats` command.
fn cmd_stats(args: cli::DayArgs) -> Result<()> {
    let date = parse_iso_date(&args.date)?;
    let (label, table) = load_table(&args.select)?;

    let stats = analysis::daily_statistics(&table, date)
        .with_context(|| format!("no high and low tide data for {label} on {date}"))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_daily_statistics(&mut handle, &stats, args.format)?;
    Ok(())
}

/// Execute the `range` command.
fn cmd_range(args: cli::RangeArgs) -> Result<()> {
    let from = parse_iso_date(&args.from)?;
    let to = parse_iso_date(&args.to)?;
    let (label, table) = load_table(&args.select)?;

    let series = analysis::range_series(&table, from, to)
        .with_context(|| format!("no tide data for {label} from {from} to {to}"))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_range_series(&mut handle, &series, args.format)?;
    Ok(())
}

/// Execute the `range-stats` command.
fn cmd_range_stats(args: cli::RangeArgs) -> Result<()> {
    let from = parse_iso_date(&args.from)?;
    let to = parse_iso_date(&args.to)?;
    let (label, table) = load_table(&args.select)?;

    let stats = analysis::range_statistics(&table, from, to)
        .with_context(|| format!("no high and low tide data for {label} from {from} to {to}"))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_range_statistics(&mut handle, &stats, args.format)?;
    Ok(())
}

/// Execute the `stations` command.
fn cmd_stations(args: cli::StationsArgs) -> Result<()> {
    let registry = build_registry(&args.source);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_stations(&mut handle, registry.stations(), args.format)?;
    Ok(())
}

/// Execute the `serve` command - start the JSON API.
fn cmd_serve(args: cli::ServeArgs) -> Result<()> {
    let registry = build_registry(&args.source);
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌊 tidecast API\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:    \x1b[96m{url}\x1b[0m");
    println!("  Stations: {}", registry.stations().len());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, &registry))
}

/// Execute the `fetch` command - download an annual export.
fn cmd_fetch(args: cli::FetchArgs) -> Result<()> {
    let client = NoaaClient::new().context("failed to create NOAA client")?;

    let body = client
        .fetch_annual(&args.station_id, args.year, &args.datum)
        .with_context(|| format!("failed to fetch predictions for station {}", args.station_id))?;

    fs::write(&args.output, &body)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(
        "saved {} {} predictions to {}",
        args.station_id,
        args.year,
        args.output.display()
    );
    Ok(())
}
