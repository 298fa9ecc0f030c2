//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analysis::SeriesMode;
use crate::output::Format;
use crate::stations::{DEFAULT_DATA_DIR, StationSpec};

/// NOAA tide predictions: parse, summarize and serve.
#[derive(Parser, Debug)]
#[command(name = "tidecast")]
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
    /// List predicted highs and lows for one date
    Day(DayArgs),

    /// 24-hour series for one date
    Series(SeriesArgs),

    /// High/low statistics for one date
    Stats(DayArgs),

    /// List predicted highs and lows across a date range
    Range(RangeArgs),

    /// High/low statistics across a date range
    RangeStats(RangeArgs),

    /// List registered stations
    Stations(StationsArgs),

    /// Start the JSON API server
    Serve(ServeArgs),

    /// Download an annual prediction export from NOAA
    Fetch(FetchArgs),
}

/// Where station data comes from.
#[derive(Args, Debug, Clone)]
pub struct StationSource {
    /// Directory holding the built-in station exports
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Register an extra station as KEY=PATH (repeatable)
    #[arg(long = "register", value_parser = parse_station_spec)]
    pub register: Vec<StationSpec>,
}

/// Station selection for single-station commands.
#[derive(Args, Debug, Clone)]
pub struct StationSelect {
    /// Station key
    #[arg(long, short = 's', default_value = "portjefferson")]
    pub station: String,

    /// Parse this export file directly instead of a registered station
    #[arg(long, conflicts_with = "station")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub source: StationSource,
}

/// Arguments for the `day` and `stats` commands.
#[derive(Parser, Debug)]
pub struct DayArgs {
    /// Date (YYYY-MM-DD)
    #[arg(long, short = 'd')]
    pub date: String,

    #[command(flatten)]
    pub select: StationSelect,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `series` command.
#[derive(Parser, Debug)]
pub struct SeriesArgs {
    /// Date (YYYY-MM-DD)
    #[arg(long, short = 'd')]
    pub date: String,

    /// How hours between extrema are filled
    #[arg(long, default_value = "nearest", value_parser = parse_mode)]
    pub mode: SeriesMode,

    #[command(flatten)]
    pub select: StationSelect,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `range` and `range-stats` commands.
#[derive(Parser, Debug)]
pub struct RangeArgs {
    /// First date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: String,

    /// Last date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: String,

    #[command(flatten)]
    pub select: StationSelect,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `stations` command.
#[derive(Parser, Debug)]
pub struct StationsArgs {
    #[command(flatten)]
    pub source: StationSource,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "5001")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[command(flatten)]
    pub source: StationSource,
}

/// Arguments for the `fetch` command.
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// NOAA CO-OPS station id (e.g. 8514322)
    #[arg(long)]
    pub station_id: String,

    /// Prediction year
    #[arg(long)]
    pub year: i32,

    /// Tidal datum
    #[arg(long, default_value = "MLLW")]
    pub datum: String,

    /// File to write the export to
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a series mode from string.
fn parse_mode(s: &str) -> Result<SeriesMode, String> {
    s.parse()
}

/// Parse a KEY=PATH station registration.
fn parse_station_spec(s: &str) -> Result<StationSpec, String> {
    s.parse()
}
