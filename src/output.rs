//! Output formatters for tide predictions and statistics.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::analysis::{DailyStatistics, HourlySeries, RangeSeries, RangeStatistics};
use crate::models::{OutputPrediction, TideKind, TidePrediction};
use crate::stations::Station;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[96m";
const BLUE: &str = "\x1b[94m";
const YELLOW: &str = "\x1b[93m";

const ICON_HIGH: &str = "▲";
const ICON_LOW: &str = "▼";
const ICON_TIDE: &str = "🌊";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

fn to_io<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Write any serializable value as pretty JSON (json) or one line (ndjson).
fn write_value<W: Write, T: Serialize>(
    writer: &mut W,
    value: &T,
    format: Format,
) -> io::Result<()> {
    let json = if format == Format::Ndjson {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(to_io)?;
    writeln!(writer, "{json}")
}

fn kind_marker(kind: TideKind) -> String {
    match kind {
        TideKind::High => format!("{CYAN}{ICON_HIGH} HIGH{RESET}"),
        TideKind::Low => format!("{BLUE}{ICON_LOW} LOW {RESET}"),
    }
}

/// Write a list of predictions.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_predictions<W: Write>(
    writer: &mut W,
    predictions: &[TidePrediction],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => {
            for p in predictions {
                writeln!(
                    writer,
                    "{ICON_TIDE} {} {DIM}{}{RESET} │ {} │ {} │ {BOLD}{:>6.2} m{RESET}",
                    p.date.format("%Y-%m-%d"),
                    p.day,
                    p.clock(),
                    kind_marker(p.kind),
                    p.height_m
                )?;
            }
            Ok(())
        }
        Format::Json => {
            let output: Vec<OutputPrediction> =
                predictions.iter().map(OutputPrediction::from).collect();
            write_value(writer, &output, format)
        }
        Format::Ndjson => {
            for p in predictions {
                write_value(writer, &OutputPrediction::from(p), format)?;
            }
            Ok(())
        }
    }
}

/// Write a 24-hour series.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_series<W: Write>(
    writer: &mut W,
    series: &HourlySeries,
    format: Format,
) -> io::Result<()> {
    if format != Format::Human {
        return write_value(writer, series, format);
    }

    let max = series.heights.iter().copied().fold(f64::MIN, f64::max);
    let min = series.heights.iter().copied().fold(f64::MAX, f64::min);
    let span = (max - min).max(f64::EPSILON);

    writeln!(
        writer,
        "{BOLD}{ICON_TIDE} {} hourly ({:?}){RESET}",
        series.date.format("%Y-%m-%d"),
        series.mode
    )?;
    for (time, height) in series.times.iter().zip(&series.heights) {
        // Bar length in 0..=30 columns
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bar = (((height - min) / span) * 30.0).round() as usize;
        writeln!(writer, "{time} │ {height:>6.2} m {CYAN}{}{RESET}", "█".repeat(bar))?;
    }
    Ok(())
}

/// Write single-date statistics.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_daily_statistics<W: Write>(
    writer: &mut W,
    stats: &DailyStatistics,
    format: Format,
) -> io::Result<()> {
    if format != Format::Human {
        return write_value(writer, stats, format);
    }

    writeln!(
        writer,
        "{CYAN}{ICON_HIGH} High{RESET}  {BOLD}{:.2} m{RESET} at {}",
        stats.high_tide.height, stats.high_tide.time
    )?;
    writeln!(
        writer,
        "{BLUE}{ICON_LOW} Low{RESET}   {BOLD}{:.2} m{RESET} at {}",
        stats.low_tide.height, stats.low_tide.time
    )?;
    writeln!(writer, "{YELLOW}Range{RESET} {BOLD}{:.2} m{RESET}", stats.tidal_range)?;
    writeln!(
        writer,
        "{DIM}{} highs, {} lows{RESET}",
        stats.all_highs.len(),
        stats.all_lows.len()
    )
}

/// Write a date-range listing.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_range_series<W: Write>(
    writer: &mut W,
    series: &RangeSeries,
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => {
            for ((date, time), (height, p)) in series
                .dates
                .iter()
                .zip(&series.times)
                .zip(series.heights.iter().zip(&series.predictions))
            {
                writeln!(
                    writer,
                    "{date} {time} │ {} │ {BOLD}{height:>6.2} m{RESET}",
                    kind_marker(p.kind)
                )?;
            }
            Ok(())
        }
        Format::Json => write_value(writer, series, format),
        Format::Ndjson => {
            for p in &series.predictions {
                write_value(writer, p, format)?;
            }
            Ok(())
        }
    }
}

/// Write date-range statistics.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_range_statistics<W: Write>(
    writer: &mut W,
    stats: &RangeStatistics,
    format: Format,
) -> io::Result<()> {
    if format != Format::Human {
        return write_value(writer, stats, format);
    }

    writeln!(writer, "{BOLD}{}{RESET}", stats.date_range)?;
    writeln!(
        writer,
        "{CYAN}{ICON_HIGH} Highest{RESET}  {BOLD}{:.2} m{RESET} on {} at {}",
        stats.highest_tide.height, stats.highest_tide.date, stats.highest_tide.time
    )?;
    writeln!(
        writer,
        "{BLUE}{ICON_LOW} Lowest{RESET}   {BOLD}{:.2} m{RESET} on {} at {}",
        stats.lowest_tide.height, stats.lowest_tide.date, stats.lowest_tide.time
    )?;
    writeln!(
        writer,
        "{YELLOW}Mean range{RESET} {BOLD}{:.2} m{RESET} {DIM}({} highs, {} lows){RESET}",
        stats.avg_tidal_range, stats.total_highs, stats.total_lows
    )
}

/// Write the station registry.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_stations<W: Write>(
    writer: &mut W,
    stations: &[Station],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => {
            for s in stations {
                writeln!(
                    writer,
                    "{BOLD}{:<16}{RESET} {} {DIM}{}{RESET}",
                    s.key,
                    s.name,
                    s.path.display()
                )?;
            }
            Ok(())
        }
        Format::Json => write_value(writer, &stations, format),
        Format::Ndjson => {
            for s in stations {
                write_value(writer, s, format)?;
            }
            Ok(())
        }
    }
}
