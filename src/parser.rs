//! NOAA CO-OPS tide prediction text parser.
//!
//! The annual export is a short `Key: value` header followed by one
//! tab-delimited row per predicted high or low:
//!
//! ```text
//! NOAA/NOS/CO-OPS
//! Disclaimer: These data are based upon the latest information available ...
//! StationName: Port Jefferson, NY
//! Stationid: 8514322
//! Units: Feet
//! Datum: MLLW
//! Time Zone: LST_LDT
//!
//! Date 		Day	Time	Pred(Ft)	Pred(cm)	High/Low
//! 2025/01/01	Wed	04:47 AM	7.73	236	H
//! ```
//!
//! Malformed data rows are logged and skipped; one bad row never costs
//! the rest of the file.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::errors::TideError;
use crate::models::{
    CLOCK_FORMAT, FILE_DATE_FORMAT, StationHeader, TideKind, TidePrediction, TideTable, Units,
};

/// Line prefixes that are never data or metadata.
const SKIP_PREFIXES: [&str; 3] = ["Date", "NOAA", "Disclaimer"];

/// Read and parse a prediction export from disk.
///
/// # Errors
///
/// Returns [`TideError::Io`] if the file cannot be read.
pub fn parse_tide_file(path: &Path) -> Result<TideTable, TideError> {
    let text = fs::read_to_string(path).map_err(|source| TideError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = parse_tide_text(&text);
    debug!(
        "parsed {} predictions from {} ({} skipped)",
        table.predictions.len(),
        path.display(),
        table.skipped_rows
    );
    Ok(table)
}

/// Parse the text of a prediction export.
#[must_use]
pub fn parse_tide_text(text: &str) -> TideTable {
    let units = text
        .lines()
        .find_map(|line| line.split_once("Units:").map(|(_, v)| Units::from_header(v)))
        .unwrap_or_default();

    let mut table = TideTable {
        header: StationHeader {
            units,
            ..StationHeader::default()
        },
        ..TideTable::default()
    };

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || SKIP_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        if has_date_prefix(line) {
            match parse_row(line, units) {
                Ok(prediction) => table.predictions.push(prediction),
                Err(reason) => {
                    warn!("skipping line {}: {line:?} - {reason}", idx + 1);
                    table.skipped_rows += 1;
                }
            }
        } else {
            apply_header_line(&mut table.header, line);
        }
    }

    table
}

/// True if the line begins with a `YYYY/MM/DD` date.
fn has_date_prefix(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'/',
            _ => b.is_ascii_digit(),
        })
}

/// Record a `Key: value` header line. Unknown keys are ignored.
fn apply_header_line(header: &mut StationHeader, line: &str) {
    let Some((key, value)) = line.split_once(':') else {
        return;
    };
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    match key.trim().to_ascii_lowercase().as_str() {
        "stationname" => header.station_name = Some(value.to_string()),
        "stationid" => header.station_id = Some(value.to_string()),
        "datum" => header.datum = Some(value.to_string()),
        "time zone" => header.time_zone = Some(value.to_string()),
        _ => {}
    }
}

/// Parse one data row into a prediction.
fn parse_row(line: &str, units: Units) -> Result<TidePrediction, String> {
    let fields: Vec<&str> = line
        .split('\t')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() < 4 {
        return Err(format!("expected at least 4 fields, got {}", fields.len()));
    }

    let date = NaiveDate::parse_from_str(fields[0], FILE_DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {e}", fields[0]))?;
    let time = parse_clock(fields[2])?;
    let raw: f64 = fields[3]
        .parse()
        .map_err(|e| format!("invalid height '{}': {e}", fields[3]))?;
    if !raw.is_finite() {
        return Err(format!("invalid height '{}'", fields[3]));
    }

    // Extra height columns (e.g. Pred(cm)) may sit between height and flag.
    let kind = fields[4..]
        .iter()
        .rev()
        .find_map(|f| f.parse::<TideKind>().ok())
        .unwrap_or(TideKind::High);

    Ok(TidePrediction {
        date,
        day: fields[1].to_string(),
        time,
        height_m: units.to_meters(raw),
        kind,
    })
}

/// Accept `hh:mm AM` first, then 24-hour `HH:MM` exports.
fn parse_clock(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, CLOCK_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("invalid time '{s}': {e}"))
}
