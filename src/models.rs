//! Data models for NOAA tide prediction exports.
//!
//! Heights are normalized to meters at parse time; nothing downstream
//! ever sees feet.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Feet to meters.
pub const FEET_TO_METERS: f64 = 0.3048;

/// Display format for dates, as written in the export.
pub const FILE_DATE_FORMAT: &str = "%Y/%m/%d";

/// Display format for times (12-hour clock).
pub const CLOCK_FORMAT: &str = "%I:%M %p";

/// Units declared in the export header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Feet,
    #[default]
    Metric,
}

impl Units {
    /// Interpret a header value. Only `Feet` means feet.
    #[must_use]
    pub fn from_header(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("feet") {
            Self::Feet
        } else {
            Self::Metric
        }
    }

    /// Convert a raw height in these units to meters.
    #[must_use]
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            Self::Feet => value * FEET_TO_METERS,
            Self::Metric => value,
        }
    }
}

/// High or low water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TideKind {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "L")]
    Low,
}

impl TideKind {
    /// Single-letter flag used in the export.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "H",
            Self::Low => "L",
        }
    }
}

impl std::str::FromStr for TideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "H" | "h" => Ok(Self::High),
            "L" | "l" => Ok(Self::Low),
            _ => Err(format!("unknown high/low flag: {s}")),
        }
    }
}

/// A single predicted extremum.
#[derive(Debug, Clone, PartialEq)]
pub struct TidePrediction {
    pub date: NaiveDate,
    /// Day-of-week abbreviation as written in the file
    pub day: String,
    pub time: NaiveTime,
    /// Predicted height in meters
    pub height_m: f64,
    pub kind: TideKind,
}

impl TidePrediction {
    /// Combined local date and time.
    #[must_use]
    pub fn datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Time of day on the 12-hour clock, e.g. `04:47 AM`.
    #[must_use]
    pub fn clock(&self) -> String {
        self.time.format(CLOCK_FORMAT).to_string()
    }
}

/// Station metadata recovered from the export header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationHeader {
    pub station_name: Option<String>,
    pub station_id: Option<String>,
    pub units: Units,
    pub datum: Option<String>,
    pub time_zone: Option<String>,
}

/// A parsed prediction export.
#[derive(Debug, Clone, Default)]
pub struct TideTable {
    pub header: StationHeader,
    /// Predictions in file order
    pub predictions: Vec<TidePrediction>,
    /// Data rows that were recognized but could not be parsed
    pub skipped_rows: usize,
}

impl TideTable {
    /// First and last calendar dates covered, if any.
    #[must_use]
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.predictions.iter().map(|p| p.date).min()?;
        let last = self.predictions.iter().map(|p| p.date).max()?;
        Some((first, last))
    }
}

/// Normalized prediction for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputPrediction {
    pub datetime: String,
    pub date: String,
    pub time: String,
    pub day: String,
    pub prediction: f64,
    #[serde(rename = "type")]
    pub kind: TideKind,
    pub units: &'static str,
}

impl From<&TidePrediction> for OutputPrediction {
    fn from(p: &TidePrediction) -> Self {
        Self {
            datetime: p.datetime().format("%Y-%m-%dT%H:%M:%S").to_string(),
            date: p.date.format(FILE_DATE_FORMAT).to_string(),
            time: p.clock(),
            day: p.day.clone(),
            prediction: p.height_m,
            kind: p.kind,
            units: "meters",
        }
    }
}
