//! Derived views over a parsed tide table.
//!
//! Daily listings, a 24-point hourly series for charting, and high/low
//! statistics over a single date or an inclusive date range. Every view
//! returns `None` rather than a partial answer when the data is missing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::errors::TideError;
use crate::models::{
    CLOCK_FORMAT, FILE_DATE_FORMAT, OutputPrediction, TideKind, TidePrediction, TideTable,
};

/// Parse a strict `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`TideError::InvalidDate`] for any other input.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, TideError> {
    let trimmed = s.trim();
    // chrono accepts unpadded fields; require the canonical width
    if trimmed.len() != 10 {
        return Err(TideError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| TideError::InvalidDate(s.to_string()))
}

/// How hours between known extrema are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMode {
    /// Height of the extremum nearest in time
    #[default]
    Nearest,
    /// Linear interpolation between the bracketing extrema
    Linear,
}

impl std::str::FromStr for SeriesMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            _ => Err(format!("unknown series mode: {s} (expected: nearest, linear)")),
        }
    }
}

/// 24 hourly points for one date.
#[derive(Debug, Clone, Serialize)]
pub struct HourlySeries {
    pub date: NaiveDate,
    pub mode: SeriesMode,
    pub hours: Vec<u32>,
    pub heights: Vec<f64>,
    pub times: Vec<String>,
    pub predictions: Vec<OutputPrediction>,
}

/// A single extremum referenced by a statistic.
#[derive(Debug, Clone, Serialize)]
pub struct Extremum {
    pub date: String,
    pub time: String,
    pub height: f64,
}

impl From<&TidePrediction> for Extremum {
    fn from(p: &TidePrediction) -> Self {
        Self {
            date: p.date.format(FILE_DATE_FORMAT).to_string(),
            time: p.clock(),
            height: p.height_m,
        }
    }
}

/// High/low statistics for one date.
#[derive(Debug, Clone, Serialize)]
pub struct DailyStatistics {
    pub high_tide: Extremum,
    pub low_tide: Extremum,
    pub tidal_range: f64,
    pub all_highs: Vec<OutputPrediction>,
    pub all_lows: Vec<OutputPrediction>,
}

/// Chart-ready listing of every extremum in a date range.
#[derive(Debug, Clone, Serialize)]
pub struct RangeSeries {
    /// `MM/DD` labels
    pub dates: Vec<String>,
    pub heights: Vec<f64>,
    pub times: Vec<String>,
    pub predictions: Vec<OutputPrediction>,
}

/// High/low statistics across an inclusive date range.
#[derive(Debug, Clone, Serialize)]
pub struct RangeStatistics {
    pub highest_tide: Extremum,
    pub lowest_tide: Extremum,
    /// Mean of highs minus mean of lows
    pub avg_tidal_range: f64,
    pub total_highs: usize,
    pub total_lows: usize,
    pub date_range: String,
}

/// All extrema on `date`, sorted by time of day.
#[must_use]
pub fn predictions_for_date(table: &TideTable, date: NaiveDate) -> Vec<TidePrediction> {
    let mut day: Vec<TidePrediction> = table
        .predictions
        .iter()
        .filter(|p| p.date == date)
        .cloned()
        .collect();
    day.sort_by_key(|p| p.time);
    day
}

/// All extrema with `from <= date <= to`, sorted by datetime.
#[must_use]
pub fn predictions_in_range(
    table: &TideTable,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<TidePrediction> {
    let mut range: Vec<TidePrediction> = table
        .predictions
        .iter()
        .filter(|p| p.date >= from && p.date <= to)
        .cloned()
        .collect();
    range.sort_by_key(TidePrediction::datetime);
    range
}

/// Build the 24-hour series for `date`.
#[must_use]
pub fn hourly_series(table: &TideTable, date: NaiveDate, mode: SeriesMode) -> Option<HourlySeries> {
    let day = predictions_for_date(table, date);
    if day.is_empty() {
        return None;
    }

    let mut hours = Vec::with_capacity(24);
    let mut heights = Vec::with_capacity(24);
    let mut times = Vec::with_capacity(24);

    for hour in 0..24u32 {
        let at = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?);
        let height = match mode {
            SeriesMode::Nearest => nearest_height(&day, at),
            SeriesMode::Linear => interpolated_height(&day, at),
        }?;

        hours.push(hour);
        heights.push(height);
        times.push(at.format(CLOCK_FORMAT).to_string());
    }

    Some(HourlySeries {
        date,
        mode,
        hours,
        heights,
        times,
        predictions: day.iter().map(OutputPrediction::from).collect(),
    })
}

/// Height of the extremum nearest to `at`; ties keep the earlier one.
fn nearest_height(day: &[TidePrediction], at: NaiveDateTime) -> Option<f64> {
    let mut best: Option<(i64, f64)> = None;
    for p in day {
        let diff = (at - p.datetime()).num_seconds().abs();
        if best.is_none_or(|(d, _)| diff < d) {
            best = Some((diff, p.height_m));
        }
    }
    best.map(|(_, h)| h)
}

/// Linear interpolation between the extrema bracketing `at`.
///
/// `day` must be sorted by time. Outside the first and last extremum the
/// nearest end value is held.
#[allow(clippy::cast_precision_loss)]
fn interpolated_height(day: &[TidePrediction], at: NaiveDateTime) -> Option<f64> {
    let first = day.first()?;
    let last = day.last()?;
    if at <= first.datetime() {
        return Some(first.height_m);
    }
    if at >= last.datetime() {
        return Some(last.height_m);
    }

    day.windows(2).find_map(|pair| {
        let (a, b) = (&pair[0], &pair[1]);
        let (ta, tb) = (a.datetime(), b.datetime());
        if at < ta || at > tb {
            return None;
        }
        let span = (tb - ta).num_seconds();
        if span == 0 {
            return Some(a.height_m);
        }
        let frac = (at - ta).num_seconds() as f64 / span as f64;
        Some(a.height_m + (b.height_m - a.height_m) * frac)
    })
}

/// Split into highs and lows, both non-empty, or `None`.
fn split_extrema(
    predictions: &[TidePrediction],
) -> Option<(Vec<&TidePrediction>, Vec<&TidePrediction>)> {
    let (highs, lows): (Vec<&TidePrediction>, Vec<&TidePrediction>) =
        predictions.iter().partition(|p| p.kind == TideKind::High);
    if highs.is_empty() || lows.is_empty() {
        return None;
    }
    Some((highs, lows))
}

/// Tallest high; among equal heights the earliest in order wins.
fn highest<'a>(highs: &[&'a TidePrediction]) -> Option<&'a TidePrediction> {
    highs
        .iter()
        .copied()
        .reduce(|best, p| if p.height_m > best.height_m { p } else { best })
}

fn lowest<'a>(lows: &[&'a TidePrediction]) -> Option<&'a TidePrediction> {
    lows.iter().copied().min_by(|a, b| a.height_m.total_cmp(&b.height_m))
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[&TidePrediction]) -> f64 {
    values.iter().map(|p| p.height_m).sum::<f64>() / values.len() as f64
}

/// Highest high, lowest low and tidal range for `date`.
#[must_use]
pub fn daily_statistics(table: &TideTable, date: NaiveDate) -> Option<DailyStatistics> {
    let day = predictions_for_date(table, date);
    let (highs, lows) = split_extrema(&day)?;
    let high = highest(&highs)?;
    let low = lowest(&lows)?;

    Some(DailyStatistics {
        high_tide: Extremum::from(high),
        low_tide: Extremum::from(low),
        tidal_range: high.height_m - low.height_m,
        all_highs: highs.iter().copied().map(OutputPrediction::from).collect(),
        all_lows: lows.iter().copied().map(OutputPrediction::from).collect(),
    })
}

/// Every extremum in `[from, to]` laid out for charting.
#[must_use]
pub fn range_series(table: &TideTable, from: NaiveDate, to: NaiveDate) -> Option<RangeSeries> {
    let range = predictions_in_range(table, from, to);
    if range.is_empty() {
        return None;
    }

    Some(RangeSeries {
        dates: range.iter().map(|p| p.date.format("%m/%d").to_string()).collect(),
        heights: range.iter().map(|p| p.height_m).collect(),
        times: range.iter().map(TidePrediction::clock).collect(),
        predictions: range.iter().map(OutputPrediction::from).collect(),
    })
}

/// Extremes and mean tidal range over `[from, to]`.
#[must_use]
pub fn range_statistics(
    table: &TideTable,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<RangeStatistics> {
    let range = predictions_in_range(table, from, to);
    let (highs, lows) = split_extrema(&range)?;
    let high = highest(&highs)?;
    let low = lowest(&lows)?;

    Some(RangeStatistics {
        highest_tide: Extremum::from(high),
        lowest_tide: Extremum::from(low),
        avg_tidal_range: mean(&highs) - mean(&lows),
        total_highs: highs.len(),
        total_lows: lows.len(),
        date_range: format!("{} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tide_text;

    const EXPORT: &str = "Units: Metric
2025/05/31\tSat\t08:00 PM\t1.90\tH
2025/06/01\tSun\t09:00 PM\t2.40\tH
2025/06/01\tSun\t03:00 AM\t-0.10\tL
2025/06/01\tSun\t09:00 AM\t2.00\tH
2025/06/01\tSun\t03:00 PM\t0.20\tL
2025/06/02\tMon\t04:00 AM\t0.00\tL
2025/06/02\tMon\t10:00 AM\t2.20\tH
2025/06/03\tTue\t10:30 AM\t2.30\tH
";

    fn table() -> TideTable {
        parse_tide_text(EXPORT)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2025-06-01").unwrap(), d(2025, 6, 1));
        assert!(parse_iso_date("2025/06/01").is_err());
        assert!(parse_iso_date("2025-6-1").is_err());
        assert!(parse_iso_date("2025-02-30").is_err());
        assert!(parse_iso_date("").is_err());
    }

    #[test]
    fn test_day_sorted_by_time() {
        let day = predictions_for_date(&table(), d(2025, 6, 1));
        let times: Vec<String> = day.iter().map(TidePrediction::clock).collect();
        assert_eq!(times, ["03:00 AM", "09:00 AM", "03:00 PM", "09:00 PM"]);
    }

    #[test]
    fn test_nearest_series() {
        let series = hourly_series(&table(), d(2025, 6, 1), SeriesMode::Nearest).unwrap();
        assert_eq!(series.hours.len(), 24);
        assert_eq!(series.times[0], "12:00 AM");
        assert_eq!(series.times[13], "01:00 PM");

        // Midnight and 05:00 snap to the 03:00 low
        assert!((series.heights[0] - -0.10).abs() < 1e-9);
        assert!((series.heights[5] - -0.10).abs() < 1e-9);
        // 06:00 is equidistant from 03:00 and 09:00; the earlier wins
        assert!((series.heights[6] - -0.10).abs() < 1e-9);
        assert!((series.heights[7] - 2.00).abs() < 1e-9);
        assert!((series.heights[23] - 2.40).abs() < 1e-9);
        assert_eq!(series.predictions.len(), 4);
    }

    #[test]
    fn test_linear_series() {
        let series = hourly_series(&table(), d(2025, 6, 1), SeriesMode::Linear).unwrap();
        // Before first extremum: held
        assert!((series.heights[1] - -0.10).abs() < 1e-9);
        // Halfway between 03:00 (-0.10) and 09:00 (2.00)
        assert!((series.heights[6] - 0.95).abs() < 1e-9);
        // Exactly on an extremum
        assert!((series.heights[15] - 0.20).abs() < 1e-9);
        // After last extremum: held
        assert!((series.heights[22] - 2.40).abs() < 1e-9);
    }

    #[test]
    fn test_series_without_data() {
        assert!(hourly_series(&table(), d(2025, 7, 1), SeriesMode::Nearest).is_none());
    }

    #[test]
    fn test_daily_statistics() {
        let stats = daily_statistics(&table(), d(2025, 6, 1)).unwrap();
        assert!((stats.high_tide.height - 2.40).abs() < 1e-9);
        assert_eq!(stats.high_tide.time, "09:00 PM");
        assert!((stats.low_tide.height - -0.10).abs() < 1e-9);
        assert!((stats.tidal_range - 2.50).abs() < 1e-9);
        assert_eq!(stats.all_highs.len(), 2);
        assert_eq!(stats.all_lows.len(), 2);
    }

    #[test]
    fn test_daily_statistics_requires_high_and_low() {
        // Only highs on the 31st and the 3rd
        assert!(daily_statistics(&table(), d(2025, 5, 31)).is_none());
        assert!(daily_statistics(&table(), d(2025, 6, 3)).is_none());
    }

    #[test]
    fn test_equal_highs_keep_the_earlier() {
        let text = "Units: Metric
2025/06/01\tSun\t03:00 AM\t2.00\tH
2025/06/01\tSun\t09:00 AM\t0.10\tL
2025/06/01\tSun\t03:00 PM\t2.00\tH
2025/06/02\tMon\t03:30 AM\t2.00\tH
2025/06/02\tMon\t09:30 AM\t0.10\tL
";
        let table = parse_tide_text(text);

        let day = daily_statistics(&table, d(2025, 6, 1)).unwrap();
        assert_eq!(day.high_tide.time, "03:00 AM");
        assert_eq!(day.low_tide.time, "09:00 AM");

        let range = range_statistics(&table, d(2025, 6, 1), d(2025, 6, 2)).unwrap();
        assert_eq!(range.highest_tide.date, "2025/06/01");
        assert_eq!(range.highest_tide.time, "03:00 AM");
        assert_eq!(range.lowest_tide.date, "2025/06/01");
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let series = range_series(&table(), d(2025, 5, 31), d(2025, 6, 2)).unwrap();
        assert_eq!(series.heights.len(), 7);
        assert_eq!(series.dates.first().map(String::as_str), Some("05/31"));
        assert_eq!(series.dates.last().map(String::as_str), Some("06/02"));

        let single = range_series(&table(), d(2025, 6, 3), d(2025, 6, 3)).unwrap();
        assert_eq!(single.heights.len(), 1);
    }

    #[test]
    fn test_range_sorted_by_datetime() {
        let series = range_series(&table(), d(2025, 6, 1), d(2025, 6, 2)).unwrap();
        assert_eq!(series.times[0], "03:00 AM");
        assert_eq!(series.dates[4], "06/02");
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(range_series(&table(), d(2025, 6, 2), d(2025, 6, 1)).is_none());
        assert!(range_statistics(&table(), d(2025, 6, 2), d(2025, 6, 1)).is_none());
    }

    #[test]
    fn test_range_statistics() {
        let stats = range_statistics(&table(), d(2025, 5, 31), d(2025, 6, 2)).unwrap();
        assert_eq!(stats.total_highs, 4);
        assert_eq!(stats.total_lows, 3);
        assert_eq!(stats.highest_tide.date, "2025/06/01");
        assert!((stats.highest_tide.height - 2.40).abs() < 1e-9);
        assert!((stats.lowest_tide.height - -0.10).abs() < 1e-9);

        let avg_high = (1.90 + 2.40 + 2.00 + 2.20) / 4.0;
        let avg_low = (-0.10 + 0.20 + 0.00) / 3.0;
        assert!((stats.avg_tidal_range - (avg_high - avg_low)).abs() < 1e-9);
        assert_eq!(stats.date_range, "2025-05-31 to 2025-06-02");
    }

    #[test]
    fn test_range_statistics_requires_high_and_low() {
        assert!(range_statistics(&table(), d(2025, 6, 3), d(2025, 6, 3)).is_none());
    }

    #[test]
    fn test_series_mode_parse() {
        assert_eq!("nearest".parse::<SeriesMode>().unwrap(), SeriesMode::Nearest);
        assert_eq!("LINEAR".parse::<SeriesMode>().unwrap(), SeriesMode::Linear);
        assert!("spline".parse::<SeriesMode>().is_err());
    }
}
