//! Station registry.
//!
//! Maps short station keys (as used in URLs and on the command line) to
//! prediction export files.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::TideError;
use crate::models::TideTable;
use crate::parser::parse_tide_file;

/// Default directory holding prediction exports.
pub const DEFAULT_DATA_DIR: &str = "HighTide";

/// Built-in stations: (key, display name, file name).
const BUILTIN_STATIONS: [(&str, &str, &str); 2] = [
    ("portjefferson", "Port Jefferson, NY", "portJeff.txt"),
    ("miami", "Miami, FL", "miami.txt"),
];

/// A registered station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    pub key: String,
    pub name: String,
    pub path: PathBuf,
}

/// A `KEY=PATH` station registration from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSpec {
    pub key: String,
    pub path: PathBuf,
}

impl std::str::FromStr for StationSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, path) = s
            .split_once('=')
            .ok_or_else(|| format!("station spec must be KEY=PATH, got '{s}'"))?;

        let key = key.trim().to_lowercase();
        let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
        if key.is_empty() || !key.chars().all(valid_char) {
            return Err(format!("invalid station key '{key}' (use letters, digits, '-' or '_')"));
        }

        let path = path.trim();
        if path.is_empty() {
            return Err(format!("station '{key}' has an empty path"));
        }

        Ok(Self {
            key,
            path: PathBuf::from(path),
        })
    }
}

/// Known stations, in registration order.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    /// Built-in stations resolved against `data_dir`.
    #[must_use]
    pub fn with_builtins(data_dir: &Path) -> Self {
        let stations = BUILTIN_STATIONS
            .iter()
            .map(|(key, name, file)| Station {
                key: (*key).to_string(),
                name: (*name).to_string(),
                path: data_dir.join(file),
            })
            .collect();
        Self { stations }
    }

    /// Add or replace a station from a command-line spec.
    pub fn register(&mut self, spec: StationSpec) {
        let station = Station {
            name: spec.key.clone(),
            key: spec.key,
            path: spec.path,
        };
        match self.stations.iter_mut().find(|s| s.key == station.key) {
            Some(existing) => *existing = station,
            None => self.stations.push(station),
        }
    }

    /// Look up a station by key (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`TideError::UnknownStation`] if the key is not registered.
    pub fn get(&self, key: &str) -> Result<&Station, TideError> {
        let key = key.to_lowercase();
        self.stations
            .iter()
            .find(|s| s.key == key)
            .ok_or(TideError::UnknownStation(key))
    }

    /// All registered stations.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Parse the export for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the station is unknown or its file unreadable.
    pub fn load(&self, key: &str) -> Result<TideTable, TideError> {
        parse_tide_file(&self.get(key)?.path)
    }
}
