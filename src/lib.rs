//! tidecast: NOAA tide prediction parsing, statistics and JSON API.
//!
//! ```text
//! tidecast
//! ├── models    — prediction records, units, JSON output shape
//! ├── parser    — NOAA CO-OPS tab-delimited text exports
//! ├── analysis  — daily listing, hourly series, single-date and range statistics
//! ├── stations  — station key → export file registry
//! ├── client    — NOAA annual export download
//! ├── output    — human / JSON / NDJSON writers
//! ├── server    — Axum JSON API
//! └── cli       — clap definitions
//! ```

pub mod analysis;
pub mod cli;
pub mod client;
pub mod errors;
pub mod models;
pub mod output;
pub mod parser;
pub mod server;
pub mod stations;
