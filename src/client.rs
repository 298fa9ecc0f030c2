//! NOAA CO-OPS prediction download client.
//!
//! Provides blocking HTTP access to the annual high/low tide prediction
//! text exports that the parser consumes.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::TideError;
use crate::parser::parse_tide_text;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("tidecast/", env!("CARGO_PKG_VERSION"));

/// NOAA Tides & Currents base URL.
const NOAA_BASE_URL: &str = "https://tidesandcurrents.noaa.gov";

/// Client for NOAA tide prediction downloads.
pub struct NoaaClient {
    client: Client,
    base_url: String,
}

impl NoaaClient {
    /// Create a new NOAA client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, TideError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: NOAA_BASE_URL.to_string(),
        })
    }

    /// URL of the annual prediction text export for a station.
    #[must_use]
    pub fn annual_url(&self, station_id: &str, year: i32, datum: &str) -> String {
        format!(
            "{}/cgi-bin/predictiondownload.cgi?&stnid={}&threshold=&thresholdDirection=&bdate={}\
             &timezone=LST/LDT&datum={}&clock=12hour&type=txt&annual=true",
            self.base_url, station_id, year, datum
        )
    }

    /// Download the annual prediction export for a CO-OPS station.
    ///
    /// The body is parsed before being returned so that an error page is
    /// never mistaken for data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, NOAA returns an error status,
    /// or the body holds no predictions.
    #[instrument(skip(self))]
    pub fn fetch_annual(
        &self,
        station_id: &str,
        year: i32,
        datum: &str,
    ) -> Result<String, TideError> {
        if !is_query_token(station_id) {
            return Err(TideError::Validation(format!("invalid station id '{station_id}'")));
        }
        if !is_query_token(datum) {
            return Err(TideError::Validation(format!("invalid datum '{datum}'")));
        }

        let url = self.annual_url(station_id, year, datum);
        debug!("fetching predictions from {}", url);

        let response = self.client.get(&url).send()?;

        // Check status before reading
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TideError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        let table = parse_tide_text(&body);
        if table.predictions.is_empty() {
            return Err(TideError::InvalidResponse(format!(
                "no predictions in response for station {station_id}"
            )));
        }

        debug!("fetched {} predictions", table.predictions.len());
        Ok(body)
    }
}

/// Station ids and datums are plain alphanumeric codes (8514322, MLLW).
fn is_query_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}
