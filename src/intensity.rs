//! # Carbon Intensity Providers
//!
//! This module is the one seam in the core: where carbon-intensity numbers
//! come from. Everything downstream (calculator, ranking, service) talks to
//! the [`IntensityProvider`] trait and never knows which implementation is
//! behind it.
//!
//! ## Implementations
//!
//! ### Mock generator
//! [`MockIntensity`] draws a uniformly distributed integer in the closed
//! interval [150, 600] gCO2/kWh — a plausible band for European grid
//! intensity. It is stateless, seeded per call, and never fails. Determinism
//! across calls is neither required nor guaranteed.
//!
//! ### Electricity Maps client
//! [`ElectricityMapsSource`] queries the Electricity Maps v3 API by
//! geolocation:
//! - **Forecast** (`/forecast?lat=..&lon=..`) when the caller asks about a
//!   specific instant; the point matching the requested hour is used, or the
//!   nearest point when no exact match exists.
//! - **Latest** (`/latest?lat=..&lon=..`) when no instant is given.
//!
//! Each call is blocking with a configured timeout and a small bounded retry
//! loop. That retry budget is the client's own politeness toward a flaky
//! upstream; the ranking engine above adds no retries of its own.
//!
//! ## Error Handling
//!
//! A deployment without an API token is valid (mock-only); asking such a
//! deployment for real data fails with [`IntensityError::NotConfigured`]
//! rather than silently handing back mock values. Transport failures after
//! retries and malformed payloads surface as the remaining variants. No
//! error is swallowed.

use crate::config::SourceConfig;
use crate::{IntensityReading, SourceKind};
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::Rng;
use serde::Deserialize;
use std::io;
use thiserror::Error;

/// Lower bound of the mock intensity draw (gCO2/kWh)
pub const MOCK_CI_MIN: u32 = 150;
/// Upper bound of the mock intensity draw, inclusive (gCO2/kWh)
pub const MOCK_CI_MAX: u32 = 600;

/// Errors from intensity lookup.
#[derive(Error, Debug)]
pub enum IntensityError {
    /// No API token configured and mock mode not requested
    #[error("intensity source not configured: no API token set (enable mock mode or configure a token)")]
    NotConfigured,

    /// HTTP request failed after the configured retries
    #[error("intensity API error: {0}")]
    Http(#[from] ureq::Error),

    /// Response body could not be read or decoded
    #[error("intensity payload decode: {0}")]
    Decode(#[from] io::Error),

    /// Response decoded but did not contain usable data
    #[error("intensity payload malformed: {0}")]
    Malformed(String),
}

/// A source of carbon-intensity readings keyed by coordinate and instant.
///
/// `time = None` means "the most recent value the source has"; a concrete
/// instant asks for the value valid at that (hour-rounded) time.
pub trait IntensityProvider {
    fn intensity_at(
        &self,
        lat: f64,
        lon: f64,
        time: Option<DateTime<Utc>>,
    ) -> Result<IntensityReading, IntensityError>;
}

/// Round a UTC instant down to the containing hour.
///
/// All intensity data in this system is hourly; requests are snapped to the
/// hour before lookup so that equal-hour requests see the same data point.
pub fn round_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::hours(1)).unwrap_or(t)
}

/// Bounded pseudo-random intensity generator for development and testing.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockIntensity;

impl IntensityProvider for MockIntensity {
    fn intensity_at(
        &self,
        _lat: f64,
        _lon: f64,
        time: Option<DateTime<Utc>>,
    ) -> Result<IntensityReading, IntensityError> {
        let when = round_to_hour(time.unwrap_or_else(Utc::now));
        // Integer draw, matching the granularity real sources report at
        let ci = rand::thread_rng().gen_range(MOCK_CI_MIN..=MOCK_CI_MAX);
        Ok(IntensityReading {
            gco2_per_kwh: f64::from(ci),
            valid_at: when,
            zone: None,
            source: SourceKind::Mock,
        })
    }
}

/// Forecast payload: `{"zone": "NL", "forecast": [{...}, ...]}`
#[derive(Debug, Deserialize)]
struct ForecastPayload {
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Deserialize)]
struct ForecastPoint {
    datetime: DateTime<Utc>,
    #[serde(rename = "carbonIntensity")]
    carbon_intensity: f64,
}

/// Latest payload: `{"zone": "NL", "datetime": "...", "carbonIntensity": 123}`
#[derive(Debug, Deserialize)]
struct LatestPayload {
    #[serde(default)]
    zone: Option<String>,
    datetime: DateTime<Utc>,
    #[serde(rename = "carbonIntensity")]
    carbon_intensity: f64,
}

/// Blocking client for the Electricity Maps v3 carbon-intensity API.
#[derive(Debug)]
pub struct ElectricityMapsSource {
    api_base: String,
    token: String,
    retries: u32,
    agent: ureq::Agent,
}

impl ElectricityMapsSource {
    /// Build a client from source configuration.
    ///
    /// # Errors
    /// [`IntensityError::NotConfigured`] when no token is available from
    /// either the environment or the config file.
    pub fn from_config(config: &SourceConfig) -> Result<Self, IntensityError> {
        let token = config
            .resolved_token()
            .ok_or(IntensityError::NotConfigured)?;
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build();
        Ok(ElectricityMapsSource {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            retries: config.retries,
            agent,
        })
    }

    /// GET an endpoint with lat/lon parameters, retrying on failure.
    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        lat: f64,
        lon: f64,
    ) -> Result<T, IntensityError> {
        let url = format!("{}/{}", self.api_base, endpoint);
        let mut attempt = 0;
        loop {
            let result = self
                .agent
                .get(&url)
                .set("auth-token", &self.token)
                .query("lat", &lat.to_string())
                .query("lon", &lon.to_string())
                .call();
            match result {
                Ok(response) => return Ok(response.into_json()?),
                Err(_) if attempt < self.retries => attempt += 1,
                Err(e) => return Err(IntensityError::Http(e)),
            }
        }
    }
}

impl IntensityProvider for ElectricityMapsSource {
    fn intensity_at(
        &self,
        lat: f64,
        lon: f64,
        time: Option<DateTime<Utc>>,
    ) -> Result<IntensityReading, IntensityError> {
        match time {
            Some(t) => {
                let payload: ForecastPayload = self.get_json("forecast", lat, lon)?;
                let point = pick_forecast_point(&payload.forecast, round_to_hour(t))
                    .ok_or_else(|| IntensityError::Malformed("empty forecast".to_string()))?;
                Ok(IntensityReading {
                    gco2_per_kwh: point.carbon_intensity,
                    valid_at: point.datetime,
                    zone: payload.zone.clone(),
                    source: SourceKind::ElectricityMaps,
                })
            }
            None => {
                let payload: LatestPayload = self.get_json("latest", lat, lon)?;
                Ok(IntensityReading {
                    gco2_per_kwh: payload.carbon_intensity,
                    valid_at: payload.datetime,
                    zone: payload.zone,
                    source: SourceKind::ElectricityMaps,
                })
            }
        }
    }
}

/// Choose the forecast point for a target hour: exact match first, nearest
/// point otherwise. Returns `None` only for an empty forecast.
fn pick_forecast_point(points: &[ForecastPoint], target: DateTime<Utc>) -> Option<&ForecastPoint> {
    points
        .iter()
        .find(|p| p.datetime == target)
        .or_else(|| points.iter().min_by_key(|p| (p.datetime - target).num_seconds().abs()))
}
