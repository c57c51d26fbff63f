//! # Service Facade
//!
//! The two operations the HTTP layer calls, wired over the loaded catalogue
//! and per-request provider selection:
//!
//! - [`Service::compute_ci`] — single-point calculation for a coordinate,
//!   bypassing the catalogue.
//! - [`Service::rank_sites`] — full-catalogue ranking.
//!
//! The surrounding HTTP layer (separate deployment unit) verifies bearer
//! tokens against an external identity service before calling in; this core
//! has no authentication concept of its own.
//!
//! Provider selection is per request: `use_mock = true` gets the bounded
//! random generator, otherwise the Electricity Maps client is built from
//! configuration — which fails up front with a "not configured" error when
//! no token is available, never by silently substituting mock values.

use crate::catalogue::{Catalogue, CatalogueError};
use crate::config::Config;
use crate::footprint::{self, InvalidInputError};
use crate::intensity::{
    round_to_hour, ElectricityMapsSource, IntensityError, IntensityProvider, MockIntensity,
};
use crate::ranking::{self, RankingError};
use crate::{FootprintResult, Ranking};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Single-point calculation request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CiRequest {
    pub lat: f64,
    pub lon: f64,
    /// UTC instant; latest available data when omitted
    pub time: Option<DateTime<Utc>>,
    /// Explicit PUE; configured default when omitted
    pub pue: Option<f64>,
    pub use_mock: bool,
    /// When supplied, the response carries absolute footprint figures
    pub energy_kwh: Option<f64>,
}

/// Full-catalogue ranking request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankRequest {
    /// UTC instant to rank for; "now" when omitted. Rounded down to the hour.
    pub start_time: Option<DateTime<Utc>>,
    /// Explicit PUE applied to every site, overriding catalogue values
    pub pue: Option<f64>,
    pub use_mock: bool,
    pub energy_kwh: Option<f64>,
}

/// Any failure of the two service operations. Terminal for the request that
/// triggered it; nothing is retried here.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Intensity(#[from] IntensityError),

    #[error(transparent)]
    Input(#[from] InvalidInputError),

    #[error(transparent)]
    Ranking(#[from] RankingError),
}

/// The core service: configuration plus the read-only catalogue snapshot.
pub struct Service {
    config: Config,
    catalogue: Catalogue,
}

impl Service {
    pub fn new(config: Config, catalogue: Catalogue) -> Self {
        Service { config, catalogue }
    }

    /// Load the catalogue from the configured path and build the service.
    ///
    /// # Errors
    /// [`CatalogueError`] is fatal: a service must never start against a
    /// missing or corrupt catalogue.
    pub fn from_config(config: Config) -> Result<Self, CatalogueError> {
        let catalogue = Catalogue::load(&config.catalogue.path)?;
        Ok(Service { config, catalogue })
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Pick the intensity provider for one request.
    fn provider(&self, use_mock: bool) -> Result<Box<dyn IntensityProvider>, IntensityError> {
        if use_mock {
            Ok(Box::new(MockIntensity))
        } else {
            Ok(Box::new(ElectricityMapsSource::from_config(
                &self.config.source,
            )?))
        }
    }

    /// Single-point effective CI (and optional footprint) for a coordinate.
    pub fn compute_ci(&self, request: &CiRequest) -> Result<FootprintResult, ServiceError> {
        let provider = self.provider(request.use_mock)?;
        let time = request.time.map(round_to_hour);
        let reading = provider.intensity_at(request.lat, request.lon, time)?;
        let pue = footprint::resolve_pue(request.pue, None, self.config.calculator.default_pue);
        Ok(footprint::compute(&reading, pue, request.energy_kwh)?)
    }

    /// Rank every catalogued site by ascending effective CI.
    pub fn rank_sites(&self, request: &RankRequest) -> Result<Ranking, ServiceError> {
        let provider = self.provider(request.use_mock)?;
        let start_time = round_to_hour(request.start_time.unwrap_or_else(Utc::now));
        Ok(ranking::rank(
            &self.catalogue,
            provider.as_ref(),
            self.config.calculator.default_pue,
            request.pue,
            request.energy_kwh,
            start_time,
        )?)
    }
}
