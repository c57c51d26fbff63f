//! # Carbon Ranker Core Library
//!
//! This library computes carbon-footprint figures for compute sites and ranks
//! a static site catalogue by effective carbon intensity. It is the pure core
//! behind a thin HTTP layer (kept out of this crate): the HTTP layer handles
//! authentication and request parsing, then calls the two operations exposed
//! by [`service::Service`].
//!
//! ## Design Philosophy
//!
//! ### Small, source-agnostic core
//! The calculation itself is two multiplications and a stable sort. The only
//! moving part is where the carbon-intensity number comes from, so that is
//! the one seam with a trait behind it ([`intensity::IntensityProvider`]):
//! a bounded pseudo-random mock for development, and an Electricity Maps
//! client for real data. Ranking and footprint code never know which one
//! they are talking to.
//!
//! ### No shared mutable state
//! The site catalogue is loaded once at startup and never mutated, so
//! concurrent requests need no locking. Every request computes its own
//! ephemeral readings, footprints, and ranking; nothing is cached between
//! calls.
//!
//! ### Fail whole, not partial
//! A catalogue file with one bad record fails the whole load, and a ranking
//! where one site's intensity lookup fails aborts the whole request. A
//! partially ranked list would mislead a caller picking the "greenest" site,
//! so there is no partial-success path.
//!
//! ## Data Flow
//! 1. **Startup**: [`config::Config`] → [`catalogue::Catalogue::load`]
//! 2. **Single point**: intensity lookup → [`footprint::compute`] → [`FootprintResult`]
//! 3. **Ranking**: per catalogued site, intensity lookup + footprint, then a
//!    stable ascending sort by effective CI → [`Ranking`]
//!
//! ## Units
//! Carbon intensity is grams of CO2-equivalent per kilowatt-hour (gCO2/kWh).
//! Effective CI is intensity multiplied by the site's PUE (power usage
//! effectiveness). Footprints are grams (and kilograms) for a supplied
//! energy amount in kWh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod catalogue;
pub mod config;
pub mod footprint;
pub mod intensity;
pub mod ranking;
pub mod report;
pub mod service;

/// Which kind of provider produced an intensity reading.
///
/// Carried through to API responses so callers can tell synthetic numbers
/// from real grid data at a glance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Bounded pseudo-random generator, development and testing only
    Mock,
    /// Electricity Maps v3 carbon-intensity API
    ElectricityMaps,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Mock => write!(f, "mock"),
            SourceKind::ElectricityMaps => write!(f, "electricitymaps"),
        }
    }
}

/// A single carbon-intensity observation for one coordinate and instant.
///
/// Ephemeral: computed per request and never persisted. The `valid_at`
/// timestamp is the instant the value describes (hour-rounded for the mock,
/// the source's own timestamp for real data), not the time of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntensityReading {
    /// Carbon intensity in grams CO2-equivalent per kWh
    pub gco2_per_kwh: f64,
    /// Instant the reading describes (UTC)
    pub valid_at: DateTime<Utc>,
    /// Grid zone identifier, when the source reports one
    pub zone: Option<String>,
    /// Provider that produced the value
    pub source: SourceKind,
}

/// Result of one footprint calculation.
///
/// `effective_ci_gco2_per_kwh` is always present; the two `cfp_*` fields are
/// only populated when the caller supplied an energy amount.
///
/// # Example
/// ```
/// use carbon_ranker_lib::{footprint, IntensityReading, SourceKind};
/// use chrono::Utc;
///
/// let reading = IntensityReading {
///     gco2_per_kwh: 200.0,
///     valid_at: Utc::now(),
///     zone: None,
///     source: SourceKind::Mock,
/// };
/// let result = footprint::compute(&reading, 1.4, Some(3.0)).unwrap();
/// assert_eq!(result.effective_ci_gco2_per_kwh, 280.0);
/// assert_eq!(result.cfp_g, Some(840.0));
/// assert_eq!(result.cfp_kg, Some(0.84));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FootprintResult {
    /// Provider that produced the underlying reading
    pub source: SourceKind,
    /// Grid zone of the reading, when known
    pub zone: Option<String>,
    /// Instant the underlying reading describes (UTC)
    pub valid_at: DateTime<Utc>,
    /// Raw carbon intensity (gCO2/kWh)
    pub ci_gco2_per_kwh: f64,
    /// Power usage effectiveness applied
    pub pue: f64,
    /// ci * pue (gCO2/kWh)
    pub effective_ci_gco2_per_kwh: f64,
    /// effective CI * energy, grams; present only when energy was supplied
    pub cfp_g: Option<f64>,
    /// cfp_g / 1000; present only when energy was supplied
    pub cfp_kg: Option<f64>,
}

/// One site's position in a ranking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based position, 1 = lowest effective CI ("best")
    pub rank: usize,
    /// Catalogue site identifier
    pub site_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// The footprint computed for this site at the ranking instant
    pub footprint: FootprintResult,
}

/// A full-catalogue ranking at one instant.
///
/// Entries are sorted ascending by effective CI; ties keep catalogue order.
/// Recomputed on every request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ranking {
    /// Hour-rounded UTC instant the ranking was computed for
    pub start_time: DateTime<Utc>,
    pub entries: Vec<RankingEntry>,
}
