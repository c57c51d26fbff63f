//! # Site Catalogue Loading
//!
//! This module loads the static site catalogue: the mapping from site name to
//! geographic coordinates and (optionally) a site-specific PUE. The catalogue
//! is produced out-of-band by a GOC DB enrichment pipeline and lands here as
//! a plain JSON array, e.g.:
//!
//! ```json
//! [
//!   {"site_name": "CESNET-MCC", "latitude": 50.1, "longitude": 14.39, "pue": 1.35},
//!   {"site_name": "SURF-NL", "latitude": 52.36, "longitude": 4.95}
//! ]
//! ```
//!
//! ## Loading Policy
//!
//! The load is all-or-nothing: a single record with a missing field, an
//! out-of-range coordinate, a non-positive PUE, or a duplicate name fails the
//! whole load. Ranking against a partially populated catalogue would silently
//! drop candidate sites, which is worse than failing loudly at startup.
//!
//! Once loaded the catalogue is never mutated, so lookups need no locking.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading the site catalogue.
///
/// All variants are fatal for the load; there is no partial-load tolerance.
#[derive(Error, Debug)]
pub enum CatalogueError {
    /// Catalogue file missing or unreadable
    #[error("catalogue IO: {0}")]
    Io(#[from] io::Error),

    /// Not a JSON array of site records, or a record missing required fields
    #[error("catalogue parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Latitude outside [-90, 90]
    #[error("site `{site}`: latitude {value} outside [-90, 90]")]
    LatitudeOutOfRange { site: String, value: f64 },

    /// Longitude outside [-180, 180]
    #[error("site `{site}`: longitude {value} outside [-180, 180]")]
    LongitudeOutOfRange { site: String, value: f64 },

    /// PUE must be strictly positive when present
    #[error("site `{site}`: PUE {value} must be positive")]
    NonPositivePue { site: String, value: f64 },

    /// Site records must carry a non-empty name
    #[error("site record with empty name")]
    EmptyName,

    /// Site names are unique within the catalogue
    #[error("duplicate site `{0}`")]
    DuplicateSite(String),
}

/// One catalogued compute site. Immutable after load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Site {
    /// Unique site identifier (GOC DB name)
    #[serde(alias = "name")]
    pub site_name: String,
    /// Degrees north, [-90, 90]
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Degrees east, [-180, 180]
    #[serde(alias = "lon")]
    pub longitude: f64,
    /// Site-specific PUE; falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pue: Option<f64>,
}

/// The loaded site catalogue: an ordered, read-only sequence of sites.
///
/// Order is the file order, which also serves as the tie-break order for
/// rankings with equal effective CI.
#[derive(Clone, Debug)]
pub struct Catalogue {
    sites: Vec<Site>,
}

impl Catalogue {
    /// Load and validate the catalogue from a JSON file.
    ///
    /// # Errors
    /// Any IO, parse, or per-record validation failure rejects the whole
    /// file — no sites are usable afterwards, even well-formed ones.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogueError> {
        let contents = fs::read_to_string(path)?;
        let sites: Vec<Site> = serde_json::from_str(&contents)?;
        Self::from_sites(sites)
    }

    /// Build a catalogue from in-memory records, applying the same
    /// validation as [`Catalogue::load`]. Mostly useful in tests.
    pub fn from_sites(sites: Vec<Site>) -> Result<Self, CatalogueError> {
        for site in &sites {
            validate(site)?;
        }
        for (i, site) in sites.iter().enumerate() {
            if sites[..i].iter().any(|s| s.site_name == site.site_name) {
                return Err(CatalogueError::DuplicateSite(site.site_name.clone()));
            }
        }
        Ok(Catalogue { sites })
    }

    /// Look up a site by name.
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.site_name == name)
    }

    /// All sites in catalogue (file) order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

fn validate(site: &Site) -> Result<(), CatalogueError> {
    if site.site_name.trim().is_empty() {
        return Err(CatalogueError::EmptyName);
    }
    if !(-90.0..=90.0).contains(&site.latitude) {
        return Err(CatalogueError::LatitudeOutOfRange {
            site: site.site_name.clone(),
            value: site.latitude,
        });
    }
    if !(-180.0..=180.0).contains(&site.longitude) {
        return Err(CatalogueError::LongitudeOutOfRange {
            site: site.site_name.clone(),
            value: site.longitude,
        });
    }
    if let Some(pue) = site.pue {
        if pue <= 0.0 {
            return Err(CatalogueError::NonPositivePue {
                site: site.site_name.clone(),
                value: pue,
            });
        }
    }
    Ok(())
}
