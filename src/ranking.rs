//! # Site Ranking Engine
//!
//! For every catalogued site, look up the carbon intensity at the requested
//! instant, compute the footprint, and order the results ascending by
//! effective CI (lowest first = "best" site to schedule on).
//!
//! ## Ordering
//!
//! The sort is stable: sites with equal effective CI keep their catalogue
//! order. Ranks are 1-based positions assigned after the sort.
//!
//! ## Failure Policy
//!
//! All-or-nothing. If the intensity lookup (or the calculator) fails for any
//! single site, the whole ranking request fails with the offending site's
//! name and the underlying cause. An incomplete ranked list could steer a
//! caller optimizing for lowest effective CI toward the wrong site, so
//! partial rankings are never returned. An *empty* catalogue, by contrast,
//! is not an error: the result is simply an empty ranking.

use crate::catalogue::Catalogue;
use crate::footprint::{self, InvalidInputError};
use crate::intensity::{IntensityError, IntensityProvider};
use crate::{Ranking, RankingEntry};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A per-site failure that aborted a ranking request.
#[derive(Error, Debug)]
pub enum RankingError {
    /// Intensity lookup failed for one site
    #[error("ranking failed at site `{site}`: {source}")]
    Intensity {
        site: String,
        #[source]
        source: IntensityError,
    },

    /// Footprint calculation rejected its inputs for one site
    #[error("ranking failed at site `{site}`: {source}")]
    Input {
        site: String,
        #[source]
        source: InvalidInputError,
    },
}

/// Rank the whole catalogue by ascending effective CI at `start_time`.
///
/// `pue_override` is the request-level PUE (beats each site's catalogue
/// value); `default_pue` is the configured global fallback. `energy_kwh`,
/// when supplied, adds absolute footprint figures to every entry.
///
/// The catalogue snapshot is read-only; nothing is cached across calls.
pub fn rank(
    catalogue: &Catalogue,
    provider: &dyn IntensityProvider,
    default_pue: f64,
    pue_override: Option<f64>,
    energy_kwh: Option<f64>,
    start_time: DateTime<Utc>,
) -> Result<Ranking, RankingError> {
    let mut entries = Vec::with_capacity(catalogue.len());

    for site in catalogue.sites() {
        let reading = provider
            .intensity_at(site.latitude, site.longitude, Some(start_time))
            .map_err(|source| RankingError::Intensity {
                site: site.site_name.clone(),
                source,
            })?;

        let pue = footprint::resolve_pue(pue_override, site.pue, default_pue);
        let result = footprint::compute(&reading, pue, energy_kwh).map_err(|source| {
            RankingError::Input {
                site: site.site_name.clone(),
                source,
            }
        })?;

        entries.push(RankingEntry {
            rank: 0, // assigned after the sort
            site_name: site.site_name.clone(),
            latitude: site.latitude,
            longitude: site.longitude,
            footprint: result,
        });
    }

    // sort_by is stable, so equal effective CI keeps catalogue order
    entries.sort_by(|a, b| {
        a.footprint
            .effective_ci_gco2_per_kwh
            .total_cmp(&b.footprint.effective_ci_gco2_per_kwh)
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    Ok(Ranking {
        start_time,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Site;
    use crate::intensity::round_to_hour;
    use crate::{IntensityReading, SourceKind};

    /// Deterministic fake: hands out intensities from a fixed list, keyed by
    /// latitude index (site i has latitude i).
    struct FixedIntensity(Vec<f64>);

    impl IntensityProvider for FixedIntensity {
        fn intensity_at(
            &self,
            lat: f64,
            _lon: f64,
            time: Option<DateTime<Utc>>,
        ) -> Result<IntensityReading, IntensityError> {
            let ci = self.0[lat as usize];
            Ok(IntensityReading {
                gco2_per_kwh: ci,
                valid_at: round_to_hour(time.unwrap_or_else(Utc::now)),
                zone: None,
                source: SourceKind::Mock,
            })
        }
    }

    /// Provider that always fails, for the all-or-nothing path.
    struct BrokenProvider;

    impl IntensityProvider for BrokenProvider {
        fn intensity_at(
            &self,
            _lat: f64,
            _lon: f64,
            _time: Option<DateTime<Utc>>,
        ) -> Result<IntensityReading, IntensityError> {
            Err(IntensityError::NotConfigured)
        }
    }

    fn catalogue_of(n: usize) -> Catalogue {
        let sites = (0..n)
            .map(|i| Site {
                site_name: format!("site-{i}"),
                latitude: i as f64,
                longitude: 0.0,
                pue: None,
            })
            .collect();
        Catalogue::from_sites(sites).unwrap()
    }

    #[test]
    fn test_ranking_is_ascending_with_one_entry_per_site() {
        let catalogue = catalogue_of(5);
        let provider = FixedIntensity(vec![400.0, 150.0, 600.0, 320.0, 210.0]);
        let ranking = rank(&catalogue, &provider, 1.4, None, None, Utc::now()).unwrap();

        assert_eq!(ranking.entries.len(), 5);
        for pair in ranking.entries.windows(2) {
            assert!(
                pair[0].footprint.effective_ci_gco2_per_kwh
                    <= pair[1].footprint.effective_ci_gco2_per_kwh,
                "entries out of order"
            );
        }
        // Ranks are 1..=N in order
        let ranks: Vec<usize> = ranking.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        // Best site is the lowest raw CI (equal PUE everywhere)
        assert_eq!(ranking.entries[0].site_name, "site-1");
    }

    #[test]
    fn test_ties_keep_catalogue_order() {
        let catalogue = catalogue_of(4);
        // Sites 0 and 2 tie, as do 1 and 3
        let provider = FixedIntensity(vec![300.0, 200.0, 300.0, 200.0]);
        let ranking = rank(&catalogue, &provider, 1.4, None, None, Utc::now()).unwrap();

        let names: Vec<&str> = ranking.entries.iter().map(|e| e.site_name.as_str()).collect();
        assert_eq!(names, vec!["site-1", "site-3", "site-0", "site-2"]);
    }

    #[test]
    fn test_site_pue_affects_order() {
        let sites = vec![
            Site {
                site_name: "efficient".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                pue: Some(1.1),
            },
            Site {
                site_name: "wasteful".to_string(),
                latitude: 1.0,
                longitude: 0.0,
                pue: Some(2.0),
            },
        ];
        let catalogue = Catalogue::from_sites(sites).unwrap();
        // Raw CI favours "wasteful", but its PUE doubles the effective CI:
        // 300 * 1.1 = 330 < 200 * 2.0 = 400
        let provider = FixedIntensity(vec![300.0, 200.0]);
        let ranking = rank(&catalogue, &provider, 1.4, None, None, Utc::now()).unwrap();
        assert_eq!(ranking.entries[0].site_name, "efficient");
    }

    #[test]
    fn test_request_pue_overrides_site_pue() {
        let sites = vec![Site {
            site_name: "a".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            pue: Some(2.0),
        }];
        let catalogue = Catalogue::from_sites(sites).unwrap();
        let provider = FixedIntensity(vec![100.0]);
        let ranking = rank(&catalogue, &provider, 1.4, Some(1.0), None, Utc::now()).unwrap();
        assert_eq!(ranking.entries[0].footprint.pue, 1.0);
        assert_eq!(ranking.entries[0].footprint.effective_ci_gco2_per_kwh, 100.0);
    }

    #[test]
    fn test_empty_catalogue_yields_empty_ranking() {
        let catalogue = Catalogue::from_sites(vec![]).unwrap();
        let ranking = rank(&catalogue, &BrokenProvider, 1.4, None, None, Utc::now()).unwrap();
        assert!(ranking.entries.is_empty());
    }

    #[test]
    fn test_single_site_failure_aborts_whole_ranking() {
        let catalogue = catalogue_of(3);
        let err = rank(&catalogue, &BrokenProvider, 1.4, None, None, Utc::now()).unwrap_err();
        match err {
            RankingError::Intensity { site, .. } => assert_eq!(site, "site-0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_request_pue_aborts_with_site_name() {
        let catalogue = catalogue_of(2);
        let provider = FixedIntensity(vec![100.0, 200.0]);
        let err = rank(&catalogue, &provider, 1.4, Some(-1.0), None, Utc::now()).unwrap_err();
        assert!(matches!(err, RankingError::Input { .. }));
    }

    #[test]
    fn test_energy_adds_footprint_to_every_entry() {
        let catalogue = catalogue_of(2);
        let provider = FixedIntensity(vec![100.0, 200.0]);
        let ranking = rank(&catalogue, &provider, 1.0, None, Some(2.0), Utc::now()).unwrap();
        assert_eq!(ranking.entries[0].footprint.cfp_g, Some(200.0));
        assert_eq!(ranking.entries[1].footprint.cfp_g, Some(400.0));
    }
}
