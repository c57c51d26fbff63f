//! # Footprint Calculator
//!
//! Pure arithmetic core: given a carbon-intensity reading, a PUE, and an
//! optional energy amount, compute
//!
//! ```text
//! effective_ci = ci * pue
//! cfp_g  = effective_ci * energy_kwh     (only if energy_kwh supplied)
//! cfp_kg = cfp_g / 1000                  (only if cfp_g computed)
//! ```
//!
//! No side effects, no I/O, no failure modes beyond rejecting negative
//! inputs. With non-negative CI and PUE the effective CI is non-negative by
//! construction, and the footprint is proportional to the energy supplied.
//!
//! ## PUE resolution
//!
//! Several layers may supply a PUE; [`resolve_pue`] fixes which one wins:
//! an explicit request value beats the site's catalogue value, which beats
//! the configured global default. Callers must not reorder this.

use crate::{FootprintResult, IntensityReading};
use thiserror::Error;

/// Grams per kilogram, for the cfp_g → cfp_kg conversion
const GRAMS_PER_KG: f64 = 1000.0;

/// Bad numeric input to the calculator. Reported to the caller; the request
/// is rejected, nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("PUE must not be negative, got {0}")]
    NegativePue(f64),

    #[error("energy must not be negative, got {0} kWh")]
    NegativeEnergy(f64),
}

/// Resolve the PUE to apply: request value > site catalogue value > default.
pub fn resolve_pue(request: Option<f64>, site: Option<f64>, default: f64) -> f64 {
    request.or(site).unwrap_or(default)
}

/// Compute effective CI and (optionally) the carbon footprint for an energy
/// amount in kWh.
///
/// # Errors
/// [`InvalidInputError`] when `pue` or `energy_kwh` is negative.
pub fn compute(
    reading: &IntensityReading,
    pue: f64,
    energy_kwh: Option<f64>,
) -> Result<FootprintResult, InvalidInputError> {
    if pue < 0.0 {
        return Err(InvalidInputError::NegativePue(pue));
    }
    if let Some(energy) = energy_kwh {
        if energy < 0.0 {
            return Err(InvalidInputError::NegativeEnergy(energy));
        }
    }

    let effective = reading.gco2_per_kwh * pue;
    let cfp_g = energy_kwh.map(|energy| effective * energy);
    let cfp_kg = cfp_g.map(|g| g / GRAMS_PER_KG);

    Ok(FootprintResult {
        source: reading.source,
        zone: reading.zone.clone(),
        valid_at: reading.valid_at,
        ci_gco2_per_kwh: reading.gco2_per_kwh,
        pue,
        effective_ci_gco2_per_kwh: effective,
        cfp_g,
        cfp_kg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn reading(ci: f64) -> IntensityReading {
        IntensityReading {
            gco2_per_kwh: ci,
            valid_at: Utc::now(),
            zone: None,
            source: SourceKind::Mock,
        }
    }

    #[test]
    fn test_worked_example() {
        // ci=200, pue=1.4, energy=3.0 -> effective=280, cfp_g=840, cfp_kg=0.84
        let result = compute(&reading(200.0), 1.4, Some(3.0)).unwrap();
        assert_relative_eq!(result.effective_ci_gco2_per_kwh, 280.0);
        assert_relative_eq!(result.cfp_g.unwrap(), 840.0);
        assert_relative_eq!(result.cfp_kg.unwrap(), 0.84);
    }

    #[test]
    fn test_footprint_omitted_without_energy() {
        let result = compute(&reading(200.0), 1.4, None).unwrap();
        assert_relative_eq!(result.effective_ci_gco2_per_kwh, 280.0);
        assert!(result.cfp_g.is_none());
        assert!(result.cfp_kg.is_none());
    }

    #[test]
    fn test_effective_ci_non_negative_for_non_negative_inputs() {
        for ci in [0.0, 1.0, 150.0, 600.0, 1200.5] {
            for pue in [0.0, 1.0, 1.4, 2.0] {
                let result = compute(&reading(ci), pue, None).unwrap();
                assert!(result.effective_ci_gco2_per_kwh >= 0.0);
                assert_relative_eq!(result.effective_ci_gco2_per_kwh, ci * pue);
            }
        }
    }

    #[test]
    fn test_footprint_proportional_to_energy() {
        let r = reading(300.0);
        let one = compute(&r, 1.5, Some(1.0)).unwrap().cfp_g.unwrap();
        let five = compute(&r, 1.5, Some(5.0)).unwrap().cfp_g.unwrap();
        assert_relative_eq!(five, 5.0 * one);
    }

    #[test]
    fn test_kg_is_grams_over_thousand() {
        let result = compute(&reading(421.0), 1.23, Some(7.5)).unwrap();
        assert_relative_eq!(result.cfp_kg.unwrap(), result.cfp_g.unwrap() / 1000.0);
    }

    #[test]
    fn test_zero_energy_gives_zero_footprint() {
        let result = compute(&reading(400.0), 1.4, Some(0.0)).unwrap();
        assert_eq!(result.cfp_g, Some(0.0));
        assert_eq!(result.cfp_kg, Some(0.0));
    }

    #[test]
    fn test_negative_pue_rejected() {
        let err = compute(&reading(200.0), -0.1, None).unwrap_err();
        assert_eq!(err, InvalidInputError::NegativePue(-0.1));
    }

    #[test]
    fn test_negative_energy_rejected() {
        let err = compute(&reading(200.0), 1.4, Some(-2.0)).unwrap_err();
        assert_eq!(err, InvalidInputError::NegativeEnergy(-2.0));
    }

    #[test]
    fn test_resolution_order_request_site_default() {
        // Three inputs differing only in which level supplies a value
        assert_eq!(resolve_pue(Some(1.1), Some(1.2), 1.4), 1.1);
        assert_eq!(resolve_pue(None, Some(1.2), 1.4), 1.2);
        assert_eq!(resolve_pue(None, None, 1.4), 1.4);
    }

    #[test]
    fn test_reading_metadata_carried_through() {
        let r = IntensityReading {
            gco2_per_kwh: 250.0,
            valid_at: Utc::now(),
            zone: Some("NL".to_string()),
            source: SourceKind::ElectricityMaps,
        };
        let result = compute(&r, 1.4, None).unwrap();
        assert_eq!(result.source, SourceKind::ElectricityMaps);
        assert_eq!(result.zone.as_deref(), Some("NL"));
        assert_eq!(result.valid_at, r.valid_at);
        assert_eq!(result.ci_gco2_per_kwh, 250.0);
    }
}
