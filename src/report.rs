//! # Ranking Report Rendering
//!
//! Plain-text rendering of a ranking for the development binary. One row per
//! site, best (lowest effective CI) first, with footprint columns only when
//! the request supplied an energy amount.

use crate::Ranking;

/// Render a ranking as an aligned text table.
pub fn render(ranking: &Ranking) -> String {
    let with_footprint = ranking
        .entries
        .iter()
        .any(|e| e.footprint.cfp_g.is_some());

    let name_width = ranking
        .entries
        .iter()
        .map(|e| e.site_name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    out.push_str(&format!(
        "Ranking for {} (ascending effective CI)\n",
        ranking.start_time.format("%Y-%m-%d %H:%M UTC")
    ));

    out.push_str(&format!(
        "{:>4}  {:<name_width$}  {:>10}  {:>5}  {:>12}",
        "rank", "site", "ci g/kWh", "pue", "eff. g/kWh"
    ));
    if with_footprint {
        out.push_str(&format!("  {:>10}  {:>8}", "cfp g", "cfp kg"));
    }
    out.push('\n');

    for entry in &ranking.entries {
        let fp = &entry.footprint;
        out.push_str(&format!(
            "{:>4}  {:<name_width$}  {:>10.1}  {:>5.2}  {:>12.1}",
            entry.rank, entry.site_name, fp.ci_gco2_per_kwh, fp.pue, fp.effective_ci_gco2_per_kwh
        ));
        if let (Some(g), Some(kg)) = (fp.cfp_g, fp.cfp_kg) {
            out.push_str(&format!("  {:>10.1}  {:>8.3}", g, kg));
        }
        out.push('\n');
    }

    if ranking.entries.is_empty() {
        out.push_str("(empty catalogue)\n");
    }

    out
}

/// Print a ranking table to stdout.
pub fn draw(ranking: &Ranking) {
    print!("{}", render(ranking));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FootprintResult, RankingEntry, SourceKind};
    use chrono::{TimeZone, Utc};

    fn entry(rank: usize, name: &str, ci: f64, energy: bool) -> RankingEntry {
        let effective = ci * 1.4;
        RankingEntry {
            rank,
            site_name: name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            footprint: FootprintResult {
                source: SourceKind::Mock,
                zone: None,
                valid_at: Utc.with_ymd_and_hms(2025, 5, 5, 13, 0, 0).unwrap(),
                ci_gco2_per_kwh: ci,
                pue: 1.4,
                effective_ci_gco2_per_kwh: effective,
                cfp_g: energy.then_some(effective * 3.0),
                cfp_kg: energy.then_some(effective * 3.0 / 1000.0),
            },
        }
    }

    #[test]
    fn test_render_lists_sites_in_rank_order() {
        let ranking = Ranking {
            start_time: Utc.with_ymd_and_hms(2025, 5, 5, 13, 0, 0).unwrap(),
            entries: vec![entry(1, "green-site", 150.0, false), entry(2, "coal-site", 600.0, false)],
        };
        let text = render(&ranking);
        let green = text.find("green-site").unwrap();
        let coal = text.find("coal-site").unwrap();
        assert!(green < coal);
        // No footprint columns without energy
        assert!(!text.contains("cfp"));
    }

    #[test]
    fn test_render_includes_footprint_columns_with_energy() {
        let ranking = Ranking {
            start_time: Utc.with_ymd_and_hms(2025, 5, 5, 13, 0, 0).unwrap(),
            entries: vec![entry(1, "a", 200.0, true)],
        };
        let text = render(&ranking);
        assert!(text.contains("cfp g"));
        assert!(text.contains("cfp kg"));
        assert!(text.contains("840.0"));
    }

    #[test]
    fn test_render_empty_ranking() {
        let ranking = Ranking {
            start_time: Utc.with_ymd_and_hms(2025, 5, 5, 13, 0, 0).unwrap(),
            entries: vec![],
        };
        let text = render(&ranking);
        assert!(text.contains("empty catalogue"));
    }
}
