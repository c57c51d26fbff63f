//! # Carbon Ranker Application Entry Point
//!
//! Development binary around the core library: loads configuration and the
//! site catalogue, runs a full-catalogue ranking, and prints the result as a
//! text table. The production surface is the HTTP layer (a separate
//! deployment unit) calling the same [`Service`] operations.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use std::env;

use carbon_ranker_lib::catalogue::Catalogue;
use carbon_ranker_lib::config::Config;
use carbon_ranker_lib::report;
use carbon_ranker_lib::service::{RankRequest, Service};

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    // --mock: rank with synthetic intensity values instead of the API
    let use_mock = args.iter().any(|arg| arg == "--mock");

    // --energy <kWh>: add absolute footprint columns to the report
    let energy_kwh = args
        .windows(2)
        .find(|pair| pair[0] == "--energy")
        .map(|pair| pair[1].parse::<f64>())
        .transpose()
        .context("--energy expects a number of kWh")?;

    // --config <path>: alternative config file location
    let config = match args.windows(2).find(|pair| pair[0] == "--config") {
        Some(pair) => Config::load_from_path(&pair[1]),
        None => Config::load(),
    };

    // A missing or corrupt catalogue is fatal: ranking against a partial
    // catalogue would silently drop candidate sites.
    let catalogue = Catalogue::load(&config.catalogue.path).with_context(|| {
        format!(
            "loading site catalogue from {}",
            config.catalogue.path.display()
        )
    })?;
    eprintln!("Loaded {} sites from catalogue", catalogue.len());

    let service = Service::new(config, catalogue);
    let ranking = service.rank_sites(&RankRequest {
        start_time: None,
        pue: None,
        use_mock,
        energy_kwh,
    })?;

    report::draw(&ranking);
    Ok(())
}
