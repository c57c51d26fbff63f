//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! carbon-config.toml file. It provides a centralized way to configure the
//! default PUE, the site catalogue location, and the Electricity Maps source
//! settings, so the core never reads process-wide state ambiently: the loaded
//! `Config` is passed explicitly into the service and provider constructors.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API token.
///
/// Deployments usually inject the token via the environment rather than the
/// config file; the file value is a fallback for local development.
pub const TOKEN_ENV: &str = "ELECTRICITYMAPS_TOKEN";

/// Application configuration loaded from carbon-config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Footprint calculator configuration
    pub calculator: CalculatorConfig,
    /// Site catalogue configuration
    pub catalogue: CatalogueConfig,
    /// Real intensity source configuration
    pub source: SourceConfig,
}

/// Footprint calculator configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Global default PUE, used when neither the request nor the site
    /// catalogue supplies one
    pub default_pue: f64,
}

/// Site catalogue configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Path to the JSON site catalogue file
    pub path: PathBuf,
}

/// Electricity Maps source configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the carbon-intensity API
    pub api_base: String,
    /// API token; may be omitted on purpose when only mock mode is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Extra attempts after a failed call (0 = single attempt)
    pub retries: u32,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        CalculatorConfig { default_pue: 1.4 }
    }
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        CatalogueConfig {
            path: PathBuf::from("sites.json"),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            api_base: "https://api.electricitymap.org/v3/carbon-intensity".to_string(),
            token: None,
            timeout_secs: 20,
            retries: 2,
        }
    }
}

impl SourceConfig {
    /// Resolve the API token: environment variable first, then config file.
    /// Returns `None` when neither is set (mock-only deployment).
    pub fn resolved_token(&self) -> Option<String> {
        env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.clone())
    }
}

impl Config {
    /// Load configuration from carbon-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("carbon-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Invalid config file format: {}", e);
                    eprintln!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Info: No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to carbon-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("carbon-config.toml", contents)?;
        println!("Configuration saved to carbon-config.toml");
        Ok(())
    }
}
