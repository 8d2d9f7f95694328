//! Application settings loading from config.toml
//!
//! Every field carries a serde default, so a partial file (or none at all when using
//! [`load_config_or_default`]) still produces a working catalog demo.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Synthetic inventory generation
    pub catalog: CatalogSettings,
    /// Catalog service latency, paging and search debounce
    pub query: QuerySettings,
    /// Offer store persistence and demo reset
    pub offers: OfferSettings,
}

/// Settings for the catalog generator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Number of raw unit records folded into groups
    pub unit_count: usize,
    /// Fixed RNG seed; `None` draws from entropy
    pub seed: Option<u64>,
    /// Share of newly created variants pre-seeded with a non-draft offer status
    pub seeded_offer_rate: f64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            unit_count: 600,
            seed: None,
            seeded_offer_rate: 0.20,
        }
    }
}

/// Settings for the simulated catalog service and its consumer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Artificial latency before a query answers, in milliseconds
    pub latency_ms: u64,
    /// Rows per page requested by the listing
    pub page_size: usize,
    /// Coalescing window for free-text search input, in milliseconds
    pub debounce_ms: u64,
}

impl QuerySettings {
    /// Latency as a [`Duration`]
    #[must_use]
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Debounce window as a [`Duration`]
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            latency_ms: 300,
            page_size: 10,
            debounce_ms: 300,
        }
    }
}

/// Settings for the offer lifecycle store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfferSettings {
    /// Key of the snapshot row in the `offer_state` table
    pub snapshot_key: String,
    /// How many variants the demo reset assigns an active status to
    pub demo_offer_count: usize,
    /// Buffered change events per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for OfferSettings {
    fn default() -> Self {
        Self {
            snapshot_key: "offerBuilderState".to_string(),
            demo_offer_count: 125,
            event_capacity: 64,
        }
    }
}

/// Loads application settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `path`, falling back to defaults when the file does not exist.
///
/// A file that exists but fails to parse is still an error.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_config(path_ref)
    } else {
        tracing::warn!(
            "No configuration file at {}, using defaults",
            path_ref.display()
        );
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [catalog]
            unit_count = 50
            seed = 7
            seeded_offer_rate = 0.5

            [query]
            latency_ms = 10
            page_size = 5
            debounce_ms = 150

            [offers]
            snapshot_key = "offerBuilderState_v3"
            demo_offer_count = 20
            event_capacity = 8
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.unit_count, 50);
        assert_eq!(config.catalog.seed, Some(7));
        assert_eq!(config.catalog.seeded_offer_rate, 0.5);
        assert_eq!(config.query.latency(), Duration::from_millis(10));
        assert_eq!(config.query.page_size, 5);
        assert_eq!(config.query.debounce(), Duration::from_millis(150));
        assert_eq!(config.offers.snapshot_key, "offerBuilderState_v3");
        assert_eq!(config.offers.demo_offer_count, 20);
        assert_eq!(config.offers.event_capacity, 8);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r"
            [query]
            page_size = 25
        ";

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.query.page_size, 25);
        assert_eq!(config.query.latency_ms, 300);
        assert_eq!(config.catalog.unit_count, 600);
        assert!(config.catalog.seed.is_none());
        assert_eq!(config.offers.snapshot_key, "offerBuilderState");
        assert_eq!(config.offers.demo_offer_count, 125);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("definitely/not/here/config.toml").unwrap();
        assert_eq!(config.catalog.unit_count, 600);
    }

    #[test]
    fn test_missing_file_is_error_for_strict_load() {
        let result = load_config("definitely/not/here/config.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
