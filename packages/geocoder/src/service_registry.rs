//! Geocoding provider settings, compiled in from `services/nominatim.toml`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::nominatim::NominatimProvider;
use crate::{GeocodeError, GeocodeProvider};

const NOMINATIM_TOML: &str = include_str!("../services/nominatim.toml");

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / `OpenStreetMap` free-form search.
    Nominatim {
        /// Search endpoint.
        base_url: String,
        /// `User-Agent` identifying this application to the provider.
        user_agent: String,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

impl GeocodingService {
    /// Parses a service definition.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if `toml_str` is malformed.
    pub fn parse(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(toml_str)
    }

    /// Returns the provider's base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } => base_url,
        }
    }

    /// Builds the provider client this service describes.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP client cannot be built.
    pub fn build_provider(&self) -> Result<Arc<dyn GeocodeProvider>, GeocodeError> {
        match &self.provider {
            ProviderConfig::Nominatim {
                base_url,
                user_agent,
                timeout_secs,
            } => Ok(Arc::new(NominatimProvider::new(
                base_url,
                user_agent,
                Duration::from_secs(*timeout_secs),
            )?)),
        }
    }
}

/// Returns the embedded service if it parses and is enabled.
#[must_use]
pub fn preferred_service() -> Option<GeocodingService> {
    match GeocodingService::parse(NOMINATIM_TOML) {
        Ok(service) if service.enabled => Some(service),
        Ok(service) => {
            log::warn!("Geocoding service {} is disabled", service.id);
            None
        }
        Err(e) => {
            log::error!("Failed to parse embedded geocoding service: {e}");
            None
        }
    }
}
