//! Server configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default geocode cache file.
pub const DEFAULT_GEOCODE_CACHE_PATH: &str = "data/geocode_cache.json";

/// How often expired segment cache entries are swept.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(3_600);

/// Runtime settings for [`crate::run_server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`, default `8080`).
    pub port: u16,
    /// Persistent geocode cache (`GEOCODE_CACHE_PATH`).
    pub geocode_cache_path: PathBuf,
    /// Where refreshed Strava tokens are written (`STRAVA_CREDENTIALS_PATH`).
    /// Unset keeps them in memory only.
    pub credentials_path: Option<PathBuf>,
    /// Segment cache sweep interval.
    pub purge_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            geocode_cache_path: PathBuf::from(DEFAULT_GEOCODE_CACHE_PATH),
            credentials_path: None,
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT {raw:?}, using {}", defaults.port);
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            geocode_cache_path: var("GEOCODE_CACHE_PATH")
                .map_or(defaults.geocode_cache_path, PathBuf::from),
            credentials_path: var("STRAVA_CREDENTIALS_PATH").map(PathBuf::from),
            purge_interval: defaults.purge_interval,
        }
    }
}
