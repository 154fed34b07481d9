#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for NextClimb.
//!
//! Serves climb segment search: a free-text location is geocoded, a
//! search box is derived around it, and scored Strava segments inside the
//! box are returned. Results are cached in memory per grid-aligned search
//! area; geocodes and refreshed Strava tokens are persisted to JSON files.

pub mod config;
mod handlers;
pub mod search;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use nextclimb_cache::{JsonFileStore, MemoryStore, SegmentCache};
use nextclimb_geocoder::{Geocoder, service_registry};
use nextclimb_strava::{StravaClient, StravaConfig, StravaCredential, StravaCredentialStore};

use crate::config::ServerConfig;
use crate::search::SearchService;

/// Shared application state.
pub struct AppState {
    /// Search orchestration over the geocoder, cache and Strava.
    pub search: SearchService,
}

/// Starts the NextClimb API server.
///
/// Opens the geocode cache, builds the geocoding provider from the
/// embedded service registry, loads Strava credentials, and starts the
/// Actix-Web HTTP server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the geocode cache cannot be opened, no geocoding service is
/// enabled, or the Strava client or credentials are not configured.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!(
        "Opening geocode cache at {}...",
        config.geocode_cache_path.display()
    );
    let geocode_store = JsonFileStore::open(config.geocode_cache_path.clone())
        .await
        .expect("Failed to open geocode cache");

    let service = service_registry::preferred_service().expect("No enabled geocoding service");
    log::info!("Geocoding with {} ({})", service.name, service.base_url());
    let geocoder = Geocoder::new(
        service
            .build_provider()
            .expect("Failed to build geocoding provider"),
        Arc::new(geocode_store),
    );

    log::info!("Loading Strava credentials...");
    let strava = Arc::new(
        StravaClient::new(StravaConfig::from_env().expect("Strava client is not configured"))
            .expect("Failed to build Strava client"),
    );
    let seed = StravaCredential::from_env()
        .map_err(|e| log::warn!("{e}"))
        .ok();
    let credentials =
        StravaCredentialStore::open(strava.clone(), config.credentials_path.clone(), seed)
            .await
            .expect("Failed to load Strava credentials");

    let segment_store = Arc::new(MemoryStore::new());
    spawn_cache_purge(segment_store.clone(), config.purge_interval);

    let state = web::Data::new(AppState {
        search: SearchService::new(
            geocoder,
            SegmentCache::new(segment_store),
            Arc::new(credentials),
            strava,
        ),
    });

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(handlers::query_config())
            .app_data(handlers::json_config())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/segments/search", web::get().to(handlers::search))
                    .route("/segments/explore", web::post().to(handlers::explore)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Periodically drops expired segment cache entries.
fn spawn_cache_purge(store: Arc<MemoryStore>, period: Duration) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            match store.purge_expired() {
                Ok(0) => {}
                Ok(n) => log::info!("Purged {n} expired segment cache entries"),
                Err(e) => log::warn!("Segment cache purge failed: {e}"),
            }
        }
    });
}
