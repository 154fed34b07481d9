//! HTTP handler functions for the NextClimb API.

use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use nextclimb_server_models::{
    ApiError, ApiHealth, ApiSearchResponse, ExploreBoundsRequest, SearchParams,
};

use crate::AppState;
use crate::search::{SearchError, SearchOutcome, bounds_from_corners};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/segments/search`
///
/// Scored climbs within `radius` miles of `location`, cached per search
/// area for 24 hours.
pub async fn search(state: web::Data<AppState>, params: web::Query<SearchParams>) -> HttpResponse {
    log::info!(
        "Segment search location={:?} radius={}",
        params.location,
        params.radius
    );

    respond(
        state
            .search
            .search(&params.location, f64::from(params.radius))
            .await,
    )
}

/// `POST /api/segments/explore`
///
/// Scored climbs inside an explicit box. Never cached.
pub async fn explore(
    state: web::Data<AppState>,
    body: web::Json<ExploreBoundsRequest>,
) -> HttpResponse {
    let bounds = match bounds_from_corners(body.sw_lat, body.sw_lng, body.ne_lat, body.ne_lng) {
        Ok(bounds) => bounds,
        Err(e) => return error_response(&e),
    };

    respond(state.search.explore(&bounds).await)
}

fn respond(result: Result<SearchOutcome, SearchError>) -> HttpResponse {
    match result {
        Ok(outcome) => {
            HttpResponse::Ok().json(ApiSearchResponse::new(outcome.source, outcome.segments))
        }
        Err(e) => error_response(&e),
    }
}

/// Query extractor config that answers malformed query strings with a
/// JSON 400 instead of actix's plain-text body.
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request(err.to_string());
        InternalError::from_response(err, response).into()
    })
}

/// JSON body extractor config, same treatment as [`query_config`].
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(err.to_string());
        InternalError::from_response(err, response).into()
    })
}

fn bad_request(error: String) -> HttpResponse {
    log::info!("Rejected malformed request: {error}");
    HttpResponse::BadRequest().json(ApiError { error })
}

/// Maps a [`SearchError`] to its status code and `{"error": ...}` body.
fn error_response(err: &SearchError) -> HttpResponse {
    let body = ApiError {
        error: err.to_string(),
    };

    match err {
        SearchError::Bounds(_)
        | SearchError::InvalidCoordinate(_)
        | SearchError::InvertedBounds { .. } => {
            log::info!("Rejected search: {err}");
            HttpResponse::BadRequest().json(body)
        }
        SearchError::LocationNotFound { .. } => {
            log::info!("{err}");
            HttpResponse::NotFound().json(body)
        }
        SearchError::Credentials(_)
        | SearchError::Provider(_)
        | SearchError::ProviderTimeout(_) => {
            log::error!("Search failed: {err}");
            HttpResponse::BadGateway().json(body)
        }
    }
}
