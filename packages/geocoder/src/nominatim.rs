//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance requires an identifying `User-Agent` and allows at
//! most one request per second; results are cached by the caller so a
//! location is only looked up once.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use nextclimb_segment_models::Coordinate;

use crate::{GeocodeError, GeocodeProvider};

/// Free-form Nominatim search client.
#[derive(Debug, Clone)]
pub struct NominatimProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimProvider {
    /// Builds a client for `base_url` that identifies itself as
    /// `user_agent` and gives up on requests after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl GeocodeProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !resp.status().is_success() {
            return Err(GeocodeError::Parse {
                message: format!("Nominatim returned status {}", resp.status()),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim `jsonv2` search response.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinate>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    if let Some(name) = first["display_name"].as_str() {
        log::debug!("Nominatim matched {name}");
    }

    Ok(Some(Coordinate::new(lat, lon)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "37.3361663",
            "lon": "-121.890591",
            "display_name": "San Jose, Santa Clara County, California, United States"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 37.336_166_3).abs() < 1e-6);
        assert!((result.longitude - -121.890_591).abs() < 1e-6);
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({"error": "Unable to geocode"});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_or_invalid_coordinates() {
        let missing = serde_json::json!([{ "lat": "37.33" }]);
        assert!(matches!(
            parse_response(&missing),
            Err(GeocodeError::Parse { .. })
        ));

        let out_of_range = serde_json::json!([{ "lat": "137.33", "lon": "-121.89" }]);
        assert!(matches!(
            parse_response(&out_of_range),
            Err(GeocodeError::InvalidCoordinate(_))
        ));
    }
}
