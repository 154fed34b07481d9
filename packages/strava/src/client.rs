//! HTTP client for the Strava v3 API.
//!
//! See <https://developers.strava.com/docs/reference/#api-Segments-exploreSegments>
//! and <https://developers.strava.com/docs/authentication/#refreshingexpiredaccesstokens>.

use std::time::Duration;

use nextclimb_segment_models::{BoundingBox, SegmentCandidate};
use serde::Deserialize;

use crate::credentials::{StravaCredential, TokenRefresher};
use crate::{ExploreQuery, SegmentProvider, StravaError};

/// Default REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";

/// Default OAuth token endpoint.
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum length of a response body kept in error messages.
const BODY_PREVIEW_LEN: usize = 500;

/// Connection settings for [`StravaClient`].
#[derive(Clone)]
pub struct StravaConfig {
    /// OAuth application client ID.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// REST API base URL.
    pub api_base_url: String,
    /// OAuth token endpoint.
    pub oauth_token_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for StravaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StravaConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("oauth_token_url", &self.oauth_token_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StravaConfig {
    /// Creates a config for the public Strava API.
    #[must_use]
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            oauth_token_url: DEFAULT_OAUTH_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `STRAVA_CLIENT_ID` and `STRAVA_CLIENT_SECRET` from the
    /// environment. `STRAVA_API_BASE_URL` and `STRAVA_OAUTH_TOKEN_URL`
    /// override the endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`StravaError::Config`] if either credential is unset.
    pub fn from_env() -> Result<Self, StravaError> {
        let client_id = required_env("STRAVA_CLIENT_ID")?;
        let client_secret = required_env("STRAVA_CLIENT_SECRET")?;

        let mut config = Self::new(&client_id, &client_secret);
        if let Ok(url) = std::env::var("STRAVA_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("STRAVA_OAUTH_TOKEN_URL") {
            config.oauth_token_url = url;
        }
        Ok(config)
    }
}

fn required_env(name: &str) -> Result<String, StravaError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StravaError::Config {
            message: format!("{name} environment variable not set"),
        })
}

/// Segment explorer response envelope.
#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    segments: Vec<SegmentCandidate>,
}

/// Strava API client.
#[derive(Debug, Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    config: StravaConfig,
}

impl StravaClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StravaError::Http`] if the HTTP client cannot be built.
    pub fn new(config: StravaConfig) -> Result<Self, StravaError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StravaError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(StravaError::Status {
            status: status.as_u16(),
            body: truncate(&body, BODY_PREVIEW_LEN),
        })
    }
}

#[async_trait::async_trait]
impl SegmentProvider for StravaClient {
    async fn explore(
        &self,
        access_token: &str,
        bounds: &BoundingBox,
        query: &ExploreQuery,
    ) -> Result<Vec<SegmentCandidate>, StravaError> {
        let url = format!("{}/segments/explore", self.config.api_base_url);
        log::debug!("Exploring segments in {}", bounds.to_query_string());

        let resp = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("bounds", bounds.to_query_string()),
                ("activity_type", query.activity_type.clone()),
                ("min_cat", query.min_category.to_string()),
                ("max_cat", query.max_category.to_string()),
            ])
            .send()
            .await?;

        let body: ExploreResponse = Self::check_status(resp).await?.json().await?;
        log::info!("Strava returned {} segments", body.segments.len());
        Ok(body.segments)
    }
}

#[async_trait::async_trait]
impl TokenRefresher for StravaClient {
    async fn refresh(&self, refresh_token: &str) -> Result<StravaCredential, StravaError> {
        let resp = self
            .http
            .post(&self.config.oauth_token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        Ok(Self::check_status(resp).await?.json().await?)
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explore_response() {
        let body = serde_json::json!({
            "segments": [{
                "id": 229_781,
                "resource_state": 2,
                "name": "Hawk Hill",
                "climb_category": 1,
                "climb_category_desc": "4",
                "avg_grade": 5.7,
                "start_latlng": [37.833_111_9, -122.483_435_6],
                "end_latlng": [37.828_072_2, -122.498_139_3],
                "elev_difference": 152.8,
                "distance": 2684.8,
                "points": "}g|eFnpqjVl@En@Md@HbAd@d@^h@Xx@VbARjBDh@OPQf@w@d@k@XKXDFPH\\EbGT`AV`@v@|@NTNb@?XOb@cAxAWLuE@eAFMBoAv@eBt@q@b@}@tAeAt@i@dAC`AFZj@dB?~@[h@MbAVn@b@b@\\d@E`Bm@b@Q`AClCD",
                "starred": false
            }]
        });

        let parsed: ExploreResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        let hawk = &parsed.segments[0];
        assert_eq!(hawk.id, 229_781);
        assert_eq!(hawk.name, "Hawk Hill");
        assert_eq!(hawk.climb_category_desc, "4");
        assert!((hawk.elev_difference - 152.8).abs() < 1e-9);
    }

    #[test]
    fn missing_segments_field_is_empty() {
        let parsed: ExploreResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.segments.is_empty());
    }

    #[test]
    fn parses_token_response() {
        let body = serde_json::json!({
            "token_type": "Bearer",
            "access_token": "a9b723",
            "expires_at": 1_568_775_134,
            "expires_in": 20_566,
            "refresh_token": "b5c569"
        });
        let credential: StravaCredential = serde_json::from_value(body).unwrap();
        assert_eq!(credential.access_token, "a9b723");
        assert_eq!(credential.refresh_token, "b5c569");
        assert_eq!(credential.expires_at, 1_568_775_134);
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn debug_redacts_secret() {
        let config = StravaConfig::new("12345", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("12345"));
        assert!(!debug.contains("hunter2"));
    }
}
