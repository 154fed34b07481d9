#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Strava segment explorer client and delegated OAuth credentials.
//!
//! The search pipeline talks to Strava through two seams:
//!
//! - [`SegmentProvider`] lists the climbs inside a bounding box.
//! - [`credentials::CredentialStore`] holds the current access token and
//!   offers an explicit `refresh_if_needed` pre-flight that rotates it
//!   through the OAuth refresh grant shortly before it expires.
//!
//! [`client::StravaClient`] implements both the explorer call and the
//! token refresh against the real API.

pub mod client;
pub mod credentials;

use nextclimb_segment_models::{BoundingBox, SegmentCandidate};
use thiserror::Error;

pub use client::{StravaClient, StravaConfig};
pub use credentials::{
    CredentialError, CredentialStore, REFRESH_BUFFER, StravaCredential, StravaCredentialStore,
    TokenRefresher,
};

/// Errors from Strava API calls.
#[derive(Debug, Error)]
pub enum StravaError {
    /// HTTP request failed (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Strava answered with a non-success status.
    #[error("Strava returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Required configuration is missing.
    #[error("Configuration error: {message}")]
    Config {
        /// What is missing.
        message: String,
    },
}

/// Filters for a segment explorer query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreQuery {
    /// `"riding"` or `"running"`.
    pub activity_type: String,
    /// Lowest climb category to include.
    pub min_category: u8,
    /// Highest climb category to include.
    pub max_category: u8,
}

impl Default for ExploreQuery {
    fn default() -> Self {
        Self {
            activity_type: "riding".to_string(),
            min_category: 1,
            max_category: 4,
        }
    }
}

/// A source of climb segments inside a bounding box.
#[async_trait::async_trait]
pub trait SegmentProvider: Send + Sync {
    /// Lists the segments inside `bounds` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`StravaError`] if the request fails, times out, or is
    /// rejected.
    async fn explore(
        &self,
        access_token: &str,
        bounds: &BoundingBox,
        query: &ExploreQuery,
    ) -> Result<Vec<SegmentCandidate>, StravaError>;
}
