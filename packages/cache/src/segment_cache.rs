//! Typed cache of scored segment search results.

use std::sync::Arc;
use std::time::Duration;

use nextclimb_segment_models::ScoredSegment;
use nextclimb_spatial::NormalizedCacheKey;

use crate::KeyValueStore;

/// How long a cached search result stays valid (24 hours).
pub const SEGMENT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Search results keyed by normalized bounding box.
///
/// Failures never surface to callers: a broken backend or an
/// undecodable entry reads as a miss, and a failed write is skipped.
#[derive(Clone)]
pub struct SegmentCache {
    store: Arc<dyn KeyValueStore>,
}

impl SegmentCache {
    /// Wraps `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the cached segments for `key`, if present and unexpired.
    pub async fn get(&self, key: &NormalizedCacheKey) -> Option<Vec<ScoredSegment>> {
        let raw = match self.store.get(key.as_str()).await {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Segment cache read failed for {key}, treating as miss: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(segments) => Some(segments),
            Err(e) => {
                log::warn!("Discarding undecodable segment cache entry {key}: {e}");
                None
            }
        }
    }

    /// Stores `segments` under `key` for [`SEGMENT_CACHE_TTL`].
    pub async fn set(&self, key: &NormalizedCacheKey, segments: &[ScoredSegment]) {
        let json = match serde_json::to_string(segments) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize segments for {key}: {e}");
                return;
            }
        };

        if let Err(e) = self
            .store
            .set(key.as_str(), json, Some(SEGMENT_CACHE_TTL))
            .await
        {
            log::warn!("Segment cache write failed for {key}: {e}");
        }
    }
}
