//! Delegated Strava OAuth credentials.
//!
//! Strava access tokens live for six hours and every refresh may rotate
//! the refresh token as well, so the latest pair is persisted to disk
//! when a path is configured. Refreshing happens only through
//! [`CredentialStore::refresh_if_needed`], which the search pipeline
//! calls once before talking to Strava.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::StravaError;

/// Refresh when the access token expires within this window.
pub const REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Errors from loading, refreshing, or persisting credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The OAuth refresh call failed.
    #[error("Token refresh failed: {0}")]
    Refresh(#[from] StravaError),

    /// Reading or writing the credentials file failed.
    #[error("Credentials file error: {0}")]
    Io(#[from] std::io::Error),

    /// The credentials file is not valid JSON.
    #[error("Credentials file is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// No credentials were found on disk or in the environment.
    #[error("No Strava credentials configured: {message}")]
    Missing {
        /// What was looked for.
        message: String,
    },
}

/// An OAuth access/refresh token pair.
///
/// Deserializes directly from Strava's token endpoint response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StravaCredential {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token used to obtain the next access token.
    pub refresh_token: String,
    /// Access token expiry as a Unix timestamp (seconds).
    pub expires_at: i64,
}

impl std::fmt::Debug for StravaCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StravaCredential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl StravaCredential {
    /// Reads `STRAVA_ACCESS_TOKEN`, `STRAVA_REFRESH_TOKEN` and the optional
    /// `STRAVA_EXPIRES_AT` from the environment.
    ///
    /// A missing `STRAVA_EXPIRES_AT` is treated as already expired so the
    /// first search refreshes the pair.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Missing`] if either token is unset.
    pub fn from_env() -> Result<Self, CredentialError> {
        let token = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CredentialError::Missing {
                    message: format!("{name} environment variable not set"),
                })
        };

        let access_token = token("STRAVA_ACCESS_TOKEN")?;
        let refresh_token = token("STRAVA_REFRESH_TOKEN")?;
        let expires_at = std::env::var("STRAVA_EXPIRES_AT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(Self {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Whether the access token expires within `buffer` of `now`
    /// (Unix seconds). Already-expired tokens count.
    #[must_use]
    pub fn expires_within(&self, now: i64, buffer: Duration) -> bool {
        let buffer = i64::try_from(buffer.as_secs()).unwrap_or(i64::MAX);
        self.expires_at.saturating_sub(now) <= buffer
    }
}

/// Exchanges a refresh token for a new credential pair.
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Performs the OAuth refresh grant.
    ///
    /// # Errors
    ///
    /// Returns [`StravaError`] if the token endpoint rejects the request.
    async fn refresh(&self, refresh_token: &str) -> Result<StravaCredential, StravaError>;
}

/// Holder of the current access token.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current credential without refreshing it.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if no credential is available.
    async fn current(&self) -> Result<StravaCredential, CredentialError>;

    /// Refreshes the credential if it expires within `buffer`.
    /// Returns whether a refresh happened.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Refresh`] if a needed refresh fails.
    async fn refresh_if_needed(&self, buffer: Duration) -> Result<bool, CredentialError>;
}

/// [`CredentialStore`] backed by an in-memory pair and an optional JSON
/// file.
pub struct StravaCredentialStore {
    refresher: Arc<dyn TokenRefresher>,
    path: Option<PathBuf>,
    state: RwLock<StravaCredential>,
}

impl StravaCredentialStore {
    /// Loads the credential from `path` if that file exists, falling back
    /// to `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the file is unreadable or malformed,
    /// or if neither source has a credential.
    pub async fn open(
        refresher: Arc<dyn TokenRefresher>,
        path: Option<PathBuf>,
        seed: Option<StravaCredential>,
    ) -> Result<Self, CredentialError> {
        let persisted = match &path {
            Some(path) => load(path).await?,
            None => None,
        };

        let credential = match (persisted, seed) {
            (Some(credential), _) => {
                log::info!("Loaded Strava credentials from {}", display(path.as_deref()));
                credential
            }
            (None, Some(seed)) => seed,
            (None, None) => {
                return Err(CredentialError::Missing {
                    message: "no credentials file and no STRAVA_ACCESS_TOKEN/STRAVA_REFRESH_TOKEN"
                        .to_string(),
                });
            }
        };

        Ok(Self {
            refresher,
            path,
            state: RwLock::new(credential),
        })
    }

    async fn persist(&self, credential: &StravaCredential) -> Result<(), CredentialError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(credential)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Option<StravaCredential>, CredentialError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn display(path: Option<&Path>) -> String {
    path.map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
}

#[async_trait::async_trait]
impl CredentialStore for StravaCredentialStore {
    async fn current(&self) -> Result<StravaCredential, CredentialError> {
        Ok(self.state.read().await.clone())
    }

    async fn refresh_if_needed(&self, buffer: Duration) -> Result<bool, CredentialError> {
        let now = chrono::Utc::now().timestamp();
        if !self.state.read().await.expires_within(now, buffer) {
            return Ok(false);
        }

        let mut state = self.state.write().await;
        // Another request may have refreshed while we waited for the lock.
        if !state.expires_within(now, buffer) {
            return Ok(false);
        }

        log::info!("Strava access token expires at {}, refreshing", state.expires_at);
        let refreshed = self.refresher.refresh(&state.refresh_token).await?;

        if let Err(e) = self.persist(&refreshed).await {
            log::error!(
                "Failed to persist refreshed Strava credentials to {}: {e}",
                display(self.path.as_deref())
            );
        }

        *state = refreshed;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FakeRefresher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeRefresher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, refresh_token: &str) -> Result<StravaCredential, StravaError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(StravaError::Status {
                    status: 401,
                    body: "Authorization Error".to_string(),
                });
            }
            Ok(StravaCredential {
                access_token: format!("access-{n}"),
                refresh_token: format!("{refresh_token}-rotated"),
                expires_at: chrono::Utc::now().timestamp() + 21_600,
            })
        }
    }

    fn credential(expires_at: i64) -> StravaCredential {
        StravaCredential {
            access_token: "access-0".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("nextclimb-credentials-{}-{name}", std::process::id()))
            .join("strava.json")
    }

    #[test]
    fn expiry_window_is_inclusive() {
        let cred = credential(1_000);
        assert!(cred.expires_within(700, REFRESH_BUFFER));
        assert!(!cred.expires_within(699, REFRESH_BUFFER));
        assert!(cred.expires_within(2_000, REFRESH_BUFFER));
    }

    #[test]
    fn debug_redacts_tokens() {
        let debug = format!("{:?}", credential(0));
        assert!(!debug.contains("access-0"));
        assert!(!debug.contains("\"refresh\""));
    }

    #[tokio::test]
    async fn fresh_token_is_not_refreshed() {
        let refresher = FakeRefresher::new(false);
        let far_future = chrono::Utc::now().timestamp() + 3_600;
        let store =
            StravaCredentialStore::open(refresher.clone(), None, Some(credential(far_future)))
                .await
                .unwrap();

        assert!(!store.refresh_if_needed(REFRESH_BUFFER).await.unwrap());
        assert_eq!(refresher.calls(), 0);
        assert_eq!(store.current().await.unwrap().access_token, "access-0");
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_once_and_persisted() {
        let path = temp_path("refresh");
        let _ = tokio::fs::remove_file(&path).await;

        let refresher = FakeRefresher::new(false);
        let store = StravaCredentialStore::open(
            refresher.clone(),
            Some(path.clone()),
            Some(credential(0)),
        )
        .await
        .unwrap();

        assert!(store.refresh_if_needed(REFRESH_BUFFER).await.unwrap());
        assert!(!store.refresh_if_needed(REFRESH_BUFFER).await.unwrap());
        assert_eq!(refresher.calls(), 1);

        let current = store.current().await.unwrap();
        assert_eq!(current.access_token, "access-1");
        assert_eq!(current.refresh_token, "refresh-rotated");

        // A reopened store prefers the persisted pair over the seed.
        let reopened =
            StravaCredentialStore::open(refresher, Some(path.clone()), Some(credential(0)))
                .await
                .unwrap();
        assert_eq!(reopened.current().await.unwrap(), current);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn failed_refresh_keeps_old_credential() {
        let store = StravaCredentialStore::open(FakeRefresher::new(true), None, Some(credential(0)))
            .await
            .unwrap();

        let err = store.refresh_if_needed(REFRESH_BUFFER).await.unwrap_err();
        assert!(matches!(
            err,
            CredentialError::Refresh(StravaError::Status { status: 401, .. })
        ));
        assert_eq!(store.current().await.unwrap().access_token, "access-0");
    }

    #[tokio::test]
    async fn open_without_any_source_fails() {
        let result = StravaCredentialStore::open(FakeRefresher::new(false), None, None).await;
        assert!(matches!(result, Err(CredentialError::Missing { .. })));
    }
}
