//! Profile resolution: cache-first lookup with retry and degradation.

use thiserror::Error;

use crate::api::UserApi;
use crate::cache::{CacheError, ProfileStore};
use crate::github::error::{GitHubError, short_error_message};
use crate::profile::UserProfile;
use crate::progress::{FetchProgress, ProgressCallback, Shutdown, emit};
use crate::retry::with_retry;

/// Outcome of resolving one username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A full profile was obtained.
    Resolved {
        profile: UserProfile,
        /// Whether it came from the local cache rather than a remote call.
        from_cache: bool,
    },

    /// The profile could not be obtained; the username is still part of
    /// the audience.
    Unresolved { username: String, error: String },
}

impl Resolution {
    /// The profile to export: the resolved one, or a username-only
    /// record for a degraded resolution.
    pub fn into_profile(self) -> UserProfile {
        match self {
            Resolution::Resolved { profile, .. } => profile,
            Resolution::Unresolved { username, .. } => UserProfile::bare(username),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn is_from_cache(&self) -> bool {
        matches!(
            self,
            Resolution::Resolved {
                from_cache: true,
                ..
            }
        )
    }
}

/// Errors that abort resolution entirely.
///
/// Per-username failures degrade to [`Resolution::Unresolved`] instead;
/// only conditions that doom every remaining lookup land here.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Rate limit exceeded. Resets at {reset_at} (~{wait_minutes} min)")]
    RateLimitExceeded {
        reset_at: chrono::DateTime<chrono::Utc>,
        wait_minutes: i64,
    },

    #[error("Authentication required or token rejected")]
    AuthRequired,

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("cancelled")]
    Cancelled,
}

/// Resolves usernames to enriched profiles through a cache-first lookup.
pub struct ProfileResolver<'a> {
    api: &'a dyn UserApi,
    store: &'a dyn ProfileStore,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(api: &'a dyn UserApi, store: &'a dyn ProfileStore) -> Self {
        Self { api, store }
    }

    /// Resolve one username within a repository's cache partition.
    ///
    /// A cache hit makes no remote call. A miss fetches the profile,
    /// retrying transient failures, and caches the result. Exhausted
    /// retries and missing users degrade to [`Resolution::Unresolved`];
    /// rate limit exhaustion and auth rejection abort instead, since no
    /// later lookup can succeed either.
    pub async fn resolve_one(
        &self,
        repository: &str,
        username: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Resolution, ResolveError> {
        if let Some(profile) = self.store.get(repository, username).await? {
            emit(
                on_progress,
                FetchProgress::ProfileResolved {
                    username: username.to_string(),
                    from_cache: true,
                },
            );
            return Ok(Resolution::Resolved {
                profile,
                from_cache: true,
            });
        }

        let fetched = with_retry(
            || self.api.user_profile(username),
            GitHubError::is_transient,
            short_error_message,
            username,
            on_progress,
        )
        .await;

        match fetched {
            Ok(profile) => {
                self.store.put(repository, &profile).await?;
                emit(
                    on_progress,
                    FetchProgress::ProfileResolved {
                        username: username.to_string(),
                        from_cache: false,
                    },
                );
                Ok(Resolution::Resolved {
                    profile,
                    from_cache: false,
                })
            }
            Err(GitHubError::RateLimited { reset_at }) => {
                let secs = (reset_at - chrono::Utc::now()).num_seconds().max(0);
                Err(ResolveError::RateLimitExceeded {
                    reset_at,
                    wait_minutes: (secs + 59) / 60,
                })
            }
            Err(GitHubError::AuthRequired) => Err(ResolveError::AuthRequired),
            Err(err) => {
                let error = short_error_message(&err);
                emit(
                    on_progress,
                    FetchProgress::ProfileUnresolved {
                        username: username.to_string(),
                        error: error.clone(),
                    },
                );
                Ok(Resolution::Unresolved {
                    username: username.to_string(),
                    error,
                })
            }
        }
    }

    /// Resolve a batch of usernames in order.
    ///
    /// Cancellation is checked between usernames; profiles already
    /// cached by earlier iterations stay cached.
    pub async fn resolve_all(
        &self,
        repository: &str,
        usernames: &[String],
        shutdown: &Shutdown,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Resolution>, ResolveError> {
        emit(
            on_progress,
            FetchProgress::ResolvingProfiles {
                total: usernames.len(),
            },
        );

        let mut resolutions = Vec::with_capacity(usernames.len());
        let mut resolved = 0usize;
        let mut unresolved = 0usize;
        let mut cache_hits = 0usize;

        for username in usernames {
            if shutdown.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            let resolution = self.resolve_one(repository, username, on_progress).await?;
            if resolution.is_resolved() {
                resolved += 1;
                if resolution.is_from_cache() {
                    cache_hits += 1;
                }
            } else {
                unresolved += 1;
            }
            resolutions.push(resolution);
        }

        emit(
            on_progress,
            FetchProgress::ResolutionComplete {
                resolved,
                unresolved,
                cache_hits,
            },
        );

        Ok(resolutions)
    }
}
