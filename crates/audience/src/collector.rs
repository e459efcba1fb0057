//! Audience collection: listings and profile resolution for one
//! repository.

use thiserror::Error;

use crate::api::{AudienceApi, UserApi};
use crate::cache::ProfileStore;
use crate::github::error::{GitHubError, short_error_message};
use crate::github::pagination::{FetchError, collect_pages};
use crate::locator::RepoRef;
use crate::profile::UserProfile;
use crate::progress::{ProgressCallback, Shutdown};
use crate::relation::Relation;
use crate::resolver::{ProfileResolver, ResolveError};
use crate::retry::with_retry;

/// Errors from collecting one repository's audience.
#[derive(Debug, Error)]
pub enum AudienceError {
    #[error(transparent)]
    Api(#[from] GitHubError),

    #[error(transparent)]
    Resolve(ResolveError),

    #[error("cancelled")]
    Cancelled,
}

impl AudienceError {
    /// Whether this error dooms collection for every other repository
    /// too. Non-fatal errors (a deleted repository, say) only fail the
    /// repository they occurred on.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Api(err) => err.is_rate_limited() || matches!(err, GitHubError::AuthRequired),
            Self::Resolve(err) => matches!(
                err,
                ResolveError::RateLimitExceeded { .. } | ResolveError::AuthRequired
            ),
            Self::Cancelled => true,
        }
    }
}

impl From<FetchError> for AudienceError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Api(e) => Self::Api(e),
            FetchError::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ResolveError> for AudienceError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Cancelled => Self::Cancelled,
            other => Self::Resolve(other),
        }
    }
}

/// What one repository's collection produced.
#[derive(Debug)]
pub struct AudienceReport {
    pub repository: RepoRef,
    /// Usernames fetched per relation.
    pub relation_totals: Vec<(Relation, usize)>,
    /// Usernames across all relations. A user appearing in several
    /// relations is counted once per relation; the audience is not
    /// deduplicated.
    pub total_usernames: usize,
    /// One profile per collected username, username-only where
    /// resolution degraded.
    pub profiles: Vec<UserProfile>,
    pub resolved: usize,
    pub unresolved: usize,
    pub cache_hits: usize,
}

/// Collect the audience of one repository.
///
/// Fetches each requested relation's listing, concatenates the usernames
/// in relation order, then resolves every username to a profile. Repeat
/// occurrences of a username are served by the cache after the first
/// resolution.
pub async fn collect_audience<A>(
    api: &A,
    store: &dyn ProfileStore,
    repo: &RepoRef,
    relations: &[Relation],
    shutdown: &Shutdown,
    on_progress: Option<&ProgressCallback>,
) -> Result<AudienceReport, AudienceError>
where
    A: AudienceApi + UserApi,
{
    let meta = with_retry(
        || api.repo_metadata(repo),
        GitHubError::is_transient,
        short_error_message,
        &repo.slug(),
        on_progress,
    )
    .await?;

    let mut relation_totals = Vec::with_capacity(relations.len());
    let mut usernames: Vec<String> = Vec::new();

    for &relation in relations {
        let expected_total = relation.expected_total(&meta);
        let batch =
            collect_pages(api, repo, relation, expected_total, shutdown, on_progress).await?;

        relation_totals.push((relation, batch.len()));
        usernames.extend(batch);
    }

    let slug = repo.slug();
    let resolver = ProfileResolver::new(api, store);
    let resolutions = resolver
        .resolve_all(&slug, &usernames, shutdown, on_progress)
        .await?;

    let resolved = resolutions.iter().filter(|r| r.is_resolved()).count();
    let cache_hits = resolutions.iter().filter(|r| r.is_from_cache()).count();
    let unresolved = resolutions.len() - resolved;
    let profiles = resolutions
        .into_iter()
        .map(|resolution| resolution.into_profile())
        .collect();

    Ok(AudienceReport {
        repository: repo.clone(),
        relation_totals,
        total_usernames: usernames.len(),
        profiles,
        resolved,
        unresolved,
        cache_hits,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryProfileStore;
    use crate::github::types::RepoMetadata;

    /// In-memory stand-in serving fixed listings and profiles.
    struct FixtureApi {
        meta: RepoMetadata,
        listings: HashMap<Relation, Vec<String>>,
        profiles: HashMap<String, UserProfile>,
        profile_calls: AtomicU32,
    }

    impl FixtureApi {
        fn new(meta: RepoMetadata) -> Self {
            Self {
                meta,
                listings: HashMap::new(),
                profiles: HashMap::new(),
                profile_calls: AtomicU32::new(0),
            }
        }

        fn listing(mut self, relation: Relation, usernames: &[&str]) -> Self {
            self.listings
                .insert(relation, usernames.iter().map(|s| s.to_string()).collect());
            self
        }

        fn profile(mut self, username: &str, email: Option<&str>) -> Self {
            let mut profile = UserProfile::bare(username);
            profile.email = email.map(String::from);
            self.profiles.insert(username.to_string(), profile);
            self
        }
    }

    #[async_trait]
    impl AudienceApi for FixtureApi {
        async fn repo_metadata(&self, _repo: &RepoRef) -> Result<RepoMetadata, GitHubError> {
            Ok(self.meta.clone())
        }

        async fn relation_page(
            &self,
            _repo: &RepoRef,
            relation: Relation,
            page: u32,
        ) -> Result<Vec<String>, GitHubError> {
            let listing = self.listings.get(&relation).cloned().unwrap_or_default();
            let start = ((page - 1) as usize) * 100;
            Ok(listing.into_iter().skip(start).take(100).collect())
        }
    }

    #[async_trait]
    impl UserApi for FixtureApi {
        async fn user_profile(&self, username: &str) -> Result<UserProfile, GitHubError> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            self.profiles
                .get(username)
                .cloned()
                .ok_or_else(|| GitHubError::NotFound(format!("/users/{username}")))
        }
    }

    fn repo() -> RepoRef {
        RepoRef::new("owner", "repo")
    }

    #[tokio::test]
    async fn concatenates_relations_without_deduplicating() {
        let api = FixtureApi::new(RepoMetadata {
            stargazers_count: 2,
            subscribers_count: 2,
            forks_count: 1,
        })
        .listing(Relation::Stargazers, &["alice", "bob"])
        .listing(Relation::Watchers, &["bob", "carol"])
        .listing(Relation::Forkers, &["alice"])
        .profile("alice", Some("alice@example.com"))
        .profile("bob", None)
        .profile("carol", Some("carol@example.com"));

        let store = MemoryProfileStore::new();
        let report = collect_audience(
            &api,
            &store,
            &repo(),
            &Relation::ALL,
            &Shutdown::new(),
            None,
        )
        .await
        .unwrap();

        // A user in several relations appears once per relation.
        assert_eq!(report.total_usernames, 5);
        assert_eq!(report.resolved, 5);
        assert_eq!(report.unresolved, 0);
        assert_eq!(
            report.relation_totals,
            vec![
                (Relation::Stargazers, 2),
                (Relation::Watchers, 2),
                (Relation::Forkers, 1),
            ]
        );

        let order: Vec<&str> = report
            .profiles
            .iter()
            .map(|p| p.username.as_str())
            .collect();
        assert_eq!(order, ["alice", "bob", "bob", "carol", "alice"]);

        // Repeat occurrences are served by the cache within the run.
        assert_eq!(report.cache_hits, 2);
        assert_eq!(api.profile_calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn missing_profiles_degrade_but_stay_in_the_audience() {
        let api = FixtureApi::new(RepoMetadata {
            stargazers_count: 2,
            subscribers_count: 0,
            forks_count: 0,
        })
        .listing(Relation::Stargazers, &["alice", "ghost"])
        .profile("alice", Some("alice@example.com"));

        let store = MemoryProfileStore::new();
        let report = collect_audience(
            &api,
            &store,
            &repo(),
            &[Relation::Stargazers],
            &Shutdown::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(report.resolved, 1);
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.profiles.len(), 2);
        assert_eq!(report.profiles[1], UserProfile::bare("ghost"));
        // Degraded lookups are not cached.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn second_run_is_served_from_cache() {
        let api = FixtureApi::new(RepoMetadata {
            stargazers_count: 1,
            subscribers_count: 0,
            forks_count: 0,
        })
        .listing(Relation::Stargazers, &["alice"])
        .profile("alice", Some("alice@example.com"));

        let store = MemoryProfileStore::new();
        let shutdown = Shutdown::new();

        let first = collect_audience(
            &api,
            &store,
            &repo(),
            &[Relation::Stargazers],
            &shutdown,
            None,
        )
        .await
        .unwrap();
        assert_eq!(first.cache_hits, 0);

        let second = collect_audience(
            &api,
            &store,
            &repo(),
            &[Relation::Stargazers],
            &shutdown,
            None,
        )
        .await
        .unwrap();
        assert_eq!(second.cache_hits, 1);
        assert_eq!(api.profile_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_surfaces_as_cancelled() {
        let api = FixtureApi::new(RepoMetadata {
            stargazers_count: 1,
            subscribers_count: 0,
            forks_count: 0,
        })
        .listing(Relation::Stargazers, &["alice"]);

        let store = MemoryProfileStore::new();
        let shutdown = Shutdown::new();
        shutdown.cancel();

        let err = collect_audience(
            &api,
            &store,
            &repo(),
            &[Relation::Stargazers],
            &shutdown,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AudienceError::Cancelled));
        assert!(err.is_fatal());
    }

    #[test]
    fn fatality_classification() {
        let rate_limited = AudienceError::Api(GitHubError::RateLimited {
            reset_at: chrono::Utc::now(),
        });
        assert!(rate_limited.is_fatal());

        let auth = AudienceError::Api(GitHubError::AuthRequired);
        assert!(auth.is_fatal());

        let missing_repo =
            AudienceError::Api(GitHubError::NotFound("/repos/a/b".to_string()));
        assert!(!missing_repo.is_fatal());
    }
}
