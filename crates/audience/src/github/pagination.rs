//! Paging through a membership listing.

use thiserror::Error;

use super::error::{GitHubError, short_error_message};
use crate::api::AudienceApi;
use crate::locator::RepoRef;
use crate::progress::{FetchProgress, ProgressCallback, Shutdown, emit};
use crate::relation::Relation;
use crate::retry::with_retry;

/// Errors from paging through a listing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] GitHubError),

    #[error("cancelled")]
    Cancelled,
}

/// Collect every username in one membership listing.
///
/// Requests pages of [`PER_PAGE`](super::client::PER_PAGE) starting from
/// page 1 and stops once the
/// running total reaches `expected_total` or a page comes back empty,
/// whichever happens first. The expected total is a snapshot taken before
/// paging starts, so the result can overshoot it by at most one page when
/// the listing grows mid-fetch; the empty-page stop covers shrinking
/// listings.
///
/// Each page fetch is retried on transient errors. Cancellation is
/// checked between pages; usernames from pages already fetched are
/// dropped with the [`FetchError::Cancelled`] return.
pub async fn collect_pages<A>(
    api: &A,
    repo: &RepoRef,
    relation: Relation,
    expected_total: usize,
    shutdown: &Shutdown,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<String>, FetchError>
where
    A: AudienceApi + ?Sized,
{
    emit(
        on_progress,
        FetchProgress::FetchingRelation {
            relation,
            expected_total,
        },
    );

    let subject = format!("{} {}", repo, relation);
    let mut usernames: Vec<String> = Vec::with_capacity(expected_total);
    let mut page = 1u32;

    while usernames.len() < expected_total {
        if shutdown.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let batch = with_retry(
            || api.relation_page(repo, relation, page),
            GitHubError::is_transient,
            short_error_message,
            &subject,
            on_progress,
        )
        .await?;

        let count = batch.len();
        usernames.extend(batch);

        emit(
            on_progress,
            FetchProgress::FetchedPage {
                relation,
                page,
                count,
                total_so_far: usernames.len(),
            },
        );

        // An empty page means the listing shrank below the snapshot.
        if count == 0 {
            break;
        }

        page += 1;
    }

    emit(
        on_progress,
        FetchProgress::RelationComplete {
            relation,
            total: usernames.len(),
        },
    );

    Ok(usernames)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::github::types::RepoMetadata;

    /// Serves scripted listing pages and counts calls.
    struct PagedApi {
        pages: Vec<Vec<String>>,
        calls: AtomicU32,
        failures_before_success: AtomicU32,
    }

    impl PagedApi {
        fn new(pages: Vec<Vec<String>>) -> Self {
            Self {
                pages,
                calls: AtomicU32::new(0),
                failures_before_success: AtomicU32::new(0),
            }
        }

        fn failing_first(mut self, failures: u32) -> Self {
            self.failures_before_success = AtomicU32::new(failures);
            self
        }
    }

    #[async_trait]
    impl AudienceApi for PagedApi {
        async fn repo_metadata(&self, _repo: &RepoRef) -> Result<RepoMetadata, GitHubError> {
            unreachable!("not used by pagination")
        }

        async fn relation_page(
            &self,
            _repo: &RepoRef,
            _relation: Relation,
            page: u32,
        ) -> Result<Vec<String>, GitHubError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_before_success
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(GitHubError::Network("connection reset".to_string()));
            }
            Ok(self
                .pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn repo() -> RepoRef {
        RepoRef::new("owner", "repo")
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[tokio::test]
    async fn stops_once_expected_total_is_reached() {
        let api = PagedApi::new(vec![names("a", 100), names("b", 100), names("c", 100)]);

        let usernames = collect_pages(
            &api,
            &repo(),
            Relation::Stargazers,
            150,
            &Shutdown::new(),
            None,
        )
        .await
        .unwrap();

        // Two pages cover a snapshot of 150; the third is never requested.
        assert_eq!(usernames.len(), 200);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_page_ends_a_shrunken_listing() {
        let api = PagedApi::new(vec![names("a", 100), vec![]]);

        let usernames = collect_pages(
            &api,
            &repo(),
            Relation::Stargazers,
            250,
            &Shutdown::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(usernames.len(), 100);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_expected_total_makes_no_requests() {
        let api = PagedApi::new(vec![]);

        let usernames = collect_pages(
            &api,
            &repo(),
            Relation::Watchers,
            0,
            &Shutdown::new(),
            None,
        )
        .await
        .unwrap();

        assert!(usernames.is_empty());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_page_failures_are_retried() {
        let api = PagedApi::new(vec![names("a", 3)]).failing_first(2);

        let advancer = tokio::spawn(async {
            for _ in 0..30 {
                tokio::time::advance(std::time::Duration::from_secs(60)).await;
                tokio::task::yield_now().await;
            }
        });

        let usernames = collect_pages(
            &api,
            &repo(),
            Relation::Forkers,
            3,
            &Shutdown::new(),
            None,
        )
        .await
        .unwrap();

        advancer.await.expect("advancer task");

        assert_eq!(usernames.len(), 3);
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_first_page() {
        let api = PagedApi::new(vec![names("a", 100)]);
        let shutdown = Shutdown::new();
        shutdown.cancel();

        let err = collect_pages(&api, &repo(), Relation::Stargazers, 100, &shutdown, None)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn progress_events_cover_start_pages_and_completion() {
        let api = PagedApi::new(vec![names("a", 2)]);

        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let capture = std::sync::Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |event| {
            capture.lock().unwrap_or_else(|e| e.into_inner()).push(event);
        });

        collect_pages(
            &api,
            &repo(),
            Relation::Stargazers,
            2,
            &Shutdown::new(),
            Some(&callback),
        )
        .await
        .unwrap();

        let seen = seen.lock().unwrap_or_else(|e| e.into_inner());
        assert!(matches!(
            seen.as_slice(),
            [
                FetchProgress::FetchingRelation {
                    expected_total: 2,
                    ..
                },
                FetchProgress::FetchedPage {
                    page: 1,
                    count: 2,
                    total_so_far: 2,
                    ..
                },
                FetchProgress::RelationComplete { total: 2, .. },
            ]
        ));
    }
}
