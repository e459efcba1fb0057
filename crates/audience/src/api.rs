//! API seams the collector and resolver are written against.
//!
//! [`crate::github::GitHubClient`] implements both traits; tests swap in
//! scripted fakes.

use async_trait::async_trait;

use crate::github::error::GitHubError;
use crate::github::types::RepoMetadata;
use crate::locator::RepoRef;
use crate::profile::UserProfile;
use crate::relation::Relation;

/// Repository-level listing operations.
#[async_trait]
pub trait AudienceApi: Send + Sync {
    /// Fetch repository metadata, including the expected size of each
    /// membership listing.
    async fn repo_metadata(&self, repo: &RepoRef) -> Result<RepoMetadata, GitHubError>;

    /// Fetch one page (1-indexed) of a membership listing and return the
    /// usernames on it.
    async fn relation_page(
        &self,
        repo: &RepoRef,
        relation: Relation,
        page: u32,
    ) -> Result<Vec<String>, GitHubError>;
}

/// User profile lookup.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn user_profile(&self, username: &str) -> Result<UserProfile, GitHubError>;
}
