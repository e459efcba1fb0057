//! Response shapes for the GitHub REST endpoints this crate touches.
//!
//! Only the fields we read are declared; serde ignores the rest.

use serde::Deserialize;

use crate::profile::UserProfile;

/// Repository metadata, fetched once per repository to learn the
/// expected size of each membership listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub stargazers_count: usize,
    /// Watcher count. `watchers_count` is a legacy alias for stars, so
    /// the subscriber count is the one that matches the listing.
    #[serde(default)]
    pub subscribers_count: usize,
    #[serde(default)]
    pub forks_count: usize,
}

/// One entry of a stargazer or subscriber listing page.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationEntry {
    pub login: String,
}

/// One entry of a fork listing page. Forks are repositories, so the
/// username lives under `owner`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForkEntry {
    pub owner: Option<RelationEntry>,
}

/// The `/users/{username}` response, reduced to the enrichment fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "blog")]
    pub website: Option<String>,
    #[serde(rename = "company")]
    pub organization: Option<String>,
    pub location: Option<String>,
}

impl UserResponse {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            username: self.login,
            name: self.name,
            email: self.email,
            website: self.website,
            organization: self.organization,
            location: self.location,
        }
    }
}

/// One resource window of the `/rate_limit` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResource {
    pub limit: usize,
    pub remaining: usize,
    pub used: usize,
    /// Unix timestamp of the window reset.
    pub reset: i64,
}

/// The `/rate_limit` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
    pub search: Option<RateLimitResource>,
    pub graphql: Option<RateLimitResource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_metadata_missing_counts_default_to_zero() {
        let meta: RepoMetadata = serde_json::from_str(r#"{"stargazers_count": 5}"#).unwrap();
        assert_eq!(meta.stargazers_count, 5);
        assert_eq!(meta.subscribers_count, 0);
        assert_eq!(meta.forks_count, 0);
    }

    #[test]
    fn fork_entry_tolerates_deleted_owner() {
        let fork: ForkEntry = serde_json::from_str(r#"{"owner": null}"#).unwrap();
        assert!(fork.owner.is_none());

        let fork: ForkEntry =
            serde_json::from_str(r#"{"owner": {"login": "alice"}}"#).unwrap();
        assert_eq!(fork.owner.unwrap().login, "alice");
    }

    #[test]
    fn user_response_maps_blog_and_company() {
        let json = r#"{
            "login": "alice",
            "name": "Alice",
            "email": null,
            "blog": "https://alice.dev",
            "company": "@acme",
            "location": "Berlin",
            "public_repos": 12
        }"#;
        let user: UserResponse = serde_json::from_str(json).unwrap();
        let profile = user.into_profile();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.website.as_deref(), Some("https://alice.dev"));
        assert_eq!(profile.organization.as_deref(), Some("@acme"));
        assert!(profile.email.is_none());
    }

    #[test]
    fn rate_limit_response_parses_core_window() {
        let json = r#"{
            "resources": {
                "core": {"limit": 5000, "remaining": 4999, "used": 1, "reset": 1700000000},
                "search": {"limit": 30, "remaining": 30, "used": 0, "reset": 1700000000}
            }
        }"#;
        let response: RateLimitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.resources.core.remaining, 4999);
        assert!(response.resources.graphql.is_none());
    }
}
