//! GitHub REST client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use super::error::GitHubError;
use super::types::{ForkEntry, RateLimitResponse, RelationEntry, RepoMetadata, UserResponse};
use crate::api::{AudienceApi, UserApi};
use crate::locator::RepoRef;
use crate::profile::UserProfile;
use crate::relation::Relation;

const API_BASE: &str = "https://api.github.com";

/// Listing pages are requested at the API maximum.
pub const PER_PAGE: usize = 100;

/// Parse the reset time from the `x-ratelimit-reset` header.
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
}

/// Whether response headers report an exhausted rate limit window.
fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|remaining| remaining == 0)
}

/// Authenticated client for the GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    /// Create a client. Requests are authenticated when a token is given;
    /// unauthenticated requests work but hit a far smaller rate limit.
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the client at a different API host. Used against local
    /// stand-ins of the API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Make a GET request and deserialize the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, GitHubError> {
        let url = format!("{}{}", self.base_url, route);

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "audience");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();

        match status {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| GitHubError::Internal(format!("JSON parse error: {}", e))),
            StatusCode::UNAUTHORIZED => Err(GitHubError::AuthRequired),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                if status == StatusCode::TOO_MANY_REQUESTS || rate_limit_exhausted(&headers) {
                    Err(GitHubError::RateLimited {
                        reset_at: rate_limit_reset(&headers).unwrap_or_else(Utc::now),
                    })
                } else {
                    Err(GitHubError::AuthRequired)
                }
            }
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound(route.to_string())),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    message: if message.is_empty() {
                        status.to_string()
                    } else {
                        message
                    },
                })
            }
        }
    }

    /// Get rate limit status for all resources.
    pub async fn get_rate_limits(&self) -> Result<RateLimitResponse, GitHubError> {
        self.get_json("/rate_limit").await
    }
}

#[async_trait]
impl AudienceApi for GitHubClient {
    async fn repo_metadata(&self, repo: &RepoRef) -> Result<RepoMetadata, GitHubError> {
        let route = format!("/repos/{}/{}", repo.owner, repo.name);
        self.get_json(&route).await
    }

    async fn relation_page(
        &self,
        repo: &RepoRef,
        relation: Relation,
        page: u32,
    ) -> Result<Vec<String>, GitHubError> {
        let route = format!(
            "/repos/{}/{}/{}?per_page={}&page={}",
            repo.owner,
            repo.name,
            relation.route_segment(),
            PER_PAGE,
            page,
        );

        // Fork listings nest the username under `owner`; the other two
        // relations list users directly. A fork whose owner account was
        // deleted is skipped.
        let usernames = match relation {
            Relation::Forkers => {
                let forks: Vec<ForkEntry> = self.get_json(&route).await?;
                forks
                    .into_iter()
                    .filter_map(|fork| fork.owner.map(|owner| owner.login))
                    .collect()
            }
            Relation::Stargazers | Relation::Watchers => {
                let entries: Vec<RelationEntry> = self.get_json(&route).await?;
                entries.into_iter().map(|entry| entry.login).collect()
            }
        };

        Ok(usernames)
    }
}

#[async_trait]
impl UserApi for GitHubClient {
    async fn user_profile(&self, username: &str) -> Result<UserProfile, GitHubError> {
        let route = format!("/users/{}", username);
        let user: UserResponse = self.get_json(&route).await?;
        Ok(user.into_profile())
    }
}
