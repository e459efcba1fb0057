//! Repository URL parsing.
//!
//! Turns a browser-style repository URL into the `owner/name` pair the
//! API expects. Malformed input fails here, before any network call.

use std::fmt;

use thiserror::Error;

/// Host prefixes accepted for repository URLs.
const ACCEPTED_PREFIXES: [&str; 3] = [
    "https://github.com/",
    "http://github.com/",
    "github.com/",
];

/// Error returned for a URL that does not identify a repository.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("invalid repository URL: {url} (expected https://github.com/<owner>/<name>)")]
    InvalidRepositoryUrl { url: String },
}

/// An `owner/name` repository identifier.
///
/// Derived once from the input URL and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The `owner/name` slug, also used as the cache partition key.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a repository URL into a [`RepoRef`].
///
/// Accepts `https://github.com/<owner>/<name>` (scheme optional), with a
/// tolerated trailing slash or `.git` suffix. Anything else is rejected.
pub fn parse_repo_url(url: &str) -> Result<RepoRef, LocatorError> {
    let invalid = || LocatorError::InvalidRepositoryUrl {
        url: url.to_string(),
    };

    let trimmed = url.trim();
    let rest = ACCEPTED_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .ok_or_else(invalid)?;

    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut segments = rest.split('/');
    let owner = segments.next().unwrap_or_default();
    let name = segments.next().unwrap_or_default();

    if owner.is_empty() || name.is_empty() || segments.next().is_some() {
        return Err(invalid());
    }
    if [owner, name]
        .iter()
        .any(|s| s.contains(char::is_whitespace) || s.contains('?') || s.contains('#'))
    {
        return Err(invalid());
    }

    Ok(RepoRef::new(owner, name))
}
