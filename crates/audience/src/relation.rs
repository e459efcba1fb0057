//! Membership relations of a repository: stargazers, watchers, forkers.

use std::fmt;

use crate::github::types::RepoMetadata;

/// One of the three membership sets of a repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Users who starred the repository.
    Stargazers,
    /// Users subscribed to notifications for the repository.
    Watchers,
    /// Users who created a fork of the repository.
    Forkers,
}

impl Relation {
    /// All relations, in the order they are fetched.
    pub const ALL: [Relation; 3] = [Relation::Stargazers, Relation::Watchers, Relation::Forkers];

    /// The path segment of the listing endpoint under `/repos/{owner}/{name}/`.
    ///
    /// Watchers are listed by the `subscribers` endpoint; the `watchers`
    /// endpoint is a legacy alias for stargazers.
    pub fn route_segment(self) -> &'static str {
        match self {
            Relation::Stargazers => "stargazers",
            Relation::Watchers => "subscribers",
            Relation::Forkers => "forks",
        }
    }

    /// The total count the repository metadata reports for this relation.
    pub fn expected_total(self, meta: &RepoMetadata) -> usize {
        match self {
            Relation::Stargazers => meta.stargazers_count,
            Relation::Watchers => meta.subscribers_count,
            Relation::Forkers => meta.forks_count,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Relation::Stargazers => "stargazers",
            Relation::Watchers => "watchers",
            Relation::Forkers => "forkers",
        };
        f.write_str(label)
    }
}
