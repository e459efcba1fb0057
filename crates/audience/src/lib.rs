//! Collect and export the audience of GitHub repositories.
//!
//! An audience is a repository's stargazers, watchers and forkers. This
//! crate fetches those listings page by page, enriches every username
//! with public profile fields, caches profiles in a local SQLite
//! database so reruns and repeat occurrences skip the remote lookup, and
//! exports the result to CSV files partitioned by email presence.
//!
//! The typical flow:
//!
//! ```ignore
//! let repo = audience::parse_repo_url("https://github.com/rust-lang/rust")?;
//! let api = audience::GitHubClient::new(Some(token));
//! let db = audience::connect_and_migrate("sqlite://audience.db?mode=rwc").await?;
//! let store = audience::DbProfileStore::new(db);
//!
//! let report = audience::collect_audience(
//!     &api,
//!     &store,
//!     &repo,
//!     &audience::Relation::ALL,
//!     &shutdown,
//!     Some(&on_progress),
//! )
//! .await?;
//!
//! audience::export_partitioned(Path::new("."), report.profiles)?;
//! ```

pub mod api;
pub mod cache;
pub mod collector;
pub mod db;
pub mod entity;
pub mod export;
pub mod github;
pub mod locator;
pub mod migration;
pub mod profile;
pub mod progress;
pub mod relation;
pub mod resolver;
pub mod retry;

pub use api::{AudienceApi, UserApi};
pub use cache::{DbProfileStore, MemoryProfileStore, ProfileStore};
pub use collector::{AudienceError, AudienceReport, collect_audience};
pub use db::{connect, connect_and_migrate};
pub use export::{EMAILS_FILE, ExportSummary, NO_EMAILS_FILE, export_partitioned};
pub use github::{GitHubClient, GitHubError};
pub use locator::{LocatorError, RepoRef, parse_repo_url};
pub use profile::UserProfile;
pub use progress::{FetchProgress, ProgressCallback, Shutdown};
pub use relation::Relation;
pub use resolver::{ProfileResolver, Resolution, ResolveError};
